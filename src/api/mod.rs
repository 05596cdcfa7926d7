pub mod arion;

pub use arion::{parse_candles, ArionClient};
