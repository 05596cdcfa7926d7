pub mod synthetic;

pub use synthetic::{MarketScenario, SyntheticDataGenerator};
