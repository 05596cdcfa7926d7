// Signal detection and entry screening
pub mod screener;
pub mod signals;

pub use screener::{Screener, ScreeningOutcome};
pub use signals::{SignalDetector, TrendReading};
