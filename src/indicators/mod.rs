// Technical indicators module
// RSI and SMA over close prices, plus candle body/volume statistics

pub mod candle_stats;
pub mod moving_average;
pub mod rsi;

pub use candle_stats::{calculate_average_body, calculate_average_volume, count_small_bodies};
pub use moving_average::{calculate_sma, sma_series};
pub use rsi::{calculate_rsi, rsi_series};
