use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// OHLCV candlestick data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Absolute size of the candle body
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }
}

/// Candle interval requested from the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
}

impl Timeframe {
    /// Interval string understood by the exchange API
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::FiveMinutes => "5m",
            Timeframe::OneHour => "1h",
            Timeframe::FourHours => "4h",
        }
    }

    pub fn minutes(&self) -> i64 {
        match self {
            Timeframe::FiveMinutes => 5,
            Timeframe::OneHour => 60,
            Timeframe::FourHours => 240,
        }
    }

    /// Every timeframe the monitor reads during a pass
    pub fn all() -> [Timeframe; 3] {
        [
            Timeframe::OneHour,
            Timeframe::FourHours,
            Timeframe::FiveMinutes,
        ]
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side of a leveraged position
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

/// Trend classification on the 1h chart
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendRegime {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for TrendRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrendRegime::Bullish => "BULLISH",
            TrendRegime::Bearish => "BEARISH",
            TrendRegime::Neutral => "NEUTRAL",
        };
        f.write_str(label)
    }
}

/// Indicator values attached to a logged signal
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IndicatorReading {
    /// `None` when the price series was too short or flat
    pub rsi: Option<f64>,
}

impl IndicatorReading {
    pub fn new(rsi: Option<f64>) -> Self {
        Self { rsi }
    }
}

/// Allocation context attached to a logged signal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalContext {
    pub allocation_usdt: f64,
}

/// Screening signal for a fresh entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntrySignal {
    pub symbol: String,
    pub direction: Direction,
    pub rsi: f64,
    pub allocation_usdt: f64,
}
