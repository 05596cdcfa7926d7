use thiserror::Error;

use crate::models::Timeframe;

/// Reasons a single-symbol evaluation is abandoned for the current tick
#[derive(Debug, Error, PartialEq)]
pub enum MonitorError {
    #[error(
        "insufficient {timeframe} data for {symbol}: need {required} candles, have {available}"
    )]
    DataInsufficient {
        symbol: String,
        timeframe: Timeframe,
        required: usize,
        available: usize,
    },

    #[error("transport failure fetching {symbol}: {message}")]
    Transport { symbol: String, message: String },

    #[error("no position for {0}")]
    UnknownPosition(String),

    #[error("invalid account equity: {0}")]
    InvalidEquity(f64),

    #[error("invalid risk metric: {0}")]
    InvalidRiskMetric(f64),
}

impl MonitorError {
    pub fn insufficient(
        symbol: &str,
        timeframe: Timeframe,
        required: usize,
        available: usize,
    ) -> Self {
        MonitorError::DataInsufficient {
            symbol: symbol.to_string(),
            timeframe,
            required,
            available,
        }
    }

    /// True for errors that only skip the symbol for this tick
    pub fn is_data_insufficient(&self) -> bool {
        matches!(self, MonitorError::DataInsufficient { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_message() {
        let err = MonitorError::insufficient("SOLUSDT", Timeframe::FourHours, 15, 3);
        assert!(err.is_data_insufficient());
        assert_eq!(
            err.to_string(),
            "insufficient 4h data for SOLUSDT: need 15 candles, have 3"
        );
    }
}
