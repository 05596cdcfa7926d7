use crate::models::{Candle, Timeframe};

/// Read access to OHLCV candles for the evaluation pass
///
/// Implementations fail soft: a transport problem yields an empty list and
/// the caller decides whether that is enough data.
pub trait MarketDataSource {
    /// Candles ordered oldest to newest
    fn fetch_candles(&self, symbol: &str, timeframe: Timeframe) -> Vec<Candle>;

    /// Close of the newest candle
    fn last_close(&self, symbol: &str, timeframe: Timeframe) -> Option<f64> {
        self.fetch_candles(symbol, timeframe).last().map(|c| c.close)
    }
}

impl<T: MarketDataSource + ?Sized> MarketDataSource for &T {
    fn fetch_candles(&self, symbol: &str, timeframe: Timeframe) -> Vec<Candle> {
        (**self).fetch_candles(symbol, timeframe)
    }

    fn last_close(&self, symbol: &str, timeframe: Timeframe) -> Option<f64> {
        (**self).last_close(symbol, timeframe)
    }
}
