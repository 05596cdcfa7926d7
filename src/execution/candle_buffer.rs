use crate::execution::MarketDataSource;
use crate::models::{Candle, Timeframe};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

type SeriesKey = (String, Timeframe);

/// Thread-safe in-memory buffer for candle data
///
/// Keeps a rolling window of candles per symbol and timeframe. This is the
/// `MarketDataSource` the evaluation pass reads from; the market feed fills it
/// before each tick.
#[derive(Clone)]
pub struct CandleBuffer {
    data: Arc<RwLock<HashMap<SeriesKey, VecDeque<Candle>>>>,
    max_candles: usize,
}

impl CandleBuffer {
    /// Create a new candle buffer
    ///
    /// # Arguments
    /// * `max_candles` - Maximum number of candles to keep per series
    pub fn new(max_candles: usize) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            max_candles,
        }
    }

    /// Replace a whole series with a freshly fetched window
    ///
    /// An empty `candles` clears the series so stale data is never evaluated.
    pub fn replace_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        candles: Vec<Candle>,
    ) -> Result<(), String> {
        let mut data = self.data.write().map_err(|e| e.to_string())?;

        let skip = candles.len().saturating_sub(self.max_candles);
        let series: VecDeque<Candle> = candles.into_iter().skip(skip).collect();
        data.insert((symbol.to_string(), timeframe), series);

        Ok(())
    }

    /// Get all candles for a series
    pub fn get_candles(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Candle>, String> {
        let data = self.data.read().map_err(|e| e.to_string())?;

        Ok(data
            .get(&(symbol.to_string(), timeframe))
            .map(|deque| deque.iter().cloned().collect())
            .unwrap_or_default())
    }

    pub fn candle_count(&self, symbol: &str, timeframe: Timeframe) -> Result<usize, String> {
        let data = self.data.read().map_err(|e| e.to_string())?;
        Ok(data
            .get(&(symbol.to_string(), timeframe))
            .map(|d| d.len())
            .unwrap_or(0))
    }
}

impl MarketDataSource for CandleBuffer {
    fn fetch_candles(&self, symbol: &str, timeframe: Timeframe) -> Vec<Candle> {
        match self.get_candles(symbol, timeframe) {
            Ok(candles) => candles,
            Err(e) => {
                tracing::warn!("Candle buffer unavailable for {} {}: {}", symbol, timeframe, e);
                Vec::new()
            }
        }
    }
}
