use chrono::DateTime;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ExchangeConfig;
use crate::error::MonitorError;
use crate::models::{Candle, Timeframe};

const CANDLES_PATH: &str = "/futures/um/v3/market/history/candles";

type ExchangeRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Client for the exchange's futures candle endpoint
///
/// Cloneable; clones share the rate limiter.
#[derive(Clone)]
pub struct ArionClient {
    client: Client,
    base_url: String,
    candle_limit: usize,
    rate_limiter: Arc<ExchangeRateLimiter>,
}

impl ArionClient {
    pub fn new(config: &ExchangeConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let quota = Quota::per_minute(
            NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN),
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            candle_limit: config.candle_limit,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Fetch candles, oldest first; any failure is logged and yields an empty list
    pub async fn fetch_ohlcv(&self, symbol: &str, timeframe: Timeframe) -> Vec<Candle> {
        match self.try_fetch_ohlcv(symbol, timeframe).await {
            Ok(candles) => candles,
            Err(e) => {
                tracing::error!("Failed to fetch {} {} candles: {}", symbol, timeframe, e);
                Vec::new()
            }
        }
    }

    /// Fetch candles, reporting transport and decode failures
    pub async fn try_fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<Candle>, MonitorError> {
        self.rate_limiter.until_ready().await;

        let transport = |message: String| MonitorError::Transport {
            symbol: symbol.to_string(),
            message,
        };

        let url = format!("{}{}", self.base_url, CANDLES_PATH);
        let limit = self.candle_limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", timeframe.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| transport(e.to_string()))?;

        let rows: Vec<Vec<Value>> = response
            .json()
            .await
            .map_err(|e| transport(format!("invalid candle payload: {}", e)))?;

        let candles = parse_candles(symbol, &rows).map_err(transport)?;

        tracing::debug!(
            "Fetched {} {} candles for {}",
            candles.len(),
            timeframe,
            symbol
        );

        Ok(candles)
    }
}

/// Decode `[ts_ms, open, high, low, close, volume, ...]` rows
///
/// Numeric fields may be JSON numbers or strings. Output is sorted by time.
pub fn parse_candles(symbol: &str, rows: &[Vec<Value>]) -> Result<Vec<Candle>, String> {
    let mut candles = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            parse_row(symbol, row).ok_or_else(|| format!("malformed candle at row {}", i))
        })
        .collect::<Result<Vec<_>, _>>()?;

    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}

fn parse_row(symbol: &str, row: &[Value]) -> Option<Candle> {
    if row.len() < 6 {
        return None;
    }

    let timestamp_ms = number(&row[0])?;
    let timestamp = DateTime::from_timestamp_millis(timestamp_ms as i64)?;

    Some(Candle {
        symbol: symbol.to_string(),
        timestamp,
        open: number(&row[1])?,
        high: number(&row[2])?,
        low: number(&row[3])?,
        close: number(&row[4])?,
        volume: number(&row[5])?,
    })
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
