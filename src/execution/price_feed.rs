use super::CandleBuffer;
use crate::api::ArionClient;
use crate::models::Timeframe;

/// Keeps the candle buffer in step with the exchange
///
/// Every refresh replaces each (symbol, timeframe) series wholesale with the
/// latest window the exchange returns. A failed fetch clears that series so
/// stale candles never drive a decision.
pub struct MarketFeed {
    client: ArionClient,
    buffer: CandleBuffer,
}

impl MarketFeed {
    pub fn new(client: ArionClient, buffer_size: usize) -> Self {
        Self {
            client,
            buffer: CandleBuffer::new(buffer_size),
        }
    }

    /// Fetch every timeframe for every symbol; returns how many series came back non-empty
    pub async fn refresh(&self, symbols: &[String]) -> usize {
        let mut loaded = 0;

        for symbol in symbols {
            for timeframe in Timeframe::all() {
                let candles = self.client.fetch_ohlcv(symbol, timeframe).await;

                let stored = self
                    .buffer
                    .replace_candles(symbol, timeframe, candles)
                    .and_then(|_| self.buffer.candle_count(symbol, timeframe));

                match stored {
                    Ok(0) => {
                        tracing::warn!(
                            symbol = %symbol,
                            timeframe = %timeframe,
                            "No candles received"
                        );
                    }
                    Ok(count) => {
                        tracing::debug!("Stored {} {} candles for {}", count, timeframe, symbol);
                        loaded += 1;
                    }
                    Err(e) => {
                        tracing::error!("Failed to store {} {} candles: {}", symbol, timeframe, e);
                    }
                }
            }
        }

        tracing::debug!(
            "Market feed refreshed {} of {} series",
            loaded,
            symbols.len() * Timeframe::all().len()
        );

        loaded
    }

    pub fn buffer(&self) -> &CandleBuffer {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExchangeConfig;
    use crate::execution::MarketDataSource;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_refresh_loads_every_timeframe() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/futures/um/v3/market/history/candles")
            .match_query(Matcher::UrlEncoded("symbol".into(), "SOLUSDT".into()))
            .with_status(200)
            .with_body(r#"[[1700000000000, "100", "101", "99", "100.5", "10"]]"#)
            .expect(3)
            .create_async()
            .await;

        let config = ExchangeConfig {
            base_url: server.url(),
            ..Default::default()
        };
        let feed = MarketFeed::new(ArionClient::new(&config).unwrap(), 100);

        let loaded = feed.refresh(&["SOLUSDT".to_string()]).await;

        assert_eq!(loaded, 3);
        for timeframe in Timeframe::all() {
            assert_eq!(feed.buffer().candle_count("SOLUSDT", timeframe).unwrap(), 1);
        }
        assert_eq!(feed.buffer().last_close("SOLUSDT", Timeframe::OneHour), Some(100.5));
    }

    #[tokio::test]
    async fn test_failed_fetch_clears_stale_series() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/futures/um/v3/market/history/candles")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let config = ExchangeConfig {
            base_url: server.url(),
            ..Default::default()
        };
        let feed = MarketFeed::new(ArionClient::new(&config).unwrap(), 100);

        let stale = crate::models::Candle {
            symbol: "SOLUSDT".to_string(),
            timestamp: chrono::Utc::now(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1.0,
        };
        feed.buffer()
            .replace_candles("SOLUSDT", Timeframe::OneHour, vec![stale])
            .unwrap();

        let loaded = feed.refresh(&["SOLUSDT".to_string()]).await;

        assert_eq!(loaded, 0);
        assert_eq!(feed.buffer().candle_count("SOLUSDT", Timeframe::OneHour).unwrap(), 0);
    }
}
