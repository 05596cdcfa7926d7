use crate::config::ScreenerConfig;
use crate::error::MonitorError;
use crate::execution::{LogSink, MarketDataSource};
use crate::indicators::calculate_rsi;
use crate::models::{
    Direction, EntrySignal, IndicatorReading, SignalContext, Timeframe, TrendRegime,
};
use crate::strategy::signals::SignalDetector;

/// Result of a phase-1 screening run
#[derive(Debug, Clone, PartialEq)]
pub enum ScreeningOutcome {
    /// Reference market is neutral; nothing was screened
    Waiting,
    Screened {
        regime: TrendRegime,
        signals: Vec<EntrySignal>,
    },
}

/// Phase-1 entry screening
///
/// Reads the regime of the reference market (BTC), then looks for assets
/// that are oversold in a bullish market or overbought in a bearish one.
pub struct Screener {
    detector: SignalDetector,
    config: ScreenerConfig,
}

impl Screener {
    pub fn new(detector: SignalDetector, config: ScreenerConfig) -> Self {
        Self { detector, config }
    }

    pub fn analyze_market_trend<S: MarketDataSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<TrendRegime, MonitorError> {
        self.detector
            .trend_regime(source, &self.config.reference_symbol)
    }

    /// Symbols whose candles a screening run reads
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols = vec![self.config.reference_symbol.clone()];
        symbols.extend(self.config.assets.iter().cloned());
        symbols
    }

    pub fn run<S, L>(&self, source: &S, sink: &mut L) -> Result<ScreeningOutcome, MonitorError>
    where
        S: MarketDataSource + ?Sized,
        L: LogSink + ?Sized,
    {
        let regime = self.analyze_market_trend(source)?;
        if regime == TrendRegime::Neutral {
            tracing::info!("Reference trend is neutral. Waiting for a clearer setup.");
            return Ok(ScreeningOutcome::Waiting);
        }

        tracing::info!("Reference trend: {}", regime);

        let mut signals = Vec::new();
        for symbol in &self.config.assets {
            let candles = source.fetch_candles(symbol, Timeframe::OneHour);
            if candles.is_empty() {
                tracing::warn!("No 1h data for {}, skipping", symbol);
                continue;
            }

            let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
            let Some(rsi) = calculate_rsi(&closes, self.detector.config().rsi_period) else {
                tracing::debug!("RSI undefined for {} ({} candles)", symbol, closes.len());
                continue;
            };

            let direction = match regime {
                TrendRegime::Bullish if rsi < self.config.oversold_rsi => Direction::Buy,
                TrendRegime::Bearish if rsi > self.config.overbought_rsi => Direction::Sell,
                _ => continue,
            };

            let context = SignalContext {
                allocation_usdt: self.config.allocation_usdt,
            };
            sink.record(symbol, &IndicatorReading::new(Some(rsi)), &context);

            signals.push(EntrySignal {
                symbol: symbol.clone(),
                direction,
                rsi,
                allocation_usdt: self.config.allocation_usdt,
            });
        }

        Ok(ScreeningOutcome::Screened { regime, signals })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{CandleBuffer, MemoryLogSink};
    use crate::models::Candle;
    use chrono::{Duration, Utc};

    fn load_closes(buffer: &CandleBuffer, symbol: &str, closes: &[f64]) {
        let start = Utc::now() - Duration::hours(closes.len() as i64);
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                symbol: symbol.to_string(),
                timestamp: start + Duration::hours(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect();
        buffer
            .replace_candles(symbol, Timeframe::OneHour, candles)
            .unwrap();
    }

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    fn falling(n: usize) -> Vec<f64> {
        (0..n).map(|i| 200.0 - i as f64).collect()
    }

    fn screener() -> Screener {
        let config = ScreenerConfig {
            reference_symbol: "BTCUSDT".to_string(),
            assets: vec!["SOLUSDT".to_string(), "ETHUSDT".to_string(), "BNBUSDT".to_string()],
            ..Default::default()
        };
        Screener::new(SignalDetector::default(), config)
    }

    #[test]
    fn test_bullish_market_flags_oversold_assets() {
        let buffer = CandleBuffer::new(100);
        load_closes(&buffer, "BTCUSDT", &rising(30));
        load_closes(&buffer, "SOLUSDT", &falling(30)); // RSI 0
        load_closes(&buffer, "ETHUSDT", &rising(30)); // RSI 100
        // BNBUSDT has no data

        let mut sink = MemoryLogSink::new();
        let outcome = screener().run(&buffer, &mut sink).unwrap();

        match outcome {
            ScreeningOutcome::Screened { regime, signals } => {
                assert_eq!(regime, TrendRegime::Bullish);
                assert_eq!(signals.len(), 1);
                assert_eq!(signals[0].symbol, "SOLUSDT");
                assert_eq!(signals[0].direction, Direction::Buy);
                assert_eq!(signals[0].allocation_usdt, 10.0);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(sink.records().len(), 1);
    }

    #[test]
    fn test_bearish_market_flags_overbought_assets() {
        let buffer = CandleBuffer::new(100);
        load_closes(&buffer, "BTCUSDT", &falling(30));
        load_closes(&buffer, "ETHUSDT", &rising(30));

        let mut sink = MemoryLogSink::new();
        let outcome = screener().run(&buffer, &mut sink).unwrap();

        let ScreeningOutcome::Screened { regime, signals } = outcome else {
            panic!("expected a screened outcome");
        };
        assert_eq!(regime, TrendRegime::Bearish);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].symbol, "ETHUSDT");
        assert_eq!(signals[0].direction, Direction::Sell);
    }

    #[test]
    fn test_neutral_market_waits() {
        let buffer = CandleBuffer::new(100);
        // Flat reference: SMAs equal, RSI undefined
        load_closes(&buffer, "BTCUSDT", &[100.0; 30]);
        load_closes(&buffer, "SOLUSDT", &falling(30));

        let mut sink = MemoryLogSink::new();
        let outcome = screener().run(&buffer, &mut sink).unwrap();

        assert_eq!(outcome, ScreeningOutcome::Waiting);
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_missing_reference_data() {
        let buffer = CandleBuffer::new(100);
        let mut sink = MemoryLogSink::new();

        let err = screener().run(&buffer, &mut sink).unwrap_err();
        assert!(err.is_data_insufficient());
    }
}
