use crate::config::SignalConfig;
use crate::error::MonitorError;
use crate::execution::MarketDataSource;
use crate::indicators::{calculate_average_volume, calculate_rsi, calculate_sma, count_small_bodies};
use crate::models::{Candle, Timeframe, TrendRegime};

/// SMA and RSI of the 1h closes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendReading {
    pub sma_fast: f64,
    pub sma_slow: f64,
    /// `None` when the RSI window has no price movement
    pub rsi: Option<f64>,
}

impl TrendReading {
    /// Screening classification: SMA crossover confirmed by RSI
    pub fn regime(&self, bullish_rsi: f64, bearish_rsi: f64) -> TrendRegime {
        match self.rsi {
            Some(rsi) if self.sma_fast > self.sma_slow && rsi >= bullish_rsi => {
                TrendRegime::Bullish
            }
            Some(rsi) if self.sma_fast < self.sma_slow && rsi <= bearish_rsi => {
                TrendRegime::Bearish
            }
            _ => TrendRegime::Neutral,
        }
    }

    /// Trend lost strength: fast SMA under slow SMA and RSI below `exit_rsi`
    pub fn signals_exit(&self, exit_rsi: f64) -> bool {
        self.sma_fast < self.sma_slow && self.rsi.is_some_and(|rsi| rsi < exit_rsi)
    }
}

/// Stabilization, reversal-trigger and trend detectors
#[derive(Debug, Clone, Default)]
pub struct SignalDetector {
    config: SignalConfig,
}

impl SignalDetector {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Candles needed for a trend reading (slow SMA or RSI warm-up)
    pub fn trend_candles_required(&self) -> usize {
        self.config.sma_slow.max(self.config.rsi_period + 1)
    }

    /// Candles needed for the reversal trigger (`last`, `prev` and the volume mean)
    pub fn trigger_candles_required(&self) -> usize {
        self.config.volume_window.max(2)
    }

    /// Volatility has contracted on the 4h chart
    ///
    /// True when at least `min_small_bodies` of the last `stabilization_window`
    /// candles have a body strictly below `small_body_ratio` x the mean body.
    pub fn is_stabilized(&self, symbol: &str, candles: &[Candle]) -> Result<bool, MonitorError> {
        let window = self.config.stabilization_window;
        let small = count_small_bodies(candles, window, self.config.small_body_ratio)
            .ok_or_else(|| {
                MonitorError::insufficient(symbol, Timeframe::FourHours, window, candles.len())
            })?;

        tracing::debug!(
            "{} stabilization: {}/{} small bodies (need {})",
            symbol,
            small,
            window,
            self.config.min_small_bodies
        );

        Ok(small >= self.config.min_small_bodies)
    }

    /// Reversal confirmed on the 5m chart
    ///
    /// The newest candle must trade more than `volume_multiplier` x the mean
    /// volume of the last `volume_window` candles (itself included) and close
    /// above the previous candle's high.
    pub fn has_trigger_strength(
        &self,
        symbol: &str,
        candles: &[Candle],
    ) -> Result<bool, MonitorError> {
        let required = self.trigger_candles_required();
        let insufficient =
            || MonitorError::insufficient(symbol, Timeframe::FiveMinutes, required, candles.len());

        if candles.len() < required {
            return Err(insufficient());
        }

        let last = &candles[candles.len() - 1];
        let prev = &candles[candles.len() - 2];
        let avg_volume =
            calculate_average_volume(candles, self.config.volume_window).ok_or_else(insufficient)?;

        let volume_spike = last.volume > avg_volume * self.config.volume_multiplier;
        let breakout = last.close > prev.high;

        tracing::debug!(
            "{} trigger: volume {:.2} vs avg {:.2} (spike: {}), close {:.4} vs prev high {:.4} (breakout: {})",
            symbol,
            last.volume,
            avg_volume,
            volume_spike,
            last.close,
            prev.high,
            breakout
        );

        Ok(volume_spike && breakout)
    }

    /// SMA(fast), SMA(slow) and RSI of the 1h closes
    pub fn trend_reading(
        &self,
        symbol: &str,
        candles: &[Candle],
    ) -> Result<TrendReading, MonitorError> {
        let required = self.trend_candles_required();
        let insufficient =
            || MonitorError::insufficient(symbol, Timeframe::OneHour, required, candles.len());

        if candles.len() < required {
            return Err(insufficient());
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let sma_fast = calculate_sma(&closes, self.config.sma_fast).ok_or_else(insufficient)?;
        let sma_slow = calculate_sma(&closes, self.config.sma_slow).ok_or_else(insufficient)?;
        let rsi = calculate_rsi(&closes, self.config.rsi_period);

        Ok(TrendReading {
            sma_fast,
            sma_slow,
            rsi,
        })
    }

    pub fn detect_stabilization<S: MarketDataSource + ?Sized>(
        &self,
        source: &S,
        symbol: &str,
    ) -> Result<bool, MonitorError> {
        let candles = source.fetch_candles(symbol, Timeframe::FourHours);
        self.is_stabilized(symbol, &candles)
    }

    pub fn trigger_strength<S: MarketDataSource + ?Sized>(
        &self,
        source: &S,
        symbol: &str,
    ) -> Result<bool, MonitorError> {
        let candles = source.fetch_candles(symbol, Timeframe::FiveMinutes);
        self.has_trigger_strength(symbol, &candles)
    }

    pub fn read_trend<S: MarketDataSource + ?Sized>(
        &self,
        source: &S,
        symbol: &str,
    ) -> Result<TrendReading, MonitorError> {
        let candles = source.fetch_candles(symbol, Timeframe::OneHour);
        self.trend_reading(symbol, &candles)
    }

    /// Screening regime of a symbol's 1h chart
    pub fn trend_regime<S: MarketDataSource + ?Sized>(
        &self,
        source: &S,
        symbol: &str,
    ) -> Result<TrendRegime, MonitorError> {
        let reading = self.read_trend(source, symbol)?;
        Ok(reading.regime(self.config.bullish_rsi, self.config.bearish_rsi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn candle(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle {
            symbol: "SOLUSDT".to_string(),
            timestamp: Utc::now(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Candles with the given bodies, alternating up and down
    fn candles_with_bodies(bodies: &[f64]) -> Vec<Candle> {
        bodies
            .iter()
            .enumerate()
            .map(|(i, &body)| {
                let close = if i % 2 == 0 { 100.0 + body } else { 100.0 - body };
                candle(100.0, 100.0 + body, 100.0 - body, close, 1000.0)
            })
            .collect()
    }

    fn closes_to_candles(closes: &[f64]) -> Vec<Candle> {
        let start = Utc::now() - Duration::hours(closes.len() as i64);
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                symbol: "SOLUSDT".to_string(),
                timestamp: start + Duration::hours(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn test_stabilization_with_eight_small_bodies() {
        // Mean body (8*1 + 7*3)/15 = 1.93, limit 1.16: the eight 1.0 bodies count
        let mut bodies = vec![1.0; 8];
        bodies.extend(vec![3.0; 7]);
        let detector = SignalDetector::default();

        assert!(detector.is_stabilized("SOLUSDT", &candles_with_bodies(&bodies)).unwrap());
    }

    #[test]
    fn test_stabilization_rejects_uniform_bodies() {
        // Every body equals the mean, none is below 0.6x of it
        let detector = SignalDetector::default();
        let candles = candles_with_bodies(&[2.0; 15]);

        assert!(!detector.is_stabilized("SOLUSDT", &candles).unwrap());
    }

    #[test]
    fn test_stabilization_needs_eight() {
        // Mean (8*1 + 7*2)/15 = 1.47, limit 0.88: no body qualifies
        let mut bodies = vec![1.0; 8];
        bodies.extend(vec![2.0; 7]);
        let detector = SignalDetector::default();

        assert!(!detector.is_stabilized("SOLUSDT", &candles_with_bodies(&bodies)).unwrap());
    }

    #[test]
    fn test_stabilization_uses_last_fifteen_only() {
        // Older candles with huge bodies are outside the window
        let mut bodies = vec![50.0; 10];
        bodies.extend(vec![1.0; 8]);
        bodies.extend(vec![3.0; 7]);
        let detector = SignalDetector::default();

        assert!(detector.is_stabilized("SOLUSDT", &candles_with_bodies(&bodies)).unwrap());
    }

    #[test]
    fn test_stabilization_insufficient_data() {
        let detector = SignalDetector::default();
        let result = detector.is_stabilized("SOLUSDT", &candles_with_bodies(&[1.0; 14]));

        assert_eq!(
            result,
            Err(MonitorError::insufficient("SOLUSDT", Timeframe::FourHours, 15, 14))
        );
    }

    #[test]
    fn test_trigger_strength() {
        let detector = SignalDetector::default();
        let candles = vec![
            candle(100.0, 101.0, 99.0, 100.0, 3.0),
            candle(100.0, 101.0, 99.0, 100.0, 3.0),
            candle(100.0, 101.0, 99.0, 100.0, 3.0),
            candle(100.0, 101.0, 99.0, 100.0, 3.0),
            candle(100.0, 103.0, 100.0, 102.0, 9.0),
        ];

        // mean 4.2, 9 > 8.4 and 102 > 101
        assert!(detector.has_trigger_strength("SOLUSDT", &candles).unwrap());
    }

    #[test]
    fn test_trigger_volume_at_exactly_twice_mean() {
        let detector = SignalDetector::default();
        let candles = vec![
            candle(100.0, 101.0, 99.0, 100.0, 3.0),
            candle(100.0, 101.0, 99.0, 100.0, 3.0),
            candle(100.0, 101.0, 99.0, 100.0, 3.0),
            candle(100.0, 101.0, 99.0, 100.0, 3.0),
            candle(100.0, 103.0, 100.0, 102.0, 8.0),
        ];

        // mean (12 + 8) / 5 = 4, so volume 8 is exactly 2x and must not trigger
        assert!(!detector.has_trigger_strength("SOLUSDT", &candles).unwrap());
    }

    #[test]
    fn test_trigger_requires_breakout() {
        let detector = SignalDetector::default();
        let candles = vec![
            candle(100.0, 101.0, 99.0, 100.0, 3.0),
            candle(100.0, 101.0, 99.0, 100.0, 3.0),
            candle(100.0, 101.0, 99.0, 100.0, 3.0),
            candle(100.0, 101.0, 99.0, 100.0, 3.0),
            candle(100.0, 101.0, 100.0, 101.0, 50.0),
        ];

        // Close equals the previous high: no breakout
        assert!(!detector.has_trigger_strength("SOLUSDT", &candles).unwrap());
    }

    #[test]
    fn test_trigger_insufficient_data() {
        let detector = SignalDetector::default();
        let candles = vec![candle(100.0, 101.0, 99.0, 100.0, 3.0); 4];

        let err = detector.has_trigger_strength("SOLUSDT", &candles).unwrap_err();
        assert!(err.is_data_insufficient());
    }

    #[test]
    fn test_trend_reading_insufficient_data() {
        let detector = SignalDetector::default();
        let candles = closes_to_candles(&[100.0; 20]);

        let err = detector.trend_reading("SOLUSDT", &candles).unwrap_err();
        assert_eq!(
            err,
            MonitorError::insufficient("SOLUSDT", Timeframe::OneHour, 21, 20)
        );
    }

    #[test]
    fn test_trend_reading_uptrend_is_bullish() {
        let detector = SignalDetector::default();
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let reading = detector
            .trend_reading("SOLUSDT", &closes_to_candles(&closes))
            .unwrap();

        assert!(reading.sma_fast > reading.sma_slow);
        assert_eq!(reading.rsi, Some(100.0));
        assert_eq!(reading.regime(55.0, 45.0), TrendRegime::Bullish);
        assert!(!reading.signals_exit(50.0));
    }

    #[test]
    fn test_trend_reading_downtrend_exits() {
        let detector = SignalDetector::default();
        let closes: Vec<f64> = (0..30).map(|i| 130.0 - i as f64).collect();
        let reading = detector
            .trend_reading("SOLUSDT", &closes_to_candles(&closes))
            .unwrap();

        assert!(reading.sma_fast < reading.sma_slow);
        assert_eq!(reading.rsi, Some(0.0));
        assert_eq!(reading.regime(55.0, 45.0), TrendRegime::Bearish);
        assert!(reading.signals_exit(50.0));
    }

    #[test]
    fn test_exit_needs_both_conditions() {
        let crossed_only = TrendReading {
            sma_fast: 99.0,
            sma_slow: 100.0,
            rsi: Some(50.0),
        };
        let weak_rsi_only = TrendReading {
            sma_fast: 101.0,
            sma_slow: 100.0,
            rsi: Some(30.0),
        };
        let both = TrendReading {
            sma_fast: 99.0,
            sma_slow: 100.0,
            rsi: Some(49.9),
        };
        let undefined_rsi = TrendReading {
            sma_fast: 99.0,
            sma_slow: 100.0,
            rsi: None,
        };

        assert!(!crossed_only.signals_exit(50.0));
        assert!(!weak_rsi_only.signals_exit(50.0));
        assert!(both.signals_exit(50.0));
        assert!(!undefined_rsi.signals_exit(50.0));
    }

    #[test]
    fn test_regime_thresholds_are_inclusive() {
        let at_bull = TrendReading {
            sma_fast: 101.0,
            sma_slow: 100.0,
            rsi: Some(55.0),
        };
        let at_bear = TrendReading {
            sma_fast: 99.0,
            sma_slow: 100.0,
            rsi: Some(45.0),
        };
        let unconfirmed = TrendReading {
            sma_fast: 101.0,
            sma_slow: 100.0,
            rsi: Some(54.9),
        };

        assert_eq!(at_bull.regime(55.0, 45.0), TrendRegime::Bullish);
        assert_eq!(at_bear.regime(55.0, 45.0), TrendRegime::Bearish);
        assert_eq!(unconfirmed.regime(55.0, 45.0), TrendRegime::Neutral);
    }
}
