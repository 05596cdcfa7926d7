use crate::execution::CandleBuffer;
use crate::models::{Candle, Timeframe};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Market scenario types for synthetic data generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketScenario {
    /// Quiet 4h base, 5m volume burst through the prior high, 1h grinding up
    Breakout,
    /// 1h trend rolling over (-0.3% per candle), other timeframes choppy
    Reversal,
    /// Mean-reverting chop on every timeframe
    Sideways,
}

/// Generates seeded multi-timeframe candle data for dry runs
pub struct SyntheticDataGenerator {
    rng: StdRng,
    base_volume: f64,
}

impl SyntheticDataGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_volume: 1_000_000.0,
        }
    }

    /// Generate `num_candles` candles for one timeframe, ending now at `last_price`
    pub fn generate(
        &mut self,
        symbol: &str,
        scenario: MarketScenario,
        timeframe: Timeframe,
        num_candles: usize,
        last_price: f64,
    ) -> Vec<Candle> {
        if num_candles == 0 {
            return Vec::new();
        }

        let bars = match (scenario, timeframe) {
            (MarketScenario::Breakout, Timeframe::FourHours) => self.quiet_base(num_candles),
            (MarketScenario::Breakout, Timeframe::FiveMinutes) => self.volume_burst(num_candles),
            (MarketScenario::Breakout, Timeframe::OneHour) => self.trend(num_candles, 0.003),
            (MarketScenario::Reversal, Timeframe::OneHour) => self.trend(num_candles, -0.003),
            _ => self.chop(num_candles),
        };

        // Rescale so the series closes exactly at `last_price`
        let scale = bars
            .last()
            .map(|bar| last_price / bar.close)
            .unwrap_or(1.0);

        let interval = timeframe.minutes();
        let start_time: DateTime<Utc> =
            Utc::now() - Duration::minutes(num_candles as i64 * interval);

        let mut candles: Vec<Candle> = bars
            .into_iter()
            .enumerate()
            .map(|(i, bar)| Candle {
                symbol: symbol.to_string(),
                timestamp: start_time + Duration::minutes(i as i64 * interval),
                open: bar.open * scale,
                high: bar.high * scale,
                low: bar.low * scale,
                close: bar.close * scale,
                volume: bar.volume,
            })
            .collect();

        // Pin the final close against rounding in the rescale
        if let Some(last) = candles.last_mut() {
            last.close = last_price;
            last.high = last.high.max(last_price);
            last.low = last.low.min(last_price);
        }

        candles
    }

    /// Load every timeframe for `symbol` into the buffer
    pub fn populate(
        &mut self,
        buffer: &CandleBuffer,
        symbol: &str,
        scenario: MarketScenario,
        num_candles: usize,
        last_price: f64,
    ) -> Result<(), String> {
        for timeframe in Timeframe::all() {
            let candles = self.generate(symbol, scenario, timeframe, num_candles, last_price);
            buffer.replace_candles(symbol, timeframe, candles)?;
        }
        Ok(())
    }

    /// Every third candle carries a wide body, the rest are tiny
    fn quiet_base(&mut self, n: usize) -> Vec<Bar> {
        let mut bars = Vec::with_capacity(n);
        let mut price = 1.0;

        for i in 0..n {
            let body = if i % 3 == 0 {
                self.rng.gen_range(0.006..0.010)
            } else {
                self.rng.gen_range(0.0002..0.0008)
            };
            let sign = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let close = price * (1.0 + sign * body);

            bars.push(self.bar(price, close, 1.0));
            price = close;
        }

        bars
    }

    /// Tight drift with flat volume, then one candle at 5x volume closing 0.5% higher
    fn volume_burst(&mut self, n: usize) -> Vec<Bar> {
        let mut bars = self.walk(n.saturating_sub(1), 0.0, 0.001);

        let open = bars.last().map(|bar| bar.close).unwrap_or(1.0);
        bars.push(self.bar(open, open * 1.005, 5.0));

        bars
    }

    fn trend(&mut self, n: usize, drift: f64) -> Vec<Bar> {
        self.walk(n, drift, 0.001)
    }

    fn chop(&mut self, n: usize) -> Vec<Bar> {
        let mut bars = Vec::with_capacity(n);
        let mut price = 1.0;

        for _ in 0..n {
            // 10% pull to the mean
            let reversion = (1.0 - price) * 0.1;
            let noise = price * self.rng.gen_range(-0.01..0.01);
            let close = price + reversion + noise;

            bars.push(self.bar(price, close, 1.0));
            price = close;
        }

        bars
    }

    /// Random walk where each close moves `drift` plus up to `noise` either way
    fn walk(&mut self, n: usize, drift: f64, noise: f64) -> Vec<Bar> {
        let mut bars = Vec::with_capacity(n);
        let mut price = 1.0;

        for _ in 0..n {
            let close = price * (1.0 + drift + self.rng.gen_range(-noise..noise));
            bars.push(self.bar(price, close, 1.0));
            price = close;
        }

        bars
    }

    fn bar(&mut self, open: f64, close: f64, volume_multiplier: f64) -> Bar {
        // ±0.05% wicks
        let high = open.max(close) * (1.0 + self.rng.gen_range(0.0..0.0005));
        let low = open.min(close) * (1.0 - self.rng.gen_range(0.0..0.0005));
        let volume = self.base_volume * volume_multiplier * self.rng.gen_range(0.9..1.1);

        Bar {
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

struct Bar {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}
