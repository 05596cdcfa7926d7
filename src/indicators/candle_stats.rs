//! Candle body and volume statistics
//!
//! Helpers over the most recent candles of a series, used by the
//! stabilization and reversal-trigger detectors.

use crate::models::Candle;

fn tail(candles: &[Candle], period: usize) -> Option<&[Candle]> {
    if period == 0 || candles.len() < period {
        return None;
    }
    Some(&candles[candles.len() - period..])
}

/// Calculate average volume over the last `period` candles (current included)
pub fn calculate_average_volume(candles: &[Candle], period: usize) -> Option<f64> {
    let recent = tail(candles, period)?;
    let total_volume: f64 = recent.iter().map(|c| c.volume).sum();
    Some(total_volume / period as f64)
}

/// Calculate average body size |close - open| over the last `period` candles
pub fn calculate_average_body(candles: &[Candle], period: usize) -> Option<f64> {
    let recent = tail(candles, period)?;
    let total_body: f64 = recent.iter().map(Candle::body).sum();
    Some(total_body / period as f64)
}

/// Count candles in the last `period` whose body is strictly below
/// `ratio` times the average body of that same window
pub fn count_small_bodies(candles: &[Candle], period: usize, ratio: f64) -> Option<usize> {
    let avg_body = calculate_average_body(candles, period)?;
    let recent = tail(candles, period)?;
    let limit = avg_body * ratio;

    Some(recent.iter().filter(|c| c.body() < limit).count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_test_candles(rows: &[(f64, f64, f64)]) -> Vec<Candle> {
        rows.iter()
            .enumerate()
            .map(|(i, &(open, close, volume))| Candle {
                symbol: "TEST".to_string(),
                timestamp: Utc::now() + chrono::Duration::hours(i as i64),
                open,
                high: open.max(close),
                low: open.min(close),
                close,
                volume,
            })
            .collect()
    }

    #[test]
    fn test_average_volume() {
        let candles = create_test_candles(&[
            (100.0, 100.0, 9000.0),
            (100.0, 100.0, 1000.0),
            (100.0, 100.0, 2000.0),
            (100.0, 100.0, 3000.0),
        ]);

        assert_eq!(calculate_average_volume(&candles, 3), Some(2000.0));
        assert!(calculate_average_volume(&candles, 5).is_none());
    }

    #[test]
    fn test_average_body() {
        let candles = create_test_candles(&[
            (100.0, 101.0, 0.0),
            (101.0, 98.0, 0.0),
            (98.0, 100.0, 0.0),
        ]);

        assert_eq!(calculate_average_body(&candles, 3), Some(2.0));
    }

    #[test]
    fn test_count_small_bodies_is_strict() {
        // Bodies 1, 1, 4 → average 2, limit 1.0 at ratio 0.5
        let candles = create_test_candles(&[
            (100.0, 101.0, 0.0),
            (101.0, 100.0, 0.0),
            (100.0, 104.0, 0.0),
        ]);

        assert_eq!(count_small_bodies(&candles, 3, 0.5), Some(0));
        assert_eq!(count_small_bodies(&candles, 3, 0.6), Some(2));
    }
}
