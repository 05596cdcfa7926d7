/// Calculate Relative Strength Index (RSI) for the most recent price
///
/// Average gain and loss are plain means of the last `period` price changes
/// (no Wilder smoothing).
///
/// Returns `None` when fewer than `period + 1` prices are available, or when
/// the window has no movement at all (both averages zero, RSI undefined).
pub fn calculate_rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let window = &prices[prices.len() - period - 1..];
    rsi_from_window(window)
}

/// RSI at every index of `prices`
///
/// Entries before `period + 1` observations are `None`, mirroring a rolling
/// computation that leaves the warm-up region undefined. Series form of
/// [`calculate_rsi`] for callers that chart or backtest the indicator; the
/// monitor itself only reads the latest value.
pub fn rsi_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..prices.len())
        .map(|i| {
            if period == 0 || i < period {
                None
            } else {
                rsi_from_window(&prices[i - period..=i])
            }
        })
        .collect()
}

fn rsi_from_window(window: &[f64]) -> Option<f64> {
    let period = window.len() - 1;

    let (gains, losses) = window
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold((0.0, 0.0), |(gain, loss), change| {
            if change > 0.0 {
                (gain + change, loss)
            } else {
                (gain, loss - change)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            return None;
        }
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}
