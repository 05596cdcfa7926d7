/// Calculate Simple Moving Average (SMA) of the last `period` prices
pub fn calculate_sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let sum: f64 = prices.iter().rev().take(period).sum();
    Some(sum / period as f64)
}

/// Rolling SMA at every index; `None` until `period` observations exist
///
/// Series form of [`calculate_sma`] for callers that chart or backtest the
/// indicator; the monitor itself only reads the latest value.
pub fn sma_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..prices.len())
        .map(|i| calculate_sma(&prices[..=i], period))
        .collect()
}
