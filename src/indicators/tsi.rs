// =============================================================================
// True Strength Index (TSI)
// =============================================================================
//
//   m   = close_t - close_{t-1}
//   TSI = 100 * EMA_fast(EMA_slow(m)) / EMA_fast(EMA_slow(|m|))
//
// Double smoothing makes TSI the slowest indicator in the frame: with 25/13
// the first value lands on close index 37 (1 for the delta, 24 for the slow
// warmup, 12 for the fast warmup).

use super::ema::calculate_ema;

/// Compute the TSI series. One value per close starting at index
/// `slow + fast - 1`.
///
/// A bar where the smoothed absolute momentum is zero (no movement at all
/// inside the smoothing horizon) has no defined TSI; it is reported as NaN
/// and later masked by [`tsi_column`].
pub fn calculate_tsi(closes: &[f64], slow: usize, fast: usize) -> Vec<f64> {
    if slow == 0 || fast == 0 || closes.len() < 2 {
        return Vec::new();
    }

    let momentum: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let abs_momentum: Vec<f64> = momentum.iter().map(|m| m.abs()).collect();

    let numerator = calculate_ema(&calculate_ema(&momentum, slow), fast);
    let denominator = calculate_ema(&calculate_ema(&abs_momentum, slow), fast);

    numerator
        .iter()
        .zip(denominator.iter())
        .map(|(n, d)| if *d == 0.0 { f64::NAN } else { 100.0 * n / d })
        .collect()
}

/// Index-aligned TSI column.
pub fn tsi_column(closes: &[f64], slow: usize, fast: usize) -> Vec<Option<f64>> {
    let offset = (slow + fast).saturating_sub(1);
    super::align(&calculate_tsi(closes, slow, fast), offset, closes.len())
}
