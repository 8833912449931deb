// =============================================================================
// MACD — Moving Average Convergence / Divergence
// =============================================================================
//
//   MACD line = EMA(fast) - EMA(slow)
//   signal    = EMA(signal) of the MACD line
//   histogram = MACD line - signal
//
// Only the histogram is reported. With 12/26/9 the first histogram value
// lands on close index 33 (25 for the slow EMA, 8 more for the signal warmup).

use super::ema::calculate_ema;

/// Compute the MACD histogram. One value per close starting at index
/// `slow - 1 + signal - 1`.
///
/// Returns an empty vec when `fast >= slow`, any period is zero, or the
/// input is too short for the signal line.
pub fn calculate_macd_histogram(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> Vec<f64> {
    if fast == 0 || signal == 0 || fast >= slow {
        return Vec::new();
    }

    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);

    // Both EMAs are realigned to the slow EMA's first index.
    let skip = slow - fast;
    let macd_line: Vec<f64> = ema_slow
        .iter()
        .zip(ema_fast.iter().skip(skip))
        .map(|(s, f)| f - s)
        .collect();

    let signal_line = calculate_ema(&macd_line, signal);
    signal_line
        .iter()
        .zip(macd_line.iter().skip(signal - 1))
        .map(|(sig, m)| m - sig)
        .collect()
}

/// Index-aligned histogram column.
pub fn macd_histogram_column(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> Vec<Option<f64>> {
    let hist = calculate_macd_histogram(closes, fast, slow, signal);
    super::align(&hist, slow.saturating_sub(1) + signal.saturating_sub(1), closes.len())
}
