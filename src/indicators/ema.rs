// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = value_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The recursion starts from the first value itself; the first `period - 1`
// outputs are still warming up and are not returned. Both MACD and TSI are
// built from chained EMAs: the next EMA in a chain starts from the first
// value the previous one returned.
// =============================================================================

/// Compute the EMA series for the given `values` slice and look-back `period`.
///
/// Returns an empty `Vec` when the input is too short or the period is zero.
/// Each output element corresponds to an input starting at index `period - 1`.
///
/// # Edge cases
/// - `period == 0` => empty vec (division by zero guard)
/// - `values.len() < period` => empty vec
/// - A non-finite intermediate value stops the series; everything produced
///   before it is kept.
pub fn calculate_ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let multiplier = 2.0 / (period + 1) as f64;

    let mut result = Vec::with_capacity(values.len() - period + 1);
    let mut prev_ema: Option<f64> = None;

    for (i, &value) in values.iter().enumerate() {
        let ema = match prev_ema {
            None => value,
            Some(prev) => value * multiplier + prev * (1.0 - multiplier),
        };
        if !ema.is_finite() {
            // Downstream consumers should not trust a broken series.
            break;
        }
        if i + 1 >= period {
            result.push(ema);
        }
        prev_ema = Some(ema);
    }

    result
}
