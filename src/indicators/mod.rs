// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators derived for every
// option contract. The per-indicator functions return compact vectors that
// start at their first computable index; `*_column` wrappers realign them to
// the input so `engine` can combine them row by row.

pub mod adx;
pub mod bollinger;
pub mod ema;
pub mod engine;
pub mod macd;
pub mod rsi;
pub mod tsi;

pub use engine::{IndicatorEngine, IndicatorFrame, IndicatorRow};

/// Rolling simple moving average over an index-aligned column. A row is
/// defined only when all `period` rows of its window are defined.
pub fn sma_column(column: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; column.len()];
    }

    let period_f = period as f64;
    (0..column.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let sum: Option<f64> = column[i + 1 - period..=i].iter().copied().sum();
            sum.map(|s| s / period_f)
        })
        .collect()
}

/// Place a compact series that starts at input index `offset` back onto a
/// column of length `len`. Non-finite values become `None`.
pub fn align(values: &[f64], offset: usize, len: usize) -> Vec<Option<f64>> {
    let mut column = vec![None; len];
    for (i, &v) in values.iter().enumerate() {
        if let Some(slot) = column.get_mut(offset + i) {
            *slot = v.is_finite().then_some(v);
        }
    }
    column
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_rolls() {
        let column = align(&[1.0, 2.0, 3.0, 4.0, 5.0], 0, 5);
        let sma = sma_column(&column, 3);
        assert_eq!(sma, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn sma_needs_a_full_window() {
        // RSI-like column defined from index 2.
        let column = vec![None, None, Some(10.0), Some(20.0), Some(30.0), Some(40.0)];
        let sma = sma_column(&column, 3);
        assert_eq!(sma, vec![None, None, None, None, Some(20.0), Some(30.0)]);
        assert!(sma_column(&column, 0).iter().all(Option::is_none));
        assert!(sma_column(&column[..2], 3).iter().all(Option::is_none));
    }

    #[test]
    fn align_offsets_and_masks_non_finite() {
        let column = align(&[1.0, f64::NAN, 3.0], 2, 6);
        assert_eq!(column, vec![None, None, Some(1.0), None, Some(3.0), None]);
    }

    #[test]
    fn align_ignores_overflow() {
        let column = align(&[1.0, 2.0, 3.0], 2, 3);
        assert_eq!(column, vec![None, None, Some(1.0)]);
    }
}
