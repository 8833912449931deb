// =============================================================================
// Indicator Engine — candle series to indicator frame
// =============================================================================
//
// Derives the fixed indicator set for one contract:
//
//   RSI(14), SMA(14) of RSI and their difference
//   SMA(20) of close
//   Bollinger(20, 2σ): upper, lower, width
//   MACD(12, 26, 9) histogram
//   ADX(14)
//   TSI(25, 13)
//
// Every indicator is computed as a column aligned to the input candles. A row
// is kept only when every column is defined there, so the frame starts at the
// first bar a forward-only computation could have produced all values for.
// =============================================================================

use serde::Serialize;
use tracing::debug;

use super::{adx, bollinger, macd, rsi, sma_column, tsi};
use crate::error::{PipelineError, PipelineResult};
use crate::market_data::{Candle, CandleSeries};

/// Fewer candles than this and derivation is not attempted.
pub const MIN_CANDLES: usize = 20;

pub const RSI_PERIOD: usize = 14;
pub const RSI_SMA_PERIOD: usize = 14;
pub const SMA_PERIOD: usize = 20;
pub const BB_PERIOD: usize = 20;
pub const BB_STD: f64 = 2.0;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const ADX_PERIOD: usize = 14;
pub const TSI_SLOW: usize = 25;
pub const TSI_FAST: usize = 13;

/// Leading rows that can never carry a full set of values, i.e. the longest
/// lookback minus one. TSI is the longest (delta + slow warmup + fast warmup).
pub const WARMUP_ROWS: usize = {
    let rsi_sma_first = RSI_PERIOD - 1 + RSI_SMA_PERIOD - 1;
    let sma_first = SMA_PERIOD - 1;
    let bb_first = BB_PERIOD - 1;
    let macd_first = MACD_SLOW - 1 + MACD_SIGNAL - 1;
    let adx_first = 2 * ADX_PERIOD - 1;
    let tsi_first = TSI_SLOW + TSI_FAST - 1;
    max(
        max(max(rsi_sma_first, sma_first), max(bb_first, macd_first)),
        max(adx_first, tsi_first),
    )
};

const fn max(a: usize, b: usize) -> usize {
    if a > b {
        a
    } else {
        b
    }
}

/// One candle with every derived value defined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    #[serde(flatten)]
    pub candle: Candle,
    #[serde(rename = "RSI")]
    pub rsi: f64,
    #[serde(rename = "RSI_SMA_14")]
    pub rsi_sma_14: f64,
    #[serde(rename = "RSI_SMA-14_Difference")]
    pub rsi_sma_diff: f64,
    #[serde(rename = "SMA_20")]
    pub sma_20: f64,
    #[serde(rename = "BB_Upper")]
    pub bb_upper: f64,
    #[serde(rename = "BB_Lower")]
    pub bb_lower: f64,
    #[serde(rename = "BollingerBandWidth")]
    pub bb_width: f64,
    #[serde(rename = "MACD_Histogram")]
    pub macd_histogram: f64,
    #[serde(rename = "ADX")]
    pub adx: f64,
    #[serde(rename = "TSI")]
    pub tsi: f64,
}

impl IndicatorRow {
    /// Numeric column names in report order (after `time`).
    pub const COLUMNS: [&'static str; 15] = [
        "open",
        "high",
        "low",
        "close",
        "volume",
        "RSI",
        "RSI_SMA_14",
        "RSI_SMA-14_Difference",
        "SMA_20",
        "BB_Upper",
        "BB_Lower",
        "BollingerBandWidth",
        "MACD_Histogram",
        "ADX",
        "TSI",
    ];

    /// Values in the same order as [`Self::COLUMNS`].
    pub fn values(&self) -> [f64; 15] {
        let c = &self.candle;
        [
            c.open,
            c.high,
            c.low,
            c.close,
            c.volume,
            self.rsi,
            self.rsi_sma_14,
            self.rsi_sma_diff,
            self.sma_20,
            self.bb_upper,
            self.bb_lower,
            self.bb_width,
            self.macd_histogram,
            self.adx,
            self.tsi,
        ]
    }
}

/// Candle series extended with derived columns; no partial rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IndicatorFrame {
    rows: Vec<IndicatorRow>,
}

impl IndicatorFrame {
    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Most recent row, used for the summary view.
    pub fn latest(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorEngine;

impl IndicatorEngine {
    pub fn new() -> Self {
        Self
    }

    /// Derive the indicator frame for `series`.
    ///
    /// Returns `Insufficient` when the series is shorter than
    /// [`MIN_CANDLES`], or when no row ends up with every value defined
    /// (series too short for the slowest indicator, or degenerate prices).
    pub fn derive(&self, series: &CandleSeries) -> PipelineResult<IndicatorFrame> {
        let n = series.len();
        if n < MIN_CANDLES {
            debug!(candles = n, need = MIN_CANDLES, "not enough data to calculate indicators");
            return Err(PipelineError::Insufficient {
                have: n,
                need: MIN_CANDLES,
            });
        }

        let candles = series.candles();
        let closes = series.closes();

        let rsi_col = rsi::rsi_column(&closes, RSI_PERIOD);
        let rsi_sma_col = sma_column(&rsi_col, RSI_SMA_PERIOD);
        let sma_col = sma_column(&super::align(&closes, 0, n), SMA_PERIOD);
        let bb_col = bollinger::bollinger_column(&closes, BB_PERIOD, BB_STD);
        let macd_col = macd::macd_histogram_column(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        let adx_col = adx::adx_column(candles, ADX_PERIOD);
        let tsi_col = tsi::tsi_column(&closes, TSI_SLOW, TSI_FAST);

        let rows: Vec<IndicatorRow> = (0..n)
            .filter_map(|i| {
                let rsi_value = rsi_col[i]?;
                let rsi_sma_14 = rsi_sma_col[i]?;
                let bb = bb_col[i]?;
                Some(IndicatorRow {
                    candle: candles[i].clone(),
                    rsi: rsi_value,
                    rsi_sma_14,
                    rsi_sma_diff: rsi_value - rsi_sma_14,
                    sma_20: sma_col[i]?,
                    bb_upper: bb.upper,
                    bb_lower: bb.lower,
                    bb_width: bb.width,
                    macd_histogram: macd_col[i]?,
                    adx: adx_col[i]?,
                    tsi: tsi_col[i]?,
                })
            })
            .collect();

        if rows.is_empty() {
            debug!(candles = n, warmup = WARMUP_ROWS, "no complete indicator rows");
            return Err(PipelineError::Insufficient {
                have: n,
                need: WARMUP_ROWS + 1,
            });
        }

        debug!(candles = n, rows = rows.len(), "indicator frame derived");
        Ok(IndicatorFrame { rows })
    }
}
