// =============================================================================
// Resolution-and-analysis pipeline
// =============================================================================
//
//   name --resolver--> SecurityIdentity
//        --selector--> ContractPair (ATM call/put)
//        --fetcher---> CandleSeries per leg
//        --engine----> IndicatorFrame per leg
//        --orchestrator--> full series view / latest-row summary view
//
// Data only flows forward. Every stage returns a fresh value or a
// `PipelineError`; nothing is shared between tickers or legs.
// =============================================================================

pub mod fetcher;
pub mod orchestrator;
pub mod resolver;
pub mod selector;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::gateway::CandleWindow;

pub use orchestrator::{AnalysisOrchestrator, AnalysisResult, AnalysisSummary, LegResult, LegSummary};

/// User-facing analysis window in local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub interval_minutes: u32,
}

impl AnalysisWindow {
    /// Validate and build a window. The interval must be at least one minute
    /// and `end` must be after `start`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, interval_minutes: u32) -> Result<Self> {
        if interval_minutes == 0 {
            anyhow::bail!("interval must be at least 1 minute");
        }
        if end <= start {
            anyhow::bail!("window end {end} is not after start {start}");
        }
        Ok(Self {
            start,
            end,
            interval_minutes,
        })
    }

    /// Epoch-millisecond request window, interpreting both ends in the
    /// local timezone.
    pub fn to_candle_window(&self) -> Result<CandleWindow> {
        Ok(CandleWindow {
            start_ms: local_epoch_ms(&self.start)?,
            end_ms: local_epoch_ms(&self.end)?,
            interval_minutes: self.interval_minutes,
        })
    }
}

fn local_epoch_ms(ts: &NaiveDateTime) -> Result<i64> {
    Local
        .from_local_datetime(ts)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .with_context(|| format!("{ts} does not exist in the local timezone"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn window_rejects_zero_interval() {
        assert!(AnalysisWindow::new(at(9, 15), at(15, 30), 0).is_err());
    }

    #[test]
    fn window_rejects_inverted_range() {
        assert!(AnalysisWindow::new(at(15, 30), at(9, 15), 15).is_err());
        assert!(AnalysisWindow::new(at(9, 15), at(9, 15), 15).is_err());
    }

    #[test]
    fn candle_window_spans_the_session_in_millis() {
        let window = AnalysisWindow::new(at(9, 15), at(15, 30), 15).unwrap();
        let cw = window.to_candle_window().unwrap();
        assert_eq!(cw.interval_minutes, 15);
        assert_eq!(cw.end_ms - cw.start_ms, (6 * 60 + 15) * 60 * 1000);
    }
}
