// =============================================================================
// Batch Report — folding per-ticker results into output files
// =============================================================================
//
// The batch driver collects one `AnalysisResult` per ticker, in input order,
// and hands the whole sequence here. Only then are the results partitioned
// into the call and put summary sheets and the per-leg series files. Nothing
// in the pipeline knows it is part of a batch.
// =============================================================================

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::indicators::IndicatorRow;
use crate::market_data::TIME_FORMAT;
use crate::pipeline::{AnalysisResult, LegSummary};
use crate::types::Leg;

pub const CALL_SHEET: &str = "call_summary.csv";
pub const PUT_SHEET: &str = "put_summary.csv";
pub const SERIES_DIR: &str = "series";

/// One summary sheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub ticker: String,
    pub summary: LegSummary,
}

/// A leg that produced no data, attributed to its ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct LegFailure {
    pub ticker: String,
    pub leg: Leg,
    pub contract_id: Option<String>,
    pub error: PipelineError,
}

/// Results of a whole batch, partitioned per leg.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub tickers: usize,
    pub call_rows: Vec<SheetRow>,
    pub put_rows: Vec<SheetRow>,
    pub failures: Vec<LegFailure>,
}

impl BatchReport {
    /// Fold the per-ticker results into sheet rows and failures, keeping
    /// input order.
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        results.iter().fold(Self::default(), |mut report, result| {
            report.tickers += 1;
            let summary = result.summary();

            for leg in Leg::ALL {
                match (summary.leg(leg), result.leg(leg).error()) {
                    (Some(row), _) => {
                        let row = SheetRow {
                            ticker: result.ticker.clone(),
                            summary: row.clone(),
                        };
                        match leg {
                            Leg::Call => report.call_rows.push(row),
                            Leg::Put => report.put_rows.push(row),
                        }
                    }
                    (None, err) => report.failures.push(failure(result, leg, err)),
                }
            }
            report
        })
    }

    pub fn rows(&self, leg: Leg) -> &[SheetRow] {
        match leg {
            Leg::Call => &self.call_rows,
            Leg::Put => &self.put_rows,
        }
    }

    /// Legs that produced a summary row.
    pub fn succeeded(&self) -> usize {
        self.call_rows.len() + self.put_rows.len()
    }
}

fn failure(result: &AnalysisResult, leg: Leg, err: Option<&PipelineError>) -> LegFailure {
    let leg_result = result.leg(leg);
    let error = match err {
        Some(e) => e.clone(),
        // A frame always has a latest row, so this only covers a leg with
        // data but no contract id, which the orchestrator never produces.
        None => PipelineError::Empty("no summary row".to_string()),
    };
    LegFailure {
        ticker: result.ticker.clone(),
        leg,
        contract_id: leg_result.contract_id.clone(),
        error,
    }
}

// =============================================================================
// Writers
// =============================================================================

/// Header of both summary sheets.
pub fn sheet_header() -> Vec<&'static str> {
    let mut header = vec!["Ticker", "time"];
    header.extend(IndicatorRow::COLUMNS);
    header.push("contractId");
    header
}

/// Write one summary sheet as CSV.
pub fn write_sheet<W: Write>(writer: W, rows: &[SheetRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(sheet_header())
        .context("failed to write sheet header")?;

    for row in rows {
        let indicators = &row.summary.row;
        let mut record: Vec<String> = Vec::with_capacity(IndicatorRow::COLUMNS.len() + 3);
        record.push(row.ticker.clone());
        record.push(indicators.candle.timestamp.format(TIME_FORMAT).to_string());
        record.extend(indicators.values().iter().map(|v| v.to_string()));
        record.push(row.summary.contract_id.clone());
        wtr.write_record(&record)
            .with_context(|| format!("failed to write sheet row for {}", row.ticker))?;
    }

    wtr.flush().context("failed to flush sheet")?;
    Ok(())
}

/// Write the non-empty summary sheets and every populated leg's series under
/// `output_dir`. Returns the paths written.
pub fn write_outputs(
    output_dir: &Path,
    results: &[AnalysisResult],
    report: &BatchReport,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir {}", output_dir.display()))?;

    let mut written = Vec::new();

    for (leg, name) in [(Leg::Call, CALL_SHEET), (Leg::Put, PUT_SHEET)] {
        let rows = report.rows(leg);
        if rows.is_empty() {
            continue;
        }
        let path = output_dir.join(name);
        let file = std::fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        write_sheet(file, rows)?;
        written.push(path);
    }

    let series_dir = output_dir.join(SERIES_DIR);
    for (index, result) in results.iter().enumerate() {
        for leg in Leg::ALL {
            let Some(frame) = result.leg(leg).series() else {
                continue;
            };
            std::fs::create_dir_all(&series_dir)
                .with_context(|| format!("failed to create {}", series_dir.display()))?;

            let path = series_dir.join(series_file_name(index, &result.ticker, leg));
            let content = serde_json::to_string_pretty(frame)
                .with_context(|| format!("failed to serialise {} {leg} series", result.ticker))?;
            std::fs::write(&path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            written.push(path);
        }
    }

    if written.is_empty() {
        warn!(dir = %output_dir.display(), "no leg produced data; nothing written");
    } else {
        info!(dir = %output_dir.display(), files = written.len(), "results saved");
    }
    Ok(written)
}

/// `<NNN>_<TICKER>_<LEG>.json`. The 1-based batch position keeps names
/// unique when two company names map to the same file stem.
pub fn series_file_name(index: usize, ticker: &str, leg: Leg) -> String {
    format!("{:03}_{}_{}.json", index + 1, file_stem(ticker), leg.label())
}

/// Filesystem-safe version of a company name.
fn file_stem(ticker: &str) -> String {
    ticker
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
