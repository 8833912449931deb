// =============================================================================
// Analyzer Configuration — batch run settings with atomic save
// =============================================================================
//
// One place for every knob of a batch run: upstream endpoint, ticker source,
// analysis window and output location. Values come from an optional JSON
// file and are then overridden by environment variables (after `.env` is
// loaded by `main`).
//
// All fields carry `#[serde(default)]` so that adding new fields never breaks
// loading an older config file.
// =============================================================================

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::gateway::groww::DEFAULT_BASE_URL;
use crate::pipeline::AnalysisWindow;

/// Format accepted for `OPTIONS_START` / `OPTIONS_END`.
pub const ENV_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Column holding company names in a ticker CSV.
pub const TICKER_COLUMN: &str = "Ticker";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_interval_minutes() -> u32 {
    15
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("analysis_output")
}

// =============================================================================
// AnalyzerConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Root of the market-data API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// CSV file with a `Ticker` column.
    #[serde(default)]
    pub tickers_csv: Option<PathBuf>,

    /// Company names analysed in addition to the CSV ones.
    #[serde(default)]
    pub tickers: Vec<String>,

    /// Window start (local time). Defaults to today's market open.
    #[serde(default)]
    pub start: Option<NaiveDateTime>,

    /// Window end (local time). Defaults to today's market close.
    #[serde(default)]
    pub end: Option<NaiveDateTime>,

    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,

    /// Where the summary sheets and series files are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            tickers_csv: None,
            tickers: Vec::new(),
            start: None,
            end: None,
            interval_minutes: default_interval_minutes(),
            output_dir: default_output_dir(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read analyzer config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse analyzer config from {}", path.display()))?;

        info!(
            path = %path.display(),
            tickers = config.tickers.len(),
            interval_minutes = config.interval_minutes,
            "analyzer config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise analyzer config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "analyzer config saved (atomic)");
        Ok(())
    }

    /// Apply overrides from `lookup` (normally `std::env::var`).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("GROWW_BASE_URL") {
            self.base_url = url;
        }
        if let Some(secs) = lookup("OPTIONS_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("OPTIONS_REQUEST_TIMEOUT_SECS: invalid value '{secs}'"))?;
        }
        if let Some(path) = lookup("OPTIONS_TICKERS_CSV") {
            self.tickers_csv = Some(PathBuf::from(path));
        }
        if let Some(list) = lookup("OPTIONS_TICKERS") {
            self.tickers = list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(raw) = lookup("OPTIONS_START") {
            self.start = Some(parse_env_time("OPTIONS_START", &raw)?);
        }
        if let Some(raw) = lookup("OPTIONS_END") {
            self.end = Some(parse_env_time("OPTIONS_END", &raw)?);
        }
        if let Some(minutes) = lookup("OPTIONS_INTERVAL_MINUTES") {
            self.interval_minutes = minutes
                .trim()
                .parse()
                .with_context(|| format!("OPTIONS_INTERVAL_MINUTES: invalid value '{minutes}'"))?;
        }
        if let Some(dir) = lookup("OPTIONS_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Validated analysis window; missing ends default to today's session
    /// (09:15 to 15:30 local).
    pub fn window(&self) -> Result<AnalysisWindow> {
        let today = Local::now().date_naive();
        let start = match self.start {
            Some(ts) => ts,
            None => today.and_hms_opt(9, 15, 0).context("invalid market open time")?,
        };
        let end = match self.end {
            Some(ts) => ts,
            None => today.and_hms_opt(15, 30, 0).context("invalid market close time")?,
        };
        AnalysisWindow::new(start, end, self.interval_minutes).context("invalid analysis window")
    }

    /// Every ticker to analyse: CSV names first, then configured ones.
    /// Names are trimmed; blanks and exact duplicates are dropped.
    pub fn load_tickers(&self) -> Result<Vec<String>> {
        let mut tickers = match &self.tickers_csv {
            Some(path) => {
                let file = std::fs::File::open(path)
                    .with_context(|| format!("failed to open ticker CSV {}", path.display()))?;
                read_tickers_csv(file)
                    .with_context(|| format!("failed to read ticker CSV {}", path.display()))?
            }
            None => Vec::new(),
        };

        for name in &self.tickers {
            let name = name.trim();
            if !name.is_empty() && !tickers.iter().any(|t| t == name) {
                tickers.push(name.to_string());
            }
        }

        if tickers.is_empty() {
            anyhow::bail!("no tickers configured (set OPTIONS_TICKERS or OPTIONS_TICKERS_CSV)");
        }
        Ok(tickers)
    }
}

/// Read the `Ticker` column of a CSV document.
pub fn read_tickers_csv(reader: impl Read) -> Result<Vec<String>> {
    let mut rdr = csv::Reader::from_reader(reader);

    let column = rdr
        .headers()
        .context("ticker CSV has no header row")?
        .iter()
        .position(|h| h.trim() == TICKER_COLUMN)
        .with_context(|| format!("ticker CSV has no '{TICKER_COLUMN}' column"))?;

    let mut tickers: Vec<String> = Vec::new();
    for record in rdr.records() {
        let record = record.context("malformed ticker CSV row")?;
        if let Some(name) = record.get(column).map(str::trim) {
            if !name.is_empty() && !tickers.iter().any(|t| t == name) {
                tickers.push(name.to_string());
            }
        }
    }
    Ok(tickers)
}

fn parse_env_time(var: &str, raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), ENV_TIME_FORMAT)
        .with_context(|| format!("{var}: expected '{ENV_TIME_FORMAT}', got '{raw}'"))
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn default_config_has_expected_values() {
        let cfg = AnalyzerConfig::default();
        assert_eq!(cfg.base_url, "https://groww.in/v1/api");
        assert_eq!(cfg.interval_minutes, 15);
        assert_eq!(cfg.request_timeout_secs, 10);
        assert!(cfg.tickers.is_empty());
        assert_eq!(cfg.output_dir, PathBuf::from("analysis_output"));
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: AnalyzerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, AnalyzerConfig::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "tickers": ["Reliance"], "interval_minutes": 5, "start": "2024-03-01T09:15:00" }"#;
        let cfg: AnalyzerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.tickers, vec!["Reliance"]);
        assert_eq!(cfg.interval_minutes, 5);
        assert_eq!(cfg.start.unwrap().format(ENV_TIME_FORMAT).to_string(), "2024-03-01 09:15");
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = AnalyzerConfig::default();
        cfg.apply_env(env(&[
            ("OPTIONS_TICKERS", " Infosys , ,TCS"),
            ("OPTIONS_START", "2024-03-01 09:15"),
            ("OPTIONS_END", "2024-03-01 15:30"),
            ("OPTIONS_INTERVAL_MINUTES", "5"),
        ]))
        .unwrap();

        assert_eq!(cfg.tickers, vec!["Infosys", "TCS"]);
        assert_eq!(cfg.interval_minutes, 5);
        let window = cfg.window().unwrap();
        assert_eq!(window.interval_minutes, 5);
        assert!(window.end > window.start);
    }

    #[test]
    fn bad_env_values_are_errors() {
        let mut cfg = AnalyzerConfig::default();
        assert!(cfg.apply_env(env(&[("OPTIONS_START", "yesterday")])).is_err());
        assert!(cfg.apply_env(env(&[("OPTIONS_INTERVAL_MINUTES", "-1")])).is_err());
    }

    #[test]
    fn zero_interval_rejected_by_window() {
        let cfg = AnalyzerConfig {
            interval_minutes: 0,
            ..Default::default()
        };
        assert!(cfg.window().is_err());
    }

    #[test]
    fn ticker_csv_is_trimmed_and_deduplicated() {
        let csv = "Ticker,Sector\n Reliance ,Energy\nTCS,IT\n,Unknown\nReliance,Energy\n";
        let tickers = read_tickers_csv(csv.as_bytes()).unwrap();
        assert_eq!(tickers, vec!["Reliance", "TCS"]);
    }

    #[test]
    fn ticker_csv_requires_column() {
        let csv = "Name\nReliance\n";
        assert!(read_tickers_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn no_tickers_is_an_error() {
        assert!(AnalyzerConfig::default().load_tickers().is_err());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = std::env::temp_dir().join(format!("options-analyzer-cfg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("analyzer_config.json");

        let cfg = AnalyzerConfig {
            tickers: vec!["Infosys".into()],
            interval_minutes: 30,
            ..Default::default()
        };
        cfg.save(&path).unwrap();
        assert_eq!(AnalyzerConfig::load(&path).unwrap(), cfg);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
