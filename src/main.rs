// =============================================================================
// Options Analyzer — Main Entry Point
// =============================================================================
//
// Batch driver: every configured company name runs through the pipeline one
// after another, then the results are folded into the call/put summary
// sheets and per-leg series files. A ticker that fails is logged and counted;
// it never stops the batch.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod error;
mod gateway;
mod indicators;
mod market_data;
mod pipeline;
mod report;
mod runtime_config;
mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::gateway::GrowwClient;
use crate::pipeline::AnalysisOrchestrator;
use crate::report::BatchReport;
use crate::runtime_config::AnalyzerConfig;

const CONFIG_PATH: &str = "analyzer_config.json";
const RUN_CONFIG_FILE: &str = "run_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = AnalyzerConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AnalyzerConfig::default()
    });
    config.apply_env(|key| std::env::var(key).ok())?;

    let window = config.window()?;
    let tickers = config.load_tickers()?;

    info!(
        tickers = tickers.len(),
        start = %window.start,
        end = %window.end,
        interval_minutes = window.interval_minutes,
        "Options analyzer starting"
    );

    // ── 2. Upstream client ───────────────────────────────────────────────
    let client = GrowwClient::new(
        config.base_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )
    .context("failed to build market data client")?;
    info!(base_url = client.base_url(), "Market data client ready");
    let orchestrator = AnalysisOrchestrator::new(Arc::new(client));

    // ── 3. Run the batch ─────────────────────────────────────────────────
    let mut results = Vec::with_capacity(tickers.len());
    for (i, ticker) in tickers.iter().enumerate() {
        info!(ticker = %ticker, n = i + 1, of = tickers.len(), "processing");
        results.push(orchestrator.analyze(ticker, &window).await);
    }

    // ── 4. Fold & persist ────────────────────────────────────────────────
    let report = BatchReport::from_results(&results);
    for failure in &report.failures {
        let contract_id = failure.contract_id.as_deref().unwrap_or("-");
        if failure.error.is_absence() {
            warn!(
                ticker = %failure.ticker,
                leg = %failure.leg,
                contract_id,
                kind = failure.error.kind(),
                reason = %failure.error,
                "leg skipped"
            );
        } else {
            error!(
                ticker = %failure.ticker,
                leg = %failure.leg,
                contract_id,
                reason = %failure.error,
                "leg failed upstream"
            );
        }
    }

    report::write_outputs(&config.output_dir, &results, &report)?;

    if let Err(e) = config.save(config.output_dir.join(RUN_CONFIG_FILE)) {
        error!(error = %e, "Failed to save run config");
    }

    info!(
        tickers = report.tickers,
        call_rows = report.call_rows.len(),
        put_rows = report.put_rows.len(),
        legs_ok = report.succeeded(),
        failed_legs = report.failures.len(),
        "Options analyzer finished"
    );

    Ok(())
}
