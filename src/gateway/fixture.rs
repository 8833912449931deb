// =============================================================================
// Fixture Gateway — canned in-memory upstream for pipeline tests
// =============================================================================
//
// Counts every call so tests can assert which upstream operations were (not)
// issued. Candle requests honour the window the way the chart endpoint does:
// a bar is returned when its open time lies in [start, end).
// =============================================================================

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CandleWindow, ChainEntry, MarketDataGateway, RawCandle, SearchMatch};
use crate::market_data::local_wall_clock;
use crate::pipeline::AnalysisWindow;

/// Open time of the first `wavy_candles` bar: 2024-03-01T03:45:00Z, which is
/// 09:15 at the exchange.
pub const FIRST_BAR_EPOCH: i64 = 1_709_264_700;
pub const BAR_SECS: i64 = 900;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub search: usize,
    pub chain: usize,
    pub price: usize,
    pub candles: usize,
}

#[derive(Default)]
pub struct FixtureGateway {
    pub search_results: Vec<SearchMatch>,
    pub chain: Vec<ChainEntry>,
    pub price: f64,
    /// Candles keyed by contract id; unknown ids return no candles.
    pub candles: HashMap<String, Vec<RawCandle>>,
    /// Contract ids whose candle request fails at the transport level.
    pub failing_contracts: Vec<String>,
    pub fail_search: bool,
    calls: Mutex<CallCounts>,
}

impl FixtureGateway {
    /// One search hit, a chain and a price; no candles yet.
    pub fn new(search_id: &str, scrip_code: &str, chain: Vec<ChainEntry>, price: f64) -> Self {
        Self {
            search_results: vec![SearchMatch {
                search_id: Some(search_id.to_string()),
                nse_scrip_code: Some(scrip_code.to_string()),
                title: Some(search_id.to_uppercase()),
            }],
            chain,
            price,
            ..Default::default()
        }
    }

    pub fn with_candles(mut self, contract_id: &str, candles: Vec<RawCandle>) -> Self {
        self.candles.insert(contract_id.to_string(), candles);
        self
    }

    pub fn with_search_failure(mut self) -> Self {
        self.fail_search = true;
        self
    }

    pub fn with_failing_contract(mut self, contract_id: &str) -> Self {
        self.failing_contracts.push(contract_id.to_string());
        self
    }

    pub fn calls(&self) -> CallCounts {
        *self.calls.lock()
    }
}

#[async_trait]
impl MarketDataGateway for FixtureGateway {
    async fn search_security(&self, _query: &str) -> Result<Vec<SearchMatch>> {
        self.calls.lock().search += 1;
        if self.fail_search {
            anyhow::bail!("search endpoint unavailable");
        }
        Ok(self.search_results.clone())
    }

    async fn list_option_chain(&self, _search_id: &str) -> Result<Vec<ChainEntry>> {
        self.calls.lock().chain += 1;
        Ok(self.chain.clone())
    }

    async fn latest_price(&self, _exchange_scrip_code: &str) -> Result<f64> {
        self.calls.lock().price += 1;
        Ok(self.price)
    }

    async fn candle_history(
        &self,
        contract_id: &str,
        window: CandleWindow,
    ) -> Result<Vec<RawCandle>> {
        self.calls.lock().candles += 1;
        if self.failing_contracts.iter().any(|c| c == contract_id) {
            anyhow::bail!("chart endpoint returned 503 for {contract_id}");
        }
        let in_window = |bar: &&RawCandle| {
            let open_ms = bar.epoch_secs * 1000;
            open_ms >= window.start_ms && open_ms < window.end_ms
        };
        Ok(self
            .candles
            .get(contract_id)
            .map(|bars| bars.iter().filter(in_window).copied().collect())
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Chain row with both legs named `{prefix}{strike/100}CE` / `PE`.
pub fn chain_entry(prefix: &str, strike_price: f64) -> ChainEntry {
    let strike = (strike_price / 100.0) as i64;
    ChainEntry {
        strike_price,
        call_contract_id: Some(format!("{prefix}{strike}CE")),
        put_contract_id: Some(format!("{prefix}{strike}PE")),
    }
}

/// `count` 15-minute bars starting at [`FIRST_BAR_EPOCH`] with a wavy close
/// around `base`, so every indicator has movement to work with.
pub fn wavy_candles(count: usize, base: f64) -> Vec<RawCandle> {
    (0..count)
        .map(|i| {
            let x = i as f64;
            let close = base + (x * 0.4).sin() * 3.0 + x * 0.05;
            RawCandle {
                epoch_secs: FIRST_BAR_EPOCH + i as i64 * BAR_SECS,
                open: close - 0.3,
                high: close + 1.0 + (x * 0.7).cos().abs(),
                low: close - 1.0 - (x * 0.3).sin().abs(),
                close,
                volume: 1_000.0 + x * 10.0,
            }
        })
        .collect()
}

/// 15-minute window covering exactly the first `bars` fixture bars, in the
/// local wall clock of the machine running the tests.
pub fn window_for_bars(bars: usize) -> AnalysisWindow {
    let start = local_wall_clock(FIRST_BAR_EPOCH).unwrap();
    let end = local_wall_clock(FIRST_BAR_EPOCH + bars as i64 * BAR_SECS).unwrap();
    AnalysisWindow::new(start, end, 15).unwrap()
}

/// One exchange session, 09:15 to 15:30, starting at the first fixture bar.
pub fn trading_day_window() -> AnalysisWindow {
    let start = local_wall_clock(FIRST_BAR_EPOCH).unwrap();
    let end = start + chrono::Duration::minutes(6 * 60 + 15);
    AnalysisWindow::new(start, end, 15).unwrap()
}
