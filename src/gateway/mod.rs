// =============================================================================
// Market Data Gateway — the upstream seam of the analysis pipeline
// =============================================================================
//
// The pipeline only depends on these four operations and on their failure /
// empty-result contracts. `GrowwClient` binds them to the Groww public API;
// tests substitute `fixture::FixtureGateway`.
// =============================================================================

pub mod groww;

#[cfg(test)]
pub mod fixture;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use groww::GrowwClient;

/// One ranked hit from the security search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub search_id: Option<String>,
    pub nse_scrip_code: Option<String>,
    pub title: Option<String>,
}

/// One strike row of an option chain. `strike_price` is scaled by 100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainEntry {
    pub strike_price: f64,
    pub call_contract_id: Option<String>,
    pub put_contract_id: Option<String>,
}

/// An OHLCV tuple keyed by epoch seconds, as the upstream returns it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawCandle {
    pub epoch_secs: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Candle-history request window. Times are epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandleWindow {
    pub start_ms: i64,
    pub end_ms: i64,
    pub interval_minutes: u32,
}

#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    /// Free-text security search; results are in upstream rank order.
    async fn search_security(&self, query: &str) -> Result<Vec<SearchMatch>>;

    /// All strikes listed for the security's option chain.
    async fn list_option_chain(&self, search_id: &str) -> Result<Vec<ChainEntry>>;

    /// Last traded price of the underlying on the cash segment.
    async fn latest_price(&self, exchange_scrip_code: &str) -> Result<f64>;

    /// Historical bars for one derivative contract.
    async fn candle_history(&self, contract_id: &str, window: CandleWindow)
        -> Result<Vec<RawCandle>>;
}
