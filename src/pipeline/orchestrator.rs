// =============================================================================
// Analysis Orchestrator — one ticker through the whole pipeline
// =============================================================================
//
// resolve -> select -> (fetch + derive) for the call leg, then the put leg.
// Legs are independent: a missing put never stops the call from being
// analysed. Any failure on a leg leaves that leg absent in both views; the
// selected contract id is still kept on the leg for reporting.
// =============================================================================

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use super::{fetcher, resolver, selector, AnalysisWindow};
use crate::error::{PipelineError, PipelineResult};
use crate::gateway::MarketDataGateway;
use crate::indicators::{IndicatorEngine, IndicatorFrame, IndicatorRow};
use crate::types::{ContractPair, Leg, SecurityIdentity};

/// Outcome for one leg of one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct LegResult {
    pub leg: Leg,
    /// Selected contract, kept even when the leg failed later on.
    pub contract_id: Option<String>,
    pub outcome: PipelineResult<IndicatorFrame>,
}

impl LegResult {
    fn failed(leg: Leg, contract_id: Option<String>, err: PipelineError) -> Self {
        Self {
            leg,
            contract_id,
            outcome: Err(err),
        }
    }

    /// Full series view; `None` when the leg is absent.
    pub fn series(&self) -> Option<&IndicatorFrame> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.outcome.as_ref().err()
    }

    /// Latest-row projection of this leg.
    pub fn summary(&self) -> Option<LegSummary> {
        let row = self.series()?.latest()?.clone();
        let contract_id = self.contract_id.clone()?;
        Some(LegSummary { contract_id, row })
    }
}

/// Full-series view for one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub ticker: String,
    pub identity: Option<SecurityIdentity>,
    pub contracts: Option<ContractPair>,
    pub call: LegResult,
    pub put: LegResult,
}

impl AnalysisResult {
    pub fn leg(&self, leg: Leg) -> &LegResult {
        match leg {
            Leg::Call => &self.call,
            Leg::Put => &self.put,
        }
    }

    /// Project to the latest-row summary without re-running the pipeline.
    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            ticker: self.ticker.clone(),
            call: self.call.summary(),
            put: self.put.summary(),
        }
    }
}

/// Latest indicator row of one leg, tagged with its contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegSummary {
    #[serde(rename = "contractId")]
    pub contract_id: String,
    #[serde(flatten)]
    pub row: IndicatorRow,
}

/// Summary view for one ticker, for tabular aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub ticker: String,
    pub call: Option<LegSummary>,
    pub put: Option<LegSummary>,
}

impl AnalysisSummary {
    pub fn leg(&self, leg: Leg) -> Option<&LegSummary> {
        match leg {
            Leg::Call => self.call.as_ref(),
            Leg::Put => self.put.as_ref(),
        }
    }
}

/// Runs the pipeline against an injected gateway. Holds no per-ticker state,
/// so repeated calls with the same inputs are independent of each other.
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    gateway: Arc<dyn MarketDataGateway>,
    engine: IndicatorEngine,
}

impl AnalysisOrchestrator {
    pub fn new(gateway: Arc<dyn MarketDataGateway>) -> Self {
        Self {
            gateway,
            engine: IndicatorEngine::new(),
        }
    }

    /// Full-series view for `name`.
    #[instrument(skip(self, window), name = "orchestrator::analyze")]
    pub async fn analyze(&self, name: &str, window: &AnalysisWindow) -> AnalysisResult {
        let gateway = self.gateway.as_ref();

        let identity = match resolver::resolve(gateway, name).await {
            Ok(identity) => identity,
            Err(err) => return Self::all_failed(name, None, None, err),
        };

        let contracts = match selector::select(gateway, &identity).await {
            Ok(pair) => pair,
            Err(err) => return Self::all_failed(name, Some(identity), None, err),
        };

        let call = self.run_leg(name, Leg::Call, &contracts, window).await;
        let put = self.run_leg(name, Leg::Put, &contracts, window).await;

        AnalysisResult {
            ticker: name.to_string(),
            identity: Some(identity),
            contracts: Some(contracts),
            call,
            put,
        }
    }

    /// Latest-row summary view for `name`. Runs the pipeline again; use
    /// [`AnalysisResult::summary`] to project an existing run instead.
    pub async fn summarize(&self, name: &str, window: &AnalysisWindow) -> AnalysisSummary {
        self.analyze(name, window).await.summary()
    }

    async fn run_leg(
        &self,
        ticker: &str,
        leg: Leg,
        contracts: &ContractPair,
        window: &AnalysisWindow,
    ) -> LegResult {
        let Some(contract_id) = contracts.contract_id(leg).map(str::to_string) else {
            let err = PipelineError::NotFound(format!(
                "no {leg} contract at strike {}",
                contracts.strike()
            ));
            warn!(ticker, leg = %leg, error = %err, "leg unavailable");
            return LegResult::failed(leg, None, err);
        };

        let outcome = match fetcher::fetch(self.gateway.as_ref(), Some(&contract_id), window).await {
            Ok(series) => self.engine.derive(&series),
            Err(err) => Err(err),
        };

        match &outcome {
            Ok(frame) => info!(
                ticker,
                leg = %leg,
                contract_id = %contract_id,
                rows = frame.len(),
                "leg analysed"
            ),
            Err(err) => warn!(
                ticker,
                leg = %leg,
                contract_id = %contract_id,
                kind = err.kind(),
                error = %err,
                "leg unavailable"
            ),
        }

        LegResult {
            leg,
            contract_id: Some(contract_id),
            outcome,
        }
    }

    fn all_failed(
        name: &str,
        identity: Option<SecurityIdentity>,
        contracts: Option<ContractPair>,
        err: PipelineError,
    ) -> AnalysisResult {
        warn!(ticker = name, kind = err.kind(), error = %err, "ticker unavailable");
        AnalysisResult {
            ticker: name.to_string(),
            identity,
            contracts,
            call: LegResult::failed(Leg::Call, None, err.clone()),
            put: LegResult::failed(Leg::Put, None, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fixture::{
        chain_entry, trading_day_window, wavy_candles, window_for_bars, FixtureGateway,
    };
    use crate::indicators::engine::WARMUP_ROWS;

    /// Wide enough for every bar any test below loads.
    fn window() -> AnalysisWindow {
        window_for_bars(80)
    }

    fn acme_chain() -> Vec<crate::gateway::ChainEntry> {
        [9_000.0, 10_000.0, 11_000.0]
            .into_iter()
            .map(|s| chain_entry("ACME", s))
            .collect()
    }

    fn orchestrator(gw: &Arc<FixtureGateway>) -> AnalysisOrchestrator {
        AnalysisOrchestrator::new(gw.clone())
    }

    #[tokio::test]
    async fn atm_pair_with_sixty_bars_populates_both_legs() {
        let gw = Arc::new(
            FixtureGateway::new("acme-ltd", "ACME", acme_chain(), 101.0)
                .with_candles("ACME100CE", wavy_candles(60, 12.0))
                .with_candles("ACME100PE", wavy_candles(60, 9.0)),
        );
        let result = orchestrator(&gw).analyze("ACME", &window()).await;

        let pair = result.contracts.as_ref().unwrap();
        assert_eq!(pair.reference_strike, 10_000.0);

        let call = result.call.series().expect("call leg populated");
        let put = result.put.series().expect("put leg populated");
        assert_eq!(call.len(), 60 - WARMUP_ROWS);
        assert_eq!(put.len(), 60 - WARMUP_ROWS);

        let summary = result.summary();
        let call_summary = summary.call.as_ref().unwrap();
        assert_eq!(call_summary.contract_id, "ACME100CE");
        assert_eq!(call_summary.row, *call.latest().unwrap());
        assert_eq!(summary.put.as_ref().unwrap().contract_id, "ACME100PE");
        assert_eq!(gw.calls().candles, 2);
    }

    #[tokio::test]
    async fn single_session_at_15_minutes_is_too_short() {
        // 09:15 to 15:30 holds 25 bars, fewer than the 38 the slowest
        // indicator needs for one complete row.
        let gw = Arc::new(
            FixtureGateway::new("acme-ltd", "ACME", acme_chain(), 101.0)
                .with_candles("ACME100CE", wavy_candles(60, 12.0))
                .with_candles("ACME100PE", wavy_candles(60, 9.0)),
        );
        let result = orchestrator(&gw).analyze("ACME", &trading_day_window()).await;

        let short = PipelineError::Insufficient { have: 25, need: 38 };
        assert_eq!(result.call.error(), Some(&short));
        assert_eq!(result.put.error(), Some(&short));
        assert_eq!(result.call.contract_id.as_deref(), Some("ACME100CE"));
        assert!(result.summary().call.is_none());
    }

    #[tokio::test]
    async fn unknown_company_issues_no_candle_calls() {
        let gw = Arc::new(FixtureGateway::default());
        let orch = orchestrator(&gw);
        let result = orch.analyze("Nobody Inc", &window()).await;

        assert!(matches!(result.call.error(), Some(PipelineError::NotFound(_))));
        assert!(matches!(result.put.error(), Some(PipelineError::NotFound(_))));
        assert!(result.identity.is_none());

        let summary = orch.summarize("Nobody Inc", &window()).await;
        assert!(summary.call.is_none());
        assert!(summary.put.is_none());

        assert_eq!(gw.calls().chain, 0);
        assert_eq!(gw.calls().candles, 0);
    }

    #[tokio::test]
    async fn short_history_is_absent_but_keeps_contract() {
        let gw = Arc::new(
            FixtureGateway::new("acme-ltd", "ACME", acme_chain(), 101.0)
                .with_candles("ACME100CE", wavy_candles(15, 12.0))
                .with_candles("ACME100PE", wavy_candles(60, 9.0)),
        );
        let result = orchestrator(&gw).analyze("ACME", &window()).await;

        assert_eq!(
            result.call.error(),
            Some(&PipelineError::Insufficient { have: 15, need: 20 })
        );
        assert!(result.call.series().is_none());
        assert_eq!(result.call.contract_id.as_deref(), Some("ACME100CE"));
        assert!(result.call.summary().is_none());

        assert!(result.put.series().is_some());
        assert!(result.summary().put.is_some());
    }

    #[tokio::test]
    async fn missing_put_does_not_abort_call() {
        let mut chain = acme_chain();
        chain[1].put_contract_id = None;
        let gw = Arc::new(
            FixtureGateway::new("acme-ltd", "ACME", chain, 101.0)
                .with_candles("ACME100CE", wavy_candles(50, 12.0)),
        );
        let result = orchestrator(&gw).analyze("ACME", &window()).await;

        assert!(result.call.series().is_some());
        assert!(matches!(result.put.error(), Some(PipelineError::NotFound(_))));
        assert!(result.put.contract_id.is_none());
        // Only the call leg reached the candle endpoint.
        assert_eq!(gw.calls().candles, 1);
    }

    #[tokio::test]
    async fn transport_failure_on_one_leg_is_isolated() {
        let gw = Arc::new(
            FixtureGateway::new("acme-ltd", "ACME", acme_chain(), 101.0)
                .with_candles("ACME100PE", wavy_candles(50, 9.0))
                .with_failing_contract("ACME100CE"),
        );
        let result = orchestrator(&gw).analyze("ACME", &window()).await;

        assert!(matches!(result.call.error(), Some(PipelineError::Transport(_))));
        assert!(result.put.series().is_some());
    }

    #[tokio::test]
    async fn analyze_is_idempotent() {
        let gw = Arc::new(
            FixtureGateway::new("acme-ltd", "ACME", acme_chain(), 101.0)
                .with_candles("ACME100CE", wavy_candles(70, 12.0))
                .with_candles("ACME100PE", wavy_candles(45, 9.0)),
        );
        let orch = orchestrator(&gw);
        let first = orch.analyze("ACME", &window()).await;
        let second = orch.analyze("ACME", &window()).await;
        assert_eq!(first, second);

        let summary = orch.summarize("ACME", &window()).await;
        assert_eq!(summary, first.summary());
    }
}
