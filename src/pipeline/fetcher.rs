// =============================================================================
// Price Series Fetcher — candle history for one option contract
// =============================================================================
//
// Bars are ordered and de-duplicated on their epoch before they are moved to
// the local wall clock, so two distinct bars inside a DST fold stay distinct.
// =============================================================================

use tracing::{debug, warn};

use super::AnalysisWindow;
use crate::error::{PipelineError, PipelineResult};
use crate::gateway::{MarketDataGateway, RawCandle};
use crate::market_data::{local_wall_clock, Candle, CandleSeries};

/// Fetch the candle series for `contract_id` over `window`.
///
/// An absent contract id short-circuits to `Empty` without touching the
/// gateway. Zero candles in the window is also `Empty`. Epoch timestamps are
/// converted to the local wall clock here.
pub async fn fetch(
    gateway: &dyn MarketDataGateway,
    contract_id: Option<&str>,
    window: &AnalysisWindow,
) -> PipelineResult<CandleSeries> {
    let Some(contract_id) = contract_id else {
        return Err(PipelineError::Empty("no contract id".into()));
    };

    let request = window
        .to_candle_window()
        .map_err(PipelineError::transport)?;

    let raw = gateway
        .candle_history(contract_id, request)
        .await
        .map_err(PipelineError::transport)?;

    if raw.is_empty() {
        debug!(contract_id, "no candles in window");
        return Err(PipelineError::Empty(format!(
            "no candles for {contract_id} between {} and {}",
            window.start, window.end
        )));
    }

    let raw = order_by_epoch(raw);
    let mut candles = Vec::with_capacity(raw.len());
    for bar in raw {
        let Some(timestamp) = local_wall_clock(bar.epoch_secs) else {
            warn!(contract_id, epoch = bar.epoch_secs, "skipping candle with unrepresentable timestamp");
            continue;
        };
        candles.push(Candle::new(timestamp, bar.open, bar.high, bar.low, bar.close, bar.volume));
    }

    let series = CandleSeries::new(candles);
    if series.is_empty() {
        return Err(PipelineError::Empty(format!("no usable candles for {contract_id}")));
    }

    debug!(contract_id, count = series.len(), "candle series fetched");
    Ok(series)
}

/// Sort bars by epoch; when two bars share an epoch the one that came later
/// in the upstream payload wins.
fn order_by_epoch(mut raw: Vec<RawCandle>) -> Vec<RawCandle> {
    // Stable sort keeps payload order among equal epochs.
    raw.sort_by_key(|bar| bar.epoch_secs);

    let mut ordered: Vec<RawCandle> = Vec::with_capacity(raw.len());
    for bar in raw {
        match ordered.last_mut() {
            Some(last) if last.epoch_secs == bar.epoch_secs => *last = bar,
            _ => ordered.push(bar),
        }
    }
    ordered
}
