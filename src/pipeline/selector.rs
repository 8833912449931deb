// =============================================================================
// Contract Selector — at-the-money call/put pair
// =============================================================================
//
// Upstream strikes are stored x100, so the distance of a chain entry from the
// underlying is |strike / 100 - ltp|. The entry with the smallest distance
// wins; on a tie the first entry in chain order is kept. This assumes the
// upstream returns chains in a stable order.
// =============================================================================

use tracing::{debug, info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::gateway::{ChainEntry, MarketDataGateway};
use crate::types::{ContractPair, SecurityIdentity};

/// Pick the ATM contract pair for `identity`.
///
/// Fails `NotFound` when the chain is empty or when the winning strike has
/// neither a call nor a put. A pair with only one populated leg is returned
/// as-is; the orchestrator reports the missing leg on its own.
pub async fn select(
    gateway: &dyn MarketDataGateway,
    identity: &SecurityIdentity,
) -> PipelineResult<ContractPair> {
    let chain = gateway
        .list_option_chain(&identity.search_id)
        .await
        .map_err(PipelineError::transport)?;

    if chain.is_empty() {
        warn!(search_id = %identity.search_id, "no option chain found");
        return Err(PipelineError::NotFound(format!(
            "no option chain for {}",
            identity.display_name
        )));
    }

    let ltp = gateway
        .latest_price(&identity.exchange_scrip_code)
        .await
        .map_err(PipelineError::transport)?;

    if !ltp.is_finite() {
        return Err(PipelineError::Transport(format!(
            "non-finite last traded price {ltp} for {}",
            identity.exchange_scrip_code
        )));
    }

    // Non-empty chain always yields an entry.
    let Some(closest) = closest_entry(&chain, ltp) else {
        return Err(PipelineError::NotFound(format!(
            "no option chain for {}",
            identity.display_name
        )));
    };

    debug!(
        search_id = %identity.search_id,
        ltp,
        strike = closest.strike_price / 100.0,
        chain_len = chain.len(),
        "closest strike selected"
    );

    if closest.call_contract_id.is_none() && closest.put_contract_id.is_none() {
        warn!(search_id = %identity.search_id, strike = closest.strike_price, "unable to find valid contract ids");
        return Err(PipelineError::NotFound(format!(
            "no call or put contract at strike {} for {}",
            closest.strike_price / 100.0,
            identity.display_name
        )));
    }

    let pair = ContractPair {
        call_contract_id: closest.call_contract_id.clone(),
        put_contract_id: closest.put_contract_id.clone(),
        reference_strike: closest.strike_price,
        reference_price: ltp,
    };

    info!(
        ticker = %identity.display_name,
        call = pair.call_contract_id.as_deref().unwrap_or("-"),
        put = pair.put_contract_id.as_deref().unwrap_or("-"),
        strike = pair.strike(),
        ltp,
        "contracts selected"
    );

    Ok(pair)
}

/// The chain entry whose strike (scaled x100) is nearest `price`.
///
/// Ties keep the earliest entry. A non-finite distance never beats a finite
/// one. Returns `None` only for an empty chain.
pub fn closest_entry(chain: &[ChainEntry], price: f64) -> Option<&ChainEntry> {
    let distance = |entry: &ChainEntry| {
        let d = (entry.strike_price / 100.0 - price).abs();
        if d.is_nan() {
            f64::INFINITY
        } else {
            d
        }
    };

    let mut iter = chain.iter();
    let mut best = iter.next()?;
    let mut best_distance = distance(best);

    for entry in iter {
        let d = distance(entry);
        if d < best_distance {
            best = entry;
            best_distance = d;
        }
    }

    Some(best)
}
