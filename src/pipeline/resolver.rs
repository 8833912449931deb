// =============================================================================
// Ticker Resolver — company name to upstream security identity
// =============================================================================
//
// The first ranked search hit is taken as-is. There is no re-ranking or
// disambiguation; a top hit missing either id fails the resolution even if
// a lower-ranked hit would have been complete.
// =============================================================================

use tracing::{debug, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::gateway::MarketDataGateway;
use crate::types::SecurityIdentity;

/// Resolve `name` (already trimmed by the caller) to a [`SecurityIdentity`].
pub async fn resolve(gateway: &dyn MarketDataGateway, name: &str) -> PipelineResult<SecurityIdentity> {
    let matches = gateway
        .search_security(name)
        .await
        .map_err(PipelineError::transport)?;

    let Some(top) = matches.into_iter().next() else {
        warn!(ticker = name, "no results found for company");
        return Err(PipelineError::NotFound(format!("no search results for '{name}'")));
    };

    match (top.search_id, top.nse_scrip_code) {
        (Some(search_id), Some(exchange_scrip_code)) => {
            let identity = SecurityIdentity {
                display_name: top.title.unwrap_or_else(|| name.to_string()),
                search_id,
                exchange_scrip_code,
            };
            debug!(ticker = name, search_id = %identity.search_id, "ticker resolved");
            Ok(identity)
        }
        _ => {
            warn!(ticker = name, "search id or NSE scrip code missing on top result");
            Err(PipelineError::NotFound(format!(
                "search id or NSE scrip code not found for '{name}'"
            )))
        }
    }
}
