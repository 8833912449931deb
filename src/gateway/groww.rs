// =============================================================================
// Groww REST API Client — public market-data endpoints
// =============================================================================
//
// All four gateway operations are plain JSON GETs with no signing. Every
// response is checked for a 2xx status before its body is trusted; anything
// else becomes an error carrying the endpoint and the upstream body.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{CandleWindow, ChainEntry, MarketDataGateway, RawCandle, SearchMatch};

/// Public API root used when no override is configured.
pub const DEFAULT_BASE_URL: &str = "https://groww.in/v1/api";

/// Number of search hits requested; only the first is ever used.
const SEARCH_PAGE_SIZE: u32 = 10;

/// Groww REST API client.
#[derive(Clone)]
pub struct GrowwClient {
    base_url: String,
    client: reqwest::Client,
}

impl GrowwClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a new `GrowwClient` against `base_url` with a per-request
    /// `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        debug!(base_url = %base_url, "GrowwClient initialised");

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -------------------------------------------------------------------------
    // Transport
    // -------------------------------------------------------------------------

    /// GET `{base_url}{path}` with `query` and return the JSON body.
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {path} request failed"))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse {path} response"))?;

        if !status.is_success() {
            anyhow::bail!("Groww GET {} returned {}: {}", path, status, body);
        }

        Ok(body)
    }
}

#[async_trait]
impl MarketDataGateway for GrowwClient {
    /// GET /search/v3/query/global/st_query
    #[instrument(skip(self), name = "groww::search_security")]
    async fn search_security(&self, query: &str) -> Result<Vec<SearchMatch>> {
        let body = self
            .get_json(
                "/search/v3/query/global/st_query",
                &[
                    ("from", "0".to_string()),
                    ("query", query.to_string()),
                    ("size", SEARCH_PAGE_SIZE.to_string()),
                    ("web", "true".to_string()),
                ],
            )
            .await?;

        let matches = parse_search(&body);
        debug!(query, count = matches.len(), "search results retrieved");
        Ok(matches)
    }

    /// GET /option_chain_service/v1/option_chain/derivatives/{search_id}
    #[instrument(skip(self), name = "groww::list_option_chain")]
    async fn list_option_chain(&self, search_id: &str) -> Result<Vec<ChainEntry>> {
        let path = format!("/option_chain_service/v1/option_chain/derivatives/{search_id}");
        let body = self.get_json(&path, &[]).await?;

        let chain = parse_chain(&body)?;
        debug!(search_id, count = chain.len(), "option chain retrieved");
        Ok(chain)
    }

    /// GET /stocks_data/v1/tr_live_prices/exchange/NSE/segment/CASH/{code}/latest
    #[instrument(skip(self), name = "groww::latest_price")]
    async fn latest_price(&self, exchange_scrip_code: &str) -> Result<f64> {
        let path = format!(
            "/stocks_data/v1/tr_live_prices/exchange/NSE/segment/CASH/{exchange_scrip_code}/latest"
        );
        let body = self.get_json(&path, &[]).await?;

        let ltp = parse_ltp(&body)?;
        debug!(exchange_scrip_code, ltp, "latest price retrieved");
        Ok(ltp)
    }

    /// GET /stocks_fo_data/v4/charting_service/chart/exchange/NSE/segment/FNO/{contract_id}
    #[instrument(skip(self), name = "groww::candle_history")]
    async fn candle_history(
        &self,
        contract_id: &str,
        window: CandleWindow,
    ) -> Result<Vec<RawCandle>> {
        let path = format!(
            "/stocks_fo_data/v4/charting_service/chart/exchange/NSE/segment/FNO/{contract_id}"
        );
        let body = self
            .get_json(
                &path,
                &[
                    ("endTimeInMillis", window.end_ms.to_string()),
                    ("intervalInMinutes", window.interval_minutes.to_string()),
                    ("startTimeInMillis", window.start_ms.to_string()),
                ],
            )
            .await?;

        let candles = parse_candles(&body)?;
        debug!(contract_id, count = candles.len(), "candles fetched");
        Ok(candles)
    }
}

impl std::fmt::Debug for GrowwClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrowwClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// =============================================================================
// Response parsing
// =============================================================================

/// `data.content[]`: a missing list means no hits, not a malformed reply.
fn parse_search(body: &Value) -> Vec<SearchMatch> {
    body["data"]["content"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| SearchMatch {
                    search_id: as_text(&item["search_id"]),
                    nse_scrip_code: as_text(&item["nse_scrip_code"]),
                    title: as_text(&item["title"]),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// `optionChain.optionChains[]`
fn parse_chain(body: &Value) -> Result<Vec<ChainEntry>> {
    let Some(rows) = body["optionChain"]["optionChains"].as_array() else {
        return Ok(Vec::new());
    };

    let mut chain = Vec::with_capacity(rows.len());
    for row in rows {
        let strike_price = parse_number(&row["strikePrice"]).context("chain entry strikePrice")?;
        chain.push(ChainEntry {
            strike_price,
            call_contract_id: as_text(&row["callOption"]["growwContractId"]),
            put_contract_id: as_text(&row["putOption"]["growwContractId"]),
        });
    }
    Ok(chain)
}

/// `ltp`
fn parse_ltp(body: &Value) -> Result<f64> {
    parse_number(&body["ltp"]).context("live price response missing 'ltp'")
}

/// `candles[]`: each entry is `[epoch_secs, open, high, low, close, volume]`.
fn parse_candles(body: &Value) -> Result<Vec<RawCandle>> {
    let Some(raw) = body["candles"].as_array() else {
        return Ok(Vec::new());
    };

    let mut candles = Vec::with_capacity(raw.len());
    for entry in raw {
        let arr = entry.as_array().context("candle entry is not an array")?;

        if arr.len() < 6 {
            warn!("skipping malformed candle entry with {} elements", arr.len());
            continue;
        }

        let Some(epoch_secs) = arr[0].as_i64().or_else(|| arr[0].as_f64().map(|f| f as i64))
        else {
            warn!(value = %arr[0], "skipping candle entry without an epoch");
            continue;
        };

        if arr[1..5].iter().any(Value::is_null) {
            warn!(epoch = epoch_secs, "skipping candle entry with a null price");
            continue;
        }

        candles.push(RawCandle {
            epoch_secs,
            open: parse_number(&arr[1])?,
            high: parse_number(&arr[2])?,
            low: parse_number(&arr[3])?,
            close: parse_number(&arr[4])?,
            // Thinly traded contracts sometimes report a null volume.
            volume: if arr[5].is_null() { 0.0 } else { parse_number(&arr[5])? },
        });
    }
    Ok(candles)
}

/// Parse a JSON value that may be either a string or a number into `f64`.
fn parse_number(val: &Value) -> Result<f64> {
    if let Some(s) = val.as_str() {
        s.parse::<f64>()
            .with_context(|| format!("failed to parse '{s}' as f64"))
    } else if let Some(n) = val.as_f64() {
        Ok(n)
    } else {
        anyhow::bail!("expected string or number, got: {val}")
    }
}

/// Non-empty string form of an id field that may arrive as a string or number.
fn as_text(val: &Value) -> Option<String> {
    match val {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_keeps_rank_order_and_blank_ids_become_none() {
        let body = json!({
            "data": { "content": [
                { "search_id": "acme-ltd", "nse_scrip_code": "ACME", "title": "Acme Ltd" },
                { "search_id": "", "nse_scrip_code": null, "title": "Acme Ventures" }
            ]}
        });
        let hits = parse_search(&body);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].search_id.as_deref(), Some("acme-ltd"));
        assert_eq!(hits[0].nse_scrip_code.as_deref(), Some("ACME"));
        assert_eq!(hits[1].search_id, None);
        assert_eq!(hits[1].nse_scrip_code, None);
    }

    #[test]
    fn search_without_content_is_empty() {
        assert!(parse_search(&json!({ "data": {} })).is_empty());
    }

    #[test]
    fn chain_reads_both_legs() {
        let body = json!({
            "optionChain": { "optionChains": [
                { "strikePrice": 10000,
                  "callOption": { "growwContractId": "ACME24MAR100CE" },
                  "putOption": { "growwContractId": "ACME24MAR100PE" } },
                { "strikePrice": "11000", "callOption": {}, "putOption": null }
            ]}
        });
        let chain = parse_chain(&body).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].strike_price, 10_000.0);
        assert_eq!(chain[0].put_contract_id.as_deref(), Some("ACME24MAR100PE"));
        assert_eq!(chain[1].strike_price, 11_000.0);
        assert_eq!(chain[1].call_contract_id, None);
        assert_eq!(chain[1].put_contract_id, None);
    }

    #[test]
    fn chain_with_bad_strike_is_an_error() {
        let body = json!({ "optionChain": { "optionChains": [ { "strikePrice": "n/a" } ] } });
        assert!(parse_chain(&body).is_err());
    }

    #[test]
    fn ltp_required() {
        assert_eq!(parse_ltp(&json!({ "ltp": 101.5 })).unwrap(), 101.5);
        assert!(parse_ltp(&json!({ "close": 101.5 })).is_err());
    }

    #[test]
    fn candles_skip_short_rows() {
        let body = json!({ "candles": [
            [1709265600, 10.0, 12.0, 9.5, 11.0, 1500],
            [1709266500, 11.0],
            [1709267400, "11.0", "11.5", "10.5", "11.2", null]
        ]});
        let candles = parse_candles(&body).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].epoch_secs, 1_709_265_600);
        assert_eq!(candles[0].high, 12.0);
        assert_eq!(candles[1].close, 11.2);
        assert_eq!(candles[1].volume, 0.0);
    }

    #[test]
    fn candles_skip_null_prices() {
        let body = json!({ "candles": [
            [1709265600, 10.0, 12.0, 9.5, 11.0, 1500],
            [1709266500, null, 12.0, 9.5, 11.0, 200],
            [1709267400, 11.0, 11.5, 10.5, null, 300],
            [1709268300, 11.2, 11.8, 11.0, 11.6, 400]
        ]});
        let candles = parse_candles(&body).unwrap();
        let epochs: Vec<i64> = candles.iter().map(|c| c.epoch_secs).collect();
        assert_eq!(epochs, vec![1_709_265_600, 1_709_268_300]);
    }

    #[test]
    fn missing_candles_is_empty_not_error() {
        assert!(parse_candles(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = GrowwClient::new("https://example.test/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "https://example.test/api");
    }
}
