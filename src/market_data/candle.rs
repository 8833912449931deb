use chrono::{Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Wall-clock format used for candle timestamps in every output.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single OHLCV bar for one option contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    #[serde(rename = "time", with = "wall_clock")]
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Convert upstream epoch seconds to the local wall clock.
///
/// Returns `None` for epochs chrono cannot represent. For ambiguous local
/// times (DST fold) the earlier instant is used.
pub fn local_wall_clock(epoch_secs: i64) -> Option<NaiveDateTime> {
    Local
        .timestamp_opt(epoch_secs, 0)
        .earliest()
        .map(|dt| dt.naive_local())
}

// ---------------------------------------------------------------------------
// CandleSeries -- epoch-ordered bars for one contract
// ---------------------------------------------------------------------------

/// Candles for one contract in upstream epoch order, one bar per epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Wrap bars that are already ordered by epoch and free of duplicates.
    /// Wall-clock timestamps may repeat inside a DST fold; order is kept.
    pub fn new(candles: Vec<Candle>) -> Self {
        Self { candles }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }
}

// ---------------------------------------------------------------------------
// serde helper for the wall-clock format
// ---------------------------------------------------------------------------

mod wall_clock {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIME_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.format(TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}
