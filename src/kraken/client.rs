// =============================================================================
// Kraken REST API Client: public OHLC endpoint
// =============================================================================
//
// GET /0/public/OHLC?pair=<PAIR>&interval=<MINUTES>
//
// Response envelope:
//   { "error": [ ... ],
//     "result": { "<PAIR>": [[time, open, high, low, close, vwap, volume, count], ...],
//                 "last": <cursor> } }
//
// Prices arrive as JSON strings, `time` as integer seconds.  The last row is
// the still-forming candle and is kept as-is.
//
// An `EQuery:` error (unknown pair, bad arguments) or an empty result means
// "no data"; any other envelope error is a service failure.
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::market_data::{Candle, CandleSeries, FetchError, SeriesFetcher};

/// Production API root.
pub const KRAKEN_BASE_URL: &str = "https://api.kraken.com";

/// Candle intervals (minutes) served by the OHLC endpoint.
pub const SUPPORTED_INTERVALS: &[u32] = &[1, 5, 15, 30, 60, 240, 1440, 10080, 21600];

/// Per-request timeout when the config does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Columns in one OHLC row.
const ROW_LEN: usize = 8;

/// Longest error body kept in [`FetchError::Status`].
const MAX_ERROR_BODY: usize = 512;

pub fn is_supported_interval(interval: u32) -> bool {
    SUPPORTED_INTERVALS.contains(&interval)
}

/// Client for Kraken's public market-data endpoints.
#[derive(Debug, Clone)]
pub struct KrakenClient {
    base_url: String,
    client: reqwest::Client,
}

impl KrakenClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a client rooted at `base_url` (no trailing path).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stoch-dash/", env!("CARGO_PKG_VERSION")))
            .build()?;

        debug!(base_url = %base_url, timeout_ms = timeout.as_millis() as u64, "KrakenClient initialised");

        Ok(Self { base_url, client })
    }

    // -------------------------------------------------------------------------
    // Public market data
    // -------------------------------------------------------------------------

    /// GET /0/public/OHLC for `pair` at `interval` minutes.
    #[instrument(skip(self), name = "kraken::get_ohlc")]
    pub async fn get_ohlc(&self, pair: &str, interval: u32) -> Result<CandleSeries, FetchError> {
        if !is_supported_interval(interval) {
            return Err(FetchError::UnsupportedInterval(interval));
        }

        let url = format!("{}/0/public/OHLC", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("pair", pair.to_string()), ("interval", interval.to_string())])
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            warn!(pair, interval, status = status.as_u16(), "Kraken OHLC request rejected");
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate(&text, MAX_ERROR_BODY),
            });
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| FetchError::Malformed(format!("response is not JSON: {e}")))?;

        let series = parse_ohlc_body(&body, pair, interval)?;
        debug!(pair, interval, count = series.len(), "ohlc fetched");
        Ok(series)
    }
}

#[async_trait]
impl SeriesFetcher for KrakenClient {
    async fn fetch(&self, pair: &str, interval: u32) -> Result<CandleSeries, FetchError> {
        self.get_ohlc(pair, interval).await
    }
}

// -----------------------------------------------------------------------------
// Payload parsing
// -----------------------------------------------------------------------------

/// Turn a decoded OHLC envelope into a [`CandleSeries`].
pub fn parse_ohlc_body(body: &Value, pair: &str, interval: u32) -> Result<CandleSeries, FetchError> {
    let unavailable = || FetchError::DataUnavailable {
        pair: pair.to_string(),
        interval,
    };

    let errors: Vec<String> = body
        .get("error")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|e| e.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    if !errors.is_empty() {
        if errors.iter().all(|e| e.starts_with("EQuery:")) {
            warn!(pair, interval, errors = ?errors, "exchange has no data for this query");
            return Err(unavailable());
        }
        return Err(FetchError::Exchange(errors));
    }

    let Some(result) = body.get("result").and_then(Value::as_object) else {
        return Err(unavailable());
    };

    // One entry keyed by the canonical pair name, plus the `last` cursor.
    let rows = match result.iter().find(|(key, _)| key.as_str() != "last") {
        Some((key, value)) => value
            .as_array()
            .ok_or_else(|| FetchError::Malformed(format!("result entry '{key}' is not an array")))?,
        None => return Err(unavailable()),
    };

    let mut candles = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let arr = row
            .as_array()
            .ok_or_else(|| FetchError::Malformed(format!("row {i} is not an array")))?;

        if arr.len() < ROW_LEN {
            warn!(pair, row = i, len = arr.len(), "skipping malformed OHLC row");
            continue;
        }

        candles.push(parse_row(arr).map_err(|e| match e {
            FetchError::Malformed(msg) => FetchError::Malformed(format!("row {i}: {msg}")),
            other => other,
        })?);
    }

    if candles.is_empty() {
        return Err(unavailable());
    }

    Ok(CandleSeries::new(candles)?)
}

fn parse_row(arr: &[Value]) -> Result<Candle, FetchError> {
    let secs = arr[0]
        .as_i64()
        .or_else(|| arr[0].as_f64().map(|f| f as i64))
        .ok_or_else(|| FetchError::Malformed(format!("time is not a number: {}", arr[0])))?;
    let timestamp = DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| FetchError::Malformed(format!("time out of range: {secs}")))?;

    Ok(Candle {
        timestamp,
        open: parse_str_f64(&arr[1], "open")?,
        high: parse_str_f64(&arr[2], "high")?,
        low: parse_str_f64(&arr[3], "low")?,
        close: parse_str_f64(&arr[4], "close")?,
        vwap: parse_str_f64(&arr[5], "vwap")?,
        volume: parse_str_f64(&arr[6], "volume")?,
        trades: arr[7]
            .as_u64()
            .ok_or_else(|| FetchError::Malformed(format!("count is not an integer: {}", arr[7])))?,
    })
}

/// Parse a JSON value that may be either a string or a number into a finite
/// `f64`.  "NaN" and "inf" parse as floats but are not prices.
fn parse_str_f64(val: &Value, name: &str) -> Result<f64, FetchError> {
    let n = if let Some(s) = val.as_str() {
        s.parse::<f64>()
            .map_err(|_| FetchError::Malformed(format!("failed to parse {name} '{s}' as f64")))?
    } else if let Some(n) = val.as_f64() {
        n
    } else {
        return Err(FetchError::Malformed(format!("{name}: expected string or number, got {val}")));
    };

    if !n.is_finite() {
        return Err(FetchError::Malformed(format!("{name} is not finite: {val}")));
    }
    Ok(n)
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
