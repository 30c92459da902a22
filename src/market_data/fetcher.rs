// =============================================================================
// Series Fetcher: the seam between the indicator pipeline and the exchange
// =============================================================================
//
// A fetcher turns (pair, interval) into a `CandleSeries`.  It must keep
// "the exchange has nothing for this pair/interval" apart from "the request
// failed": the first is rendered as a notice, the second as an error.
// =============================================================================

use async_trait::async_trait;
use thiserror::Error;

use super::candle::{CandleSeries, SeriesError};

/// Why a fetch produced no usable series.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The exchange answered but had no candles for this pair/interval.
    #[error("no candles available for {pair} at {interval}m")]
    DataUnavailable { pair: String, interval: u32 },

    /// The interval is not one the exchange serves.  Raised before any I/O.
    #[error("unsupported candle interval: {0} minutes")]
    UnsupportedInterval(u32),

    /// Connection, timeout or body-read failure.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The exchange reported errors in its response envelope.
    #[error("exchange reported errors: {}", .0.join(", "))]
    Exchange(Vec<String>),

    /// The payload did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Candle timestamps in the payload were not strictly increasing.
    #[error("candles out of order: {0}")]
    Ordering(#[from] SeriesError),
}

impl FetchError {
    /// `true` for the "valid request, nothing to show" case.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Self::DataUnavailable { .. })
    }

    /// `true` when the caller supplied something the fetcher cannot serve.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::UnsupportedInterval(_))
    }
}

/// Source of candle series.
#[async_trait]
pub trait SeriesFetcher: Send + Sync {
    /// Fetch the candles for `pair` at `interval` minutes, oldest first.
    async fn fetch(&self, pair: &str, interval: u32) -> Result<CandleSeries, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_helpers() {
        let unavailable = FetchError::DataUnavailable {
            pair: "XXBTZUSD".into(),
            interval: 60,
        };
        assert!(unavailable.is_data_unavailable());
        assert!(!unavailable.is_caller_error());
        assert_eq!(unavailable.to_string(), "no candles available for XXBTZUSD at 60m");

        let exchange = FetchError::Exchange(vec!["EGeneral:Too many requests".into()]);
        assert!(!exchange.is_data_unavailable());
        assert_eq!(
            exchange.to_string(),
            "exchange reported errors: EGeneral:Too many requests"
        );

        assert!(FetchError::UnsupportedInterval(7).is_caller_error());
    }
}
