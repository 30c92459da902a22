// =============================================================================
// Candle & CandleSeries: time-ordered OHLC buckets
// =============================================================================
//
// A `CandleSeries` is built once per request from the exchange payload and is
// never mutated afterwards.  Timestamps must be strictly increasing; gaps are
// allowed because the upstream source may skip empty buckets.
//
// The OHLC ordering invariant (low <= open/close <= high) is trusted, not
// checked.
// =============================================================================

use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Candle
// ---------------------------------------------------------------------------

/// One OHLC time bucket as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Start of the interval.
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Volume-weighted average price over the bucket.
    pub vwap: f64,
    pub volume: f64,
    /// Number of trades in the bucket.
    pub trades: u64,
}

impl Candle {
    /// Build a candle without exchange-side aggregates.
    ///
    /// `vwap` is set to `close` and `trades` to zero.
    pub fn new(
        timestamp: DateTime<Utc>,
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
            vwap: close,
            volume,
            trades: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// CandleSeries
// ---------------------------------------------------------------------------

/// Rejection reasons when assembling a [`CandleSeries`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("candle timestamps must be strictly increasing (index {index}: {previous} -> {next})")]
    NotIncreasing {
        index: usize,
        previous: DateTime<Utc>,
        next: DateTime<Utc>,
    },
}

/// An immutable, strictly time-ordered run of candles.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Validate ordering and wrap `candles`.
    pub fn new(candles: Vec<Candle>) -> Result<Self, SeriesError> {
        for (i, pair) in candles.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(SeriesError::NotIncreasing {
                    index: i + 1,
                    previous: pair[0].timestamp,
                    next: pair[1].timestamp,
                });
            }
        }
        Ok(Self { candles })
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.candles.iter().map(|c| c.timestamp).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }
}

impl Deref for CandleSeries {
    type Target = [Candle];

    fn deref(&self) -> &[Candle] {
        &self.candles
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::hours(hour)
    }

    fn candle(hour: i64, close: f64) -> Candle {
        Candle::new(at(hour), close, close + 1.0, close - 1.0, close, 10.0)
    }

    #[test]
    fn empty_series_is_valid() {
        let series = CandleSeries::new(Vec::new()).unwrap();
        assert!(series.is_empty());
        assert_eq!(series, CandleSeries::default());
    }

    #[test]
    fn gaps_are_permitted() {
        let series = CandleSeries::new(vec![candle(0, 1.0), candle(1, 2.0), candle(5, 3.0)]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series[2].close, 3.0);
        assert_eq!(series.volumes(), vec![10.0; 3]);
        assert_eq!(series.timestamps()[2], at(5));
    }

    #[test]
    fn duplicate_timestamp_is_rejected() {
        let err = CandleSeries::new(vec![candle(0, 1.0), candle(1, 2.0), candle(1, 3.0)]).unwrap_err();
        assert_eq!(
            err,
            SeriesError::NotIncreasing {
                index: 2,
                previous: at(1),
                next: at(1),
            }
        );
    }

    #[test]
    fn decreasing_timestamp_is_rejected() {
        assert!(CandleSeries::new(vec![candle(3, 1.0), candle(2, 2.0)]).is_err());
    }

    #[test]
    fn new_candle_defaults_aggregates() {
        let c = candle(0, 50.0);
        assert_eq!(c.vwap, 50.0);
        assert_eq!(c.trades, 0);
    }

    #[test]
    fn serialises_as_plain_array() {
        let series = CandleSeries::new(vec![candle(0, 1.0)]).unwrap();
        let json = serde_json::to_value(&series).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["close"], 1.0);
    }
}
