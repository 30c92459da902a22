// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator computations over a candle slice.  Every
// output series is aligned 1:1 with the input: `None` marks an index where
// the rolling window has insufficient history or the value is numerically
// undefined.  Window lengths of zero are rejected before any work is done.

pub mod bands;
pub mod moving_average;
pub mod stochastic;

use thiserror::Error;

pub use bands::ThresholdBands;
pub use moving_average::compute_moving_average;
pub use stochastic::{compute_stochastic, Stochastic, StochasticParams};

/// Derived series aligned by index to a candle series.
pub type IndicatorSeries = Vec<Option<f64>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    #[error("invalid parameter `{name}`: must be a positive integer, got {value}")]
    InvalidParameter { name: &'static str, value: i64 },
}

/// Reject non-positive window lengths and hand back a `usize`.
///
/// Accepts any integer so that signed values arriving from query strings or
/// config files are checked in one place.
pub fn positive_window(name: &'static str, value: i64) -> Result<usize, IndicatorError> {
    if value <= 0 {
        return Err(IndicatorError::InvalidParameter { name, value });
    }
    usize::try_from(value).map_err(|_| IndicatorError::InvalidParameter { name, value })
}

/// Arithmetic mean of a window in which every term must be defined.
fn mean_of_defined(window: &[Option<f64>]) -> Option<f64> {
    let mut sum = 0.0;
    for v in window {
        sum += (*v)?;
    }
    Some(sum / window.len() as f64)
}
