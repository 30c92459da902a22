// =============================================================================
// Simple Moving Average (SMA) of closes
// =============================================================================
//
//   MA[i] = (close[i - w + 1] + ... + close[i]) / w
//
// Undefined for the first `w - 1` positions.
// =============================================================================

use super::{IndicatorError, IndicatorSeries};
use crate::market_data::Candle;

/// Window used by the dashboard when none is requested.
pub const DEFAULT_MA_WINDOW: usize = 10;

/// Compute the moving average of closes over `window` candles.
///
/// # Edge cases
/// - `window == 0` => `InvalidParameter`
/// - `candles.len() < window` => every value is `None`
pub fn compute_moving_average(
    candles: &[Candle],
    window: usize,
) -> Result<IndicatorSeries, IndicatorError> {
    if window == 0 {
        return Err(IndicatorError::InvalidParameter {
            name: "window",
            value: 0,
        });
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let mut ma: IndicatorSeries = vec![None; closes.len()];

    for (start, slice) in closes.windows(window).enumerate() {
        let mean = slice.iter().sum::<f64>() / window as f64;
        if mean.is_finite() {
            ma[start + window - 1] = Some(mean);
        }
    }

    Ok(ma)
}
