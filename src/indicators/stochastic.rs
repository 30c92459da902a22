// =============================================================================
// Stochastic Oscillator (%K / %D)
// =============================================================================
//
// %K locates the close inside the high/low range of the trailing window:
//
//   lowMin  = min(low[i - k + 1 ..= i])
//   highMax = max(high[i - k + 1 ..= i])
//   %K[i]   = (close[i] - lowMin) / (highMax - lowMin) * 100
//
// %D is the simple moving average of the last `d` %K values.
//
// Thresholds:  %K >= 80 => OVERBOUGHT,  %K <= 20 => OVERSOLD.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::{mean_of_defined, IndicatorError, IndicatorSeries};
use crate::market_data::Candle;

pub const DEFAULT_WINDOW_K: usize = 14;
pub const DEFAULT_SMOOTHING_D: usize = 3;

/// Window lengths for the oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StochasticParams {
    /// Look-back for the high/low range behind %K.
    pub window_k: usize,
    /// Number of %K values averaged into %D.
    pub smoothing_d: usize,
}

impl Default for StochasticParams {
    fn default() -> Self {
        Self {
            window_k: DEFAULT_WINDOW_K,
            smoothing_d: DEFAULT_SMOOTHING_D,
        }
    }
}

impl StochasticParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.window_k == 0 {
            return Err(IndicatorError::InvalidParameter {
                name: "window_k",
                value: 0,
            });
        }
        if self.smoothing_d == 0 {
            return Err(IndicatorError::InvalidParameter {
                name: "smoothing_d",
                value: 0,
            });
        }
        Ok(())
    }

    /// Index of the first defined %K.
    pub fn k_lookback(&self) -> usize {
        self.window_k.saturating_sub(1)
    }

    /// Index of the first defined %D.
    pub fn d_lookback(&self) -> usize {
        (self.window_k + self.smoothing_d).saturating_sub(2)
    }
}

/// %K and %D lines, both the length of the input series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stochastic {
    pub k: IndicatorSeries,
    pub d: IndicatorSeries,
}

impl Stochastic {
    /// Most recent defined %K value.
    pub fn latest_k(&self) -> Option<f64> {
        self.k.iter().rev().flatten().next().copied()
    }

    /// Most recent defined %D value.
    pub fn latest_d(&self) -> Option<f64> {
        self.d.iter().rev().flatten().next().copied()
    }
}

/// Compute the stochastic oscillator for `candles`.
///
/// # Edge cases
/// - `window_k == 0` or `smoothing_d == 0` => `InvalidParameter`
/// - fewer than `window_k` candles => every value is `None`
/// - flat window (`highMax == lowMin`) => `None` at that index, and every %D
///   whose window covers it is `None` as well
pub fn compute_stochastic(
    candles: &[Candle],
    window_k: usize,
    smoothing_d: usize,
) -> Result<Stochastic, IndicatorError> {
    let params = StochasticParams {
        window_k,
        smoothing_d,
    };
    params.validate()?;

    let n = candles.len();

    let mut k: IndicatorSeries = vec![None; n];
    for (start, window) in candles.windows(window_k).enumerate() {
        k[start + params.k_lookback()] = percent_k(window);
    }

    let mut d: IndicatorSeries = vec![None; n];
    for (start, window) in k.windows(smoothing_d).enumerate() {
        d[start + smoothing_d - 1] = mean_of_defined(window);
    }

    Ok(Stochastic { k, d })
}

/// Same as [`compute_stochastic`] with a parameter bundle.
pub fn compute_stochastic_with(
    candles: &[Candle],
    params: StochasticParams,
) -> Result<Stochastic, IndicatorError> {
    compute_stochastic(candles, params.window_k, params.smoothing_d)
}

/// %K for the last candle of `window`.
fn percent_k(window: &[Candle]) -> Option<f64> {
    let close = window.last()?.close;
    // f64::min/max ignore NaN.
    if window.iter().any(|c| !c.high.is_finite() || !c.low.is_finite()) {
        return None;
    }
    let (low_min, high_max) = window
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
            (lo.min(c.low), hi.max(c.high))
        });

    let range = high_max - low_min;
    // Flat or inverted range has no position to report.
    if range <= 0.0 || !range.is_finite() {
        return None;
    }

    let value = (close - low_min) / range * 100.0;
    value.is_finite().then_some(value)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn candles_from(rows: &[(f64, f64, f64)]) -> Vec<Candle> {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        rows.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| {
                Candle::new(start + Duration::hours(i as i64), close, high, low, close, 1.0)
            })
            .collect()
    }

    /// Close walks 10, 11, ... with a +/-1 band around it.
    fn ascending(n: usize) -> Vec<Candle> {
        let rows: Vec<_> = (0..n)
            .map(|i| {
                let close = 10.0 + i as f64;
                (close + 1.0, close - 1.0, close)
            })
            .collect();
        candles_from(&rows)
    }

    /// Deterministic zig-zag series with strictly positive ranges.
    fn noisy(n: usize) -> Vec<Candle> {
        let mut state: u64 = 42;
        let mut price = 100.0;
        let rows: Vec<_> = (0..n)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let step = ((state >> 33) % 1000) as f64 / 100.0 - 5.0;
                price = (price + step).max(1.0);
                let spread = 0.5 + ((state >> 20) % 300) as f64 / 100.0;
                let close_offset = ((state >> 10) % 100) as f64 / 100.0;
                let low = price - spread;
                let high = price + spread;
                (high, low, low + (high - low) * close_offset)
            })
            .collect();
        candles_from(&rows)
    }

    #[test]
    fn default_params() {
        let p = StochasticParams::default();
        assert_eq!(p.window_k, 14);
        assert_eq!(p.smoothing_d, 3);
        assert_eq!(p.k_lookback(), 13);
        assert_eq!(p.d_lookback(), 15);
    }

    #[test]
    fn fourteen_ascending_candles() {
        // lowMin = low[0] = 9, highMax = high[13] = 24, close[13] = 23.
        let candles = ascending(14);
        let stoch = compute_stochastic(&candles, 14, 3).unwrap();
        let expected = (23.0 - 9.0) / (24.0 - 9.0) * 100.0;
        let k13 = stoch.k[13].unwrap();
        assert!((k13 - expected).abs() < 1e-9, "got {k13}, expected {expected}");
        assert!(stoch.k[..13].iter().all(Option::is_none));
        // Only one %K defined, so no %D yet.
        assert!(stoch.d.iter().all(Option::is_none));
    }

    #[test]
    fn lookback_positions_are_undefined() {
        let stoch = compute_stochastic(&noisy(40), 14, 3).unwrap();
        assert_eq!(stoch.k.len(), 40);
        assert_eq!(stoch.d.len(), 40);
        assert!(stoch.k[..13].iter().all(Option::is_none));
        assert!(stoch.k[13..].iter().all(Option::is_some));
        assert!(stoch.d[..15].iter().all(Option::is_none));
        assert!(stoch.d[15..].iter().all(Option::is_some));
    }

    #[test]
    fn k_stays_within_bounds() {
        let stoch = compute_stochastic(&noisy(300), 14, 3).unwrap();
        for v in stoch.k.iter().flatten() {
            assert!((0.0..=100.0).contains(v), "%K {v} out of range");
        }
        for v in stoch.d.iter().flatten() {
            assert!((0.0..=100.0).contains(v), "%D {v} out of range");
        }
    }

    #[test]
    fn d_is_mean_of_trailing_k() {
        let stoch = compute_stochastic(&noisy(120), 5, 4).unwrap();
        for i in 0..stoch.d.len() {
            if i < 3 {
                continue;
            }
            let terms = &stoch.k[i - 3..=i];
            if terms.iter().all(Option::is_some) {
                let mean = terms.iter().flatten().sum::<f64>() / 4.0;
                let d = stoch.d[i].unwrap();
                assert!((d - mean).abs() < 1e-9, "index {i}: {d} vs {mean}");
            }
        }
    }

    #[test]
    fn short_input_is_all_undefined() {
        let stoch = compute_stochastic(&ascending(10), 14, 3).unwrap();
        assert_eq!(stoch.k.len(), 10);
        assert!(stoch.k.iter().all(Option::is_none));
        assert!(stoch.d.iter().all(Option::is_none));
        assert_eq!(stoch.latest_k(), None);
    }

    #[test]
    fn empty_input_is_empty_output() {
        let stoch = compute_stochastic(&[], 14, 3).unwrap();
        assert!(stoch.k.is_empty());
        assert!(stoch.d.is_empty());
    }

    #[test]
    fn flat_window_is_undefined() {
        let candles = candles_from(&[(5.0, 5.0, 5.0); 6]);
        let stoch = compute_stochastic(&candles, 3, 2).unwrap();
        for v in &stoch.k {
            assert!(v.is_none());
        }
        for v in &stoch.d {
            assert!(v.is_none());
        }
    }

    #[test]
    fn flat_stretch_then_breakout() {
        let mut rows = vec![(5.0, 5.0, 5.0); 3];
        rows.push((7.0, 5.0, 7.0));
        let stoch = compute_stochastic(&candles_from(&rows), 3, 2).unwrap();
        assert_eq!(stoch.k[2], None);
        assert_eq!(stoch.k[3], Some(100.0));
        // %D[3] spans the undefined %K[2].
        assert_eq!(stoch.d[3], None);
    }

    #[test]
    fn non_finite_price_only_poisons_its_windows() {
        let mut candles = ascending(6);
        candles[0].low = f64::NAN;
        let stoch = compute_stochastic(&candles, 3, 1).unwrap();
        // Windows [0..=2] include the NaN low.
        assert_eq!(stoch.k[2], None);
        assert!(stoch.k[3..].iter().all(Option::is_some));

        let mut candles = ascending(6);
        candles[4].high = f64::INFINITY;
        let stoch = compute_stochastic(&candles, 3, 1).unwrap();
        assert!(stoch.k[2..4].iter().all(Option::is_some));
        assert!(stoch.k[4..].iter().all(Option::is_none));
    }

    #[test]
    fn close_at_window_low_is_zero() {
        let candles = candles_from(&[(12.0, 10.0, 11.0), (11.0, 9.0, 10.0), (10.0, 8.0, 8.0)]);
        let stoch = compute_stochastic(&candles, 3, 1).unwrap();
        assert_eq!(stoch.k[2], Some(0.0));
        // smoothing_d == 1 makes %D identical to %K.
        assert_eq!(stoch.d, stoch.k);
    }

    #[test]
    fn zero_windows_are_rejected() {
        let candles = ascending(20);
        assert_eq!(
            compute_stochastic(&candles, 0, 3),
            Err(IndicatorError::InvalidParameter {
                name: "window_k",
                value: 0
            })
        );
        assert_eq!(
            compute_stochastic(&candles, 14, 0),
            Err(IndicatorError::InvalidParameter {
                name: "smoothing_d",
                value: 0
            })
        );
    }

    #[test]
    fn latest_values_skip_trailing_gaps() {
        let mut rows: Vec<_> = (0..5).map(|i| (10.0 + i as f64, 8.0, 9.0 + i as f64)).collect();
        rows.push((20.0, 20.0, 20.0));
        let stoch = compute_stochastic_with(
            &candles_from(&rows),
            StochasticParams {
                window_k: 1,
                smoothing_d: 1,
            },
        )
        .unwrap();
        assert_eq!(stoch.k[5], None);
        let latest = stoch.latest_k().unwrap();
        assert!((latest - stoch.k[4].unwrap()).abs() < 1e-12);
        assert_eq!(stoch.latest_d(), stoch.latest_k());
    }
}
