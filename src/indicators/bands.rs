// =============================================================================
// Threshold Bands: constant reference lines for the oscillator panel
// =============================================================================

use serde::Serialize;

pub const OVERBOUGHT_LEVEL: f64 = 80.0;
pub const OVERSOLD_LEVEL: f64 = 20.0;
pub const EXPECTED_UPPER_LEVEL: f64 = 80.0;
pub const EXPECTED_LOWER_LEVEL: f64 = 20.0;

pub fn overbought(len: usize) -> Vec<f64> {
    vec![OVERBOUGHT_LEVEL; len]
}

pub fn oversold(len: usize) -> Vec<f64> {
    vec![OVERSOLD_LEVEL; len]
}

pub fn expected_upper(len: usize) -> Vec<f64> {
    vec![EXPECTED_UPPER_LEVEL; len]
}

pub fn expected_lower(len: usize) -> Vec<f64> {
    vec![EXPECTED_LOWER_LEVEL; len]
}

/// All four bands broadcast to one series length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdBands {
    pub overbought: Vec<f64>,
    pub oversold: Vec<f64>,
    pub expected_max: Vec<f64>,
    pub expected_min: Vec<f64>,
}

impl ThresholdBands {
    pub fn for_len(len: usize) -> Self {
        Self {
            overbought: overbought(len),
            oversold: oversold(len),
            expected_max: expected_upper(len),
            expected_min: expected_lower(len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_broadcast_constants() {
        let bands = ThresholdBands::for_len(4);
        assert_eq!(bands.overbought, vec![80.0; 4]);
        assert_eq!(bands.oversold, vec![20.0; 4]);
        assert_eq!(bands.expected_max, vec![80.0; 4]);
        assert_eq!(bands.expected_min, vec![20.0; 4]);
    }

    #[test]
    fn empty_series_gives_empty_bands() {
        let bands = ThresholdBands::for_len(0);
        assert!(bands.overbought.is_empty());
        assert!(bands.expected_min.is_empty());
    }
}
