// =============================================================================
// Shared types used across the dashboard backend
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::bands::{OVERBOUGHT_LEVEL, OVERSOLD_LEVEL};

/// A selectable asset: display name plus the exchange pair symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub pair: String,
}

impl Asset {
    pub fn new(name: impl Into<String>, pair: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pair: pair.into(),
        }
    }
}

/// Where the latest %K sits relative to the threshold bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StochasticZone {
    Overbought,
    Neutral,
    Oversold,
}

impl StochasticZone {
    pub fn classify(k: f64) -> Self {
        if k >= OVERBOUGHT_LEVEL {
            Self::Overbought
        } else if k <= OVERSOLD_LEVEL {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }
}

impl std::fmt::Display for StochasticZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overbought => write!(f, "OVERBOUGHT"),
            Self::Neutral => write!(f, "NEUTRAL"),
            Self::Oversold => write!(f, "OVERSOLD"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_boundaries_are_inclusive() {
        assert_eq!(StochasticZone::classify(80.0), StochasticZone::Overbought);
        assert_eq!(StochasticZone::classify(99.9), StochasticZone::Overbought);
        assert_eq!(StochasticZone::classify(20.0), StochasticZone::Oversold);
        assert_eq!(StochasticZone::classify(0.0), StochasticZone::Oversold);
        assert_eq!(StochasticZone::classify(50.0), StochasticZone::Neutral);
    }

    #[test]
    fn zone_display() {
        assert_eq!(StochasticZone::Overbought.to_string(), "OVERBOUGHT");
        assert_eq!(StochasticZone::Neutral.to_string(), "NEUTRAL");
        assert_eq!(StochasticZone::Oversold.to_string(), "OVERSOLD");
    }
}
