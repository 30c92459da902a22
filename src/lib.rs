// =============================================================================
// Stochastic Dashboard: library root
// =============================================================================
//
// Fetches OHLC candles from Kraken, computes the stochastic oscillator and a
// moving average, and serves the aligned series as JSON for chart front ends.
// =============================================================================

pub mod api;
pub mod app_state;
pub mod dashboard;
pub mod indicators;
pub mod kraken;
pub mod market_data;
pub mod runtime_config;
pub mod types;
