pub mod client;

pub use client::{KrakenClient, KRAKEN_BASE_URL, SUPPORTED_INTERVALS};
