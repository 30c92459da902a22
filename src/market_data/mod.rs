pub mod candle;
pub mod fetcher;

// Re-export the core types for convenient access (e.g. `use crate::market_data::Candle`).
pub use candle::{Candle, CandleSeries, SeriesError};
pub use fetcher::{FetchError, SeriesFetcher};
