// =============================================================================
// Central Application State
// =============================================================================
//
// Shared by every request handler via `Arc<AppState>`.  Nothing in here is
// mutated after start-up: the loaded configuration and the candle fetcher.
// Each request builds its own series and drops them when the response is
// sent.
// =============================================================================

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::market_data::SeriesFetcher;
use crate::runtime_config::DashboardConfig;

pub struct AppState {
    pub config: DashboardConfig,
    pub fetcher: Arc<dyn SeriesFetcher>,
    started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: DashboardConfig, fetcher: Arc<dyn SeriesFetcher>) -> Self {
        Self {
            config,
            fetcher,
            started_at: Utc::now(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}
