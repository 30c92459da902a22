// =============================================================================
// Runtime Configuration: dashboard defaults with atomic save
// =============================================================================
//
// Every tunable lives here: the listen address, the exchange endpoint, the
// candle interval, the indicator windows and the selectable asset table.
//
// All fields carry `#[serde(default)]` so that a partial or older JSON file
// still loads.  Environment variables override the file (see
// `apply_overrides`).  Persistence uses an atomic tmp + rename.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::indicators::moving_average::DEFAULT_MA_WINDOW;
use crate::indicators::stochastic::{StochasticParams, DEFAULT_SMOOTHING_D, DEFAULT_WINDOW_K};
use crate::kraken::client::{is_supported_interval, DEFAULT_TIMEOUT, KRAKEN_BASE_URL};
use crate::types::Asset;

/// Default config file, relative to the working directory.
pub const CONFIG_FILE: &str = "dashboard_config.json";

pub const ENV_BIND_ADDR: &str = "DASHBOARD_BIND_ADDR";
pub const ENV_KRAKEN_URL: &str = "DASHBOARD_KRAKEN_URL";
pub const ENV_INTERVAL: &str = "DASHBOARD_INTERVAL";
/// Alternative path for the config file.
pub const ENV_CONFIG_PATH: &str = "DASHBOARD_CONFIG";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_kraken_base_url() -> String {
    KRAKEN_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_interval() -> u32 {
    60
}

fn default_window_k() -> usize {
    DEFAULT_WINDOW_K
}

fn default_smoothing_d() -> usize {
    DEFAULT_SMOOTHING_D
}

fn default_ma_window() -> usize {
    DEFAULT_MA_WINDOW
}

fn default_assets() -> Vec<Asset> {
    vec![
        Asset::new("Bitcoin", "XXBTZUSD"),
        Asset::new("Ethereum", "XETHZUSD"),
        Asset::new("Tether", "USDTZUSD"),
        Asset::new("USD Coin", "USDCUSD"),
        Asset::new("Doge Coin", "XDGUSD"),
        Asset::new("Solana", "SOLUSD"),
        Asset::new("XRP", "XRPUSD"),
        Asset::new("Cardano", "ADAUSD"),
        Asset::new("Avalanche", "AVAXUSD"),
    ]
}

// =============================================================================
// DashboardConfig
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    // --- Server -------------------------------------------------------------

    /// Address the HTTP API listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    // --- Exchange -----------------------------------------------------------

    /// Root of the Kraken REST API.
    #[serde(default = "default_kraken_base_url")]
    pub kraken_base_url: String,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Candle interval in minutes used when a request does not name one.
    #[serde(default = "default_interval")]
    pub interval: u32,

    // --- Indicators ---------------------------------------------------------

    #[serde(default = "default_window_k")]
    pub window_k: usize,

    #[serde(default = "default_smoothing_d")]
    pub smoothing_d: usize,

    #[serde(default = "default_ma_window")]
    pub ma_window: usize,

    // --- Assets -------------------------------------------------------------

    /// Selectable assets, in display order.
    #[serde(default = "default_assets")]
    pub assets: Vec<Asset>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            kraken_base_url: default_kraken_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            interval: default_interval(),
            window_k: default_window_k(),
            smoothing_d: default_smoothing_d(),
            ma_window: default_ma_window(),
            assets: default_assets(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dashboard config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse dashboard config from {}", path.display()))?;

        info!(
            path = %path.display(),
            assets = config.assets.len(),
            interval = config.interval,
            "dashboard config loaded"
        );

        Ok(config)
    }

    /// Persist the configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise dashboard config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "dashboard config saved (atomic)");
        Ok(())
    }

    /// Load the config at `path`, seeding it with the defaults when absent.
    ///
    /// An existing file that fails to load is left alone and the defaults
    /// are used for this run.
    pub fn load_or_init(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            let config = Self::default();
            match config.save(path) {
                Ok(()) => info!(path = %path.display(), "wrote default dashboard config"),
                Err(e) => warn!(error = %e, "failed to write default dashboard config"),
            }
            return config;
        }

        Self::load(path).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            Self::default()
        })
    }

    /// Apply overrides from `lookup` (normally `std::env::var`).
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup(ENV_BIND_ADDR).filter(|s| !s.trim().is_empty()) {
            self.bind_addr = addr.trim().to_string();
        }
        if let Some(url) = lookup(ENV_KRAKEN_URL).filter(|s| !s.trim().is_empty()) {
            self.kraken_base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_INTERVAL) {
            match raw.trim().parse::<u32>() {
                Ok(interval) => self.interval = interval,
                Err(e) => warn!(value = %raw, error = %e, "ignoring invalid {ENV_INTERVAL}"),
            }
        }
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.stochastic_params()
            .validate()
            .context("invalid stochastic settings")?;
        if self.ma_window == 0 {
            anyhow::bail!("ma_window must be a positive integer");
        }
        if !is_supported_interval(self.interval) {
            anyhow::bail!("unsupported candle interval: {} minutes", self.interval);
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be positive");
        }
        if self.assets.is_empty() {
            anyhow::bail!("at least one asset must be configured");
        }
        Ok(())
    }

    pub fn stochastic_params(&self) -> StochasticParams {
        StochasticParams {
            window_k: self.window_k,
            smoothing_d: self.smoothing_d,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Look up an asset by display name or pair symbol, ignoring case.
    pub fn find_asset(&self, name_or_pair: &str) -> Option<&Asset> {
        let wanted = name_or_pair.trim();
        self.assets
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(wanted) || a.pair.eq_ignore_ascii_case(wanted))
    }
}
