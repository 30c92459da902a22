// =============================================================================
// Indicator Panel: one fetch-and-compute pass per request
// =============================================================================
//
// Flow for a single request:
//   1. Resolve settings (interval + windows) against the config defaults and
//      reject bad values before any network I/O.
//   2. Fetch the candle series for the asset's pair.
//   3. Compute %K/%D, the moving average and the threshold bands.
//   4. Package everything aligned to the candle timestamps.
//
// "No data for this pair/interval" is not an error here: it produces an
// empty panel carrying a user-facing notice.  Transport and service failures
// are returned as `PanelError::Fetch`.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::indicators::{
    compute_moving_average, positive_window, stochastic::compute_stochastic_with, IndicatorError,
    IndicatorSeries, StochasticParams, ThresholdBands,
};
use crate::kraken::client::is_supported_interval;
use crate::market_data::{CandleSeries, FetchError, SeriesFetcher};
use crate::runtime_config::DashboardConfig;
use crate::types::{Asset, StochasticZone};

/// Shown to the user when the exchange has no candles for the selection.
pub const NO_DATA_NOTICE: &str = "No valid data available for the selected cryptocurrency pair.";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("unknown asset: {0}")]
    UnknownAsset(String),

    #[error(transparent)]
    InvalidParameter(#[from] IndicatorError),

    #[error("unsupported candle interval: {0} minutes")]
    UnsupportedInterval(i64),

    #[error("failed to fetch candles: {0}")]
    Fetch(#[from] FetchError),
}

impl PanelError {
    /// `true` when the request itself was at fault.
    pub fn is_caller_error(&self) -> bool {
        match self {
            Self::UnknownAsset(_) | Self::InvalidParameter(_) | Self::UnsupportedInterval(_) => true,
            Self::Fetch(e) => e.is_caller_error(),
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Per-request overrides; `None` falls back to the configured value.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SettingsOverrides {
    pub interval: Option<i64>,
    pub window_k: Option<i64>,
    pub smoothing_d: Option<i64>,
    pub ma_window: Option<i64>,
}

/// Validated parameters for one panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PanelSettings {
    /// Candle interval in minutes.
    pub interval: u32,
    pub stochastic: StochasticParams,
    pub ma_window: usize,
}

impl PanelSettings {
    /// Merge `overrides` over the config defaults and validate the result.
    pub fn resolve(config: &DashboardConfig, overrides: SettingsOverrides) -> Result<Self, PanelError> {
        let interval_raw = overrides.interval.unwrap_or(i64::from(config.interval));
        let interval = u32::try_from(interval_raw)
            .ok()
            .filter(|iv| is_supported_interval(*iv))
            .ok_or(PanelError::UnsupportedInterval(interval_raw))?;

        let window_k = positive_window("window_k", overrides.window_k.unwrap_or(config.window_k as i64))?;
        let smoothing_d =
            positive_window("smoothing_d", overrides.smoothing_d.unwrap_or(config.smoothing_d as i64))?;
        let ma_window = positive_window("ma_window", overrides.ma_window.unwrap_or(config.ma_window as i64))?;

        Ok(Self {
            interval,
            stochastic: StochasticParams {
                window_k,
                smoothing_d,
            },
            ma_window,
        })
    }

    fn validate(&self) -> Result<(), IndicatorError> {
        self.stochastic.validate()?;
        if self.ma_window == 0 {
            return Err(IndicatorError::InvalidParameter {
                name: "ma_window",
                value: 0,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Panel
// =============================================================================

/// Snapshot of the most recent candle and oscillator reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestReading {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub k: Option<f64>,
    pub d: Option<f64>,
    pub ma: Option<f64>,
    pub zone: Option<StochasticZone>,
}

/// Everything a chart front end needs for one asset, index-aligned.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorPanel {
    pub asset: String,
    pub pair: String,
    pub settings: PanelSettings,
    /// User-facing message when there is nothing to plot.
    pub notice: Option<String>,
    /// e.g. "Bitcoin - 2023-11-22 to 2023-12-22".
    pub range_label: Option<String>,
    pub timestamps: Vec<DateTime<Utc>>,
    pub candles: CandleSeries,
    pub volume: Vec<f64>,
    pub k: IndicatorSeries,
    pub d: IndicatorSeries,
    pub ma: IndicatorSeries,
    #[serde(flatten)]
    pub bands: ThresholdBands,
    pub latest: Option<LatestReading>,
}

impl IndicatorPanel {
    /// Empty panel for a pair the exchange has no candles for.
    pub fn unavailable(asset: &Asset, settings: PanelSettings) -> Self {
        Self {
            asset: asset.name.clone(),
            pair: asset.pair.clone(),
            settings,
            notice: Some(NO_DATA_NOTICE.to_string()),
            range_label: None,
            timestamps: Vec::new(),
            candles: CandleSeries::default(),
            volume: Vec::new(),
            k: Vec::new(),
            d: Vec::new(),
            ma: Vec::new(),
            bands: ThresholdBands::for_len(0),
            latest: None,
        }
    }
}

/// Compute every series for `candles`.  Pure; no I/O.
pub fn compute_panel(
    asset: &Asset,
    settings: PanelSettings,
    candles: CandleSeries,
) -> Result<IndicatorPanel, IndicatorError> {
    settings.validate()?;

    if candles.is_empty() {
        return Ok(IndicatorPanel::unavailable(asset, settings));
    }

    let stochastic = compute_stochastic_with(&candles, settings.stochastic)?;
    let ma = compute_moving_average(&candles, settings.ma_window)?;
    let bands = ThresholdBands::for_len(candles.len());

    let range_label = match (candles.first(), candles.last()) {
        (Some(first), Some(last)) => Some(format!(
            "{} - {} to {}",
            asset.name,
            first.timestamp.format("%Y-%m-%d"),
            last.timestamp.format("%Y-%m-%d")
        )),
        _ => None,
    };

    // %K/%D report the most recent defined value; a flat final window
    // leaves trailing gaps.
    let latest = candles.last().map(|c| {
        let k = stochastic.latest_k();
        LatestReading {
            timestamp: c.timestamp,
            close: c.close,
            k,
            d: stochastic.latest_d(),
            ma: ma.last().copied().flatten(),
            zone: k.map(StochasticZone::classify),
        }
    });

    Ok(IndicatorPanel {
        asset: asset.name.clone(),
        pair: asset.pair.clone(),
        settings,
        notice: None,
        range_label,
        timestamps: candles.timestamps(),
        volume: candles.volumes(),
        candles,
        k: stochastic.k,
        d: stochastic.d,
        ma,
        bands,
        latest,
    })
}

/// Fetch candles for `asset` and compute its panel.
pub async fn build_panel(
    fetcher: &dyn SeriesFetcher,
    asset: &Asset,
    settings: PanelSettings,
) -> Result<IndicatorPanel, PanelError> {
    // Fail fast: never spend a request on parameters the engine would reject.
    settings.validate()?;

    let candles = match fetcher.fetch(&asset.pair, settings.interval).await {
        Ok(candles) => candles,
        Err(e) if e.is_data_unavailable() => {
            warn!(asset = %asset.name, pair = %asset.pair, interval = settings.interval, "no candles available");
            return Ok(IndicatorPanel::unavailable(asset, settings));
        }
        Err(e) => {
            warn!(asset = %asset.name, pair = %asset.pair, error = %e, "candle fetch failed");
            return Err(e.into());
        }
    };

    if candles.len() <= settings.stochastic.d_lookback() {
        warn!(
            asset = %asset.name,
            candles = candles.len(),
            needed = settings.stochastic.d_lookback() + 1,
            "history too short for a defined %D"
        );
    }

    let panel = compute_panel(asset, settings, candles)?;
    info!(
        asset = %panel.asset,
        candles = panel.candles.len(),
        zone = ?panel.latest.as_ref().and_then(|l| l.zone),
        "indicator panel built"
    );
    Ok(panel)
}

/// One row of a multi-asset comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonEntry {
    pub asset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel: Option<IndicatorPanel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build panels for several assets, one after another.
///
/// A failure on one asset is recorded in its entry and does not stop the
/// others.
pub async fn build_comparison(
    fetcher: &dyn SeriesFetcher,
    assets: &[Asset],
    settings: PanelSettings,
) -> Vec<ComparisonEntry> {
    let mut entries = Vec::with_capacity(assets.len());
    for asset in assets {
        let entry = match build_panel(fetcher, asset, settings).await {
            Ok(panel) => ComparisonEntry {
                asset: asset.name.clone(),
                panel: Some(panel),
                error: None,
            },
            Err(e) => ComparisonEntry {
                asset: asset.name.clone(),
                panel: None,
                error: Some(e.to_string()),
            },
        };
        entries.push(entry);
    }
    entries
}
