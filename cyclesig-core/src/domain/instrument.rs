//! Instrument metadata: asset registry rows and per-instrument configuration.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Timeframe;

/// Asset classification derived from the broker's symbol path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Forex,
    Indices,
    Crypto,
    Stocks,
    Other,
}

impl AssetClass {
    pub const RANKED: [AssetClass; 4] = [
        AssetClass::Forex,
        AssetClass::Indices,
        AssetClass::Crypto,
        AssetClass::Stocks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Forex => "forex",
            AssetClass::Indices => "indices",
            AssetClass::Crypto => "crypto",
            AssetClass::Stocks => "stocks",
            AssetClass::Other => "other",
        }
    }
}

/// One row of the asset registry.
///
/// Written by the market scanner, read by the configuration loader. The core
/// never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetRecord {
    pub symbol: String,
    pub class: AssetClass,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub path: String,
    /// Spread in points.
    pub spread: f64,
    /// Ranking metric (sum of recent tick volume).
    pub ranking_metric: f64,
    pub observing: bool,
}

/// Per-instrument configuration. Immutable for the duration of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstrumentConfig {
    pub symbol: String,
    pub trading_start: NaiveTime,
    pub trading_end: NaiveTime,
    /// Minimum ADX for a trend to count as strong.
    pub adx_min: f64,
    /// Maximum candle body, in percent of the open.
    pub max_body_pct: f64,
    pub timeframe: Timeframe,
    pub cycle_timeframe: Timeframe,
    pub position_size: f64,
    /// Price point size (0.01 for JPY crosses, 0.0001 otherwise).
    pub point: f64,
}

/// Values applied to every instrument loaded from the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstrumentDefaults {
    pub trading_start: NaiveTime,
    pub trading_end: NaiveTime,
    pub adx_min: f64,
    pub max_body_pct: f64,
    pub timeframe: Timeframe,
    pub cycle_timeframe: Timeframe,
    pub position_size: f64,
}

impl Default for InstrumentDefaults {
    fn default() -> Self {
        Self {
            trading_start: NaiveTime::from_hms_opt(3, 0, 0).unwrap_or_default(),
            trading_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            adx_min: 20.0,
            max_body_pct: 2.5,
            timeframe: Timeframe::M5,
            cycle_timeframe: Timeframe::H1,
            position_size: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InstrumentError {
    #[error("{symbol}: trading window start {start} is after end {end}")]
    InvertedTradingWindow {
        symbol: String,
        start: NaiveTime,
        end: NaiveTime,
    },

    #[error("{symbol}: {field} must be {requirement}, got {value}")]
    InvalidField {
        symbol: String,
        field: &'static str,
        requirement: &'static str,
        value: f64,
    },

    #[error("empty instrument symbol")]
    EmptySymbol,
}

/// Point size the pipeline's absolute price thresholds are quoted in.
pub const REFERENCE_POINT: f64 = 0.0001;

/// Price point size for a symbol: 0.01 for JPY crosses, 0.0001 otherwise.
pub fn point_size(symbol: &str) -> f64 {
    if symbol.to_uppercase().contains("JPY") {
        0.01
    } else {
        0.0001
    }
}

impl InstrumentConfig {
    /// Build a validated configuration for an asset registry row.
    pub fn from_asset(
        asset: &AssetRecord,
        defaults: &InstrumentDefaults,
    ) -> Result<Self, InstrumentError> {
        let config = Self {
            symbol: asset.symbol.clone(),
            trading_start: defaults.trading_start,
            trading_end: defaults.trading_end,
            adx_min: defaults.adx_min,
            max_body_pct: defaults.max_body_pct,
            timeframe: defaults.timeframe,
            cycle_timeframe: defaults.cycle_timeframe,
            position_size: defaults.position_size,
            point: point_size(&asset.symbol),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot evaluate sensibly.
    pub fn validate(&self) -> Result<(), InstrumentError> {
        if self.symbol.trim().is_empty() {
            return Err(InstrumentError::EmptySymbol);
        }
        if self.trading_start > self.trading_end {
            return Err(InstrumentError::InvertedTradingWindow {
                symbol: self.symbol.clone(),
                start: self.trading_start,
                end: self.trading_end,
            });
        }
        let checks = [
            ("adx_min", self.adx_min, self.adx_min >= 0.0, "non-negative"),
            (
                "max_body_pct",
                self.max_body_pct,
                self.max_body_pct >= 0.0,
                "non-negative",
            ),
            (
                "position_size",
                self.position_size,
                self.position_size > 0.0,
                "positive",
            ),
            ("point", self.point, self.point > 0.0, "positive"),
        ];
        for (field, value, ok, requirement) in checks {
            if !ok || !value.is_finite() {
                return Err(InstrumentError::InvalidField {
                    symbol: self.symbol.clone(),
                    field,
                    requirement,
                    value,
                });
            }
        }
        Ok(())
    }

    /// Factor converting thresholds quoted in [`REFERENCE_POINT`] units to
    /// this instrument's prices: 1 for EURUSD, 100 for USDJPY.
    pub fn price_scale(&self) -> f64 {
        self.point / REFERENCE_POINT
    }

    /// Whether `time` falls inside the inclusive trading window.
    pub fn in_trading_window(&self, time: NaiveTime) -> bool {
        self.trading_start <= time && time <= self.trading_end
    }
}
