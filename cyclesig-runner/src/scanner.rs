//! Market scanner: ranks the symbol universe and picks what to observe.
//!
//! Each candidate is classified from its broker path, filtered by spread and
//! ranked by adjusted volume (summed tick volume over the most recent bars).
//! The top entries of every class become the observed rows of the asset
//! registry.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cyclesig_core::data::BarSource;
use cyclesig_core::domain::{AssetClass, AssetRecord, Timeframe};

#[derive(Debug, Error)]
pub enum ScannerError {
    #[error("read universe {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parse universe: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Per-class limits and ranking inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScannerConfig {
    pub max_forex: usize,
    pub max_indices: usize,
    pub max_crypto: usize,
    pub max_stocks: usize,
    /// Maximum spread in points; wider symbols are never observed.
    pub max_spread: f64,
    /// Bars summed for the adjusted volume.
    pub ranking_bars: usize,
    pub ranking_timeframe: Timeframe,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_forex: 5,
            max_indices: 3,
            max_crypto: 2,
            max_stocks: 0,
            max_spread: 40.0,
            ranking_bars: 200,
            ranking_timeframe: Timeframe::M5,
        }
    }
}

impl ScannerConfig {
    pub fn limit(&self, class: AssetClass) -> usize {
        match class {
            AssetClass::Forex => self.max_forex,
            AssetClass::Indices => self.max_indices,
            AssetClass::Crypto => self.max_crypto,
            AssetClass::Stocks => self.max_stocks,
            AssetClass::Other => 0,
        }
    }
}

/// A symbol as listed by the broker terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketSymbol {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub path: String,
    pub spread: f64,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

/// Candidate symbols, loaded from a TOML list of `[[symbols]]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Universe {
    #[serde(default)]
    pub symbols: Vec<MarketSymbol>,
}

impl Universe {
    pub fn load(path: &Path) -> Result<Self, ScannerError> {
        let text = fs::read_to_string(path).map_err(|source| ScannerError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ScannerError> {
        Ok(toml::from_str(text)?)
    }
}

/// Asset class from a broker symbol path such as `Forex\Majors\EURUSD`.
///
/// Stocks only count when listed on a US venue; other listings are `Other`.
pub fn classify_path(path: &str) -> AssetClass {
    let path = path.to_lowercase();
    let has = |needle: &str| path.contains(needle);

    if has("forex") {
        AssetClass::Forex
    } else if has("indice") || has("index") {
        AssetClass::Indices
    } else if has("crypto") || has("cripto") {
        AssetClass::Crypto
    } else if has("stock") || has("acoes") {
        if has("usa") || has("nasdaq") || has("nyse") {
            AssetClass::Stocks
        } else {
            AssetClass::Other
        }
    } else {
        AssetClass::Other
    }
}

pub struct MarketScanner<'a> {
    config: &'a ScannerConfig,
    source: &'a dyn BarSource,
}

impl<'a> MarketScanner<'a> {
    pub fn new(config: &'a ScannerConfig, source: &'a dyn BarSource) -> Self {
        Self { config, source }
    }

    /// Sum of tick volume over the most recent `ranking_bars` bars.
    ///
    /// A symbol whose bars cannot be fetched ranks at zero.
    pub fn adjusted_volume(&self, symbol: &str) -> f64 {
        match self.source.fetch(
            symbol,
            self.config.ranking_timeframe,
            self.config.ranking_bars,
        ) {
            Ok(bars) => bars.iter().map(|b| b.tick_volume).sum(),
            Err(e) => {
                tracing::warn!(symbol, error = %e, "ranking bars unavailable");
                0.0
            }
        }
    }

    /// Rank every visible candidate. Rows come back with `observing = false`.
    pub fn rank(&self, universe: &Universe) -> Vec<AssetRecord> {
        universe
            .symbols
            .par_iter()
            .filter(|s| s.visible)
            .map(|s| AssetRecord {
                symbol: s.name.clone(),
                class: classify_path(&s.path),
                description: s.description.clone(),
                path: s.path.to_lowercase(),
                spread: s.spread,
                ranking_metric: self.adjusted_volume(&s.name),
                observing: false,
            })
            .collect()
    }

    /// Observed rows: per class, spread-filtered, highest volume first.
    pub fn select(&self, ranked: Vec<AssetRecord>) -> Vec<AssetRecord> {
        let mut observed = Vec::new();
        for class in AssetClass::RANKED {
            let mut candidates: Vec<AssetRecord> = ranked
                .iter()
                .filter(|a| a.class == class && a.spread <= self.config.max_spread)
                .cloned()
                .collect();
            candidates.sort_by(|a, b| b.ranking_metric.total_cmp(&a.ranking_metric));
            candidates.truncate(self.config.limit(class));

            tracing::debug!(class = class.as_str(), selected = candidates.len(), "class ranked");
            observed.extend(candidates.into_iter().map(|mut a| {
                a.observing = true;
                a
            }));
        }
        observed
    }

    /// Rank and select in one step.
    pub fn scan(&self, universe: &Universe) -> Vec<AssetRecord> {
        let observed = self.select(self.rank(universe));
        tracing::info!(
            candidates = universe.symbols.len(),
            observed = observed.len(),
            "market scan complete"
        );
        observed
    }
}
