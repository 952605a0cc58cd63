//! Runner configuration loaded from TOML.
//!
//! Every section is optional and falls back to the bot's defaults; unknown
//! keys are rejected at load time rather than silently ignored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cyclesig_core::domain::InstrumentDefaults;
use cyclesig_core::indicators::IndicatorError;
use cyclesig_core::pipeline::PipelineParams;

use crate::scanner::ScannerConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid pipeline parameters: {0}")]
    Pipeline(#[from] IndicatorError),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// File locations used by a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory of `<SYMBOL>_<TIMEFRAME>.csv` bar files.
    pub bars_dir: PathBuf,
    /// Candidate symbols considered by the market scanner.
    pub universe: PathBuf,
    /// Asset registry (observed instruments).
    pub registry: PathBuf,
    /// JSONL signal store.
    pub signals: PathBuf,
    /// Timestamp of the last universe re-rank.
    pub stamp: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            bars_dir: PathBuf::from("data/bars"),
            universe: PathBuf::from("data/universe.toml"),
            registry: PathBuf::from("data/assets.toml"),
            signals: PathBuf::from("data/signals.jsonl"),
            stamp: PathBuf::from("data/last_scan.txt"),
        }
    }
}

/// Bar counts and scheduling for one scan pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    pub primary_bars: usize,
    pub cycle_bars: usize,
    /// Evaluate instruments on the rayon pool.
    pub parallel: bool,
    /// Pause between passes in watch mode.
    pub interval_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            primary_bars: 500,
            cycle_bars: 1000,
            parallel: true,
            interval_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    pub paths: PathsConfig,
    pub pipeline: PipelineParams,
    pub defaults: InstrumentDefaults,
    pub scanner: ScannerConfig,
    pub scan: ScanConfig,
}

impl RunnerConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pipeline.validate()?;
        if self.scan.primary_bars == 0 {
            return Err(ConfigError::Invalid {
                field: "scan.primary_bars",
                reason: "must be >= 1".into(),
            });
        }
        if self.scan.cycle_bars == 0 {
            return Err(ConfigError::Invalid {
                field: "scan.cycle_bars",
                reason: "must be >= 1".into(),
            });
        }
        if self.defaults.trading_start > self.defaults.trading_end {
            return Err(ConfigError::Invalid {
                field: "defaults.trading_start",
                reason: format!(
                    "{} is after trading_end {}",
                    self.defaults.trading_start, self.defaults.trading_end
                ),
            });
        }
        if !self.scanner.max_spread.is_finite() || self.scanner.max_spread < 0.0 {
            return Err(ConfigError::Invalid {
                field: "scanner.max_spread",
                reason: format!("must be >= 0, got {}", self.scanner.max_spread),
            });
        }
        Ok(())
    }
}
