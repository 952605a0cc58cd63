//! Asset registry persisted as TOML.
//!
//! The market scanner writes it; the scan pass reads the observed rows and
//! turns them into per-instrument configurations.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cyclesig_core::domain::{AssetRecord, InstrumentConfig, InstrumentDefaults, InstrumentError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("read registry {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parse registry: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize registry: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("write registry {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("duplicate symbol in registry: {0}")]
    DuplicateSymbol(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetRegistry {
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
}

impl AssetRegistry {
    pub fn new(assets: Vec<AssetRecord>) -> Result<Self, RegistryError> {
        let registry = Self { assets };
        registry.check_unique()?;
        Ok(registry)
    }

    /// Load from disk. A missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(RegistryError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, RegistryError> {
        let registry: Self = toml::from_str(text)?;
        registry.check_unique()?;
        Ok(registry)
    }

    pub fn to_toml(&self) -> Result<String, RegistryError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), RegistryError> {
        let text = self.to_toml()?;
        let write_err = |source| RegistryError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, text).map_err(write_err)
    }

    /// Rows flagged for evaluation.
    pub fn observed(&self) -> impl Iterator<Item = &AssetRecord> {
        self.assets.iter().filter(|a| a.observing)
    }

    /// Replace the registry contents with a fresh ranking.
    pub fn replace(&mut self, assets: Vec<AssetRecord>) -> Result<(), RegistryError> {
        let previous = std::mem::replace(&mut self.assets, assets);
        if let Err(e) = self.check_unique() {
            self.assets = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Instrument configurations for every observed row.
    ///
    /// Rows that fail validation are returned separately so one bad row does
    /// not keep the rest of the universe from being evaluated.
    pub fn instrument_configs(
        &self,
        defaults: &InstrumentDefaults,
    ) -> (BTreeMap<String, InstrumentConfig>, Vec<InstrumentError>) {
        let mut configs = BTreeMap::new();
        let mut failures = Vec::new();
        for asset in self.observed() {
            match InstrumentConfig::from_asset(asset, defaults) {
                Ok(config) => {
                    configs.insert(config.symbol.clone(), config);
                }
                Err(e) => failures.push(e),
            }
        }
        (configs, failures)
    }

    fn check_unique(&self) -> Result<(), RegistryError> {
        let mut seen = std::collections::HashSet::new();
        for asset in &self.assets {
            if !seen.insert(asset.symbol.as_str()) {
                return Err(RegistryError::DuplicateSymbol(asset.symbol.clone()));
            }
        }
        Ok(())
    }
}
