//! Run orchestration — wires configuration, registry, scanner and scan pass.
//!
//! Two entry points:
//! - `Runner::run_once()`: re-rank the universe if the stamp is stale, then
//!   evaluate every observed instrument. Used by `scan` and `watch`.
//! - `Runner::rank()`: re-rank unconditionally. Used by `rank`.

use std::path::Path;

use chrono::NaiveDateTime;
use thiserror::Error;

use cyclesig_core::indicators::IndicatorError;
use cyclesig_core::pipeline::SignalPipeline;
use cyclesig_core::report::DecisionReporter;

use crate::config::{ConfigError, RunnerConfig};
use crate::csv_source::CsvBarSource;
use crate::jsonl_store::JsonlSignalStore;
use crate::registry::{AssetRegistry, RegistryError};
use crate::scan::{ScanPass, ScanSummary};
use crate::scanner::{MarketScanner, ScannerError, Universe};
use crate::stamp::RefreshStamp;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("pipeline error: {0}")]
    Pipeline(#[from] IndicatorError),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("scanner error: {0}")]
    Scanner(#[from] ScannerError),
    #[error("refresh stamp {path}: {source}")]
    Stamp {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Long-lived collaborators built once from a [`RunnerConfig`].
pub struct Runner {
    config: RunnerConfig,
    pipeline: SignalPipeline,
    source: CsvBarSource,
    store: JsonlSignalStore,
    stamp: RefreshStamp,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Result<Self, RunError> {
        config.validate()?;
        let pipeline = SignalPipeline::new(config.pipeline.clone())?;
        let source = CsvBarSource::new(config.paths.bars_dir.clone());
        let store = JsonlSignalStore::new(config.paths.signals.clone());
        let stamp = RefreshStamp::new(config.paths.stamp.clone());
        Ok(Self {
            config,
            pipeline,
            source,
            store,
            stamp,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, RunError> {
        Self::new(RunnerConfig::from_file(path)?)
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn store(&self) -> &JsonlSignalStore {
        &self.store
    }

    /// Re-rank the universe and overwrite the registry. Returns the number of
    /// observed instruments.
    pub fn rank(&self, now: NaiveDateTime) -> Result<usize, RunError> {
        let universe = Universe::load(&self.config.paths.universe)?;
        let observed = MarketScanner::new(&self.config.scanner, &self.source).scan(&universe);
        let count = observed.len();

        let mut registry = AssetRegistry::load(&self.config.paths.registry)?;
        registry.replace(observed)?;
        registry.save(&self.config.paths.registry)?;

        self.stamp.touch(now).map_err(|source| RunError::Stamp {
            path: self.stamp.path().display().to_string(),
            source,
        })?;
        Ok(count)
    }

    /// Re-rank if the stamp is stale. A missing universe file leaves the
    /// registry as it is.
    pub fn refresh_if_due(&self, now: NaiveDateTime) -> Result<bool, RunError> {
        if !self.stamp.is_due(now) {
            return Ok(false);
        }
        if !self.config.paths.universe.exists() {
            tracing::warn!(
                path = %self.config.paths.universe.display(),
                "no universe file, keeping current registry"
            );
            return Ok(false);
        }
        let observed = self.rank(now)?;
        tracing::info!(observed, "universe re-ranked");
        Ok(true)
    }

    /// One full pass at `now`.
    pub fn run_once(
        &self,
        now: NaiveDateTime,
        reporter: &dyn DecisionReporter,
    ) -> Result<ScanSummary, RunError> {
        self.refresh_if_due(now)?;

        let registry = AssetRegistry::load(&self.config.paths.registry)?;
        let (configs, failures) = registry.instrument_configs(&self.config.defaults);
        for failure in &failures {
            tracing::warn!(error = %failure, "instrument configuration rejected");
        }

        let symbols: Vec<String> = registry.observed().map(|a| a.symbol.clone()).collect();
        if symbols.is_empty() {
            tracing::warn!("no observed instruments");
        }

        let pass = ScanPass {
            pipeline: &self.pipeline,
            source: &self.source,
            store: &self.store,
            reporter,
            config: &self.config.scan,
        };
        Ok(pass.run(&symbols, &configs, now))
    }
}
