//! One scheduling pass over the observed universe.
//!
//! Each instrument is fetched and evaluated on its own. A failure on one
//! instrument is reported and recorded in the summary; it never stops the
//! others.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rayon::prelude::*;
use thiserror::Error;

use cyclesig_core::data::{BarSource, DataError};
use cyclesig_core::domain::{InstrumentConfig, Series, Signal};
use cyclesig_core::indicators::IndicatorError;
use cyclesig_core::pipeline::{
    Evaluation, PipelineError, SeriesContext, SignalPipeline, SuppressReason, Suppression,
};
use cyclesig_core::report::DecisionReporter;
use cyclesig_core::store::{SignalStore, StoreError};

use crate::config::ScanConfig;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("no configuration for {0}")]
    ConfigurationMissing(String),

    #[error("invalid input: {0}")]
    InvalidInput(#[from] IndicatorError),

    #[error("signal store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("bar source failed: {0}")]
    DataSource(#[from] DataError),
}

impl ScanError {
    /// Stable error label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::ConfigurationMissing(_) => "configuration_missing",
            ScanError::InvalidInput(_) => "invalid_input",
            ScanError::StoreUnavailable(_) => "store_unavailable",
            ScanError::DataSource(_) => "data_source",
        }
    }
}

impl From<PipelineError> for ScanError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::InvalidInput(e) => ScanError::InvalidInput(e),
            PipelineError::Store(e) => ScanError::StoreUnavailable(e),
        }
    }
}

/// What happened to one instrument in a pass.
#[derive(Debug)]
pub enum InstrumentOutcome {
    Emitted(Signal),
    Suppressed(Suppression),
    Failed(ScanError),
}

impl InstrumentOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            InstrumentOutcome::Emitted(_) => "emitted",
            InstrumentOutcome::Suppressed(s) => s.reason.filter_name(),
            InstrumentOutcome::Failed(e) => e.kind(),
        }
    }
}

/// Per-instrument outcomes of one pass, in input order.
#[derive(Debug, Default)]
pub struct ScanSummary {
    pub started_at: Option<NaiveDateTime>,
    pub outcomes: Vec<(String, InstrumentOutcome)>,
}

impl ScanSummary {
    pub fn emitted(&self) -> usize {
        self.count(|o| matches!(o, InstrumentOutcome::Emitted(_)))
    }

    pub fn suppressed(&self) -> usize {
        self.count(|o| matches!(o, InstrumentOutcome::Suppressed(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, InstrumentOutcome::Failed(_)))
    }

    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.outcomes.iter().filter_map(|(_, o)| match o {
            InstrumentOutcome::Emitted(s) => Some(s),
            _ => None,
        })
    }

    pub fn outcome(&self, symbol: &str) -> Option<&InstrumentOutcome> {
        self.outcomes
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, o)| o)
    }

    fn count(&self, pred: impl Fn(&InstrumentOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Collaborators for a pass. Nothing here is owned; the caller decides
/// the lifetime of the store, source and reporter.
pub struct ScanPass<'a> {
    pub pipeline: &'a SignalPipeline,
    pub source: &'a dyn BarSource,
    pub store: &'a dyn SignalStore,
    pub reporter: &'a dyn DecisionReporter,
    pub config: &'a ScanConfig,
}

impl<'a> ScanPass<'a> {
    /// Evaluate every symbol at `now`.
    ///
    /// A symbol absent from `configs` fails with `ConfigurationMissing`.
    pub fn run(
        &self,
        symbols: &[String],
        configs: &BTreeMap<String, InstrumentConfig>,
        now: NaiveDateTime,
    ) -> ScanSummary {
        let evaluate = |symbol: &String| {
            let outcome = self.evaluate_symbol(symbol, configs.get(symbol), now);
            (symbol.clone(), outcome)
        };

        let outcomes: Vec<(String, InstrumentOutcome)> = if self.config.parallel {
            symbols.par_iter().map(evaluate).collect()
        } else {
            symbols.iter().map(evaluate).collect()
        };

        let summary = ScanSummary {
            started_at: Some(now),
            outcomes,
        };
        tracing::info!(
            instruments = symbols.len(),
            emitted = summary.emitted(),
            suppressed = summary.suppressed(),
            failed = summary.failed(),
            "scan pass complete"
        );
        summary
    }

    fn evaluate_symbol(
        &self,
        symbol: &str,
        config: Option<&InstrumentConfig>,
        now: NaiveDateTime,
    ) -> InstrumentOutcome {
        let Some(config) = config else {
            return self.fail(symbol, ScanError::ConfigurationMissing(symbol.to_string()));
        };

        let (primary, cycle) = match self.fetch(config) {
            Ok(series) => series,
            Err(e) => return self.fail(symbol, e),
        };

        if primary.is_empty() || cycle.is_empty() {
            let what = if primary.is_empty() { "bars" } else { "cycle_bars" };
            let suppression = Suppression::new(SuppressReason::InsufficientData(what));
            self.reporter.on_suppressed(symbol, &suppression);
            return InstrumentOutcome::Suppressed(suppression);
        }

        let ctx = SeriesContext::new(&primary, &cycle);
        // The pipeline reports its own outcome, including failures.
        match self
            .pipeline
            .evaluate(config, &ctx, now, self.store, self.reporter)
        {
            Ok(Evaluation::Emitted(signal)) => InstrumentOutcome::Emitted(signal),
            Ok(Evaluation::Suppressed(s)) => InstrumentOutcome::Suppressed(s),
            Err(e) => InstrumentOutcome::Failed(e.into()),
        }
    }

    fn fetch(&self, config: &InstrumentConfig) -> Result<(Series, Series), ScanError> {
        let primary =
            self.source
                .fetch(&config.symbol, config.timeframe, self.config.primary_bars)?;
        let cycle =
            self.source
                .fetch(&config.symbol, config.cycle_timeframe, self.config.cycle_bars)?;

        let primary = Series::new(primary).map_err(IndicatorError::from)?;
        let cycle = Series::new(cycle).map_err(IndicatorError::from)?;
        Ok((primary, cycle))
    }

    fn fail(&self, symbol: &str, error: ScanError) -> InstrumentOutcome {
        self.reporter.on_error(symbol, error.kind(), &error);
        InstrumentOutcome::Failed(error)
    }
}
