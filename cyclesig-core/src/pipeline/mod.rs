//! Signal pipeline — eight ordered stages from market context to signal.
//!
//! 1. trading window  2. ADX band  3. candle body  4. VWAP distance
//! 5. cycle → direction  6. duplicate check  7. stop/target  8. emission
//!
//! The first stage that suppresses ends the evaluation: nothing after it is
//! computed and the store is never written. Suppression is an ordinary
//! [`Evaluation`] value; `Err` is reserved for malformed input and store
//! failures.

pub mod context;
pub mod filters;
pub mod levels;
pub mod params;

pub use context::{MarketContext, SeriesContext};
pub use levels::{round_to, stop_and_target, Levels};
pub use params::PipelineParams;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDateTime};
use thiserror::Error;

use crate::cycle::classify;
use crate::domain::{InstrumentConfig, Signal, SignalId, SignalStatus};
use crate::indicators::{IndicatorError, PivotParams};
use crate::report::DecisionReporter;
use crate::store::{InsertOutcome, SignalStore, StoreError};

/// Why an evaluation produced no signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    OutsideTradingWindow,
    WeakTrend,
    AnomalousCandle,
    FarFromVwap,
    NoCycle,
    DuplicateSignal,
    NoStopLevel,
    /// A required value was undefined (names the value).
    InsufficientData(&'static str),
}

impl SuppressReason {
    /// Stable filter label used in logs.
    pub fn filter_name(&self) -> &'static str {
        match self {
            SuppressReason::OutsideTradingWindow => "time_window",
            SuppressReason::WeakTrend => "adx",
            SuppressReason::AnomalousCandle => "candle_body",
            SuppressReason::FarFromVwap => "vwap_distance",
            SuppressReason::NoCycle => "cycle",
            SuppressReason::DuplicateSignal => "duplicate",
            SuppressReason::NoStopLevel => "stop_level",
            SuppressReason::InsufficientData(_) => "insufficient_data",
        }
    }
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuppressReason::OutsideTradingWindow => f.write_str("outside trading window"),
            SuppressReason::WeakTrend => f.write_str("ADX in weak band"),
            SuppressReason::AnomalousCandle => f.write_str("anomalous candle body"),
            SuppressReason::FarFromVwap => f.write_str("price too far from daily VWAP"),
            SuppressReason::NoCycle => f.write_str("no directional cycle"),
            SuppressReason::DuplicateSignal => f.write_str("open signal already exists"),
            SuppressReason::NoStopLevel => f.write_str("no qualifying stop pivot"),
            SuppressReason::InsufficientData(what) => write!(f, "{what} undefined"),
        }
    }
}

/// A suppression and the filter's inputs at the time.
#[derive(Debug, Clone, PartialEq)]
pub struct Suppression {
    pub reason: SuppressReason,
    pub filter_state: BTreeMap<String, f64>,
}

impl Suppression {
    pub fn new(reason: SuppressReason) -> Self {
        Self {
            reason,
            filter_state: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.filter_state.insert(key.to_string(), value);
        self
    }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Emitted(Signal),
    Suppressed(Suppression),
}

impl Evaluation {
    pub fn signal(&self) -> Option<&Signal> {
        match self {
            Evaluation::Emitted(signal) => Some(signal),
            Evaluation::Suppressed(_) => None,
        }
    }

    pub fn suppression(&self) -> Option<&Suppression> {
        match self {
            Evaluation::Emitted(_) => None,
            Evaluation::Suppressed(s) => Some(s),
        }
    }
}

impl From<Suppression> for Evaluation {
    fn from(s: Suppression) -> Self {
        Evaluation::Suppressed(s)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidInput(#[from] IndicatorError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    /// Stable error label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput(_) => "invalid_input",
            PipelineError::Store(_) => "store_unavailable",
        }
    }
}

fn suppressed(reason: SuppressReason) -> Result<Evaluation, PipelineError> {
    Ok(Evaluation::Suppressed(Suppression::new(reason)))
}

/// The signal pipeline with its shared thresholds.
#[derive(Debug, Clone)]
pub struct SignalPipeline {
    params: PipelineParams,
}

impl SignalPipeline {
    pub fn new(params: PipelineParams) -> Result<Self, IndicatorError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Evaluate one instrument at `now` and report the outcome.
    pub fn evaluate(
        &self,
        config: &InstrumentConfig,
        ctx: &dyn MarketContext,
        now: NaiveDateTime,
        store: &dyn SignalStore,
        reporter: &dyn DecisionReporter,
    ) -> Result<Evaluation, PipelineError> {
        let result = self.run(config, ctx, now, store);
        match &result {
            Ok(Evaluation::Emitted(signal)) => reporter.on_emitted(signal),
            Ok(Evaluation::Suppressed(s)) => reporter.on_suppressed(&config.symbol, s),
            Err(e) => reporter.on_error(&config.symbol, e.kind(), e),
        }
        result
    }

    fn run(
        &self,
        config: &InstrumentConfig,
        ctx: &dyn MarketContext,
        now: NaiveDateTime,
        store: &dyn SignalStore,
    ) -> Result<Evaluation, PipelineError> {
        let params = &self.params;

        if let Some(s) = filters::trading_window(config, now.time()) {
            return Ok(s.into());
        }

        let Some(adx) = ctx.adx(params.adx_period)? else {
            return suppressed(SuppressReason::InsufficientData("adx"));
        };
        if let Some(s) = filters::trend_strength(config, params, adx) {
            return Ok(s.into());
        }

        let Some(bar) = ctx.current_bar() else {
            return suppressed(SuppressReason::InsufficientData("bars"));
        };
        let body_pct = match filters::body_pct(bar) {
            Ok(pct) => pct,
            Err(s) => return Ok(s.into()),
        };
        if let Some(s) = filters::candle_body(config, body_pct) {
            return Ok(s.into());
        }

        let price = bar.close;
        let vwap = match ctx.daily_vwap()? {
            Some(v) if v > 0.0 => v,
            _ => return suppressed(SuppressReason::InsufficientData("vwap")),
        };
        if let Some(s) = filters::vwap_distance(params, price, vwap) {
            return Ok(s.into());
        }

        let scale = config.price_scale();
        let pivot_params = PivotParams {
            min_prominence: params.pivots.min_prominence * scale,
            ..params.pivots
        };
        let pivots = ctx.pivots(&pivot_params)?;
        let cycle = classify(&pivots.tops, &pivots.bottoms, params.cycle_rule);
        let Some(direction) = cycle.direction() else {
            return Ok(Suppression::new(SuppressReason::NoCycle)
                .with("tops", pivots.tops.len() as f64)
                .with("bottoms", pivots.bottoms.len() as f64)
                .into());
        };

        let since = now - Duration::minutes(params.duplicate_lookback_minutes);
        if store.find_recent_signal(&config.symbol, direction, &SignalStatus::OPEN, since)? {
            return Ok(Suppression::new(SuppressReason::DuplicateSignal)
                .with("lookback_minutes", params.duplicate_lookback_minutes as f64)
                .into());
        }

        let min_distance = params.stop_min_distance * scale;
        let Some(levels) =
            stop_and_target(direction, price, &pivots, min_distance, params.reward_risk)
        else {
            return Ok(Suppression::new(SuppressReason::NoStopLevel)
                .with("price", price)
                .with("min_distance", min_distance)
                .into());
        };

        let stop = round_to(levels.stop, params.price_decimals);
        let target = round_to(levels.target, params.price_decimals);
        let signal = Signal {
            id: SignalId::derive(now, &config.symbol, direction, price, stop, target),
            instrument: config.symbol.clone(),
            direction,
            entry: price,
            stop,
            target,
            position_size: config.position_size,
            cycle,
            adx: round_to(adx, 2),
            body_pct: round_to(body_pct, 2),
            status: SignalStatus::Pending,
            emitted_at: now,
        };

        if store.insert_signal(&signal)? == InsertOutcome::Duplicate {
            tracing::debug!(
                instrument = %signal.instrument,
                id = signal.id.short(),
                "signal already stored"
            );
        }
        Ok(Evaluation::Emitted(signal))
    }
}
