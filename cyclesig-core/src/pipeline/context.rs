//! Market data seen by one evaluation.
//!
//! Indicator values are pulled on demand, so a suppression at an early filter
//! never pays for the later ones.

use crate::domain::{Bar, Series};
use crate::indicators::{Adx, Indicator, IndicatorError, PivotParams, PivotSet, Pivots, Vwap};

pub trait MarketContext {
    /// The bar being evaluated (last bar of the primary series).
    fn current_bar(&self) -> Option<&Bar>;

    /// ADX at the current bar; `None` when undefined.
    fn adx(&self, period: usize) -> Result<Option<f64>, IndicatorError>;

    /// Daily VWAP at the current bar; `None` when undefined.
    fn daily_vwap(&self) -> Result<Option<f64>, IndicatorError>;

    /// Pivots from the cycle-detection series.
    fn pivots(&self, params: &PivotParams) -> Result<PivotSet, IndicatorError>;
}

/// Context backed by a primary series and a cycle-detection series.
#[derive(Debug, Clone, Copy)]
pub struct SeriesContext<'a> {
    primary: &'a Series,
    cycle: &'a Series,
}

impl<'a> SeriesContext<'a> {
    pub fn new(primary: &'a Series, cycle: &'a Series) -> Self {
        Self { primary, cycle }
    }
}

impl MarketContext for SeriesContext<'_> {
    fn current_bar(&self) -> Option<&Bar> {
        self.primary.last()
    }

    fn adx(&self, period: usize) -> Result<Option<f64>, IndicatorError> {
        let points = Adx::new(period)?.compute(self.primary.bars())?;
        Ok(points.last().and_then(|p| p.adx))
    }

    fn daily_vwap(&self) -> Result<Option<f64>, IndicatorError> {
        let points = Vwap::new().compute(self.primary.bars())?;
        Ok(points.last().and_then(|p| p.daily))
    }

    fn pivots(&self, params: &PivotParams) -> Result<PivotSet, IndicatorError> {
        Pivots::new(*params)?.compute(self.cycle.bars())
    }
}
