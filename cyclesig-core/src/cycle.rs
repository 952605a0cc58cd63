//! Cycle classifier: trend label from the ordering of recent pivots.
//!
//! Recomputed from scratch on every evaluation; nothing is carried over.

use serde::{Deserialize, Serialize};

use crate::domain::Cycle;
use crate::indicators::Pivot;

/// Strictness of the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleRule {
    /// Last three tops and bottoms. Uptrend also accepts rising tops whose
    /// middle bottom sits below the newest top; downtrend has no such branch.
    #[default]
    ThreePivot,
    /// Last two tops and bottoms, both rising or both falling. Superseded.
    TwoPivot,
}

impl CycleRule {
    /// Pivots of each kind required before a label other than
    /// `Indeterminate` can be produced.
    pub fn required_pivots(self) -> usize {
        match self {
            CycleRule::ThreePivot => 3,
            CycleRule::TwoPivot => 2,
        }
    }
}

fn last_prices<const N: usize>(pivots: &[Pivot]) -> Option<[f64; N]> {
    let tail = pivots.get(pivots.len().checked_sub(N)?..)?;
    let mut out = [0.0; N];
    for (slot, pivot) in out.iter_mut().zip(tail) {
        *slot = pivot.price;
    }
    Some(out)
}

fn rising(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}

fn falling(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] > w[1])
}

/// Classify the market cycle from chronologically ordered tops and bottoms.
pub fn classify(tops: &[Pivot], bottoms: &[Pivot], rule: CycleRule) -> Cycle {
    match rule {
        CycleRule::ThreePivot => {
            let (Some(t), Some(b)) = (last_prices::<3>(tops), last_prices::<3>(bottoms)) else {
                return Cycle::Indeterminate;
            };
            if rising(&t) && (rising(&b) || b[1] < t[2]) {
                Cycle::Uptrend
            } else if falling(&t) && falling(&b) {
                Cycle::Downtrend
            } else {
                Cycle::Indeterminate
            }
        }
        CycleRule::TwoPivot => {
            let (Some(t), Some(b)) = (last_prices::<2>(tops), last_prices::<2>(bottoms)) else {
                return Cycle::Indeterminate;
            };
            if rising(&t) && rising(&b) {
                Cycle::Uptrend
            } else if falling(&t) && falling(&b) {
                Cycle::Downtrend
            } else {
                Cycle::Indeterminate
            }
        }
    }
}
