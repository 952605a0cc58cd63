//! Series — a validated, chronologically ordered run of bars.

use chrono::NaiveDateTime;
use thiserror::Error;

use super::Bar;

/// Malformed bar input. Indicators fail fast on these; nothing partial is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("timestamps not strictly increasing at bar {index} ({previous} -> {current})")]
    UnsortedTimestamps {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("negative volume at bar {index}: {volume}")]
    NegativeVolume { index: usize, volume: f64 },

    #[error("non-finite price at bar {index}")]
    NonFinitePrice { index: usize },
}

/// Check the preconditions every indicator relies on.
///
/// Timestamps must be strictly increasing, volumes non-negative, and OHLC
/// values finite. High/low ordering is not checked.
pub fn validate_bars(bars: &[Bar]) -> Result<(), SeriesError> {
    for (index, bar) in bars.iter().enumerate() {
        if bar.is_void() {
            return Err(SeriesError::NonFinitePrice { index });
        }
        for volume in [bar.tick_volume, bar.real_volume] {
            if volume < 0.0 || volume.is_nan() {
                return Err(SeriesError::NegativeVolume { index, volume });
            }
        }
        if index > 0 {
            let previous = bars[index - 1].time;
            if bar.time <= previous {
                return Err(SeriesError::UnsortedTimestamps {
                    index,
                    previous,
                    current: bar.time,
                });
            }
        }
    }
    Ok(())
}

/// Ordered sequence of bars, validated once at construction.
///
/// Read-only to the indicator engine. An empty series is valid and means
/// "insufficient data", not an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    pub fn new(bars: Vec<Bar>) -> Result<Self, SeriesError> {
        validate_bars(&bars)?;
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }
}

impl TryFrom<Vec<Bar>> for Series {
    type Error = SeriesError;

    fn try_from(bars: Vec<Bar>) -> Result<Self, Self::Error> {
        Self::new(bars)
    }
}
