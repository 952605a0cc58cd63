//! Domain types for cyclesig

pub mod bar;
pub mod ids;
pub mod instrument;
pub mod series;
pub mod signal;
pub mod timeframe;

pub use bar::Bar;
pub use ids::SignalId;
pub use instrument::{
    point_size, AssetClass, AssetRecord, InstrumentConfig, InstrumentDefaults, InstrumentError,
    REFERENCE_POINT,
};
pub use series::{Series, SeriesError};
pub use signal::{Cycle, Direction, Signal, SignalStatus};
pub use timeframe::{ParseTimeframeError, Timeframe};
