//! Bar acquisition contract

pub mod provider;

pub use provider::{keep_last, BarSource, DataError, StaticBarSource};
