//! cyclesig runner — scheduling, registry and file-backed collaborators.
//!
//! This crate builds on `cyclesig-core` to provide:
//! - One scan pass across the observed universe with per-instrument isolation
//! - Asset registry and per-instrument configuration loading
//! - Market scanner that ranks the universe by spread and volume
//! - CSV bar source and JSONL signal store
//! - Refresh stamp gating universe re-ranks
//! - TOML runner configuration

pub mod config;
pub mod csv_source;
pub mod jsonl_store;
pub mod registry;
pub mod runner;
pub mod scan;
pub mod scanner;
pub mod stamp;

pub use config::{ConfigError, PathsConfig, RunnerConfig, ScanConfig};
pub use csv_source::CsvBarSource;
pub use jsonl_store::JsonlSignalStore;
pub use registry::{AssetRegistry, RegistryError};
pub use runner::{RunError, Runner};
pub use scan::{InstrumentOutcome, ScanError, ScanPass, ScanSummary};
pub use scanner::{
    classify_path, MarketScanner, MarketSymbol, ScannerConfig, ScannerError, Universe,
};
pub use stamp::RefreshStamp;
