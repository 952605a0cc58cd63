//! cyclesig core — indicators, cycle classifier and signal pipeline.
//!
//! This crate contains the decision engine:
//! - Domain types (bars, series, signals, instrument configuration)
//! - Indicator engine: daily/weekly VWAP, rolling ADX, pivot detection
//! - Cycle classifier over the most recent pivots
//! - Eight-stage signal pipeline with short-circuit suppression
//! - Collaborator contracts for bar sources and signal stores
//! - Injected decision reporting

pub mod cycle;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod pipeline;
pub mod report;
pub mod store;
