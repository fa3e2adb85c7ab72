//! Core report pipeline for Kabati.
//!
//! This crate contains pure report logic with ZERO web-server or wire-protocol
//! dependencies. The data store and the PDF generator are reached through
//! traits; concrete network clients live in `kabati-remote`.
//!
//! # Modules
//!
//! - `period` - Date-range presets anchored to a civil timezone
//! - `store` - Data-store query model and an in-memory store
//! - `reports` - Report descriptors, registry and the aggregation pipeline
//! - `export` - CSV, HTML, PDF and JSON sinks plus archive storage
//! - `orchestrator` - Per-panel state machine with cancellation and timeouts

pub mod export;
pub mod orchestrator;
pub mod period;
pub mod reports;
pub mod store;
