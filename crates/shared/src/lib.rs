//! Shared types, errors, and configuration for Kabati reports.
//!
//! This crate provides common types used across all other crates:
//! - Money types with decimal precision and display formatting
//! - Typed IDs for type-safe entity references
//! - Page requests for paged fetches from the hosted store
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
