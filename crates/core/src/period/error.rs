//! Period error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Malformed or missing date bounds. Generation never starts on these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    /// A custom range is missing one of its bounds.
    #[error("Invalid date range: custom range requires a {0} date")]
    MissingBound(&'static str),

    /// Start falls after end.
    #[error("Invalid date range: start {start} is after end {end}")]
    StartAfterEnd {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Start instant falls after end instant.
    #[error("Invalid date range: start is after end")]
    Inverted,

    /// Date arithmetic left the representable calendar.
    #[error("Invalid date range: {0} is out of range")]
    OutOfRange(NaiveDate),

    /// Unrecognised preset name.
    #[error("Unknown date preset: {0}")]
    UnknownPreset(String),
}
