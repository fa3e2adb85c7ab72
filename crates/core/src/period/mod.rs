//! Report periods.
//!
//! Turns a named preset ("this month", "last week", ...) into a concrete
//! half-open `[start, end)` instant range, anchored to a fixed civil timezone.

pub mod error;
pub mod preset;
pub mod range;
pub mod resolver;

#[cfg(test)]
mod resolver_props;

pub use error::PeriodError;
pub use preset::PresetKey;
pub use range::DateRange;
pub use resolver::PeriodResolver;
