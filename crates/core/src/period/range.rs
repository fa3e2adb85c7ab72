//! Half-open instant ranges.

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::error::PeriodError;

/// A half-open `[start, end)` range of instants.
///
/// Invariant: `start <= end`. Values are produced once per report request
/// and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    /// Creates a range, rejecting inverted bounds.
    ///
    /// # Errors
    ///
    /// Returns `PeriodError::Inverted` if `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, PeriodError> {
        if start > end {
            return Err(PeriodError::Inverted);
        }
        Ok(Self { start, end })
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive upper bound.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// The last millisecond inside the range (`23:59:59.999` for day-aligned ranges).
    #[must_use]
    pub fn last_instant(&self) -> DateTime<Utc> {
        if self.start == self.end {
            return self.end;
        }
        self.end - TimeDelta::milliseconds(1)
    }

    /// Returns true if the instant falls within the range.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// Returns true if `other` starts exactly where this range ends.
    #[must_use]
    pub fn is_followed_by(&self, other: &Self) -> bool {
        self.end == other.start
    }

    /// Returns true if the two ranges share at least one instant.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// First local calendar day of the range.
    #[must_use]
    pub fn first_day(&self, tz: Tz) -> NaiveDate {
        self.start.with_timezone(&tz).date_naive()
    }

    /// Last local calendar day of the range.
    #[must_use]
    pub fn last_day(&self, tz: Tz) -> NaiveDate {
        self.last_instant().with_timezone(&tz).date_naive()
    }

    /// Human-readable period, e.g. `01 Oct 2026 to 31 Oct 2026`.
    #[must_use]
    pub fn label(&self, tz: Tz) -> String {
        let first = self.first_day(tz);
        let last = self.last_day(tz);
        if first == last {
            first.format("%d %b %Y").to_string()
        } else {
            format!("{} to {}", first.format("%d %b %Y"), last.format("%d %b %Y"))
        }
    }

    /// Lower bound as an RFC 3339 string with millisecond precision.
    #[must_use]
    pub fn start_rfc3339(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Upper bound as an RFC 3339 string with millisecond precision.
    #[must_use]
    pub fn end_rfc3339(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
