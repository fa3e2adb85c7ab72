//! Preset resolution anchored to a civil timezone.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use super::error::PeriodError;
use super::preset::PresetKey;
use super::range::DateRange;

/// Calendar unit a preset is aligned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

/// Maps presets to concrete `[start, end)` ranges.
///
/// All unit boundaries are local midnights in `tz`, converted to UTC, so a
/// report run from a server in another zone still cuts days where the shop does.
#[derive(Debug, Clone, Copy)]
pub struct PeriodResolver {
    tz: Tz,
    epoch: NaiveDate,
    week_start: Weekday,
}

impl PeriodResolver {
    /// Creates a resolver for the given timezone with a Monday week start
    /// and a 2020-01-01 epoch.
    #[must_use]
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            epoch: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            week_start: Weekday::Mon,
        }
    }

    /// Sets the earliest date covered by `PresetKey::All`.
    #[must_use]
    pub const fn with_epoch(mut self, epoch: NaiveDate) -> Self {
        self.epoch = epoch;
        self
    }

    /// Sets the first day of the week.
    #[must_use]
    pub const fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    /// Anchor timezone.
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.tz
    }

    /// Local calendar date of `now`.
    #[must_use]
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }

    /// Resolves a preset into a concrete range.
    ///
    /// Pure: the result depends only on the arguments and the resolver's settings.
    ///
    /// # Errors
    ///
    /// Returns `PeriodError::MissingBound` if `Custom` lacks a bound,
    /// `PeriodError::StartAfterEnd` if custom bounds are inverted, and
    /// `PeriodError::OutOfRange` if calendar arithmetic overflows.
    pub fn resolve(
        &self,
        preset: PresetKey,
        explicit_start: Option<NaiveDate>,
        explicit_end: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<DateRange, PeriodError> {
        let today = self.local_date(now);

        match preset {
            PresetKey::Today => self.unit_range(Unit::Day, today),
            PresetKey::Yesterday => self.unit_range(Unit::Day, shift_days(today, 1)?),
            PresetKey::Week => self.unit_range(Unit::Week, today),
            PresetKey::LastWeek => self.unit_range(Unit::Week, shift_days(today, 7)?),
            PresetKey::Month => self.unit_range(Unit::Month, today),
            PresetKey::LastMonth => self.unit_range(Unit::Month, shift_months(today, 1)?),
            PresetKey::Quarter => self.unit_range(Unit::Quarter, today),
            PresetKey::LastQuarter => self.unit_range(Unit::Quarter, shift_months(today, 3)?),
            PresetKey::Year => self.unit_range(Unit::Year, today),
            PresetKey::LastYear => self.unit_range(Unit::Year, shift_months(today, 12)?),
            PresetKey::Custom => {
                let start = explicit_start.ok_or(PeriodError::MissingBound("start"))?;
                let end = explicit_end.ok_or(PeriodError::MissingBound("end"))?;
                self.custom(start, end)
            }
            PresetKey::All => self.all(now),
        }
    }

    /// Range covering whole local days `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns `PeriodError::StartAfterEnd` if `start > end`.
    pub fn custom(&self, start: NaiveDate, end: NaiveDate) -> Result<DateRange, PeriodError> {
        if start > end {
            return Err(PeriodError::StartAfterEnd { start, end });
        }
        let after_end = end
            .checked_add_days(Days::new(1))
            .ok_or(PeriodError::OutOfRange(end))?;
        DateRange::new(self.local_midnight(start), self.local_midnight(after_end))
    }

    fn all(&self, now: DateTime<Utc>) -> Result<DateRange, PeriodError> {
        let horizon = now
            .checked_add_months(Months::new(12))
            .ok_or_else(|| PeriodError::OutOfRange(self.local_date(now)))?;
        let start = self.local_midnight(self.epoch).min(now);
        DateRange::new(start, horizon)
    }

    fn unit_range(&self, unit: Unit, anchor: NaiveDate) -> Result<DateRange, PeriodError> {
        let first = self.unit_start(unit, anchor)?;
        let next = match unit {
            Unit::Day => first.checked_add_days(Days::new(1)),
            Unit::Week => first.checked_add_days(Days::new(7)),
            Unit::Month => first.checked_add_months(Months::new(1)),
            Unit::Quarter => first.checked_add_months(Months::new(3)),
            Unit::Year => first.checked_add_months(Months::new(12)),
        }
        .ok_or(PeriodError::OutOfRange(first))?;

        DateRange::new(self.local_midnight(first), self.local_midnight(next))
    }

    fn unit_start(&self, unit: Unit, anchor: NaiveDate) -> Result<NaiveDate, PeriodError> {
        let start = match unit {
            Unit::Day => Some(anchor),
            Unit::Week => {
                let back = (7 + anchor.weekday().num_days_from_monday()
                    - self.week_start.num_days_from_monday())
                    % 7;
                anchor.checked_sub_days(Days::new(u64::from(back)))
            }
            Unit::Month => anchor.with_day(1),
            Unit::Quarter => {
                let first_month = (anchor.month0() / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(anchor.year(), first_month, 1)
            }
            Unit::Year => NaiveDate::from_ymd_opt(anchor.year(), 1, 1),
        };
        start.ok_or(PeriodError::OutOfRange(anchor))
    }

    /// Start of the local day as a UTC instant.
    ///
    /// A midnight skipped by a DST jump resolves to the first valid local instant
    /// after it; an ambiguous midnight resolves to the earlier instant.
    #[must_use]
    pub fn local_midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(chrono::NaiveTime::MIN);
        for hour in 0..4 {
            let candidate = midnight + chrono::TimeDelta::hours(hour);
            if let Some(local) = self.tz.from_local_datetime(&candidate).earliest() {
                return local.with_timezone(&Utc);
            }
        }
        Utc.from_utc_datetime(&midnight)
    }
}

fn shift_days(date: NaiveDate, days: u64) -> Result<NaiveDate, PeriodError> {
    date.checked_sub_days(Days::new(days))
        .ok_or(PeriodError::OutOfRange(date))
}

fn shift_months(date: NaiveDate, months: u32) -> Result<NaiveDate, PeriodError> {
    date.checked_sub_months(Months::new(months))
        .ok_or(PeriodError::OutOfRange(date))
}
