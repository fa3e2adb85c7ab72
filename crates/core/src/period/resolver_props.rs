//! Property-based tests for preset resolution.

use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone, Utc};
use chrono_tz::Africa::Nairobi;
use proptest::prelude::*;

use super::preset::PresetKey;
use super::resolver::PeriodResolver;

/// Instants between 2000 and 2099.
fn instant_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800i64..4_102_444_800i64).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2090, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn preset_strategy() -> impl Strategy<Value = PresetKey> {
    proptest::sample::select(PresetKey::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every preset resolves to an ordered range.
    #[test]
    fn prop_start_never_after_end(
        preset in preset_strategy(),
        now in instant_strategy(),
        a in date_strategy(),
        b in date_strategy(),
    ) {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        let range = PeriodResolver::new(Nairobi)
            .resolve(preset, Some(start), Some(end), now)
            .unwrap();
        prop_assert!(range.start() <= range.end());
    }

    /// The current month contains `now` and excludes the same day one month either side.
    #[test]
    fn prop_month_contains_now_only(now in instant_strategy()) {
        let resolver = PeriodResolver::new(Nairobi);
        let range = resolver.resolve(PresetKey::Month, None, None, now).unwrap();
        prop_assert!(range.contains(now));

        let local = now.with_timezone(&Nairobi);
        let next = local.checked_add_months(Months::new(1)).unwrap();
        let prev = local.checked_sub_months(Months::new(1)).unwrap();
        prop_assert!(!range.contains(next.with_timezone(&Utc)));
        prop_assert!(!range.contains(prev.with_timezone(&Utc)));
        prop_assert_eq!(range.first_day(Nairobi).day(), 1);
    }

    /// Last month and this month are adjacent: no gap, no overlap.
    #[test]
    fn prop_last_month_adjacent_to_month(now in instant_strategy()) {
        let resolver = PeriodResolver::new(Nairobi);
        let last = resolver.resolve(PresetKey::LastMonth, None, None, now).unwrap();
        let this = resolver.resolve(PresetKey::Month, None, None, now).unwrap();
        prop_assert!(last.is_followed_by(&this));
        prop_assert!(!last.overlaps(&this));
    }

    /// Same adjacency holds for weeks, quarters, and years.
    #[test]
    fn prop_previous_unit_adjacent(now in instant_strategy()) {
        let resolver = PeriodResolver::new(Nairobi);
        for (previous, current) in [
            (PresetKey::Yesterday, PresetKey::Today),
            (PresetKey::LastWeek, PresetKey::Week),
            (PresetKey::LastQuarter, PresetKey::Quarter),
            (PresetKey::LastYear, PresetKey::Year),
        ] {
            let before = resolver.resolve(previous, None, None, now).unwrap();
            let after = resolver.resolve(current, None, None, now).unwrap();
            prop_assert!(before.is_followed_by(&after), "{previous} then {current}");
            prop_assert!(after.contains(now));
        }
    }

    /// A custom range covers exactly the requested local days.
    #[test]
    fn prop_custom_covers_whole_days(a in date_strategy(), b in date_strategy()) {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        let range = PeriodResolver::new(Nairobi).custom(start, end).unwrap();
        prop_assert_eq!(range.first_day(Nairobi), start);
        prop_assert_eq!(range.last_day(Nairobi), end);
    }
}
