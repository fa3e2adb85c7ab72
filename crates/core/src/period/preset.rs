//! Named date-range presets.

use serde::{Deserialize, Serialize};

use super::error::PeriodError;

/// A named, pre-defined date-range shorthand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetKey {
    /// The current local day.
    Today,
    /// The previous local day.
    Yesterday,
    /// The current week.
    Week,
    /// The week before the current one.
    LastWeek,
    /// The current calendar month.
    Month,
    /// The previous calendar month.
    LastMonth,
    /// The current calendar quarter.
    Quarter,
    /// The previous calendar quarter.
    LastQuarter,
    /// The current calendar year.
    Year,
    /// The previous calendar year.
    LastYear,
    /// Caller-supplied start and end dates.
    Custom,
    /// Everything from the application epoch onwards.
    All,
}

impl PresetKey {
    /// All presets, in the order a picker would list them.
    pub const ALL: [Self; 12] = [
        Self::Today,
        Self::Yesterday,
        Self::Week,
        Self::LastWeek,
        Self::Month,
        Self::LastMonth,
        Self::Quarter,
        Self::LastQuarter,
        Self::Year,
        Self::LastYear,
        Self::Custom,
        Self::All,
    ];

    /// Canonical snake_case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Week => "week",
            Self::LastWeek => "last_week",
            Self::Month => "month",
            Self::LastMonth => "last_month",
            Self::Quarter => "quarter",
            Self::LastQuarter => "last_quarter",
            Self::Year => "year",
            Self::LastYear => "last_year",
            Self::Custom => "custom",
            Self::All => "all",
        }
    }
}

impl std::fmt::Display for PresetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PresetKey {
    type Err = PeriodError;

    /// Accepts `last_month`, `lastMonth`, `last-month` and `this_month` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        let folded = folded.strip_prefix("this").unwrap_or(&folded);

        match folded {
            "today" | "day" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            "week" => Ok(Self::Week),
            "lastweek" => Ok(Self::LastWeek),
            "month" => Ok(Self::Month),
            "lastmonth" => Ok(Self::LastMonth),
            "quarter" => Ok(Self::Quarter),
            "lastquarter" => Ok(Self::LastQuarter),
            "year" => Ok(Self::Year),
            "lastyear" => Ok(Self::LastYear),
            "custom" => Ok(Self::Custom),
            "all" | "alltime" => Ok(Self::All),
            _ => Err(PeriodError::UnknownPreset(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case("today", PresetKey::Today)]
    #[case("lastMonth", PresetKey::LastMonth)]
    #[case("last_month", PresetKey::LastMonth)]
    #[case("last-week", PresetKey::LastWeek)]
    #[case("this_quarter", PresetKey::Quarter)]
    #[case("ALL", PresetKey::All)]
    fn test_preset_from_str(#[case] input: &str, #[case] expected: PresetKey) {
        assert_eq!(PresetKey::from_str(input).unwrap(), expected);
    }

    #[test]
    fn test_unknown_preset() {
        assert_eq!(
            PresetKey::from_str("fortnight"),
            Err(PeriodError::UnknownPreset("fortnight".to_string()))
        );
    }

    #[test]
    fn test_canonical_names_round_trip() {
        for preset in PresetKey::ALL {
            assert_eq!(PresetKey::from_str(preset.as_str()).unwrap(), preset);
        }
    }
}
