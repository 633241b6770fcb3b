//! Days of the week as used by weekly schedules.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A weekday, persisted as its lowercase three-letter abbreviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Mon,
        DayOfWeek::Tue,
        DayOfWeek::Wed,
        DayOfWeek::Thu,
        DayOfWeek::Fri,
        DayOfWeek::Sat,
        DayOfWeek::Sun,
    ];

    pub fn abbrev(&self) -> &'static str {
        match self {
            Self::Mon => "mon",
            Self::Tue => "tue",
            Self::Wed => "wed",
            Self::Thu => "thu",
            Self::Fri => "fri",
            Self::Sat => "sat",
            Self::Sun => "sun",
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        date.weekday().into()
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => Self::Mon,
            Weekday::Tue => Self::Tue,
            Weekday::Wed => Self::Wed,
            Weekday::Thu => Self::Thu,
            Weekday::Fri => Self::Fri,
            Weekday::Sat => Self::Sat,
            Weekday::Sun => Self::Sun,
        }
    }
}

impl From<DayOfWeek> for Weekday {
    fn from(day: DayOfWeek) -> Self {
        match day {
            DayOfWeek::Mon => Weekday::Mon,
            DayOfWeek::Tue => Weekday::Tue,
            DayOfWeek::Wed => Weekday::Wed,
            DayOfWeek::Thu => Weekday::Thu,
            DayOfWeek::Fri => Weekday::Fri,
            DayOfWeek::Sat => Weekday::Sat,
            DayOfWeek::Sun => Weekday::Sun,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid day of week '{0}'")]
pub struct ParseDayOfWeekError(String);

impl FromStr for DayOfWeek {
    type Err = ParseDayOfWeekError;

    /// Accepts abbreviations and full English names in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<Weekday>()
            .map(Into::into)
            .map_err(|_| ParseDayOfWeekError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_abbrev_and_full_name() {
        assert_eq!("mon".parse::<DayOfWeek>().unwrap(), DayOfWeek::Mon);
        assert_eq!("FRI".parse::<DayOfWeek>().unwrap(), DayOfWeek::Fri);
        assert_eq!("Sunday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Sun);
        assert!("funday".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn test_of_date() {
        // 2026-10-19 is a Monday
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(DayOfWeek::of(date), DayOfWeek::Mon);
        assert_eq!(DayOfWeek::of(date.succ_opt().unwrap()), DayOfWeek::Tue);
    }

    #[test]
    fn test_serde_lowercase_abbrev() {
        assert_eq!(serde_json::to_string(&DayOfWeek::Thu).unwrap(), "\"thu\"");
        let day: DayOfWeek = serde_json::from_str("\"sat\"").unwrap();
        assert_eq!(day, DayOfWeek::Sat);
    }
}
