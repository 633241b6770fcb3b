//! Wall-clock time of day.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A time of day with second precision, formatted as `HH:MM:SS`.
///
/// Field order makes the derived ordering chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hours: u8,
    minutes: u8,
    seconds: u8,
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay {
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    /// Returns `None` when any component is out of range.
    pub fn new(hours: u8, minutes: u8, seconds: u8) -> Option<Self> {
        (hours < 24 && minutes < 60 && seconds < 60).then_some(Self {
            hours,
            minutes,
            seconds,
        })
    }

    pub fn hours(&self) -> u8 {
        self.hours
    }

    pub fn minutes(&self) -> u8 {
        self.minutes
    }

    pub fn seconds(&self) -> u8 {
        self.seconds
    }

    /// Same time with the seconds dropped, which is the precision schedules fire at.
    pub fn truncate_seconds(&self) -> Self {
        Self {
            seconds: 0,
            ..*self
        }
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        // Components are range-checked on construction
        NaiveTime::from_hms_opt(
            u32::from(self.hours),
            u32::from(self.minutes),
            u32::from(self.seconds),
        )
        .unwrap_or(NaiveTime::MIN)
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(time: NaiveTime) -> Self {
        Self {
            hours: time.hour() as u8,
            minutes: time.minute() as u8,
            // Leap seconds collapse onto :59
            seconds: time.second().min(59) as u8,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

/// Error returned when a string is not a valid `HH:MM[:SS]` time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time of day '{0}', expected HH:MM:SS")]
pub struct ParseTimeOfDayError(String);

impl FromStr for TimeOfDay {
    type Err = ParseTimeOfDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseTimeOfDayError(s.to_string());
        let mut parts = s.trim().split(':');

        let mut next_component = |required: bool| -> Result<u8, ParseTimeOfDayError> {
            match parts.next() {
                Some(part) if !part.is_empty() && part.len() <= 2 => {
                    part.parse::<u8>().map_err(|_| invalid())
                }
                None if !required => Ok(0),
                _ => Err(invalid()),
            }
        };

        let hours = next_component(true)?;
        let minutes = next_component(true)?;
        let seconds = next_component(false)?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        TimeOfDay::new(hours, minutes, seconds).ok_or_else(invalid)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_pads_components() {
        let tod = TimeOfDay::new(7, 5, 9).unwrap();
        assert_eq!(tod.to_string(), "07:05:09");
    }

    #[test]
    fn test_parse_accepts_short_form() {
        assert_eq!(
            "7:30".parse::<TimeOfDay>().unwrap(),
            TimeOfDay::new(7, 30, 0).unwrap()
        );
        assert_eq!(
            "23:59:59".parse::<TimeOfDay>().unwrap(),
            TimeOfDay::new(23, 59, 59).unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_out_of_range_and_garbage() {
        for bad in ["24:00:00", "12:60:00", "12:00:60", "noon", "12", "1:2:3:4", "", "12::00"] {
            assert!(bad.parse::<TimeOfDay>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_ordering_is_chronological() {
        let early = TimeOfDay::new(6, 59, 59).unwrap();
        let late = TimeOfDay::new(7, 0, 0).unwrap();
        assert!(early < late);
        assert!(TimeOfDay::MIDNIGHT < early);
    }

    #[test]
    fn test_serde_uses_string_form() {
        let tod = TimeOfDay::new(18, 0, 0).unwrap();
        let json = serde_json::to_string(&tod).unwrap();
        assert_eq!(json, "\"18:00:00\"");
        let back: TimeOfDay = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tod);
    }

    #[test]
    fn test_truncate_seconds() {
        let tod = TimeOfDay::new(17, 29, 42).unwrap();
        assert_eq!(tod.truncate_seconds(), TimeOfDay::new(17, 29, 0).unwrap());
    }

    proptest! {
        #[test]
        fn test_parse_format_round_trip(h in 0u8..24, m in 0u8..60, s in 0u8..60) {
            let tod = TimeOfDay::new(h, m, s).unwrap();
            prop_assert_eq!(tod.to_string().parse::<TimeOfDay>().unwrap(), tod);
        }
    }
}
