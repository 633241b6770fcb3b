//! Scheduled commands and the requests that create or change them.

use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

use super::error::{Result, SchedulerError};
use crate::common::constants::MAXIMUM_OFFSET_MINUTES;
use crate::geo::SunriseSunsetInfo;
use crate::time::{DayOfWeek, TimeOfDay};

/// Attribute payload delivered with a fired command.
pub type Attributes = serde_json::Map<String, Value>;

/// How a command's trigger time is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    /// Fixed wall-clock time.
    #[default]
    Absolute,
    /// Offset in minutes from the day's sunrise.
    Sunrise,
    /// Offset in minutes from the day's sunset.
    Sunset,
}

impl Mode {
    pub fn is_relative(&self) -> bool {
        !matches!(self, Self::Absolute)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Absolute => write!(f, "ABSOLUTE"),
            Mode::Sunrise => write!(f, "SUNRISE"),
            Mode::Sunset => write!(f, "SUNSET"),
        }
    }
}

/// One recurring action of a weekly schedule.
///
/// For [`Mode::Absolute`] the `time` is authoritative and `offset_minutes` is
/// absent. For relative modes `offset_minutes` is authoritative and `time` only
/// caches the trigger time computed the last time the command was evaluated;
/// it must be recomputed for the date at hand before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledCommand {
    pub id: String,
    pub schedule_id: String,
    pub message_type: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeOfDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_minutes: Option<i32>,
    #[serde(default)]
    pub days: BTreeSet<DayOfWeek>,
    /// Creation order within the scheduler; breaks ties between equal times.
    #[serde(default)]
    pub seq: u64,
}

impl ScheduledCommand {
    pub fn is_relative(&self) -> bool {
        self.mode.is_relative()
    }

    /// Trigger time of a relative command for the day described by `info`,
    /// as wall-clock time in `tz`.
    pub fn relative_time(&self, info: &SunriseSunsetInfo, tz: Tz) -> TimeOfDay {
        let event = match self.mode {
            Mode::Sunrise => info.sunrise,
            _ => info.sunset,
        };
        let offset = Duration::minutes(i64::from(self.offset_minutes.unwrap_or(0)));
        TimeOfDay::from((event.with_timezone(&tz) + offset).time())
    }

    /// Ordering key within a day bucket.
    pub fn sort_key(&self) -> (TimeOfDay, u64) {
        (self.time.unwrap_or(TimeOfDay::MIDNIGHT), self.seq)
    }

    /// Check the mode/time/offset invariants of a fully merged command.
    pub fn validate(&self) -> Result<()> {
        if self.message_type.trim().is_empty() {
            return Err(SchedulerError::invalid("messageType must not be empty"));
        }
        if self.days.is_empty() {
            return Err(SchedulerError::invalid("At least one day must be specified"));
        }
        if self.is_relative() {
            if self.offset_minutes.is_none() {
                return Err(SchedulerError::invalid(format!(
                    "offsetMinutes is required for {} commands",
                    self.mode
                )));
            }
        } else {
            if self.time.is_none() {
                return Err(SchedulerError::invalid(
                    "time is required for ABSOLUTE commands",
                ));
            }
            if self.offset_minutes.is_some() {
                return Err(SchedulerError::invalid(
                    "offsetMinutes is not allowed for ABSOLUTE commands",
                ));
            }
        }
        validate_offset(self.offset_minutes)
    }
}

/// Request to create, update or delete a [`ScheduledCommand`].
///
/// Every field is optional: a create request leaves `id` empty, an update
/// request names the `id` and only the fields to change, and within a batch an
/// `id` with an empty `days` set requests deletion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommandSpec {
    pub id: Option<String>,
    pub schedule_id: Option<String>,
    pub message_type: Option<String>,
    pub attributes: Option<Attributes>,
    pub mode: Option<Mode>,
    pub time: Option<TimeOfDay>,
    pub offset_minutes: Option<i32>,
    pub days: Option<BTreeSet<DayOfWeek>>,
}

impl CommandSpec {
    /// Create request for a command at a fixed time.
    pub fn absolute(
        schedule_id: impl Into<String>,
        time: TimeOfDay,
        days: impl IntoIterator<Item = DayOfWeek>,
    ) -> Self {
        Self {
            schedule_id: Some(schedule_id.into()),
            mode: Some(Mode::Absolute),
            time: Some(time),
            days: Some(days.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Create request for a command relative to sunrise or sunset.
    pub fn relative(
        schedule_id: impl Into<String>,
        mode: Mode,
        offset_minutes: i32,
        days: impl IntoIterator<Item = DayOfWeek>,
    ) -> Self {
        Self {
            schedule_id: Some(schedule_id.into()),
            mode: Some(mode),
            offset_minutes: Some(offset_minutes),
            days: Some(days.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Update request for an existing command; set the fields to change afterwards.
    pub fn update(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message_type: impl Into<String>, attributes: Attributes) -> Self {
        self.message_type = Some(message_type.into());
        self.attributes = Some(attributes);
        self
    }

    /// A batch entry naming an existing command with no days deletes it.
    pub fn is_delete(&self) -> bool {
        self.has_id() && self.days.as_ref().is_some_and(BTreeSet::is_empty)
    }

    pub fn has_id(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.trim().is_empty())
    }

    /// Shape checks that do not depend on the command being updated.
    pub fn validate(&self) -> Result<()> {
        if !self.has_id() {
            if let Some(days) = &self.days
                && days.is_empty()
            {
                return Err(SchedulerError::invalid("At least one day must be specified"));
            }
            if !self.mode.unwrap_or_default().is_relative() && self.time.is_none() {
                return Err(SchedulerError::invalid(
                    "time is required for ABSOLUTE commands",
                ));
            }
        }
        validate_offset(self.offset_minutes)
    }
}

fn validate_offset(offset_minutes: Option<i32>) -> Result<()> {
    match offset_minutes {
        Some(offset) if offset.abs() > MAXIMUM_OFFSET_MINUTES => {
            Err(SchedulerError::invalid(format!(
                "offsetMinutes ({offset}) must be between -{MAXIMUM_OFFSET_MINUTES} and {MAXIMUM_OFFSET_MINUTES}"
            )))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn command(mode: Mode) -> ScheduledCommand {
        ScheduledCommand {
            id: "cmd-1".to_string(),
            schedule_id: "weekday".to_string(),
            message_type: "base:SetAttributes".to_string(),
            attributes: Attributes::new(),
            mode,
            time: None,
            offset_minutes: None,
            days: BTreeSet::from([DayOfWeek::Fri]),
            seq: 0,
        }
    }

    #[test]
    fn test_relative_time_applies_offset_in_timezone() {
        let info = SunriseSunsetInfo {
            sunrise: Utc.with_ymd_and_hms(2026, 10, 23, 12, 10, 0).unwrap(),
            sunset: Utc.with_ymd_and_hms(2026, 10, 23, 23, 0, 0).unwrap(),
        };
        let mut sunset = command(Mode::Sunset);
        sunset.offset_minutes = Some(-30);
        // 23:00 UTC is 18:00 CDT
        assert_eq!(
            sunset.relative_time(&info, chrono_tz::America::Chicago),
            "17:30:00".parse().unwrap()
        );

        let mut sunrise = command(Mode::Sunrise);
        sunrise.offset_minutes = Some(15);
        assert_eq!(
            sunrise.relative_time(&info, chrono_tz::America::Chicago),
            "07:25:00".parse().unwrap()
        );
    }

    #[test]
    fn test_validate_mode_invariants() {
        let mut absolute = command(Mode::Absolute);
        assert!(absolute.validate().is_err());
        absolute.time = Some("07:30:00".parse().unwrap());
        assert!(absolute.validate().is_ok());
        absolute.offset_minutes = Some(5);
        assert!(absolute.validate().is_err());

        let mut relative = command(Mode::Sunrise);
        assert!(relative.validate().is_err());
        relative.offset_minutes = Some(-45);
        assert!(relative.validate().is_ok());
        relative.offset_minutes = Some(MAXIMUM_OFFSET_MINUTES + 1);
        assert!(relative.validate().is_err());
    }

    #[test]
    fn test_validate_requires_days() {
        let mut absolute = command(Mode::Absolute);
        absolute.time = Some("07:30:00".parse().unwrap());
        absolute.days.clear();
        assert_eq!(
            absolute.validate(),
            Err(SchedulerError::invalid("At least one day must be specified"))
        );
    }

    #[test]
    fn test_spec_delete_sentinel() {
        let mut spec = CommandSpec::update("cmd-1");
        assert!(!spec.is_delete());
        spec.days = Some(BTreeSet::new());
        assert!(spec.is_delete());
        assert!(spec.validate().is_ok());

        let create = CommandSpec {
            days: Some(BTreeSet::new()),
            ..CommandSpec::absolute("weekday", "07:00:00".parse().unwrap(), [])
        };
        assert!(!create.is_delete());
        assert!(create.validate().is_err());
    }

    #[test]
    fn test_spec_create_requires_time_for_absolute() {
        let spec = CommandSpec {
            schedule_id: Some("weekday".to_string()),
            days: Some(BTreeSet::from([DayOfWeek::Mon])),
            ..CommandSpec::default()
        };
        assert!(spec.validate().is_err());

        let relative = CommandSpec::relative("weekday", Mode::Sunset, -30, [DayOfWeek::Fri]);
        assert!(relative.validate().is_ok());
    }

    #[test]
    fn test_spec_deserializes_from_request_map() {
        let json = r#"{
            "scheduleId": "climate",
            "mode": "SUNSET",
            "offsetMinutes": -30,
            "days": ["fri", "sat"],
            "messageType": "therm:SetPoint",
            "attributes": {"heat": 20}
        }"#;
        let spec: CommandSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.mode, Some(Mode::Sunset));
        assert_eq!(spec.offset_minutes, Some(-30));
        assert_eq!(
            spec.days,
            Some(BTreeSet::from([DayOfWeek::Fri, DayOfWeek::Sat]))
        );
        assert!(spec.id.is_none());
    }
}
