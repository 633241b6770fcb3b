//! Persisted shape of a scheduler and its schedule instances.
//!
//! A [`Scheduler`] is the aggregate root for one device or place. Its
//! `commands` map is the single source of truth for scheduled commands; the
//! seven day lists on every [`WeeklySchedule`] are a projection of that map,
//! rebuilt wholesale whenever the instance is committed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::command::{Attributes, ScheduledCommand};
use crate::common::constants::{SCHEDULE_CAPABILITY, WEEKLY_SCHEDULE_CAPABILITY};
use crate::time::DayOfWeek;

/// Commands of one schedule instance, bucketed by weekday and sorted by time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekBuckets {
    #[serde(default)]
    pub mon: Vec<ScheduledCommand>,
    #[serde(default)]
    pub tue: Vec<ScheduledCommand>,
    #[serde(default)]
    pub wed: Vec<ScheduledCommand>,
    #[serde(default)]
    pub thu: Vec<ScheduledCommand>,
    #[serde(default)]
    pub fri: Vec<ScheduledCommand>,
    #[serde(default)]
    pub sat: Vec<ScheduledCommand>,
    #[serde(default)]
    pub sun: Vec<ScheduledCommand>,
}

impl WeekBuckets {
    pub fn get(&self, day: DayOfWeek) -> &[ScheduledCommand] {
        match day {
            DayOfWeek::Mon => &self.mon,
            DayOfWeek::Tue => &self.tue,
            DayOfWeek::Wed => &self.wed,
            DayOfWeek::Thu => &self.thu,
            DayOfWeek::Fri => &self.fri,
            DayOfWeek::Sat => &self.sat,
            DayOfWeek::Sun => &self.sun,
        }
    }

    pub fn get_mut(&mut self, day: DayOfWeek) -> &mut Vec<ScheduledCommand> {
        match day {
            DayOfWeek::Mon => &mut self.mon,
            DayOfWeek::Tue => &mut self.tue,
            DayOfWeek::Wed => &mut self.wed,
            DayOfWeek::Thu => &mut self.thu,
            DayOfWeek::Fri => &mut self.fri,
            DayOfWeek::Sat => &mut self.sat,
            DayOfWeek::Sun => &mut self.sun,
        }
    }

    pub fn is_empty(&self) -> bool {
        DayOfWeek::ALL.iter().all(|day| self.get(*day).is_empty())
    }
}

/// One weekly schedule instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySchedule {
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(flatten)]
    pub days: WeekBuckets,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_fire_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_fire_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fire_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fire_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fire_message_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fire_attributes: Option<Attributes>,
}

impl WeeklySchedule {
    /// New empty weekly instance in `group`.
    pub fn new_weekly(group: impl Into<String>, enabled: bool) -> Self {
        Self {
            capabilities: BTreeSet::from([
                SCHEDULE_CAPABILITY.to_string(),
                WEEKLY_SCHEDULE_CAPABILITY.to_string(),
            ]),
            group: Some(group.into()),
            enabled,
            ..Self::default()
        }
    }

    pub fn is_weekly(&self) -> bool {
        self.capabilities.contains(WEEKLY_SCHEDULE_CAPABILITY)
    }

    /// True when both instances name the same non-empty group.
    pub fn shares_group_with(&self, group: &str) -> bool {
        !group.is_empty() && self.group.as_deref() == Some(group)
    }

    pub fn clear_next_fire(&mut self) {
        self.next_fire_time = None;
        self.next_fire_command = None;
    }
}

/// Aggregate root owning every schedule instance of one device or place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scheduler {
    pub id: String,
    /// Address the fired messages are sent to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub commands: BTreeMap<String, ScheduledCommand>,
    #[serde(default)]
    pub instances: BTreeMap<String, WeeklySchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_fire_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_fire_schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fire_schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fire_time: Option<DateTime<Utc>>,
    #[serde(default)]
    next_command_seq: u64,
}

impl Scheduler {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Command that the next fire will run, if any.
    pub fn next_fire_command(&self) -> Option<&str> {
        let schedule_id = self.next_fire_schedule.as_deref()?;
        self.instances
            .get(schedule_id)?
            .next_fire_command
            .as_deref()
    }

    pub(crate) fn allocate_seq(&mut self) -> u64 {
        let seq = self.next_command_seq;
        self.next_command_seq += 1;
        seq
    }
}
