//! Per-instance operations of a weekly time-of-day schedule.
//!
//! A [`WeeklyScheduleEngine`] is a short-lived view over one instance of a
//! [`Scheduler`]. It applies command CRUD, rebuilds the instance's day buckets
//! from the scheduler's command index, and computes the instance's next fire.
//!
//! ## Next fire
//!
//! Starting from the local date of `now`, the engine walks at most eight days
//! (today plus one full week). For each day it refreshes the trigger time of
//! every sunrise/sunset-relative command from that day's solar events, re-sorts
//! the bucket, and picks the first command whose wall-clock time on that date is
//! strictly after `now`. Eight days are needed so that a command that already
//! ran earlier today is found again on the same weekday next week.

use chrono::{DateTime, Days, NaiveDate, Utc};
use uuid::Uuid;

use super::command::{CommandSpec, ScheduledCommand};
use super::context::SchedulerContext;
use super::error::{Result, SchedulerError};
use super::model::{Scheduler, WeekBuckets, WeeklySchedule};
use crate::common::constants::NEXT_FIRE_SEARCH_DAYS;
use crate::geo::SunriseSunsetInfo;
use crate::time::{DayOfWeek, resolve_local};

/// Operations on one weekly schedule instance of a scheduler.
pub struct WeeklyScheduleEngine<'a> {
    context: &'a SchedulerContext,
    scheduler: &'a mut Scheduler,
    instance_id: String,
}

impl<'a> WeeklyScheduleEngine<'a> {
    pub(crate) fn new(
        context: &'a SchedulerContext,
        scheduler: &'a mut Scheduler,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            context,
            scheduler,
            instance_id: instance_id.into(),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn instance(&self) -> Option<&WeeklySchedule> {
        self.scheduler.instances.get(&self.instance_id)
    }

    fn instance_mut(&mut self) -> Result<&mut WeeklySchedule> {
        self.scheduler
            .instances
            .get_mut(&self.instance_id)
            .ok_or_else(|| SchedulerError::invalid(format!("Schedule [{}] not found", self.instance_id)))
    }

    pub fn is_enabled(&self) -> bool {
        self.instance().is_some_and(|instance| instance.enabled)
    }

    pub fn is_sunrise_sunset_supported(&self) -> bool {
        self.context.location().is_some()
    }

    /// Commands belonging to this instance, in index order.
    pub fn commands(&self) -> impl Iterator<Item = &ScheduledCommand> {
        let instance_id = self.instance_id.as_str();
        self.scheduler
            .commands
            .values()
            .filter(move |command| command.schedule_id == instance_id)
    }

    /// Enable or disable this instance.
    ///
    /// Enabling disables every other instance in the same non-empty group and
    /// clears their next fire.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        let group = self.instance_mut()?.group.clone().unwrap_or_default();

        self.transact(|engine| {
            if enabled {
                for (instance_id, other) in engine.scheduler.instances.iter_mut() {
                    if *instance_id != engine.instance_id && other.shares_group_with(&group) {
                        if other.enabled {
                            log_debug!("Disabling schedule [{instance_id}] in group [{group}]");
                        }
                        other.enabled = false;
                        other.clear_next_fire();
                    }
                }
            }

            engine.instance_mut()?.enabled = enabled;
            let now = engine.context.now();
            engine.compute_next_fire_time(now)
        })
    }

    /// Create a new command on this instance and commit.
    pub fn add_time_of_day_command(&mut self, spec: &CommandSpec) -> Result<ScheduledCommand> {
        spec.validate()?;
        self.instance_mut()?;

        let mode = spec.mode.unwrap_or_default();
        let mut command = ScheduledCommand {
            id: Uuid::new_v4().to_string(),
            schedule_id: self.instance_id.clone(),
            message_type: spec
                .message_type
                .clone()
                .filter(|message_type| !message_type.trim().is_empty())
                .unwrap_or_else(|| self.context.default_message_type().to_string()),
            attributes: spec.attributes.clone().unwrap_or_default(),
            mode,
            time: None,
            offset_minutes: None,
            days: spec.days.clone().unwrap_or_default(),
            seq: 0,
        };
        if mode.is_relative() {
            command.offset_minutes = Some(spec.offset_minutes.unwrap_or(0));
        } else {
            command.time = spec.time;
        }
        command.validate()?;

        if command.is_relative() {
            let today = self.context.local_date(self.context.now());
            self.update_relative_time(&mut command, today)?;
        }

        self.transact(|engine| {
            command.seq = engine.scheduler.allocate_seq();
            engine
                .scheduler
                .commands
                .insert(command.id.clone(), command.clone());
            engine.commit()?;
            Ok(command)
        })
    }

    /// Overlay the fields present in `spec` onto an existing command and commit.
    pub fn update_time_of_day_command(&mut self, spec: &CommandSpec) -> Result<()> {
        spec.validate()?;
        let mut command = spec
            .id
            .as_deref()
            .and_then(|id| self.scheduler.commands.get(id))
            .filter(|command| command.schedule_id == self.instance_id)
            .cloned()
            .ok_or_else(|| SchedulerError::invalid("Command not found"))?;

        if let Some(days) = &spec.days {
            command.days = days.clone();
        }
        if let Some(mode) = spec.mode {
            command.mode = mode;
        }
        if let Some(time) = spec.time {
            command.time = Some(time);
        }
        if let Some(offset) = spec.offset_minutes {
            command.offset_minutes = Some(offset);
        }
        if let Some(message_type) = spec.message_type.as_deref()
            && !message_type.trim().is_empty()
        {
            command.message_type = message_type.to_string();
        }
        if let Some(attributes) = &spec.attributes {
            command.attributes = attributes.clone();
        }

        if command.is_relative() {
            command.time = None;
            command.offset_minutes.get_or_insert(0);
        } else {
            command.offset_minutes = None;
        }
        command.validate()?;

        if command.is_relative() {
            let today = self.context.local_date(self.context.now());
            self.update_relative_time(&mut command, today)?;
        }

        self.transact(|engine| {
            engine
                .scheduler
                .commands
                .insert(command.id.clone(), command);
            engine.commit()
        })
    }

    /// Remove a command. Returns `false` when this instance has no such command.
    pub fn delete_command(&mut self, command_id: &str) -> Result<bool> {
        let known = self
            .scheduler
            .commands
            .get(command_id)
            .is_some_and(|command| command.schedule_id == self.instance_id);
        if !known {
            return Ok(false);
        }

        self.transact(|engine| {
            engine.scheduler.commands.remove(command_id);
            engine.commit()?;
            Ok(true)
        })
    }

    /// Rebuild the day buckets from the command index, then recompute the next fire.
    pub fn commit(&mut self) -> Result<()> {
        let mut buckets = WeekBuckets::default();
        for command in self.commands() {
            for day in &command.days {
                buckets.get_mut(*day).push(command.clone());
            }
        }
        for day in DayOfWeek::ALL {
            buckets.get_mut(day).sort_by_key(ScheduledCommand::sort_key);
        }

        self.instance_mut()?.days = buckets;
        let now = self.context.now();
        self.compute_next_fire_time(now)
    }

    /// Record the first command of this instance that fires strictly after `now`.
    pub fn compute_next_fire_time(&mut self, now: DateTime<Utc>) -> Result<()> {
        let context = self.context;
        let instance_id = self.instance_id.clone();
        let instance = self.instance_mut()?;

        if !instance.enabled {
            instance.clear_next_fire();
            return Ok(());
        }

        let tz = context.time_zone();
        let today = context.local_date(now);

        for offset in 0..NEXT_FIRE_SEARCH_DAYS {
            let Some(date) = today.checked_add_days(Days::new(offset)) else {
                break;
            };
            let bucket = instance.days.get_mut(DayOfWeek::of(date));
            if bucket.is_empty() {
                continue;
            }
            let solar_available = refresh_relative_times(context, date, bucket)?;

            for command in bucket.iter() {
                if command.is_relative() && !solar_available {
                    continue;
                }
                let Some(time) = command.time else {
                    continue;
                };
                let Some(candidate) = resolve_local(tz, date, time.truncate_seconds()) else {
                    continue;
                };
                let candidate = candidate.with_timezone(&Utc);
                if candidate > now {
                    log_debug!(
                        "Next fire for [{instance_id}]: {} (command [{}])",
                        candidate.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S %Z"),
                        command.id
                    );
                    instance.next_fire_time = Some(candidate);
                    instance.next_fire_command = Some(command.id.clone());
                    return Ok(());
                }
            }
        }

        instance.clear_next_fire();
        Ok(())
    }

    /// Set the cached trigger time of a relative command for `date`.
    ///
    /// When the sun does not rise or set on `date` the cached time is left as
    /// it was. A missing location is still an error.
    pub(crate) fn update_relative_time(
        &self,
        command: &mut ScheduledCommand,
        date: NaiveDate,
    ) -> Result<()> {
        if let Some(info) = solar_events(self.context, date)? {
            command.time = Some(command.relative_time(&info, self.context.time_zone()));
        }
        Ok(())
    }

    /// Run `op`, restoring the scheduler to its prior state if it fails.
    fn transact<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let snapshot = self.scheduler.clone();
        let result = op(self);
        if result.is_err() {
            *self.scheduler = snapshot;
        }
        result
    }
}

/// Sunrise and sunset on `date`, or `None` when the provider has no answer for
/// that day (polar day or night).
fn solar_events(context: &SchedulerContext, date: NaiveDate) -> Result<Option<SunriseSunsetInfo>> {
    match context.sunrise_sunset(date) {
        Ok(info) => Ok(Some(info)),
        Err(SchedulerError::Solar(reason)) => {
            log_warning!("No sunrise/sunset on {date}, skipping relative commands: {reason}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Recompute relative trigger times in `bucket` for `date` and re-sort it.
/// Returns `false` when relative commands have no trigger on `date`.
fn refresh_relative_times(
    context: &SchedulerContext,
    date: NaiveDate,
    bucket: &mut [ScheduledCommand],
) -> Result<bool> {
    if !bucket.iter().any(ScheduledCommand::is_relative) {
        return Ok(true);
    }

    let Some(info) = solar_events(context, date)? else {
        return Ok(false);
    };
    let tz = context.time_zone();
    for command in bucket.iter_mut().filter(|command| command.is_relative()) {
        command.time = Some(command.relative_time(&info, tz));
    }
    bucket.sort_by_key(ScheduledCommand::sort_key);
    Ok(true)
}
