//! Scheduler-wide arbitration across schedule instances.
//!
//! The coordinator owns one [`Scheduler`] aggregate together with its
//! [`SchedulerContext`]. It creates and deletes weekly instances, routes
//! command requests to the right [`WeeklyScheduleEngine`], fires commands, and
//! keeps the aggregate's next fire equal to the earliest next fire of its
//! enabled instances.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::command::{CommandSpec, ScheduledCommand};
use super::context::SchedulerContext;
use super::error::{Result, SchedulerError};
use super::message::MessageBody;
use super::model::{Scheduler, WeeklySchedule};
use super::weekly::WeeklyScheduleEngine;
use crate::geo::GeoLocation;

pub struct SchedulerCoordinator {
    context: SchedulerContext,
    scheduler: Scheduler,
}

impl SchedulerCoordinator {
    pub fn new(context: SchedulerContext, scheduler: Scheduler) -> Self {
        Self { context, scheduler }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn into_scheduler(self) -> Scheduler {
        self.scheduler
    }

    pub fn context(&self) -> &SchedulerContext {
        &self.context
    }

    /// Engine for an existing instance.
    pub fn weekly_schedule(&mut self, schedule_id: &str) -> Option<WeeklyScheduleEngine<'_>> {
        if !self.scheduler.instances.contains_key(schedule_id) {
            return None;
        }
        Some(WeeklyScheduleEngine::new(
            &self.context,
            &mut self.scheduler,
            schedule_id,
        ))
    }

    /// Get or create the weekly instance `schedule_id`.
    ///
    /// A new instance joins `group` (its own id when blank) and starts enabled
    /// only if no other instance of that group is enabled.
    pub fn add_weekly_schedule(
        &mut self,
        schedule_id: &str,
        group: Option<&str>,
    ) -> Result<WeeklyScheduleEngine<'_>> {
        if schedule_id.trim().is_empty() {
            return Err(SchedulerError::invalid("scheduleId is required"));
        }

        match self.scheduler.instances.get(schedule_id) {
            Some(existing) if !existing.is_weekly() => {
                return Err(SchedulerError::TypeConflict(schedule_id.to_string()));
            }
            Some(_) => {}
            None => {
                let group = group
                    .map(str::trim)
                    .filter(|group| !group.is_empty())
                    .unwrap_or(schedule_id);
                let enabled = !self
                    .scheduler
                    .instances
                    .values()
                    .any(|other| other.enabled && other.shares_group_with(group));
                log_debug!(
                    "Created schedule [{schedule_id}] in group [{group}] ({})",
                    if enabled { "enabled" } else { "disabled" }
                );
                self.scheduler.instances.insert(
                    schedule_id.to_string(),
                    WeeklySchedule::new_weekly(group, enabled),
                );
            }
        }

        Ok(WeeklyScheduleEngine::new(
            &self.context,
            &mut self.scheduler,
            schedule_id,
        ))
    }

    /// Remove an instance and every command it owns. Returns `false` if it did not exist.
    pub fn delete_schedule(&mut self, schedule_id: &str) -> Result<bool> {
        if self.scheduler.instances.remove(schedule_id).is_none() {
            return Ok(false);
        }
        self.scheduler
            .commands
            .retain(|_, command| command.schedule_id != schedule_id);
        self.sync()?;
        Ok(true)
    }

    /// Apply a batch of create, update and delete requests.
    ///
    /// Each entry names its instance, which is created on demand in `group`.
    /// An entry without an id creates a command, an id with an empty day set
    /// deletes one, anything else updates. The next fire is resynced after every
    /// entry. Returns the ids created or deleted. If any entry fails the whole
    /// batch is rolled back.
    pub fn schedule_commands(
        &mut self,
        group: Option<&str>,
        specs: &[CommandSpec],
    ) -> Result<Vec<String>> {
        self.transact(|coordinator| coordinator.apply_batch(group, specs))
    }

    fn apply_batch(&mut self, group: Option<&str>, specs: &[CommandSpec]) -> Result<Vec<String>> {
        let mut command_ids = Vec::new();
        for spec in specs {
            let schedule_id = spec
                .schedule_id
                .as_deref()
                .filter(|id| !id.trim().is_empty())
                .ok_or_else(|| SchedulerError::invalid("scheduleId is required"))?;
            let mut schedule = self.add_weekly_schedule(schedule_id, group)?;

            match spec.id.as_deref() {
                _ if !spec.has_id() => {
                    command_ids.push(schedule.add_time_of_day_command(spec)?.id);
                }
                Some(id) if spec.is_delete() => {
                    schedule.delete_command(id)?;
                    command_ids.push(id.to_string());
                }
                _ => schedule.update_time_of_day_command(spec)?,
            }
            self.sync()?;
        }
        Ok(command_ids)
    }

    /// Create a single command on `schedule_id`, creating the instance if needed.
    pub fn schedule_weekly_command(
        &mut self,
        schedule_id: &str,
        spec: &CommandSpec,
    ) -> Result<ScheduledCommand> {
        if spec.has_id() {
            return Err(SchedulerError::invalid(
                "This can only be used to schedule new commands",
            ));
        }
        self.transact(|coordinator| {
            let command = coordinator
                .add_weekly_schedule(schedule_id, None)?
                .add_time_of_day_command(spec)?;
            coordinator.sync()?;
            Ok(command)
        })
    }

    pub fn update_weekly_command(&mut self, schedule_id: &str, spec: &CommandSpec) -> Result<()> {
        self.existing_schedule(schedule_id)?
            .update_time_of_day_command(spec)?;
        self.sync()
    }

    pub fn delete_command(&mut self, schedule_id: &str, command_id: &str) -> Result<bool> {
        let deleted = match self.weekly_schedule(schedule_id) {
            Some(mut schedule) => schedule.delete_command(command_id)?,
            None => false,
        };
        self.sync()?;
        Ok(deleted)
    }

    /// Enable or disable an instance, enforcing group exclusion.
    pub fn set_enabled(&mut self, schedule_id: &str, enabled: bool) -> Result<()> {
        self.existing_schedule(schedule_id)?.set_enabled(enabled)?;
        self.sync()
    }

    fn existing_schedule(&mut self, schedule_id: &str) -> Result<WeeklyScheduleEngine<'_>> {
        self.weekly_schedule(schedule_id)
            .ok_or_else(|| SchedulerError::invalid(format!("Schedule [{schedule_id}] not found")))
    }

    /// Fire `command_id` at `now` and return the message to deliver.
    ///
    /// Unknown commands and commands whose instance is gone are logged and
    /// yield `None`. The aggregate's next fire is resynced on every path.
    pub fn fire(&mut self, command_id: &str, now: DateTime<Utc>) -> Result<Option<MessageBody>> {
        let fired = self.fire_command(command_id, now);
        let synced = self.sync_at(now);
        let body = fired?;
        synced?;
        Ok(body)
    }

    fn fire_command(&mut self, command_id: &str, now: DateTime<Utc>) -> Result<Option<MessageBody>> {
        let Some(mut command) = self.scheduler.commands.get(command_id).cloned() else {
            log_warning!("Unable to fire command [{command_id}]: no such command");
            return Ok(None);
        };
        let schedule_id = command.schedule_id.clone();
        let Some(instance) = self.scheduler.instances.get_mut(&schedule_id) else {
            log_warning!(
                "Unable to fire command [{command_id}]: schedule [{schedule_id}] no longer exists"
            );
            return Ok(None);
        };

        instance.last_fire_time = Some(now);
        instance.last_fire_command = Some(command.id.clone());
        instance.last_fire_message_type = Some(command.message_type.clone());
        instance.last_fire_attributes = Some(command.attributes.clone());
        self.scheduler.last_fire_schedule = Some(schedule_id.clone());
        self.scheduler.last_fire_time = Some(now);

        let mut schedule = WeeklyScheduleEngine::new(&self.context, &mut self.scheduler, &schedule_id);
        schedule.compute_next_fire_time(now)?;
        if command.is_relative() {
            schedule.update_relative_time(&mut command, self.context.local_date(now))?;
            self.scheduler
                .commands
                .insert(command.id.clone(), command.clone());
        }

        log_decorated!(
            "Fired command [{}] of schedule [{schedule_id}]: {}",
            command.id,
            command.message_type
        );
        Ok(Some(MessageBody::build(
            command.message_type,
            command.attributes,
        )))
    }

    pub fn set_time_zone(&mut self, tz: Tz) -> Result<()> {
        self.context.set_time_zone(tz);
        self.updated()
    }

    pub fn set_location(&mut self, location: GeoLocation) -> Result<()> {
        self.context.set_location(location);
        self.updated()
    }

    /// Recompute every weekly instance after an outside change to the aggregate
    /// or its context.
    pub fn updated(&mut self) -> Result<()> {
        log_debug!("Recomputing all schedules of [{}]", self.scheduler.id);
        self.sync()
    }

    /// Global resync at the context's current time.
    pub fn sync(&mut self) -> Result<()> {
        let now = self.context.now();
        self.sync_at(now)
    }

    /// Recompute every weekly instance's next fire at `now`, then the aggregate's.
    pub fn sync_at(&mut self, now: DateTime<Utc>) -> Result<()> {
        let weekly: Vec<String> = self
            .scheduler
            .instances
            .iter()
            .filter(|(_, instance)| instance.is_weekly())
            .map(|(id, _)| id.clone())
            .collect();
        for schedule_id in weekly {
            WeeklyScheduleEngine::new(&self.context, &mut self.scheduler, schedule_id)
                .compute_next_fire_time(now)?;
        }
        self.sync_next_fire_time();
        Ok(())
    }

    /// Run `op`, restoring the aggregate to its prior state if it fails.
    fn transact<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let snapshot = self.scheduler.clone();
        let result = op(self);
        if result.is_err() {
            self.scheduler = snapshot;
        }
        result
    }

    /// Earliest next fire over the enabled instances; ties go to the first id.
    fn sync_next_fire_time(&mut self) {
        let mut next: Option<(DateTime<Utc>, String)> = None;
        for (schedule_id, instance) in &self.scheduler.instances {
            if !instance.enabled {
                continue;
            }
            let Some(fire_time) = instance.next_fire_time else {
                continue;
            };
            if next.as_ref().is_none_or(|(best, _)| fire_time < *best) {
                next = Some((fire_time, schedule_id.clone()));
            }
        }

        let (next_fire_time, next_fire_schedule) = next.unzip();
        self.scheduler.next_fire_time = next_fire_time;
        self.scheduler.next_fire_schedule = next_fire_schedule;
    }
}
