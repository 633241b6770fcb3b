//! Host-facing driver for one scheduler aggregate.
//!
//! The scheduler core never owns a timer. A [`SchedulerDispatcher`] loads an
//! aggregate from a [`SchedulerStore`], runs one operation against it through a
//! [`SchedulerCoordinator`], saves it, and reports how the host's wake-up must
//! change as a [`FireTimeChange`]. The host arms its timer accordingly and calls
//! [`SchedulerDispatcher::handle_scheduled_event`] when it goes off.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use std::fmt;

use crate::common::constants::FIRE_ADVANCE_SECONDS;
use crate::geo::GeoLocation;
use crate::scheduler::{self, MessageBody, SchedulerContext, SchedulerCoordinator};
use crate::store::SchedulerStore;

/// What the host must do with its pending wake-up after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireTimeChange {
    Unchanged,
    /// Nothing was pending; arm a wake-up at this instant.
    Schedule(DateTime<Utc>),
    /// Move the pending wake-up.
    Reschedule {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
    /// Cancel the pending wake-up at this instant.
    Cancel(DateTime<Utc>),
}

impl FireTimeChange {
    pub fn between(previous: Option<DateTime<Utc>>, next: Option<DateTime<Utc>>) -> Self {
        match (previous, next) {
            (Some(from), Some(to)) if from == to => Self::Unchanged,
            (Some(from), Some(to)) => Self::Reschedule { from, to },
            (None, Some(to)) => Self::Schedule(to),
            (Some(from), None) => Self::Cancel(from),
            (None, None) => Self::Unchanged,
        }
    }
}

impl fmt::Display for FireTimeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::Schedule(at) => write!(f, "schedule at {at}"),
            Self::Reschedule { from, to } => write!(f, "reschedule {from} -> {to}"),
            Self::Cancel(at) => write!(f, "cancel {at}"),
        }
    }
}

/// Result of handling a timer event or a fire request.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// Message to deliver to the scheduler's target, if a command fired.
    pub message: Option<MessageBody>,
    pub change: FireTimeChange,
}

pub struct SchedulerDispatcher<'s, S: SchedulerStore + ?Sized> {
    store: &'s S,
    coordinator: SchedulerCoordinator,
}

impl<'s, S: SchedulerStore + ?Sized> SchedulerDispatcher<'s, S> {
    /// Load scheduler `id` from `store`, or start a new one.
    pub fn open(store: &'s S, context: SchedulerContext, id: &str) -> Result<Self> {
        let scheduler = store
            .load_or_new(id)
            .with_context(|| format!("Failed to load scheduler [{id}]"))?;
        Ok(Self {
            store,
            coordinator: SchedulerCoordinator::new(context, scheduler),
        })
    }

    pub fn coordinator(&self) -> &SchedulerCoordinator {
        &self.coordinator
    }

    pub fn next_fire_time(&self) -> Option<DateTime<Utc>> {
        self.coordinator.scheduler().next_fire_time
    }

    /// Run `op`, save the aggregate and report the wake-up change.
    ///
    /// A failed operation leaves the stored aggregate untouched.
    pub fn apply<T>(
        &mut self,
        op: impl FnOnce(&mut SchedulerCoordinator) -> scheduler::Result<T>,
    ) -> Result<(T, FireTimeChange)> {
        let previous = self.next_fire_time();
        let id = self.coordinator.scheduler().id.clone();

        let value = op(&mut self.coordinator)
            .with_context(|| format!("Scheduler [{id}] rejected the request"))?;
        self.store
            .save(self.coordinator.scheduler())
            .with_context(|| format!("Failed to save scheduler [{id}]"))?;

        let change = FireTimeChange::between(previous, self.next_fire_time());
        if change != FireTimeChange::Unchanged {
            log_debug!("Scheduler [{id}] wake-up: {change}");
        }
        Ok((value, change))
    }

    /// Handle the host timer going off for `scheduled_at`.
    ///
    /// Events for a scheduler with nothing pending, and events earlier than the
    /// pending fire (a wake-up that failed to cancel), are ignored. Otherwise the
    /// pending command fires one second after `scheduled_at` so that the next
    /// search starts strictly after it.
    pub fn handle_scheduled_event(&mut self, scheduled_at: DateTime<Utc>) -> Result<Dispatch> {
        let (message, change) = self.apply(|coordinator| {
            let scheduler = coordinator.scheduler();
            let Some(next_fire_time) = scheduler.next_fire_time else {
                log_debug!("Received scheduled event for [{}] with nothing pending", scheduler.id);
                return Ok(None);
            };
            if next_fire_time > scheduled_at {
                log_debug!(
                    "Ignoring early scheduled event at {scheduled_at}, next fire is {next_fire_time}"
                );
                return Ok(None);
            }

            let Some(command_id) = scheduler.next_fire_command().map(str::to_string) else {
                log_warning!("Cannot determine the command to run, recalculating schedules");
                coordinator.updated()?;
                return Ok(None);
            };
            coordinator.fire(
                &command_id,
                scheduled_at + Duration::seconds(FIRE_ADVANCE_SECONDS),
            )
        })?;
        Ok(Dispatch { message, change })
    }

    /// Fire a command on demand at the context's current time.
    pub fn fire_command(&mut self, command_id: &str) -> Result<Dispatch> {
        let (message, change) = self.apply(|coordinator| {
            let now = coordinator.context().now();
            coordinator.fire(command_id, now)
        })?;
        Ok(Dispatch { message, change })
    }

    pub fn set_enabled(&mut self, schedule_id: &str, enabled: bool) -> Result<FireTimeChange> {
        self.apply(|coordinator| coordinator.set_enabled(schedule_id, enabled))
            .map(|((), change)| change)
    }

    /// Apply a change to the place's timezone and/or location.
    pub fn update_place(
        &mut self,
        tz: Option<Tz>,
        location: Option<GeoLocation>,
    ) -> Result<FireTimeChange> {
        self.apply(|coordinator| {
            if let Some(tz) = tz {
                log_info!("Updating timezone to {tz}");
                coordinator.set_time_zone(tz)?;
            }
            if let Some(location) = location {
                log_info!("Updating location to {location}");
                coordinator.set_location(location)?;
            }
            Ok(())
        })
        .map(|((), change)| change)
    }

    /// Remove the scheduler from the store.
    pub fn delete(self) -> Result<FireTimeChange> {
        let id = &self.coordinator.scheduler().id;
        self.store
            .delete(id)
            .with_context(|| format!("Failed to delete scheduler [{id}]"))?;
        Ok(FireTimeChange::between(self.next_fire_time(), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::FixedSolarProvider;
    use crate::scheduler::CommandSpec;
    use crate::store::MemoryStore;
    use crate::time::{DayOfWeek, SimulatedTimeSource};
    use chrono::TimeZone;
    use chrono_tz::America::Chicago;
    use std::sync::Arc;

    fn chicago(d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Chicago
            .with_ymd_and_hms(2026, 10, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn context(clock: Arc<SimulatedTimeSource>) -> SchedulerContext {
        let provider = FixedSolarProvider::new(
            Chicago,
            "07:10:00".parse().unwrap(),
            "18:00:00".parse().unwrap(),
        );
        SchedulerContext::new(Arc::new(provider), clock, Chicago)
            .with_location(GeoLocation::from_coordinates(41.8781, -87.6298).unwrap())
    }

    #[test]
    fn test_fire_time_change_between() {
        let a = chicago(19, 7, 30);
        let b = chicago(20, 7, 30);
        assert_eq!(FireTimeChange::between(None, None), FireTimeChange::Unchanged);
        assert_eq!(FireTimeChange::between(Some(a), Some(a)), FireTimeChange::Unchanged);
        assert_eq!(FireTimeChange::between(None, Some(a)), FireTimeChange::Schedule(a));
        assert_eq!(FireTimeChange::between(Some(a), None), FireTimeChange::Cancel(a));
        assert_eq!(
            FireTimeChange::between(Some(a), Some(b)),
            FireTimeChange::Reschedule { from: a, to: b }
        );
    }

    #[test]
    fn test_scheduled_event_lifecycle() {
        let store = MemoryStore::new();
        let clock = Arc::new(SimulatedTimeSource::new(chicago(19, 6, 0)));
        let mut dispatcher =
            SchedulerDispatcher::open(&store, context(clock.clone()), "place-1").unwrap();

        // Nothing pending yet
        let ignored = dispatcher.handle_scheduled_event(chicago(19, 6, 0)).unwrap();
        assert_eq!(ignored.message, None);
        assert_eq!(ignored.change, FireTimeChange::Unchanged);

        let (command, change) = dispatcher
            .apply(|coordinator| {
                coordinator.schedule_weekly_command(
                    "weekday",
                    &CommandSpec::absolute("weekday", "07:30:00".parse().unwrap(), [DayOfWeek::Mon]),
                )
            })
            .unwrap();
        assert_eq!(change, FireTimeChange::Schedule(chicago(19, 7, 30)));
        assert_eq!(
            store.load("place-1").unwrap().unwrap().next_fire_time,
            Some(chicago(19, 7, 30))
        );

        // A stale wake-up from before the pending fire does nothing
        let early = dispatcher.handle_scheduled_event(chicago(19, 7, 0)).unwrap();
        assert_eq!(early.message, None);
        assert_eq!(early.change, FireTimeChange::Unchanged);

        clock.advance_to(chicago(19, 7, 30));
        let fired = dispatcher.handle_scheduled_event(chicago(19, 7, 30)).unwrap();
        assert_eq!(fired.message.unwrap().message_type, "base:SetAttributes");
        assert_eq!(
            fired.change,
            FireTimeChange::Reschedule {
                from: chicago(19, 7, 30),
                to: chicago(26, 7, 30)
            }
        );

        let saved = store.load("place-1").unwrap().unwrap();
        assert_eq!(saved.last_fire_time, Some(chicago(19, 7, 30) + Duration::seconds(1)));
        assert_eq!(
            saved.instances["weekday"].last_fire_command.as_deref(),
            Some(command.id.as_str())
        );
    }

    #[test]
    fn test_disabling_cancels_wake_up() {
        let store = MemoryStore::new();
        let clock = Arc::new(SimulatedTimeSource::new(chicago(19, 6, 0)));
        let mut dispatcher =
            SchedulerDispatcher::open(&store, context(clock), "place-1").unwrap();
        dispatcher
            .apply(|coordinator| {
                coordinator.schedule_weekly_command(
                    "weekday",
                    &CommandSpec::absolute("weekday", "07:30:00".parse().unwrap(), [DayOfWeek::Mon]),
                )
            })
            .unwrap();

        assert_eq!(
            dispatcher.set_enabled("weekday", false).unwrap(),
            FireTimeChange::Cancel(chicago(19, 7, 30))
        );
        assert_eq!(
            dispatcher.set_enabled("weekday", true).unwrap(),
            FireTimeChange::Schedule(chicago(19, 7, 30))
        );
    }

    #[test]
    fn test_rejected_request_is_not_saved() {
        let store = MemoryStore::new();
        let clock = Arc::new(SimulatedTimeSource::new(chicago(19, 6, 0)));
        let mut dispatcher =
            SchedulerDispatcher::open(&store, context(clock), "place-1").unwrap();

        let result = dispatcher.set_enabled("missing", true);
        assert!(result.is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_place_and_delete() {
        let store = MemoryStore::new();
        let clock = Arc::new(SimulatedTimeSource::new(chicago(19, 6, 0)));
        let mut dispatcher =
            SchedulerDispatcher::open(&store, context(clock), "place-1").unwrap();
        dispatcher
            .apply(|coordinator| {
                coordinator.schedule_weekly_command(
                    "weekday",
                    &CommandSpec::absolute("weekday", "07:30:00".parse().unwrap(), [DayOfWeek::Mon]),
                )
            })
            .unwrap();

        let change = dispatcher
            .update_place(Some(chrono_tz::America::New_York), None)
            .unwrap();
        let new_york = chrono_tz::America::New_York
            .with_ymd_and_hms(2026, 10, 19, 7, 30, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            change,
            FireTimeChange::Reschedule {
                from: chicago(19, 7, 30),
                to: new_york
            }
        );

        assert_eq!(dispatcher.delete().unwrap(), FireTimeChange::Cancel(new_york));
        assert!(store.load("place-1").unwrap().is_none());
    }
}
