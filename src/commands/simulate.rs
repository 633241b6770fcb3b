//! Implementation of the simulate command.
//!
//! Replays a stored scheduler against a simulated clock: every pending fire
//! between the start and end times is handled exactly as the host timer would
//! handle it. The scheduler is copied into memory first, so the stored state
//! is never changed.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::args::RunOptions;
use crate::dispatch::SchedulerDispatcher;
use crate::logger::Log;
use crate::scheduler::SchedulerContext;
use crate::store::{MemoryStore, SchedulerStore};
use crate::time::SimulatedTimeSource;
use crate::time::source::parse_datetime_in_tz;

/// One fire observed during a simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedFire {
    pub at: DateTime<Utc>,
    pub schedule_id: Option<String>,
    pub command_id: Option<String>,
    pub message_type: Option<String>,
}

/// Drive `store`'s copy of `scheduler_id` from `start` to `end` inclusive and
/// return every fire in order.
pub fn run_simulation<S: SchedulerStore + ?Sized>(
    store: &S,
    context: &SchedulerContext,
    scheduler_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<SimulatedFire>> {
    if end <= start {
        anyhow::bail!("End time must be after start time");
    }

    let scratch = MemoryStore::new();
    if let Some(scheduler) = store.load(scheduler_id)? {
        scratch.save(&scheduler)?;
    }

    let clock = Arc::new(SimulatedTimeSource::new(start));
    let context = context.clone().with_clock(clock.clone());
    let mut dispatcher = SchedulerDispatcher::open(&scratch, context.clone(), scheduler_id)?;

    // Times stored by an earlier run are stale at the simulated start
    dispatcher.apply(|coordinator| coordinator.updated())?;

    let mut fires = Vec::new();
    while let Some(at) = dispatcher.next_fire_time()
        && at <= end
    {
        clock.advance_to(at);
        Log::set_line_prefix(Some(format!(
            "[{}] ",
            super::local(&context, at)
        )));

        let scheduler = dispatcher.coordinator().scheduler();
        let schedule_id = scheduler.next_fire_schedule.clone();
        let command_id = scheduler.next_fire_command().map(str::to_string);
        let dispatch = dispatcher.handle_scheduled_event(at)?;

        fires.push(SimulatedFire {
            at,
            schedule_id,
            command_id,
            message_type: dispatch.message.map(|message| message.message_type),
        });

        if dispatcher.next_fire_time().is_some_and(|next| next <= at) {
            Log::set_line_prefix(None);
            anyhow::bail!("Next fire did not advance past {at}");
        }
    }
    Log::set_line_prefix(None);

    Ok(fires)
}

pub fn handle_simulate_command(
    options: &RunOptions,
    scheduler_id: &str,
    start_time: &str,
    end_time: &str,
) -> Result<()> {
    let env = super::prepare(options)?;
    let tz = env.context.time_zone();
    let start = parse_datetime_in_tz(start_time, tz)
        .map_err(|e| anyhow::anyhow!("Invalid start time: {e}"))?;
    let end = parse_datetime_in_tz(end_time, tz)
        .map_err(|e| anyhow::anyhow!("Invalid end time: {e}"))?;

    log_block_start!("Simulation Mode");
    log_decorated!("Simulating [{scheduler_id}] from {start_time} to {end_time} ({tz})");
    let duration = end.signed_duration_since(start);
    log_indented!(
        "Total simulated time: {} days {} hours",
        duration.num_days(),
        duration.num_hours() % 24
    );
    log_pipe!();

    let fires = run_simulation(&env.store, &env.context, scheduler_id, start, end)
        .with_context(|| format!("Simulation of [{scheduler_id}] failed"))?;

    log_block_start!("Simulation complete: {} fire(s)", fires.len());
    for fire in &fires {
        log_indented!(
            "{}  [{}] {} {}",
            super::local(&env.context, fire.at),
            fire.schedule_id.as_deref().unwrap_or("-"),
            fire.command_id.as_deref().unwrap_or("-"),
            fire.message_type.as_deref().unwrap_or("(nothing fired)")
        );
    }
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("simulate - Replay fires over a time range");
    log_block_start!("Usage: sunsched simulate <scheduler> <start> <end>");
    log_block_start!("Arguments:");
    log_indented!("<start>  Start time, \"YYYY-MM-DD HH:MM:SS\"");
    log_indented!("<end>    End time, \"YYYY-MM-DD HH:MM:SS\"");
    log_indented!("Both are read in the configured timezone.");
    log_block_start!("Notes:");
    log_indented!("Works on a copy of the scheduler; the stored state is unchanged.");
    log_block_start!("Example:");
    log_indented!("sunsched simulate place-1 \"2026-10-19 00:00:00\" \"2026-10-26 00:00:00\"");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{FixedSolarProvider, GeoLocation};
    use crate::scheduler::{CommandSpec, Mode, Scheduler, SchedulerCoordinator};
    use crate::time::DayOfWeek;
    use chrono::TimeZone;
    use chrono_tz::America::Chicago;
    use serial_test::serial;

    fn chicago(d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Chicago
            .with_ymd_and_hms(2026, 10, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn context() -> SchedulerContext {
        let provider = FixedSolarProvider::new(
            Chicago,
            "07:10:00".parse().unwrap(),
            "18:00:00".parse().unwrap(),
        );
        SchedulerContext::new(
            Arc::new(provider),
            Arc::new(SimulatedTimeSource::new(chicago(19, 0, 0))),
            Chicago,
        )
        .with_location(GeoLocation::from_coordinates(41.8781, -87.6298).unwrap())
    }

    fn stored_scheduler(store: &MemoryStore) -> Scheduler {
        let mut coordinator = SchedulerCoordinator::new(context(), Scheduler::new("place-1"));
        coordinator
            .schedule_weekly_command(
                "weekday",
                &CommandSpec::absolute(
                    "weekday",
                    "07:30:00".parse().unwrap(),
                    [DayOfWeek::Mon, DayOfWeek::Wed],
                ),
            )
            .unwrap();
        coordinator
            .schedule_weekly_command(
                "weekday",
                &CommandSpec::relative("weekday", Mode::Sunset, -15, [DayOfWeek::Tue]),
            )
            .unwrap();
        let scheduler = coordinator.into_scheduler();
        store.save(&scheduler).unwrap();
        scheduler
    }

    #[test]
    #[serial]
    fn test_simulation_replays_a_week() {
        Log::set_enabled(false);
        let store = MemoryStore::new();
        let before = stored_scheduler(&store);

        let fires =
            run_simulation(&store, &context(), "place-1", chicago(19, 0, 0), chicago(26, 0, 0))
                .unwrap();
        Log::set_enabled(true);

        let times: Vec<_> = fires.iter().map(|fire| fire.at).collect();
        assert_eq!(
            times,
            vec![chicago(19, 7, 30), chicago(20, 17, 45), chicago(21, 7, 30)]
        );
        assert!(fires.iter().all(|fire| fire.schedule_id.as_deref() == Some("weekday")));
        assert!(fires.iter().all(|fire| fire.message_type.is_some()));

        // The stored copy is untouched
        assert_eq!(store.load("place-1").unwrap().unwrap(), before);
    }

    #[test]
    #[serial]
    fn test_simulation_of_unknown_scheduler_fires_nothing() {
        Log::set_enabled(false);
        let store = MemoryStore::new();
        let fires =
            run_simulation(&store, &context(), "nobody", chicago(19, 0, 0), chicago(26, 0, 0))
                .unwrap();
        Log::set_enabled(true);

        assert!(fires.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_simulation_rejects_reversed_range() {
        let store = MemoryStore::new();
        assert!(
            run_simulation(&store, &context(), "place-1", chicago(26, 0, 0), chicago(19, 0, 0))
                .is_err()
        );
    }
}
