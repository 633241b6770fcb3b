//! Command-line command handlers for sunsched.
//!
//! Each subcommand lives in its own submodule. They all share the same start-up:
//! apply the global flags, load the configuration, and open the state store.

pub mod enable;
pub mod fire;
pub mod help;
pub mod next;
pub mod recalculate;
pub mod schedule;
pub mod simulate;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::args::RunOptions;
use crate::config;
use crate::dispatch::FireTimeChange;
use crate::logger::Log;
use crate::scheduler::{Scheduler, SchedulerContext};
use crate::store::JsonFileStore;

/// Everything a subcommand needs to open a scheduler.
pub(crate) struct Environment {
    pub context: SchedulerContext,
    pub store: JsonFileStore,
}

/// Apply the global flags and load configuration and state store.
pub(crate) fn prepare(options: &RunOptions) -> Result<Environment> {
    log_version!();
    if options.debug_enabled {
        Log::set_debug(true);
        log_pipe!();
        log_debug!("Debug mode enabled");
    }

    // A second call in the same process keeps the first directory
    if config::set_config_dir(options.config_dir.clone()).is_err() {
        log_debug!("Configuration directory already set");
    }

    let config = config::load()?;
    if Log::is_debug() {
        config.log_config(config::get_config_path().ok().as_deref());
    }

    let context = SchedulerContext::from_config(&config)?;
    let state_dir = config.state_dir()?;
    let store = JsonFileStore::open(state_dir.clone())
        .with_context(|| format!("Failed to open state directory {}", state_dir.display()))?;

    Ok(Environment {
        context,
        store,
    })
}

/// Format an instant in the scheduler's timezone.
pub(crate) fn local(context: &SchedulerContext, instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&context.time_zone())
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string()
}

/// Print the aggregate's pending fire and every instance's own.
pub(crate) fn log_schedule_summary(context: &SchedulerContext, scheduler: &Scheduler) {
    log_block_start!("Scheduler [{}]", scheduler.id);
    match (scheduler.next_fire_time, scheduler.next_fire_command()) {
        (Some(at), Some(command_id)) => {
            log_indented!("Next fire: {} (command [{command_id}])", local(context, at));
        }
        _ => log_indented!("Next fire: none"),
    }

    for (schedule_id, instance) in &scheduler.instances {
        let state = if instance.enabled { "enabled" } else { "disabled" };
        let group = instance.group.as_deref().unwrap_or("-");
        match instance.next_fire_time {
            Some(at) => log_indented!(
                "[{schedule_id}] {state}, group {group}, next {}",
                local(context, at)
            ),
            None => log_indented!("[{schedule_id}] {state}, group {group}, nothing pending"),
        }
    }
}

/// Tell the user how the host wake-up must change.
pub(crate) fn log_change(context: &SchedulerContext, change: FireTimeChange) {
    match change {
        FireTimeChange::Unchanged => log_indented!("Wake-up unchanged"),
        FireTimeChange::Schedule(at) => log_indented!("Wake-up armed for {}", local(context, at)),
        FireTimeChange::Reschedule { to, .. } => {
            log_indented!("Wake-up moved to {}", local(context, to))
        }
        FireTimeChange::Cancel(_) => log_indented!("Wake-up cancelled"),
    }
}
