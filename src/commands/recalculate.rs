//! Implementation of the recalculate command.

use anyhow::Result;

use crate::args::RunOptions;
use crate::dispatch::SchedulerDispatcher;

/// Recompute every schedule of `scheduler_id`, for example after the
/// configured timezone or location changed.
pub fn handle_recalculate_command(options: &RunOptions, scheduler_id: &str) -> Result<()> {
    let env = super::prepare(options)?;
    let mut dispatcher = SchedulerDispatcher::open(&env.store, env.context.clone(), scheduler_id)?;

    let tz = env.context.time_zone();
    let location = env.context.location().copied();
    let change = dispatcher.update_place(Some(tz), location)?;

    log_block_start!("Recalculated [{scheduler_id}]");
    super::log_change(&env.context, change);
    super::log_schedule_summary(&env.context, dispatcher.coordinator().scheduler());
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("recalculate - Recompute all schedules");
    log_block_start!("Usage: sunsched recalculate <scheduler>");
    log_block_start!("Description:");
    log_indented!("Applies the configured timezone and location to the scheduler");
    log_indented!("and recomputes every sunrise/sunset time and next fire.");
    log_end!();
}
