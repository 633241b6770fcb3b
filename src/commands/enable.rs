//! Implementation of the enable and disable commands.

use anyhow::Result;

use crate::args::RunOptions;
use crate::dispatch::SchedulerDispatcher;

/// Enable or disable one schedule. Enabling disables the other schedules of
/// its group.
pub fn handle_set_enabled_command(
    options: &RunOptions,
    scheduler_id: &str,
    schedule_id: &str,
    enabled: bool,
) -> Result<()> {
    let env = super::prepare(options)?;
    let mut dispatcher = SchedulerDispatcher::open(&env.store, env.context.clone(), scheduler_id)?;

    let change = dispatcher.set_enabled(schedule_id, enabled)?;
    log_block_start!(
        "{} schedule [{schedule_id}]",
        if enabled { "Enabled" } else { "Disabled" }
    );
    super::log_change(&env.context, change);
    super::log_schedule_summary(&env.context, dispatcher.coordinator().scheduler());
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("enable | disable - Switch a schedule on or off");
    log_block_start!("Usage: sunsched enable <scheduler> <schedule>");
    log_indented!("       sunsched disable <scheduler> <schedule>");
    log_block_start!("Notes:");
    log_indented!("Only one schedule per group can be enabled. Enabling a schedule");
    log_indented!("disables the others in its group.");
    log_end!();
}
