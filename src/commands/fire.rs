//! Implementation of the fire command.
//!
//! Fires one command immediately, records it as the last fire, and prints the
//! message that would be delivered.

use anyhow::Result;

use crate::args::RunOptions;
use crate::dispatch::SchedulerDispatcher;

pub fn handle_fire_command(options: &RunOptions, scheduler_id: &str, command_id: &str) -> Result<()> {
    let env = super::prepare(options)?;
    let mut dispatcher = SchedulerDispatcher::open(&env.store, env.context.clone(), scheduler_id)?;

    let dispatch = dispatcher.fire_command(command_id)?;
    match &dispatch.message {
        Some(message) => {
            log_block_start!("Message for [{scheduler_id}]:");
            log_indented!("{}", serde_json::to_string_pretty(message)?);
        }
        None => {
            log_pipe!();
            log_warning!("Nothing was fired");
        }
    }
    super::log_change(&env.context, dispatch.change);
    super::log_schedule_summary(&env.context, dispatcher.coordinator().scheduler());
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("fire - Fire a command now");
    log_block_start!("Usage: sunsched fire <scheduler> <command>");
    log_block_start!("Arguments:");
    log_indented!("<scheduler>  Id of the scheduler owning the command");
    log_indented!("<command>    Id of the command to fire");
    log_block_start!("Notes:");
    log_indented!("The fire is recorded as the schedule's last fire and the");
    log_indented!("next fire is recomputed from the current time.");
    log_end!();
}
