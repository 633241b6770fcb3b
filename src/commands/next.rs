//! Implementation of the next command.
//!
//! Shows the pending fire of a stored scheduler without changing it.

use anyhow::Result;

use crate::args::RunOptions;
use crate::store::SchedulerStore;

/// Print the next fire of `scheduler_id` and the state of its instances.
pub fn handle_next_command(options: &RunOptions, scheduler_id: &str) -> Result<()> {
    let env = super::prepare(options)?;

    match env.store.load(scheduler_id)? {
        Some(scheduler) => super::log_schedule_summary(&env.context, &scheduler),
        None => {
            log_pipe!();
            log_warning!(
                "No scheduler [{scheduler_id}] in {}",
                env.store.dir().display()
            );
        }
    }
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("next - Show the next pending fire");
    log_block_start!("Usage: sunsched next <scheduler>");
    log_block_start!("Arguments:");
    log_indented!("<scheduler>  Id of a stored scheduler");
    log_block_start!("Output:");
    log_indented!("The scheduler-wide next fire, followed by each schedule's");
    log_indented!("enabled state, group and own next fire. Nothing is saved.");
    log_end!();
}
