//! Help command implementation for sunsched.
//!
//! This module provides a dispatcher for the help command that shows
//! command-specific help or general help based on the arguments provided.

use anyhow::Result;

/// Show brief usage for a command (used for error messages)
pub fn show_command_usage(command: &str) {
    match command {
        "next" | "n" => log_block_start!("Usage: sunsched next <scheduler>"),
        "fire" | "f" => log_block_start!("Usage: sunsched fire <scheduler> <command>"),
        "recalculate" | "r" => log_block_start!("Usage: sunsched recalculate <scheduler>"),
        "schedule" | "s" => {
            log_block_start!("Usage: sunsched schedule [--group <name>] <scheduler> <file.json>")
        }
        "enable" | "disable" => {
            log_block_start!("Usage: sunsched {command} <scheduler> <schedule>")
        }
        "simulate" | "S" => log_block_start!("Usage: sunsched simulate <scheduler> <start> <end>"),
        "help" | "h" => log_block_start!("Usage: sunsched help [COMMAND]"),
        _ => log_block_start!("Usage: sunsched [OPTIONS] <COMMAND> <SCHEDULER> [ARGS]"),
    }
}

/// Run the help command (dispatcher)
///
/// # Arguments
/// * `command` - Optional command name to get help for (None = general help)
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("next") | Some("n") => super::next::display_help(),
        Some("fire") | Some("f") => super::fire::display_help(),
        Some("recalculate") | Some("r") => super::recalculate::display_help(),
        Some("schedule") | Some("s") => super::schedule::display_help(),
        Some("enable") | Some("disable") => super::enable::display_help(),
        Some("simulate") | Some("S") => super::simulate::display_help(),
        Some("help") | Some("h") => display_help_help(),
        Some(unknown) => {
            log_warning!("Unknown command: {unknown}");
            display_general_help();
        }
    }
    Ok(())
}

/// Display general help focused on commands (for the help command)
fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("next, n <scheduler>                    Show the next pending fire");
    log_indented!("fire, f <scheduler> <command>          Fire a command now");
    log_indented!("recalculate, r <scheduler>             Recompute all schedules");
    log_indented!("schedule, s <scheduler> <file.json>    Apply command requests");
    log_indented!("enable | disable <scheduler> <schedule>");
    log_indented!("simulate, S <scheduler> <start> <end>  Replay fires over a time range");
    log_indented!("help, h [COMMAND]                      Show detailed help for a command");
    log_pipe!();
    log_info!("Use 'sunsched help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'sunsched --help' to see all options and general usage.");
    log_end!();
}

/// Display help for the help command itself
fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: sunsched help [COMMAND]");
    log_block_start!("Arguments:");
    log_indented!("COMMAND  Optional command to get help for");
    log_indented!("         If omitted, shows general help");
    log_block_start!("Examples:");
    log_indented!("# Show general help");
    log_indented!("sunsched help");
    log_pipe!();
    log_indented!("# Show help for specific commands");
    log_indented!("sunsched help schedule");
    log_indented!("sunsched help simulate");
    log_end!();
}
