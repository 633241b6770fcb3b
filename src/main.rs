//! Main application entry point.
//!
//! Parses the command line and hands the resulting action to its handler in
//! `sunsched::commands`. Handlers print their own output; failures are
//! reported here and turned into a non-zero exit status.

use sunsched::args::{self, CliAction, ParsedArgs};
use sunsched::commands;
use sunsched::common::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use sunsched::{log_end, log_error, log_indented, log_pipe};

fn run(action: CliAction) -> anyhow::Result<()> {
    match action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp | CliAction::ShowHelpDueToError => {
            args::display_help();
            Ok(())
        }
        CliAction::HelpCommand { command } => commands::help::run_help_command(command.as_deref()),
        CliAction::Next {
            options,
            scheduler_id,
        } => commands::next::handle_next_command(&options, &scheduler_id),
        CliAction::Fire {
            options,
            scheduler_id,
            command_id,
        } => commands::fire::handle_fire_command(&options, &scheduler_id, &command_id),
        CliAction::Recalculate {
            options,
            scheduler_id,
        } => commands::recalculate::handle_recalculate_command(&options, &scheduler_id),
        CliAction::Schedule {
            options,
            scheduler_id,
            specs_path,
            group,
        } => commands::schedule::handle_schedule_command(
            &options,
            &scheduler_id,
            &specs_path,
            group.as_deref(),
        ),
        CliAction::SetEnabled {
            options,
            scheduler_id,
            schedule_id,
            enabled,
        } => commands::enable::handle_set_enabled_command(
            &options,
            &scheduler_id,
            &schedule_id,
            enabled,
        ),
        CliAction::Simulate {
            options,
            scheduler_id,
            start_time,
            end_time,
        } => commands::simulate::handle_simulate_command(
            &options,
            &scheduler_id,
            &start_time,
            &end_time,
        ),
    }
}

fn main() {
    let parsed_args = ParsedArgs::from_env();
    let failed_parse = parsed_args.action == CliAction::ShowHelpDueToError;

    if let Err(e) = run(parsed_args.action) {
        log_pipe!();
        log_error!("{e}");
        for cause in e.chain().skip(1) {
            log_indented!("Caused by: {cause}");
        }
        log_end!();
        std::process::exit(EXIT_FAILURE);
    }

    std::process::exit(if failed_parse { EXIT_FAILURE } else { EXIT_SUCCESS });
}
