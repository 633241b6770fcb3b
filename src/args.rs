//! Command-line argument parsing and processing.
//!
//! Every invocation names a subcommand and, for all but `help`, the scheduler it
//! works on. Global flags may appear anywhere on the command line.

/// Flags shared by every scheduler subcommand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    pub debug_enabled: bool,
    pub config_dir: Option<String>,
}

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Show the pending fire of a scheduler
    Next {
        options: RunOptions,
        scheduler_id: String,
    },
    /// Fire a command immediately
    Fire {
        options: RunOptions,
        scheduler_id: String,
        command_id: String,
    },
    /// Recompute every schedule of a scheduler
    Recalculate {
        options: RunOptions,
        scheduler_id: String,
    },
    /// Apply a batch of command requests read from a JSON file
    Schedule {
        options: RunOptions,
        scheduler_id: String,
        specs_path: String,
        group: Option<String>,
    },
    /// Enable or disable one schedule instance
    SetEnabled {
        options: RunOptions,
        scheduler_id: String,
        schedule_id: String,
        enabled: bool,
    },
    /// Drive a scheduler through a simulated time range
    Simulate {
        options: RunOptions,
        scheduler_id: String,
        start_time: String,
        end_time: String,
    },
    /// Detailed help for one command, or the command list
    HelpCommand { command: Option<String> },

    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown or missing arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments (including the program name) into an action.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut options = RunOptions::default();
        let mut group: Option<String> = None;
        let mut display_help = false;
        let mut display_version = false;
        let mut unknown_arg_found = false;
        let mut positionals: Vec<String> = Vec::new();

        let mut i = 0;
        while i < args_vec.len() {
            let arg_str = &args_vec[i];
            match arg_str.as_str() {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => options.debug_enabled = true,
                "--config" | "-c" | "--group" | "-g" => {
                    // Both take one value: --config <directory>, --group <name>
                    if i + 1 < args_vec.len() && !args_vec[i + 1].starts_with('-') {
                        let value = args_vec[i + 1].clone();
                        if matches!(arg_str.as_str(), "--config" | "-c") {
                            options.config_dir = Some(value);
                        } else {
                            group = Some(value);
                        }
                        i += 1;
                    } else {
                        log_warning!("Missing value for {arg_str}");
                        unknown_arg_found = true;
                    }
                }
                _ if arg_str.starts_with('-') && arg_str.len() > 1 => {
                    log_warning!("Unknown option: {arg_str}");
                    unknown_arg_found = true;
                }
                _ => positionals.push(arg_str.clone()),
            }
            i += 1;
        }

        if display_version {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }
        if unknown_arg_found {
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }
        if display_help {
            // `sunsched next --help` shows help for `next`
            let action = match positionals.first() {
                Some(command) => CliAction::HelpCommand {
                    command: Some(command.clone()),
                },
                None => CliAction::ShowHelp,
            };
            return ParsedArgs { action };
        }

        let Some((command, rest)) = positionals.split_first() else {
            return ParsedArgs {
                action: CliAction::ShowHelp,
            };
        };

        let action = match (command.as_str(), rest) {
            ("help" | "h", []) => CliAction::HelpCommand { command: None },
            ("help" | "h", [topic]) => CliAction::HelpCommand {
                command: Some(topic.clone()),
            },
            ("next" | "n", [scheduler_id]) => CliAction::Next {
                options,
                scheduler_id: scheduler_id.clone(),
            },
            ("fire" | "f", [scheduler_id, command_id]) => CliAction::Fire {
                options,
                scheduler_id: scheduler_id.clone(),
                command_id: command_id.clone(),
            },
            ("recalculate" | "r", [scheduler_id]) => CliAction::Recalculate {
                options,
                scheduler_id: scheduler_id.clone(),
            },
            ("schedule" | "s", [scheduler_id, specs_path]) => CliAction::Schedule {
                options,
                scheduler_id: scheduler_id.clone(),
                specs_path: specs_path.clone(),
                group,
            },
            ("enable" | "disable", [scheduler_id, schedule_id]) => CliAction::SetEnabled {
                options,
                scheduler_id: scheduler_id.clone(),
                schedule_id: schedule_id.clone(),
                enabled: command == "enable",
            },
            ("simulate" | "S", [scheduler_id, start_time, end_time]) => {
                let valid = |s: &str| {
                    s.len() == 19
                        && s.chars().nth(4) == Some('-')
                        && s.chars().nth(7) == Some('-')
                        && s.chars().nth(10) == Some(' ')
                        && s.chars().nth(13) == Some(':')
                        && s.chars().nth(16) == Some(':')
                };
                if !valid(start_time) || !valid(end_time) {
                    log_error!("Invalid time format. Use \"YYYY-MM-DD HH:MM:SS\"");
                    CliAction::ShowHelpDueToError
                } else {
                    CliAction::Simulate {
                        options,
                        scheduler_id: scheduler_id.clone(),
                        start_time: start_time.clone(),
                        end_time: end_time.clone(),
                    }
                }
            }
            (
                "help" | "h" | "next" | "n" | "fire" | "f" | "recalculate" | "r" | "schedule"
                | "s" | "enable" | "disable" | "simulate" | "S",
                _,
            ) => {
                log_warning!("Wrong number of arguments for '{command}'");
                crate::commands::help::show_command_usage(command);
                CliAction::ShowHelpDueToError
            }
            _ => {
                log_warning!("Unknown command: {command}");
                CliAction::ShowHelpDueToError
            }
        };

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    crate::logger::write_output(&format!("┗ {}\n", env!("CARGO_PKG_DESCRIPTION")));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("sunsched [OPTIONS] <COMMAND> <SCHEDULER> [ARGS]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-g, --group <name>     Group for schedules created by 'schedule'");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("next, n <scheduler>                    Show the next pending fire");
    log_indented!("fire, f <scheduler> <command>          Fire a command now");
    log_indented!("recalculate, r <scheduler>             Recompute all schedules");
    log_indented!("schedule, s <scheduler> <file.json>    Apply command requests");
    log_indented!("enable | disable <scheduler> <schedule>");
    log_indented!("simulate, S <scheduler> <start> <end>  Replay fires over a time range");
    log_indented!("help, h [COMMAND]                      Detailed help for a command");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliAction {
        ParsedArgs::parse(std::iter::once("sunsched").chain(args.iter().copied())).action
    }

    #[test]
    fn test_parse_no_args() {
        assert_eq!(parse(&[]), CliAction::ShowHelp);
    }

    #[test]
    fn test_parse_help_and_version() {
        assert_eq!(parse(&["--help"]), CliAction::ShowHelp);
        assert_eq!(parse(&["-h"]), CliAction::ShowHelp);
        assert_eq!(parse(&["--version"]), CliAction::ShowVersion);
        assert_eq!(parse(&["-V"]), CliAction::ShowVersion);
        // Version takes precedence
        assert_eq!(parse(&["--help", "--version"]), CliAction::ShowVersion);
    }

    #[test]
    fn test_parse_next() {
        assert_eq!(
            parse(&["next", "place-1"]),
            CliAction::Next {
                options: RunOptions::default(),
                scheduler_id: "place-1".to_string(),
            }
        );
    }

    #[test]
    fn test_flags_anywhere() {
        assert_eq!(
            parse(&["-d", "fire", "place-1", "--config", "/tmp/conf", "cmd-1"]),
            CliAction::Fire {
                options: RunOptions {
                    debug_enabled: true,
                    config_dir: Some("/tmp/conf".to_string()),
                },
                scheduler_id: "place-1".to_string(),
                command_id: "cmd-1".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_schedule_with_group() {
        assert_eq!(
            parse(&["schedule", "place-1", "specs.json", "--group", "climate"]),
            CliAction::Schedule {
                options: RunOptions::default(),
                scheduler_id: "place-1".to_string(),
                specs_path: "specs.json".to_string(),
                group: Some("climate".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_enable_disable() {
        assert_eq!(
            parse(&["disable", "place-1", "weekday"]),
            CliAction::SetEnabled {
                options: RunOptions::default(),
                scheduler_id: "place-1".to_string(),
                schedule_id: "weekday".to_string(),
                enabled: false,
            }
        );
    }

    #[test]
    fn test_parse_simulate() {
        assert_eq!(
            parse(&["simulate", "place-1", "2026-10-19 00:00:00", "2026-10-26 00:00:00"]),
            CliAction::Simulate {
                options: RunOptions::default(),
                scheduler_id: "place-1".to_string(),
                start_time: "2026-10-19 00:00:00".to_string(),
                end_time: "2026-10-26 00:00:00".to_string(),
            }
        );
        assert_eq!(
            parse(&["simulate", "place-1", "2026-10-19", "2026-10-26"]),
            CliAction::ShowHelpDueToError
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse(&["next"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["fire", "place-1"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["bogus", "place-1"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["next", "place-1", "--bogus"]), CliAction::ShowHelpDueToError);
        assert_eq!(parse(&["next", "place-1", "--config"]), CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_help_command() {
        assert_eq!(parse(&["help"]), CliAction::HelpCommand { command: None });
        assert_eq!(
            parse(&["help", "simulate"]),
            CliAction::HelpCommand {
                command: Some("simulate".to_string())
            }
        );
        assert_eq!(
            parse(&["next", "--help"]),
            CliAction::HelpCommand {
                command: Some("next".to_string())
            }
        );
    }
}
