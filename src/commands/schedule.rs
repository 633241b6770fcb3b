//! Implementation of the schedule command.
//!
//! Reads a JSON array of command requests and applies them as one batch. An
//! entry without an `id` creates a command, an `id` with `"days": []` deletes
//! one, and any other entry with an `id` updates the named fields.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::args::RunOptions;
use crate::dispatch::SchedulerDispatcher;
use crate::scheduler::CommandSpec;

/// Parse a batch of command requests.
pub fn read_specs(path: &Path) -> Result<Vec<CommandSpec>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read command requests from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse command requests in {}", path.display()))
}

pub fn handle_schedule_command(
    options: &RunOptions,
    scheduler_id: &str,
    specs_path: &str,
    group: Option<&str>,
) -> Result<()> {
    let env = super::prepare(options)?;
    let specs = read_specs(Path::new(specs_path))?;
    let mut dispatcher = SchedulerDispatcher::open(&env.store, env.context.clone(), scheduler_id)?;

    let (command_ids, change) =
        dispatcher.apply(|coordinator| coordinator.schedule_commands(group, &specs))?;

    log_block_start!("Applied {} request(s) to [{scheduler_id}]", specs.len());
    for command_id in &command_ids {
        log_indented!("{command_id}");
    }
    super::log_change(&env.context, change);
    super::log_schedule_summary(&env.context, dispatcher.coordinator().scheduler());
    log_end!();
    Ok(())
}

pub fn display_help() {
    log_version!();
    log_block_start!("schedule - Apply command requests");
    log_block_start!("Usage: sunsched schedule [OPTIONS] <scheduler> <file.json>");
    log_block_start!("Options:");
    log_indented!("-g, --group <name>  Group for schedules created by this batch");
    log_indented!("                    (defaults to each schedule's own id)");
    log_block_start!("File format:");
    log_indented!("[");
    log_indented!("  {{ \"scheduleId\": \"weekday\", \"mode\": \"ABSOLUTE\",");
    log_indented!("    \"time\": \"07:30:00\", \"days\": [\"mon\", \"tue\"] }},");
    log_indented!("  {{ \"scheduleId\": \"weekday\", \"mode\": \"SUNSET\",");
    log_indented!("    \"offsetMinutes\": -15, \"days\": [\"fri\"],");
    log_indented!("    \"messageType\": \"swit:SetSwitch\",");
    log_indented!("    \"attributes\": {{ \"state\": \"ON\" }} }},");
    log_indented!("  {{ \"scheduleId\": \"weekday\", \"id\": \"<command>\", \"days\": [] }}");
    log_indented!("]");
    log_block_start!("Notes:");
    log_indented!("Entries without an id create commands, an id with no days deletes,");
    log_indented!("any other id updates. If one entry fails nothing is saved.");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Mode;
    use crate::time::DayOfWeek;
    use tempfile::tempdir;

    #[test]
    fn test_read_specs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("specs.json");
        fs::write(
            &path,
            r#"[
                {"scheduleId": "weekday", "mode": "ABSOLUTE", "time": "07:30:00", "days": ["mon", "tue"]},
                {"scheduleId": "weekday", "mode": "SUNSET", "offsetMinutes": -15, "days": ["fri"]},
                {"scheduleId": "weekday", "id": "cmd-1", "days": []}
            ]"#,
        )
        .unwrap();

        let specs = read_specs(&path).unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].time, Some("07:30:00".parse().unwrap()));
        assert_eq!(
            specs[0].days.as_ref().unwrap().iter().copied().collect::<Vec<_>>(),
            vec![DayOfWeek::Mon, DayOfWeek::Tue]
        );
        assert_eq!(specs[1].mode, Some(Mode::Sunset));
        assert_eq!(specs[1].offset_minutes, Some(-15));
        assert!(specs[2].is_delete());
    }

    #[test]
    fn test_read_specs_rejects_bad_time() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("specs.json");
        fs::write(&path, r#"[{"scheduleId": "weekday", "time": "25:00:00"}]"#).unwrap();

        let err = read_specs(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse command requests"));
    }
}
