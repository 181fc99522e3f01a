use crate::error::CliError;
use model::{execution::outcome::RunOutcome, task::spec::TaskSpec};
use std::fmt::Write;

pub fn print_outcome(outcome: &RunOutcome, as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        println!("{outcome}");
    }
    Ok(())
}

pub fn print_tasks(tasks: &[TaskSpec]) {
    print!("{}", render_task_table(tasks));
}

pub fn render_task_table(tasks: &[TaskSpec]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<20} {:<11} {:<24} {:<24} {:<16} {}",
        "Task", "Structure", "Table", "Key", "Schedule", "Tracking"
    );
    let _ = writeln!(out, "{}", "-".repeat(110));
    for task in tasks {
        let tracking = task
            .tracking
            .as_ref()
            .map(|t| format!("{} {} ({})", t.column, t.operator, t.checkpoint_key))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<20} {:<11} {:<24} {:<24} {:<16} {}",
            task.name.to_string(),
            task.kind().as_str(),
            task.table.to_string(),
            task.destination_key,
            task.schedule,
            tracking
        );
    }
    out
}
