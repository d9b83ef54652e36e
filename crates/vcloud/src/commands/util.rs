//! Shared helpers for command handlers.

use vcloud_core::{TabularResult, TaskSnapshot};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.to_owned(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Unwrap a required flag, naming it in the validation error.
pub fn required<'a>(value: Option<&'a str>, flag: &str) -> Result<&'a str, CliError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| CliError::validation(flag, format!("--{flag} is required for this operation")))
}

/// Text for an optional cell.
pub fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// One row per task, in submission order.
pub fn task_result(tasks: &[TaskSnapshot]) -> Result<TabularResult, CliError> {
    let mut result = TabularResult::new(["task", "operation", "status", "progress", "message"]);
    for task in tasks {
        result.push_row([
            task.id.clone(),
            cell(task.operation.as_deref()),
            task.state.to_string(),
            task.progress.to_string(),
            cell(task.message.as_deref()),
        ])?;
    }
    Ok(result)
}
