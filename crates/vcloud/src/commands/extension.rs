//! API extension management. Reserved: every operation reports that it
//! is unsupported, without touching a session.

use crate::cli::{ExtensionArgs, ExtensionOperation};
use crate::error::CliError;

pub fn handle(args: &ExtensionArgs) -> Result<(), CliError> {
    let op = match args.operation {
        ExtensionOperation::List => "list",
        ExtensionOperation::Info => "info",
        ExtensionOperation::Create => "create",
        ExtensionOperation::Delete => "delete",
    };
    Err(CliError::Unsupported {
        operation: format!("extension {op}"),
    })
}
