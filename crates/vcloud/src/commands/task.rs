//! Task inspection: show, wait on, or cancel an existing task.

use vcloud_core::{OperationHandle, TabularResult, TaskSnapshot};

use crate::cli::{TaskArgs, TaskOperation};
use crate::context::{CommandContext, Connection};
use crate::error::CliError;

use super::util::{self, cell};

fn detail(task: &TaskSnapshot) -> TabularResult {
    TabularResult::from_pairs([
        ("task", task.id.clone()),
        ("operation", cell(task.operation.as_deref())),
        ("status", task.state.to_string()),
        ("progress", task.progress.to_string()),
        ("message", cell(task.message.as_deref())),
    ])
}

pub async fn handle(args: TaskArgs, ctx: &mut CommandContext) -> Result<(), CliError> {
    let id = util::required(Some(args.id.as_str()), "id")?.to_owned();
    let conn = Connection::authorize(ctx).await?;

    match args.operation {
        TaskOperation::Info => {
            let record = conn
                .call(conn.client().get_task(&id))
                .await
                .map_err(|e| e.not_found_as("task", &id, "task info"))?;
            ctx.renderer.emit(&detail(&TaskSnapshot::from(record)), "")
        }

        TaskOperation::Wait => {
            let handle = OperationHandle::new(&id, &conn.profile().name);
            let snapshot = conn
                .monitor(ctx, handle, &format!("task {id}"))
                .await
                .map_err(|e| e.not_found_as("task", &id, "task info"))?;
            ctx.renderer
                .emit(&util::task_result(&[snapshot])?, &format!("task '{id}' completed"))
        }

        TaskOperation::Cancel => {
            let accepted = conn
                .call(conn.client().cancel_task(&id))
                .await
                .map_err(|e| e.not_found_as("task", &id, "task info"))?;
            let result = TabularResult::from_pairs([
                ("task", id.clone()),
                ("cancel_accepted", accepted.to_string()),
            ]);
            let message = if accepted {
                format!("cancellation of task '{id}' requested")
            } else {
                format!("task '{id}' could not be canceled (already finished?)")
            };
            ctx.renderer.emit(&result, &message)
        }
    }
}
