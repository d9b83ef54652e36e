//! Execution event listing.

use vcloud_api::{EventPage, EventQuery};
use vcloud_core::TabularResult;

use crate::cli::{EventArgs, EventOperation};
use crate::context::{CommandContext, Connection};
use crate::error::CliError;

use super::util::{self, cell};

/// One row per event, in the order the server returned them.
pub(crate) fn event_rows(page: &EventPage) -> Result<TabularResult, CliError> {
    let mut result = TabularResult::new(["type", "timestamp", "message"]);
    for event in &page.items {
        result.push_row([
            cell(event.event_type.as_deref()),
            cell(event.timestamp.as_deref()),
            cell(event.message.as_ref().and_then(|m| m.text.as_deref())),
        ])?;
    }
    Ok(result)
}

pub(crate) fn summary(page: &EventPage) -> String {
    format!("{} of {} event(s)", page.items.len(), page.total)
}

pub async fn handle(args: EventArgs, ctx: &mut CommandContext) -> Result<(), CliError> {
    let id = util::required(Some(args.id.as_str()), "id")?.to_owned();
    if args.size == 0 {
        return Err(CliError::validation("size", "must be at least 1"));
    }
    let conn = Connection::authorize(ctx).await?;

    match args.operation {
        EventOperation::List => {
            let query = EventQuery {
                from: args.from,
                size: args.size,
                include_logs: args.show_logs,
            };
            let page = conn
                .call(conn.client().list_events(&id, query))
                .await
                .map_err(|e| e.not_found_as("execution", &id, "deployment info"))?;
            ctx.renderer.emit(&event_rows(&page)?, &summary(&page))
        }
    }
}
