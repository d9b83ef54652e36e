//! Role listing for the session's organization.

use vcloud_core::TabularResult;

use crate::cli::{RoleArgs, RoleOperation};
use crate::context::{CommandContext, Connection};
use crate::error::CliError;

use super::util::cell;

pub async fn handle(args: RoleArgs, ctx: &mut CommandContext) -> Result<(), CliError> {
    let conn = Connection::authorize(ctx).await?;
    let org = conn.org().to_owned();

    match args.operation {
        RoleOperation::List => {
            let roles = conn
                .call(conn.client().list_roles(&org))
                .await
                .map_err(|e| e.not_found_as("organization", &org, "status"))?;

            let mut result = TabularResult::new(["name", "read_only", "description"]);
            for role in &roles {
                result.push_row([
                    role.name.clone(),
                    role.read_only.to_string(),
                    cell(role.description.as_deref()),
                ])?;
            }
            result.sort_by_column("name");
            ctx.renderer
                .emit(&result, &format!("{} role(s) in organization '{org}'", result.len()))
        }
    }
}
