//! Organization VDC network commands.

use vcloud_api::{CreateNetworkRequest, NetworkType};
use vcloud_core::TabularResult;

use crate::cli::{NetworkArgs, NetworkOperation};
use crate::context::{CommandContext, Connection};
use crate::error::CliError;

use super::util::{self, cell};

/// Parse `--type`, case-insensitively.
fn parse_type(raw: &str) -> Result<NetworkType, CliError> {
    match raw.to_ascii_lowercase().as_str() {
        "vdc-direct" => Ok(NetworkType::VdcDirect),
        "vdc-isolated" => Ok(NetworkType::VdcIsolated),
        _ => Err(CliError::validation(
            "type",
            format!("invalid network type '{raw}' (expected vdc-direct or vdc-isolated)"),
        )),
    }
}

fn create_request(args: &NetworkArgs) -> Result<CreateNetworkRequest, CliError> {
    let name = util::required(args.name.as_deref(), "name")?;
    let network_type = parse_type(util::required(args.network_type.as_deref(), "type")?)?;
    if network_type == NetworkType::VdcDirect && args.parent.is_none() {
        return Err(CliError::validation(
            "parent",
            "a vdc-direct network needs --parent <external network>",
        ));
    }
    Ok(CreateNetworkRequest {
        name: name.to_owned(),
        network_type,
        parent: args.parent.clone(),
        description: args.description.clone(),
    })
}

pub async fn handle(args: NetworkArgs, ctx: &mut CommandContext) -> Result<(), CliError> {
    let request = match args.operation {
        NetworkOperation::Create => Some(create_request(&args)?),
        NetworkOperation::Delete => {
            util::required(args.name.as_deref(), "name")?;
            None
        }
        NetworkOperation::List => None,
    };

    let conn = Connection::authorize(ctx).await?;
    let vdc = conn.vdc(args.vdc.as_deref())?;

    match request {
        Some(request) => {
            let record = conn.call(conn.client().create_network(&vdc, &request)).await?;
            let snapshot = conn
                .await_task(ctx, record, &format!("creating {}", request.name))
                .await?;
            ctx.renderer.emit(
                &util::task_result(&[snapshot])?,
                &format!("network '{}' created in VDC '{vdc}'", request.name),
            )
        }

        None if args.operation == NetworkOperation::Delete => {
            let name = util::required(args.name.as_deref(), "name")?;
            if !util::confirm(&format!("Delete network '{name}' from VDC '{vdc}'?"), ctx.global.yes)? {
                return Ok(());
            }
            let record = conn
                .call(conn.client().delete_network(&vdc, name))
                .await
                .map_err(|e| e.not_found_as("network", name, "network list"))?;
            let snapshot = conn.await_task(ctx, record, &format!("deleting {name}")).await?;
            ctx.renderer
                .emit(&util::task_result(&[snapshot])?, &format!("network '{name}' deleted"))
        }

        None => {
            let networks = conn
                .call(conn.client().list_networks(&vdc))
                .await
                .map_err(|e| e.not_found_as("VDC", &vdc, "vdc list"))?;

            let mut result =
                TabularResult::new(["name", "type", "gateway", "netmask", "parent", "description"]);
            for net in &networks {
                result.push_row([
                    net.name.clone(),
                    cell(net.network_type.as_deref()),
                    cell(net.gateway.as_deref()),
                    cell(net.netmask.as_deref()),
                    cell(net.parent.as_deref()),
                    cell(net.description.as_deref()),
                ])?;
            }
            result.sort_by_column("name");
            ctx.renderer
                .emit(&result, &format!("{} network(s) in VDC '{vdc}'", result.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_types_parse_case_insensitively() {
        assert!(matches!(parse_type("VDC-Direct"), Ok(NetworkType::VdcDirect)));
        assert!(matches!(parse_type("vdc-isolated"), Ok(NetworkType::VdcIsolated)));
        let err = parse_type("bridged").err().map(|e| e.exit_code());
        assert_eq!(err, Some(2));
    }
}
