//! Virtual datacenter commands.

use vcloud_api::Vdc;
use vcloud_core::{ProfileField, TabularResult};

use crate::cli::{VdcArgs, VdcOperation};
use crate::context::{CommandContext, Connection};
use crate::error::CliError;

use super::util::{self, cell};

fn usage(used: Option<u64>, limit: Option<u64>, unit: &str) -> String {
    match (used, limit) {
        (None, None) => String::new(),
        (used, Some(0) | None) => format!("{} {unit} (unlimited)", used.unwrap_or(0)),
        (used, Some(limit)) => format!("{} / {limit} {unit}", used.unwrap_or(0)),
    }
}

fn detail(vdc: &Vdc) -> TabularResult {
    TabularResult::from_pairs([
        ("name", vdc.name.clone()),
        ("id", vdc.id.clone()),
        ("description", cell(vdc.description.as_deref())),
        ("allocation_model", cell(vdc.allocation_model.as_deref())),
        ("enabled", vdc.enabled.to_string()),
        ("cpu", usage(vdc.cpu_used_mhz, vdc.cpu_limit_mhz, "MHz")),
        ("memory", usage(vdc.memory_used_mb, vdc.memory_limit_mb, "MB")),
        ("storage", usage(vdc.storage_used_mb, vdc.storage_limit_mb, "MB")),
        ("gateways", vdc.gateways.join(", ")),
    ])
}

pub async fn handle(args: VdcArgs, ctx: &mut CommandContext) -> Result<(), CliError> {
    if args.operation == VdcOperation::Use {
        util::required(args.vdc.as_deref(), "vdc")?;
    }

    let conn = Connection::authorize(ctx).await?;
    let org = conn.org().to_owned();

    match args.operation {
        VdcOperation::List => {
            let vdcs = conn.call(conn.client().list_vdcs(&org)).await?;
            let in_use = conn.profile().vdc();

            let mut result =
                TabularResult::new(["in_use", "name", "allocation_model", "enabled", "description"]);
            for vdc in &vdcs {
                result.push_row([
                    if Some(vdc.name.as_str()) == in_use { "*".to_owned() } else { String::new() },
                    vdc.name.clone(),
                    cell(vdc.allocation_model.as_deref()),
                    vdc.enabled.to_string(),
                    cell(vdc.description.as_deref()),
                ])?;
            }
            result.sort_by_column("name");
            ctx.renderer
                .emit(&result, &format!("{} VDC(s) in org '{org}'", result.len()))
        }

        VdcOperation::Use => {
            let name = util::required(args.vdc.as_deref(), "vdc")?;
            let vdc = conn
                .call(conn.client().get_vdc(&org, name))
                .await
                .map_err(|e| e.not_found_as("VDC", name, "vdc list"))?;

            let profile = conn.profile().name.clone();
            ctx.store.set(&profile, ProfileField::Vdc, &vdc.name)?;
            ctx.renderer
                .emit_message(&format!("using VDC '{}' in org '{org}'", vdc.name))
        }

        VdcOperation::Info => {
            let name = conn.vdc(args.vdc.as_deref())?;
            let vdc = conn
                .call(conn.client().get_vdc(&org, &name))
                .await
                .map_err(|e| e.not_found_as("VDC", &name, "vdc list"))?;
            ctx.renderer.emit(&detail(&vdc), "")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_formats_limits() {
        assert_eq!(usage(Some(500), Some(2000), "MHz"), "500 / 2000 MHz");
        assert_eq!(usage(Some(500), Some(0), "MB"), "500 MB (unlimited)");
        assert_eq!(usage(None, None, "MB"), "");
    }
}
