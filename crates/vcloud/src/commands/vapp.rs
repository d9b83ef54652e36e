//! vApp command handlers.

use vcloud_api::{CreateVAppRequest, VApp};
use vcloud_core::TabularResult;

use crate::cli::{VappArgs, VappOperation};
use crate::context::{CommandContext, Connection};
use crate::error::CliError;

use super::util::{self, cell};

/// Names for `create --count`: the plain name for one, `name-1..name-N`
/// for more.
fn instance_names(base: &str, count: u32) -> Vec<String> {
    if count <= 1 {
        vec![base.to_owned()]
    } else {
        (1..=count).map(|i| format!("{base}-{i}")).collect()
    }
}

fn detail(vapp: &VApp) -> TabularResult {
    TabularResult::from_pairs([
        ("name", vapp.name.clone()),
        ("id", vapp.id.clone()),
        ("status", cell(vapp.status.as_deref())),
        ("deployed", vapp.deployed.to_string()),
        ("description", cell(vapp.description.as_deref())),
        (
            "vms",
            vapp.vms.iter().map(|vm| vm.name.as_str()).collect::<Vec<_>>().join(", "),
        ),
        (
            "ips",
            vapp.vms
                .iter()
                .filter_map(|vm| vm.ip.as_deref())
                .collect::<Vec<_>>()
                .join(", "),
        ),
    ])
}

pub async fn handle(args: VappArgs, ctx: &mut CommandContext) -> Result<(), CliError> {
    // Argument checks come before the session gate so bad input never
    // costs a remote call.
    if args.operation == VappOperation::Create {
        util::required(args.vapp.as_deref(), "vapp")?;
        util::required(args.catalog.as_deref(), "catalog")?;
        util::required(args.template.as_deref(), "template")?;
        if args.count == 0 {
            return Err(CliError::validation("count", "must be at least 1"));
        }
    }
    if matches!(args.operation, VappOperation::Info | VappOperation::Delete) {
        util::required(args.vapp.as_deref(), "vapp")?;
    }

    let conn = Connection::authorize(ctx).await?;
    let vdc = conn.vdc(args.vdc.as_deref())?;

    match args.operation {
        VappOperation::List => {
            let vapps = conn
                .call(conn.client().list_vapps(&vdc))
                .await
                .map_err(|e| e.not_found_as("VDC", &vdc, "vdc list"))?;

            let mut result = TabularResult::new(["name", "status", "deployed", "vms", "description"]);
            for vapp in &vapps {
                result.push_row([
                    vapp.name.clone(),
                    cell(vapp.status.as_deref()),
                    vapp.deployed.to_string(),
                    vapp.vms.len().to_string(),
                    cell(vapp.description.as_deref()),
                ])?;
            }
            result.sort_by_column("name");
            ctx.renderer
                .emit(&result, &format!("{} vApp(s) in VDC '{vdc}'", result.len()))
        }

        VappOperation::Info => {
            let name = util::required(args.vapp.as_deref(), "vapp")?;
            let vapp = conn
                .call(conn.client().get_vapp(&vdc, name))
                .await
                .map_err(|e| e.not_found_as("vApp", name, "vapp list"))?;
            ctx.renderer.emit(&detail(&vapp), "")
        }

        VappOperation::Create => {
            let base = util::required(args.vapp.as_deref(), "vapp")?;
            let mut tasks = Vec::new();
            for name in instance_names(base, args.count) {
                let request = CreateVAppRequest {
                    name: name.clone(),
                    catalog: args.catalog.clone().unwrap_or_default(),
                    template: args.template.clone().unwrap_or_default(),
                    vm_name: args.vm.clone(),
                    network: args.network.clone(),
                    cpus: args.cpu,
                    memory_mb: args.ram,
                };
                let record = conn.call(conn.client().create_vapp(&vdc, &request)).await?;
                let snapshot = conn
                    .await_task(ctx, record, &format!("creating {name}"))
                    .await?;
                tasks.push(snapshot);
            }

            let result = util::task_result(&tasks)?;
            let message = if ctx.global.no_wait {
                format!("{} vApp creation task(s) submitted", tasks.len())
            } else {
                format!("{} vApp(s) created in VDC '{vdc}'", tasks.len())
            };
            ctx.renderer.emit(&result, &message)
        }

        VappOperation::Delete => {
            let name = util::required(args.vapp.as_deref(), "vapp")?;
            if !util::confirm(&format!("Delete vApp '{name}' from VDC '{vdc}'?"), ctx.global.yes)? {
                return Ok(());
            }
            let record = conn
                .call(conn.client().delete_vapp(&vdc, name))
                .await
                .map_err(|e| e.not_found_as("vApp", name, "vapp list"))?;
            let snapshot = conn.await_task(ctx, record, &format!("deleting {name}")).await?;
            let message = if ctx.global.no_wait {
                format!("deletion of vApp '{name}' submitted")
            } else {
                format!("vApp '{name}' deleted")
            };
            ctx.renderer.emit(&util::task_result(&[snapshot])?, &message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_expands_to_numbered_names() {
        assert_eq!(instance_names("web", 1), vec!["web"]);
        assert_eq!(instance_names("web", 3), vec!["web-1", "web-2", "web-3"]);
    }
}
