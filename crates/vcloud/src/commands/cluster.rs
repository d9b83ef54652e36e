//! Container cluster commands.

use vcloud_api::{Cluster, CreateClusterRequest};
use vcloud_core::TabularResult;

use crate::cli::{ClusterArgs, ClusterOperation};
use crate::context::{CommandContext, Connection};
use crate::error::CliError;

use super::util::{self, cell};

fn node_list(cluster: &Cluster) -> String {
    cluster
        .nodes
        .iter()
        .map(|n| match n.ip.as_deref() {
            Some(ip) => format!("{} ({ip})", n.name),
            None => n.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn detail(cluster: &Cluster) -> TabularResult {
    TabularResult::from_pairs([
        ("name", cluster.name.clone()),
        ("id", cluster.id.clone()),
        ("vdc", cell(cluster.vdc.as_deref())),
        ("status", cell(cluster.status.as_deref())),
        (
            "masters",
            cluster
                .master_nodes
                .iter()
                .map(|n| n.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        ("nodes", node_list(cluster)),
    ])
}

/// Resolve `--id`, or look the cluster up by `--name`.
async fn resolve_id(conn: &Connection, args: &ClusterArgs) -> Result<String, CliError> {
    if let Some(id) = args.id.as_deref().filter(|s| !s.trim().is_empty()) {
        return Ok(id.to_owned());
    }
    let name = util::required(args.name.as_deref(), "name")?;
    let clusters = conn.call(conn.client().list_clusters()).await?;
    clusters
        .into_iter()
        .find(|c| c.name == name)
        .map(|c| c.id)
        .ok_or_else(|| CliError::NotFound {
            resource_type: "cluster".into(),
            identifier: name.to_owned(),
            list_command: "cluster list".into(),
        })
}

pub async fn handle(args: ClusterArgs, ctx: &mut CommandContext) -> Result<(), CliError> {
    match args.operation {
        ClusterOperation::Create => {
            util::required(args.name.as_deref(), "name")?;
            util::required(args.network.as_deref(), "network")?;
            if args.nodes == 0 {
                return Err(CliError::validation("nodes", "must be at least 1"));
            }
        }
        ClusterOperation::Info | ClusterOperation::Delete => {
            if args.id.is_none() && args.name.is_none() {
                return Err(CliError::validation("name", "pass --name or --id"));
            }
        }
        ClusterOperation::List => {}
    }

    let conn = Connection::authorize(ctx).await?;

    match args.operation {
        ClusterOperation::List => {
            let clusters = conn.call(conn.client().list_clusters()).await?;
            let mut result = TabularResult::new(["name", "id", "vdc", "status", "masters", "nodes"]);
            for cluster in &clusters {
                result.push_row([
                    cluster.name.clone(),
                    cluster.id.clone(),
                    cell(cluster.vdc.as_deref()),
                    cell(cluster.status.as_deref()),
                    cluster.master_nodes.len().to_string(),
                    cluster.nodes.len().to_string(),
                ])?;
            }
            result.sort_by_column("name");
            ctx.renderer
                .emit(&result, &format!("{} cluster(s)", result.len()))
        }

        ClusterOperation::Info => {
            let id = resolve_id(&conn, &args).await?;
            let cluster = conn
                .call(conn.client().get_cluster(&id))
                .await
                .map_err(|e| e.not_found_as("cluster", &id, "cluster list"))?;
            ctx.renderer.emit(&detail(&cluster), "")
        }

        ClusterOperation::Create => {
            let name = util::required(args.name.as_deref(), "name")?;
            let request = CreateClusterRequest {
                name: name.to_owned(),
                vdc: conn.vdc(args.vdc.as_deref())?,
                network: util::required(args.network.as_deref(), "network")?.to_owned(),
                node_count: args.nodes,
            };
            let record = conn.call(conn.client().create_cluster(&request)).await?;
            let snapshot = conn.await_task(ctx, record, &format!("creating {name}")).await?;
            let message = if ctx.global.no_wait {
                format!("creation of cluster '{name}' submitted")
            } else {
                format!("cluster '{name}' created with {} node(s)", args.nodes)
            };
            ctx.renderer.emit(&util::task_result(&[snapshot])?, &message)
        }

        ClusterOperation::Delete => {
            let id = resolve_id(&conn, &args).await?;
            let label = args.name.as_deref().unwrap_or(&id).to_owned();
            if !util::confirm(&format!("Delete cluster '{label}'?"), ctx.global.yes)? {
                return Ok(());
            }
            let record = conn
                .call(conn.client().delete_cluster(&id))
                .await
                .map_err(|e| e.not_found_as("cluster", &id, "cluster list"))?;
            let snapshot = conn.await_task(ctx, record, &format!("deleting {label}")).await?;
            let message = if ctx.global.no_wait {
                format!("deletion of cluster '{label}' submitted")
            } else {
                format!("cluster '{label}' deleted")
            };
            ctx.renderer.emit(&util::task_result(&[snapshot])?, &message)
        }
    }
}

#[cfg(test)]
mod tests {
    use vcloud_api::ClusterNode;

    use super::*;

    #[test]
    fn node_list_shows_addresses_when_known() {
        let cluster = Cluster {
            name: "k8s".into(),
            id: "c-1".into(),
            master_nodes: vec![],
            nodes: vec![
                ClusterNode {
                    name: "node-1".into(),
                    ip: Some("10.0.0.11".into()),
                },
                ClusterNode {
                    name: "node-2".into(),
                    ip: None,
                },
            ],
            vdc: None,
            status: None,
        };
        assert_eq!(node_list(&cluster), "node-1 (10.0.0.11), node-2");
    }
}
