//! Deployment commands, including workflow execution and cancellation.

use std::fs;
use std::path::Path;

use vcloud_api::{
    CreateDeploymentRequest, Deployment, EventQuery, ExecuteWorkflowRequest, Execution,
};
use vcloud_core::TabularResult;
use vcloud_core::tabular::sanitize_cell;

use crate::cli::{DeploymentArgs, DeploymentOperation};
use crate::context::{CommandContext, Connection};
use crate::error::CliError;

use super::event;
use super::util::{self, cell};

/// Events shown by `deployment info --show-events`.
const EVENT_WINDOW: u64 = 100;

/// Read deployment inputs from a YAML mapping file; no file means no inputs.
fn load_inputs(path: Option<&Path>) -> Result<serde_json::Value, CliError> {
    let Some(path) = path else {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    };
    let text = fs::read_to_string(path)?;
    let doc: serde_yaml::Value = serde_yaml::from_str(&text)
        .map_err(|e| CliError::validation("file", format!("{}: {e}", path.display())))?;
    match doc {
        serde_yaml::Value::Null => Ok(serde_json::Value::Object(serde_json::Map::new())),
        serde_yaml::Value::Mapping(_) => serde_json::to_value(&doc)
            .map_err(|e| CliError::validation("file", format!("inputs cannot be sent as JSON: {e}"))),
        _ => Err(CliError::validation("file", "inputs must be a YAML mapping")),
    }
}

/// `key=value` pairs with sensitive keys masked.
fn input_summary(deployment: &Deployment) -> String {
    deployment
        .inputs
        .iter()
        .map(|(key, value)| {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{key}={}", sanitize_cell(key, &text))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Execution history, oldest first.
fn execution_rows(executions: &mut [Execution]) -> Result<TabularResult, CliError> {
    executions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    let mut result = TabularResult::new(["workflow", "created", "status", "id"]);
    for ex in executions.iter() {
        result.push_row([
            ex.workflow_id.clone(),
            cell(ex.created_at.as_deref()),
            cell(ex.status.as_deref()),
            ex.id.clone(),
        ])?;
    }
    Ok(result)
}

pub async fn handle(args: DeploymentArgs, ctx: &mut CommandContext) -> Result<(), CliError> {
    match args.operation {
        DeploymentOperation::Create => {
            util::required(args.deployment.as_deref(), "deployment")?;
            util::required(args.blueprint.as_deref(), "blueprint")?;
        }
        DeploymentOperation::Info | DeploymentOperation::Delete => {
            util::required(args.deployment.as_deref(), "deployment")?;
        }
        DeploymentOperation::Execute => {
            util::required(args.deployment.as_deref(), "deployment")?;
            util::required(args.workflow.as_deref(), "workflow")?;
        }
        DeploymentOperation::Cancel => {
            util::required(args.execution.as_deref(), "execution")?;
        }
        DeploymentOperation::List => {}
    }

    let inputs = match args.operation {
        DeploymentOperation::Create => Some(load_inputs(args.file.as_deref())?),
        _ => None,
    };

    let conn = Connection::authorize(ctx).await?;

    match args.operation {
        DeploymentOperation::List => {
            let deployments = conn.call(conn.client().list_deployments()).await?;
            let mut result = TabularResult::new(["id", "blueprint", "created", "inputs"]);
            for dep in &deployments {
                result.push_row([
                    dep.id.clone(),
                    dep.blueprint_id.clone(),
                    cell(dep.created_at.as_deref()),
                    input_summary(dep),
                ])?;
            }
            result.sort_by_column("id");
            ctx.renderer
                .emit(&result, &format!("{} deployment(s)", result.len()))
        }

        DeploymentOperation::Info => {
            let id = util::required(args.deployment.as_deref(), "deployment")?;
            let mut executions = conn
                .call(conn.client().list_executions(id))
                .await
                .map_err(|e| e.not_found_as("deployment", id, "deployment list"))?;
            let history = execution_rows(&mut executions)?;

            if !args.show_events {
                let message = format!("{} execution(s) of deployment '{id}'", history.len());
                return ctx.renderer.emit(&history, &message);
            }

            let Some(latest) = executions.last() else {
                let message = format!("deployment '{id}' has no executions");
                return ctx.renderer.emit(&history, &message);
            };
            let query = EventQuery {
                from: 0,
                size: EVENT_WINDOW,
                include_logs: false,
            };
            let page = conn
                .call(conn.client().list_events(&latest.id, query))
                .await?;
            let message = format!(
                "{}: {} for '{}'",
                latest.id,
                event::summary(&page),
                latest.workflow_id
            );
            ctx.renderer.emit(&event::event_rows(&page)?, &message)
        }

        DeploymentOperation::Create => {
            let id = util::required(args.deployment.as_deref(), "deployment")?;
            let blueprint = util::required(args.blueprint.as_deref(), "blueprint")?;
            let request = CreateDeploymentRequest {
                blueprint_id: blueprint.to_owned(),
                inputs: inputs.unwrap_or_default(),
            };
            let deployment = conn
                .call(conn.client().create_deployment(id, &request))
                .await
                .map_err(|e| e.not_found_as("blueprint", blueprint, "blueprint list"))?;
            let result = TabularResult::from_pairs([
                ("id", deployment.id.clone()),
                ("blueprint", deployment.blueprint_id.clone()),
                ("created", cell(deployment.created_at.as_deref())),
                ("inputs", input_summary(&deployment)),
            ]);
            ctx.renderer
                .emit(&result, &format!("deployment '{id}' created from '{blueprint}'"))
        }

        DeploymentOperation::Delete => {
            let id = util::required(args.deployment.as_deref(), "deployment")?;
            if !util::confirm(&format!("Delete deployment '{id}'?"), ctx.global.yes)? {
                return Ok(());
            }
            conn.call(conn.client().delete_deployment(id, args.force_delete))
                .await
                .map_err(|e| e.not_found_as("deployment", id, "deployment list"))?;
            let result = TabularResult::from_pairs([("deployment", id.to_owned())]);
            ctx.renderer
                .emit(&result, &format!("deployment '{id}' deleted"))
        }

        DeploymentOperation::Execute => {
            let id = util::required(args.deployment.as_deref(), "deployment")?;
            let workflow = util::required(args.workflow.as_deref(), "workflow")?;
            let request = ExecuteWorkflowRequest {
                deployment_id: id.to_owned(),
                workflow_id: workflow.to_owned(),
            };
            let record = conn
                .call(conn.client().execute_workflow(&request))
                .await
                .map_err(|e| e.not_found_as("deployment", id, "deployment list"))?;
            let snapshot = conn
                .await_task(ctx, record, &format!("{workflow} on {id}"))
                .await?;
            let message = if ctx.global.no_wait {
                format!("workflow '{workflow}' on deployment '{id}' submitted")
            } else {
                format!("workflow '{workflow}' on deployment '{id}' finished")
            };
            ctx.renderer.emit(&util::task_result(&[snapshot])?, &message)
        }

        DeploymentOperation::Cancel => {
            let execution = util::required(args.execution.as_deref(), "execution")?;
            let record = conn
                .call(conn.client().cancel_execution(execution, args.force_cancel))
                .await
                .map_err(|e| e.not_found_as("execution", execution, "deployment info"))?;
            let snapshot = conn
                .await_task(ctx, record, &format!("canceling {execution}"))
                .await?;
            let message = if ctx.global.no_wait {
                format!("cancellation of execution '{execution}' submitted")
            } else {
                format!("execution '{execution}' canceled")
            };
            ctx.renderer.emit(&util::task_result(&[snapshot])?, &message)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use vcloud_core::tabular::MASK;

    use super::*;

    fn deployment(inputs: serde_json::Value) -> Deployment {
        serde_json::from_value(json!({ "id": "d1", "blueprint_id": "web", "inputs": inputs }))
            .unwrap()
    }

    #[test]
    fn input_summary_masks_sensitive_keys() {
        let dep = deployment(json!({ "image": "ubuntu", "db_password": "hunter2", "port": 80 }));
        let summary = input_summary(&dep);
        assert!(summary.contains("image=ubuntu"), "{summary}");
        assert!(summary.contains(&format!("db_password={MASK}")), "{summary}");
        assert!(summary.contains("port=80"), "{summary}");
        assert!(!summary.contains("hunter2"));
    }

    #[test]
    fn executions_are_listed_oldest_first() {
        let mut executions: Vec<Execution> = serde_json::from_value(json!([
            { "id": "ex-2", "workflow_id": "scale", "status": "started",
              "created_at": "2024-01-03T00:00:00Z" },
            { "id": "ex-1", "workflow_id": "install", "status": "terminated",
              "created_at": "2024-01-02T00:00:00Z" }
        ]))
        .unwrap();
        let rows = execution_rows(&mut executions).unwrap();
        assert_eq!(rows.rows()[0][0], "install");
        assert_eq!(rows.rows()[1][3], "ex-2");
        assert_eq!(executions.last().map(|e| e.id.as_str()), Some("ex-2"));
    }

    #[test]
    fn inputs_file_must_be_a_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("inputs.yaml");
        fs::write(&good, "image: ubuntu\nreplicas: 2\n").unwrap();
        assert_eq!(
            load_inputs(Some(&good)).unwrap(),
            json!({ "image": "ubuntu", "replicas": 2 })
        );

        let bad = dir.path().join("list.yaml");
        fs::write(&bad, "- a\n- b\n").unwrap();
        assert_eq!(load_inputs(Some(&bad)).unwrap_err().exit_code(), 2);

        assert_eq!(load_inputs(None).unwrap(), json!({}));
    }
}
