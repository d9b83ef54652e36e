//! Blueprint commands: list, inspect, upload, delete, and local validation.

use std::fs;
use std::path::Path;

use serde_yaml::Value;
use vcloud_api::{Blueprint, UploadBlueprintRequest};
use vcloud_core::TabularResult;

use crate::cli::{BlueprintArgs, BlueprintOperation};
use crate::context::{CommandContext, Connection};
use crate::error::CliError;

use super::util::{self, cell};

/// Counts reported for a blueprint that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PlanSummary {
    pub node_templates: usize,
    pub inputs: usize,
}

fn invalid(reason: impl Into<String>) -> CliError {
    CliError::validation("file", reason)
}

/// Collect every `get_input: <name>` reference below `value`.
fn collect_input_refs<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::Mapping(map) => {
            for (key, child) in map {
                if key.as_str() == Some("get_input") {
                    if let Some(name) = child.as_str() {
                        out.push(name);
                    }
                }
                collect_input_refs(child, out);
            }
        }
        Value::Sequence(items) => {
            for item in items {
                collect_input_refs(item, out);
            }
        }
        Value::Tagged(tagged) => collect_input_refs(&tagged.value, out),
        _ => {}
    }
}

/// Structural checks on a parsed blueprint document.
pub(crate) fn validate_plan(doc: &Value) -> Result<PlanSummary, CliError> {
    let root = doc
        .as_mapping()
        .ok_or_else(|| invalid("blueprint must be a YAML mapping"))?;

    if root
        .get("tosca_definitions_version")
        .and_then(Value::as_str)
        .is_none()
    {
        return Err(invalid("missing tosca_definitions_version"));
    }

    let templates = root
        .get("node_templates")
        .and_then(Value::as_mapping)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| invalid("node_templates must be a non-empty mapping"))?;
    let inputs = root.get("inputs").and_then(Value::as_mapping);

    for (name, template) in templates {
        let name = name
            .as_str()
            .ok_or_else(|| invalid("node template names must be strings"))?;

        if template.get("type").and_then(Value::as_str).is_none() {
            return Err(invalid(format!("node template '{name}' has no type")));
        }

        if let Some(relationships) = template.get("relationships") {
            let relationships = relationships
                .as_sequence()
                .ok_or_else(|| invalid(format!("relationships of '{name}' must be a list")))?;
            for rel in relationships {
                let target = rel.get("target").and_then(Value::as_str).ok_or_else(|| {
                    invalid(format!("a relationship of '{name}' has no target"))
                })?;
                if !templates.contains_key(target) {
                    return Err(invalid(format!(
                        "'{name}' relates to unknown node template '{target}'"
                    )));
                }
            }
        }

        let mut refs = Vec::new();
        collect_input_refs(template, &mut refs);
        for input in refs {
            if !inputs.is_some_and(|m| m.contains_key(input)) {
                return Err(invalid(format!(
                    "'{name}' references undeclared input '{input}'"
                )));
            }
        }
    }

    Ok(PlanSummary {
        node_templates: templates.len(),
        inputs: inputs.map_or(0, serde_yaml::Mapping::len),
    })
}

/// Read, parse, and validate a blueprint file.
fn load_plan(path: &Path) -> Result<(Value, PlanSummary), CliError> {
    let text = fs::read_to_string(path)?;
    let doc: Value = serde_yaml::from_str(&text)
        .map_err(|e| invalid(format!("{}: {e}", path.display())))?;
    let summary = validate_plan(&doc)?;
    Ok((doc, summary))
}

fn detail(blueprint: &Blueprint) -> TabularResult {
    TabularResult::from_pairs([
        ("id", blueprint.id.clone()),
        ("created", cell(blueprint.created_at.as_deref())),
        ("updated", cell(blueprint.updated_at.as_deref())),
        ("description", cell(blueprint.description.as_deref())),
    ])
}

/// One row per node template in a stored plan.
fn node_rows(plan: Option<&serde_json::Value>) -> Result<TabularResult, CliError> {
    let mut result = TabularResult::new(["node", "type"]);
    let templates = plan
        .and_then(|p| p.get("node_templates"))
        .and_then(serde_json::Value::as_object);
    for (name, template) in templates.into_iter().flatten() {
        result.push_row([
            name.clone(),
            cell(template.get("type").and_then(serde_json::Value::as_str)),
        ])?;
    }
    result.sort_by_column("node");
    Ok(result)
}

pub async fn handle(args: BlueprintArgs, ctx: &mut CommandContext) -> Result<(), CliError> {
    match args.operation {
        BlueprintOperation::Validate => {
            let file = args
                .file
                .as_deref()
                .ok_or_else(|| CliError::validation("file", "--file is required for this operation"))?;
            let (_, summary) = load_plan(file)?;
            let result = TabularResult::from_pairs([
                ("file", file.display().to_string()),
                ("node_templates", summary.node_templates.to_string()),
                ("inputs", summary.inputs.to_string()),
            ]);
            return ctx
                .renderer
                .emit(&result, &format!("blueprint '{}' is valid", file.display()));
        }
        BlueprintOperation::Create => {
            util::required(args.blueprint.as_deref(), "blueprint")?;
            if args.file.is_none() {
                return Err(CliError::validation("file", "--file is required for this operation"));
            }
        }
        BlueprintOperation::Info | BlueprintOperation::Delete => {
            util::required(args.blueprint.as_deref(), "blueprint")?;
        }
        BlueprintOperation::List => {}
    }

    // Parse locally before a session is needed
    let plan = match (args.operation, args.file.as_deref()) {
        (BlueprintOperation::Create, Some(file)) => Some(load_plan(file)?.0),
        _ => None,
    };

    let conn = Connection::authorize(ctx).await?;

    match args.operation {
        BlueprintOperation::List => {
            let blueprints = conn.call(conn.client().list_blueprints()).await?;
            let mut result = TabularResult::new(["id", "description", "created", "updated"]);
            for bp in &blueprints {
                result.push_row([
                    bp.id.clone(),
                    cell(bp.description.as_deref()),
                    cell(bp.created_at.as_deref()),
                    cell(bp.updated_at.as_deref()),
                ])?;
            }
            result.sort_by_column("id");
            ctx.renderer
                .emit(&result, &format!("{} blueprint(s)", result.len()))
        }

        BlueprintOperation::Info => {
            let id = util::required(args.blueprint.as_deref(), "blueprint")?;
            let blueprint = conn
                .call(conn.client().get_blueprint(id))
                .await
                .map_err(|e| e.not_found_as("blueprint", id, "blueprint list"))?;
            if args.include_plan {
                let nodes = node_rows(blueprint.plan.as_ref())?;
                let message = format!("blueprint '{id}': {} node template(s)", nodes.len());
                ctx.renderer.emit(&nodes, &message)
            } else {
                ctx.renderer.emit(&detail(&blueprint), "")
            }
        }

        BlueprintOperation::Create => {
            let id = util::required(args.blueprint.as_deref(), "blueprint")?;
            let plan = plan.ok_or_else(|| CliError::Internal("blueprint plan not loaded".into()))?;
            let plan = serde_json::to_value(&plan)
                .map_err(|e| invalid(format!("blueprint cannot be sent as JSON: {e}")))?;
            let request = UploadBlueprintRequest {
                id: id.to_owned(),
                plan,
            };
            let blueprint = conn.call(conn.client().upload_blueprint(&request)).await?;
            ctx.renderer
                .emit(&detail(&blueprint), &format!("blueprint '{id}' uploaded"))
        }

        BlueprintOperation::Delete => {
            let id = util::required(args.blueprint.as_deref(), "blueprint")?;
            if !util::confirm(&format!("Delete blueprint '{id}'?"), ctx.global.yes)? {
                return Ok(());
            }
            conn.call(conn.client().delete_blueprint(id))
                .await
                .map_err(|e| e.not_found_as("blueprint", id, "blueprint list"))?;
            let result = TabularResult::from_pairs([("blueprint", id.to_owned())]);
            ctx.renderer
                .emit(&result, &format!("blueprint '{id}' deleted"))
        }

        BlueprintOperation::Validate => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    const WEB: &str = r"
tosca_definitions_version: cloudify_dsl_1_3
inputs:
  image:
    default: ubuntu
node_templates:
  vm:
    type: cloudify.nodes.Compute
    properties:
      image: { get_input: image }
  app:
    type: cloudify.nodes.WebServer
    relationships:
      - type: contained_in
        target: vm
";

    #[test]
    fn well_formed_blueprint_passes() {
        let summary = validate_plan(&parse(WEB)).unwrap();
        assert_eq!(
            summary,
            PlanSummary {
                node_templates: 2,
                inputs: 1
            }
        );
    }

    #[test]
    fn missing_version_is_rejected() {
        let doc = parse("node_templates:\n  vm:\n    type: compute\n");
        let err = validate_plan(&doc).unwrap_err();
        assert!(err.to_string().contains("tosca_definitions_version"), "{err}");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn empty_node_templates_are_rejected() {
        let doc = parse("tosca_definitions_version: v1\nnode_templates: {}\n");
        assert!(validate_plan(&doc).is_err());
        assert!(validate_plan(&parse("- just\n- a list\n")).is_err());
    }

    #[test]
    fn unknown_relationship_target_is_rejected() {
        let doc = parse(&WEB.replace("target: vm", "target: db"));
        let err = validate_plan(&doc).unwrap_err();
        assert!(err.to_string().contains("'db'"), "{err}");
    }

    #[test]
    fn undeclared_input_is_rejected() {
        let doc = parse(&WEB.replace("get_input: image", "get_input: flavor"));
        let err = validate_plan(&doc).unwrap_err();
        assert!(err.to_string().contains("'flavor'"), "{err}");
    }

    #[test]
    fn template_without_type_is_rejected() {
        let doc = parse(&WEB.replace("    type: cloudify.nodes.WebServer\n", ""));
        let err = validate_plan(&doc).unwrap_err();
        assert!(err.to_string().contains("'app' has no type"), "{err}");
    }

    #[test]
    fn node_rows_are_sorted_and_tolerate_missing_plan() {
        let plan = json!({ "node_templates": {
            "vm": { "type": "compute" },
            "app": { "type": "web" }
        }});
        let rows = node_rows(Some(&plan)).unwrap();
        assert_eq!(rows.rows()[0], vec!["app".to_owned(), "web".to_owned()]);
        assert!(node_rows(None).unwrap().is_empty());
    }

    #[test]
    fn blueprint_file_round_trips_into_json_plan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("web.yaml");
        fs::write(&path, WEB).unwrap();
        let (doc, _) = load_plan(&path).unwrap();
        let plan = serde_json::to_value(&doc).unwrap();
        assert_eq!(plan["node_templates"]["vm"]["type"], json!("cloudify.nodes.Compute"));
    }
}
