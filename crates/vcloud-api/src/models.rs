// Wire models for the control-plane JSON API.
//
// Optional fields default rather than fail: older API versions omit
// several of them and the CLI renders blanks for anything missing.

use serde::{Deserialize, Serialize};

/// Identity returned by `POST /api/sessions` and `GET /api/session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub user: String,
    pub org: String,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Href of the session resource, when the server provides one.
    #[serde(default)]
    pub location: Option<String>,
}

/// A remote long-running operation as returned by `GET /api/tasks/{id}`
/// and by every mutating endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    /// `queued`, `preRunning`, `running`, `success`, `error`, `canceled`, `aborted`.
    pub status: String,
    #[serde(default)]
    pub operation: Option<String>,
    /// Percent complete as reported by the server; may be absent or out of range.
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub details: Option<String>,
    /// Structured error payload, present only when `status` is `error`.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vdc {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub allocation_model: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub cpu_limit_mhz: Option<u64>,
    #[serde(default)]
    pub cpu_used_mhz: Option<u64>,
    #[serde(default)]
    pub memory_limit_mb: Option<u64>,
    #[serde(default)]
    pub memory_used_mb: Option<u64>,
    #[serde(default)]
    pub storage_limit_mb: Option<u64>,
    #[serde(default)]
    pub storage_used_mb: Option<u64>,
    #[serde(default)]
    pub gateways: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vm {
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub cpus: Option<u32>,
    #[serde(default)]
    pub memory_mb: Option<u64>,
    #[serde(default)]
    pub ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VApp {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub deployed: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub vms: Vec<Vm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgNetwork {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub network_type: Option<String>,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub netmask: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNode {
    pub name: String,
    #[serde(default)]
    pub ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub master_nodes: Vec<ClusterNode>,
    #[serde(default)]
    pub nodes: Vec<ClusterNode>,
    #[serde(default)]
    pub vdc: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

// ── Blueprints and deployments ──────────────────────────────────────

/// A stored blueprint. `plan` is only returned by the detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub plan: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
}

/// A blueprint instantiated with concrete inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: String,
    pub blueprint_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub inputs: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub workflows: Vec<Workflow>,
}

/// One run of a workflow against a deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub id: String,
    pub workflow_id: String,
    #[serde(default)]
    pub deployment_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub message: Option<EventMessage>,
}

/// One batch of execution events plus the total available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPage {
    #[serde(default)]
    pub items: Vec<Event>,
    #[serde(default)]
    pub total: u64,
}

// ── Request bodies ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CreateVAppRequest {
    pub name: String,
    pub catalog: String,
    pub template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpus: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u64>,
}

/// Org VDC network flavours the client knows how to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkType {
    /// Directly connected to an external network.
    VdcDirect,
    /// Isolated, no uplink.
    VdcIsolated,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateNetworkRequest {
    pub name: String,
    pub network_type: NetworkType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateClusterRequest {
    pub name: String,
    pub vdc: String,
    pub network: String,
    pub node_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadBlueprintRequest {
    pub id: String,
    pub plan: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateDeploymentRequest {
    pub blueprint_id: String,
    pub inputs: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteWorkflowRequest {
    pub deployment_id: String,
    pub workflow_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelExecutionRequest {
    pub force: bool,
}

/// Window into an execution's event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventQuery {
    pub from: u64,
    pub size: u64,
    pub include_logs: bool,
}
