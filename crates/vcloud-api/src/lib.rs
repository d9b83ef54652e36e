// vcloud-api: async client for a vCloud-style control plane.
//
// Endpoint groups (auth, tasks, vdcs, vapps, networks, roles, clusters,
// blueprints) are inherent methods on `VcdClient`, one file per group.

pub mod auth;
pub mod blueprint;
pub mod client;
pub mod cluster;
pub mod error;
pub mod models;
pub mod network;
pub mod role;
pub mod tasks;
pub mod transport;
pub mod vapp;
pub mod vdc;

pub use client::VcdClient;
pub use error::Error;
pub use models::{
    Blueprint, CancelExecutionRequest, Cluster, ClusterNode, CreateClusterRequest,
    CreateDeploymentRequest, CreateNetworkRequest, CreateVAppRequest, Deployment, Event,
    EventMessage, EventPage, EventQuery, ExecuteWorkflowRequest, Execution, NetworkType,
    OrgNetwork, Role, SessionInfo, TaskRecord, UploadBlueprintRequest, VApp, Vdc, Vm, Workflow,
};
pub use transport::{TlsMode, TransportConfig};
