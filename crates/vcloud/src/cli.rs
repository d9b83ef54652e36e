//! Clap derive structures for the `vcd` CLI.
//!
//! Every resource command takes a closed `operation` selector plus flags,
//! so unknown operations are rejected before anything touches the network.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vcd -- manage vCloud Director organizations from the command line
#[derive(Debug, Parser)]
#[command(
    name = "vcd",
    version,
    about = "Manage vCloud Director virtual datacenters, vApps, and networks",
    long_about = "Command-line client for vCloud Director.\n\n\
        Log in once with `vcd login`; the session token is kept in a named\n\
        profile and reused by every later command until it expires.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Profile to use instead of the active one
    #[arg(long, short = 'p', env = "VCD_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Profile store location (default: ~/.vcd-cli.yaml)
    #[arg(long, env = "VCD_PROFILES_FILE", global = true, value_name = "PATH")]
    pub profiles_file: Option<PathBuf>,

    /// Output format (default from settings, else table)
    #[arg(long, short = 'o', env = "VCD_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Return as soon as a task is submitted instead of waiting for it
    #[arg(long, global = true)]
    pub no_wait: bool,

    /// Request timeout in seconds (overrides settings)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// How long to wait for a task in seconds; 0 returns immediately
    #[arg(long, global = true, value_name = "SECS")]
    pub task_timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table with a status line (default, interactive)
    Table,
    /// Pretty-printed JSON document
    Json,
    /// Compact single-line JSON document
    JsonCompact,
    /// YAML document
    Yaml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session in a profile
    Login(LoginArgs),

    /// End the session of the active profile
    Logout,

    /// Show the session of the active profile
    Status,

    /// Manage stored profiles
    Profile(ProfileArgs),

    /// Work with virtual datacenters
    Vdc(VdcArgs),

    /// Work with vApps
    Vapp(VappArgs),

    /// Work with organization VDC networks
    #[command(alias = "net")]
    Network(NetworkArgs),

    /// Work with roles in the current organization
    Role(RoleArgs),

    /// Work with container clusters
    Cluster(ClusterArgs),

    /// Inspect, wait for, or cancel remote tasks
    Task(TaskArgs),

    /// Work with blueprints
    Blueprint(BlueprintArgs),

    /// Work with deployments and their workflow executions
    Deployment(DeploymentArgs),

    /// Show the events of a workflow execution
    Event(EventArgs),

    /// Operations with service extensions
    Extension(ExtensionArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Login ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// vCloud Director host name or URL
    pub host: String,

    /// Organization to log in to
    pub org: String,

    /// User name
    pub user: String,

    /// Password (prompted when omitted)
    #[arg(long, env = "VCD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Adopt an existing session token instead of a password
    #[arg(long, conflicts_with = "password")]
    pub token: Option<String>,

    /// API version to negotiate
    #[arg(long, default_value = "36.0")]
    pub api_version: String,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k')]
    pub insecure: bool,

    /// Do not print TLS warnings
    #[arg(long)]
    pub disable_warnings: bool,

    /// Log remote calls for this profile at debug level
    #[arg(long)]
    pub debug: bool,

    /// Name of the profile to create or replace
    #[arg(long, default_value = "default")]
    pub profile_name: String,
}

// ── Profile ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProfileOperation {
    List,
    Show,
    Get,
    Set,
    Use,
    Delete,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[arg(value_enum)]
    pub operation: ProfileOperation,

    /// Profile name (defaults to the active profile where optional)
    pub name: Option<String>,

    /// Field name for get/set (host, org, user, token, api_version,
    /// verify, disable_warnings, debug, vdc)
    pub field: Option<String>,

    /// New value for set
    pub value: Option<String>,
}

// ── VDC ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VdcOperation {
    List,
    Use,
    Info,
}

#[derive(Debug, Args)]
pub struct VdcArgs {
    #[arg(value_enum)]
    pub operation: VdcOperation,

    /// VDC name (defaults to the VDC in use for info)
    #[arg(long)]
    pub vdc: Option<String>,
}

// ── vApp ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VappOperation {
    List,
    Info,
    Create,
    Delete,
}

#[derive(Debug, Args)]
pub struct VappArgs {
    #[arg(value_enum)]
    pub operation: VappOperation,

    /// vApp name
    #[arg(long, short = 'a')]
    pub vapp: Option<String>,

    /// VDC name (defaults to the VDC in use)
    #[arg(long)]
    pub vdc: Option<String>,

    /// Catalog holding the template
    #[arg(long, short = 'c')]
    pub catalog: Option<String>,

    /// Template to instantiate
    #[arg(long, short = 't')]
    pub template: Option<String>,

    /// Name of the VM inside the new vApp
    #[arg(long, short = 'm')]
    pub vm: Option<String>,

    /// Network to connect the VM to
    #[arg(long, short = 'n')]
    pub network: Option<String>,

    /// Number of vApps to create (names get a -1..-N suffix when > 1)
    #[arg(long, default_value = "1")]
    pub count: u32,

    /// Virtual CPUs for the VM
    #[arg(long)]
    pub cpu: Option<u32>,

    /// Memory for the VM in MB
    #[arg(long)]
    pub ram: Option<u64>,
}

// ── Network ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NetworkOperation {
    List,
    Create,
    Delete,
}

#[derive(Debug, Args)]
pub struct NetworkArgs {
    #[arg(value_enum)]
    pub operation: NetworkOperation,

    /// Network name (create, delete)
    pub name: Option<String>,

    /// Network type: vdc-direct or vdc-isolated
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub network_type: Option<String>,

    /// External network to connect to (vdc-direct)
    #[arg(long, short = 'P')]
    pub parent: Option<String>,

    /// Description of the network
    #[arg(long, short = 'd', default_value = "")]
    pub description: String,

    /// VDC name (defaults to the VDC in use)
    #[arg(long)]
    pub vdc: Option<String>,
}

// ── Role ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleOperation {
    List,
}

#[derive(Debug, Args)]
pub struct RoleArgs {
    #[arg(value_enum)]
    pub operation: RoleOperation,
}

// ── Cluster ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClusterOperation {
    List,
    Info,
    Create,
    Delete,
}

#[derive(Debug, Args)]
pub struct ClusterArgs {
    #[arg(value_enum)]
    pub operation: ClusterOperation,

    /// Cluster name
    #[arg(long)]
    pub name: Option<String>,

    /// Cluster id
    #[arg(long)]
    pub id: Option<String>,

    /// Number of worker nodes
    #[arg(long, default_value = "2")]
    pub nodes: u32,

    /// Network to attach the nodes to
    #[arg(long, short = 'n')]
    pub network: Option<String>,

    /// VDC name (defaults to the VDC in use)
    #[arg(long)]
    pub vdc: Option<String>,
}

// ── Task ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskOperation {
    Info,
    Wait,
    Cancel,
}

#[derive(Debug, Args)]
pub struct TaskArgs {
    #[arg(value_enum)]
    pub operation: TaskOperation,

    /// Task id
    pub id: String,
}

// ── Blueprint ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BlueprintOperation {
    List,
    Info,
    #[value(alias = "upload")]
    Create,
    Delete,
    /// Check a blueprint file locally without uploading it
    Validate,
}

#[derive(Debug, Args)]
pub struct BlueprintArgs {
    #[arg(value_enum)]
    pub operation: BlueprintOperation,

    /// Blueprint id
    #[arg(long, short = 'b')]
    pub blueprint: Option<String>,

    /// Local blueprint YAML file (create, validate)
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// List the node templates of the plan (info)
    #[arg(long)]
    pub include_plan: bool,
}

// ── Deployment ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeploymentOperation {
    List,
    Info,
    Create,
    Delete,
    /// Run a workflow on the deployment
    Execute,
    /// Cancel a workflow execution
    Cancel,
}

#[derive(Debug, Args)]
pub struct DeploymentArgs {
    #[arg(value_enum)]
    pub operation: DeploymentOperation,

    /// Deployment id
    #[arg(long, short = 'd')]
    pub deployment: Option<String>,

    /// Blueprint to deploy (create)
    #[arg(long, short = 'b')]
    pub blueprint: Option<String>,

    /// Inputs YAML file (create)
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Workflow to run (execute)
    #[arg(long, short = 'w')]
    pub workflow: Option<String>,

    /// Execution id (cancel)
    #[arg(long, short = 'e')]
    pub execution: Option<String>,

    /// Show the events of the latest execution instead of the history (info)
    #[arg(long, short = 's')]
    pub show_events: bool,

    /// Force-cancel the execution (cancel)
    #[arg(long)]
    pub force_cancel: bool,

    /// Delete even when the deployment still has live nodes (delete)
    #[arg(long)]
    pub force_delete: bool,
}

// ── Event ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventOperation {
    List,
}

#[derive(Debug, Args)]
pub struct EventArgs {
    #[arg(value_enum)]
    pub operation: EventOperation,

    /// Execution id
    #[arg(long, short = 'i')]
    pub id: String,

    /// Offset of the first event
    #[arg(long, default_value = "0")]
    pub from: u64,

    /// Maximum number of events to fetch
    #[arg(long, default_value = "100")]
    pub size: u64,

    /// Include log lines as well as events
    #[arg(long, short = 'l')]
    pub show_logs: bool,
}

// ── Extension ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExtensionOperation {
    List,
    Info,
    Create,
    Delete,
}

#[derive(Debug, Args)]
pub struct ExtensionArgs {
    #[arg(value_enum)]
    pub operation: ExtensionOperation,

    /// Extension name
    pub name: Option<String>,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
