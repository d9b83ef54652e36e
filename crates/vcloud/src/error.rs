//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use vcloud_config::ConfigError;
use vcloud_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const REMOTE_OPERATION: i32 = 9;
    pub const INTERRUPTED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────

    #[error("Not logged in (profile '{profile}')")]
    #[diagnostic(
        code(vcd::not_authenticated),
        help("Run: vcd login <host> <org> <user> [--profile-name {profile}]")
    )]
    NotAuthenticated { profile: String },

    #[error("No profile selected")]
    #[diagnostic(
        code(vcd::no_profile),
        help(
            "Log in first with: vcd login <host> <org> <user>\n\
             Profiles are stored in: {path}"
        )
    )]
    NoProfile { path: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(vcd::auth_failed),
        help("Check the organization, user name, and password, then log in again.")
    )]
    AuthFailed { message: String },

    // ── Connection ───────────────────────────────────────────────────

    #[error("Network error during {operation} after {attempts} attempt(s): {message}")]
    #[diagnostic(
        code(vcd::connection_failed),
        help(
            "Check that the host is reachable. Use --insecure (-k) at login\n\
             for self-signed certificates, or raise --timeout."
        )
    )]
    Connection {
        operation: String,
        attempts: u32,
        message: String,
    },

    // ── Tasks ────────────────────────────────────────────────────────

    #[error("Task {task_id} failed: {message}")]
    #[diagnostic(code(vcd::task_failed), help("Inspect it with: vcd task info {task_id}"))]
    RemoteOperation {
        task_id: String,
        message: String,
        detail: Option<serde_json::Value>,
    },

    #[error("Gave up waiting for task {task_id} after {waited_secs}s")]
    #[diagnostic(
        code(vcd::timeout),
        help(
            "The task may still be running.\n\
             Check it with: vcd task wait {task_id}"
        )
    )]
    Timeout { task_id: String, waited_secs: u64 },

    #[error("Interrupted: {message}")]
    #[diagnostic(code(vcd::interrupted))]
    Interrupted { message: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(vcd::not_found),
        help("Run: vcd {list_command} to see what is available")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("API error: {message}")]
    #[diagnostic(code(vcd::api_error))]
    ApiError {
        message: String,
        code: Option<String>,
        status: Option<u16>,
    },

    // ── Unsupported ──────────────────────────────────────────────────

    #[error("'{operation}' is not implemented")]
    #[diagnostic(code(vcd::unsupported))]
    Unsupported { operation: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vcd::validation))]
    Validation { field: String, reason: String },

    #[error("Profile '{name}' not found")]
    #[diagnostic(
        code(vcd::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(vcd::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration / internal ─────────────────────────────────────

    #[error("Configuration error: {message}")]
    #[diagnostic(code(vcd::config))]
    Config { message: String },

    #[error("Internal error: {0}")]
    #[diagnostic(code(vcd::internal))]
    Internal(String),

    #[error(transparent)]
    #[diagnostic(code(vcd::io))]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotAuthenticated { .. } | Self::NoProfile { .. } | Self::AuthFailed { .. } => {
                exit_code::AUTH
            }
            Self::Connection { .. } => exit_code::CONNECTION,
            Self::RemoteOperation { .. } => exit_code::REMOTE_OPERATION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Interrupted { .. } => exit_code::INTERRUPTED,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::Validation { .. }
            | Self::ProfileNotFound { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::ApiError { .. } | Self::Config { .. } | Self::Internal(_) | Self::Io(_) => {
                exit_code::GENERAL
            }
        }
    }

    /// Stable machine-readable identifier for structured error output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotAuthenticated { .. } | Self::NoProfile { .. } => "not_authenticated",
            Self::AuthFailed { .. } => "authentication_failed",
            Self::Connection { .. } => "transient_network",
            Self::RemoteOperation { .. } => "remote_operation",
            Self::Timeout { .. } => "timeout",
            Self::Interrupted { .. } => "cancelled",
            Self::NotFound { .. } => "not_found",
            Self::ApiError { .. } => "api",
            Self::Unsupported { .. } => "unsupported",
            Self::Validation { .. }
            | Self::ProfileNotFound { .. }
            | Self::NonInteractiveRequiresYes { .. } => "validation",
            Self::Config { .. } => "config",
            Self::Internal(_) | Self::Io(_) => "internal",
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Replace a generic not-found with one naming the resource.
    #[must_use]
    pub fn not_found_as(self, resource_type: &str, identifier: &str, list_command: &str) -> Self {
        match self {
            Self::NotFound { .. } => Self::NotFound {
                resource_type: resource_type.into(),
                identifier: identifier.into(),
                list_command: list_command.into(),
            },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotAuthenticated { profile } => CliError::NotAuthenticated { profile },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::TransientNetwork {
                operation,
                attempts,
                message,
            } => CliError::Connection {
                operation,
                attempts,
                message,
            },

            CoreError::RemoteOperation {
                task_id,
                message,
                detail,
            } => CliError::RemoteOperation {
                task_id,
                message,
                detail,
            },

            CoreError::Timeout {
                task_id,
                waited_secs,
            } => CliError::Timeout {
                task_id,
                waited_secs,
            },

            CoreError::Cancelled { message } => CliError::Interrupted { message },

            CoreError::Validation { field, reason } => CliError::Validation { field, reason },

            CoreError::Unsupported { operation } => CliError::Unsupported { operation },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: format!("{entity_type} list"),
                resource_type: entity_type,
                identifier,
            },

            CoreError::Api {
                message,
                code,
                status,
            } => CliError::ApiError {
                message,
                code,
                status,
            },

            CoreError::Config { message } => CliError::Config { message },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<vcloud_api::Error> for CliError {
    fn from(err: vcloud_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
