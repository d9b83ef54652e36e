// ── Core error types ──
//
// The taxonomy every command reports through. Transport-level details
// from `vcloud-api` are classified here: expired credentials become
// `NotAuthenticated`, connection problems become `TransientNetwork`,
// and structured server errors stay `Api`.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Session errors ───────────────────────────────────────────────
    #[error("Not logged in (profile '{profile}')")]
    NotAuthenticated { profile: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Network errors ───────────────────────────────────────────────
    #[error("Network error during {operation} after {attempts} attempt(s): {message}")]
    TransientNetwork {
        operation: String,
        attempts: u32,
        message: String,
    },

    // ── Task errors ──────────────────────────────────────────────────
    #[error("Task {task_id} failed: {message}")]
    RemoteOperation {
        task_id: String,
        message: String,
        /// Structured error payload reported by the remote, if any.
        detail: Option<serde_json::Value>,
    },

    #[error("Gave up waiting for task {task_id} after {waited_secs}s (it may still be running)")]
    Timeout { task_id: String, waited_secs: u64 },

    #[error("Interrupted: {message}")]
    Cancelled { message: String },

    // ── Input errors ─────────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("API error: {message}")]
    Api {
        message: String,
        code: Option<String>,
        status: Option<u16>,
    },

    // ── Configuration / internal ─────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable machine-readable identifier, used by structured error output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotAuthenticated { .. } => "not_authenticated",
            Self::AuthenticationFailed { .. } => "authentication_failed",
            Self::TransientNetwork { .. } => "transient_network",
            Self::RemoteOperation { .. } => "remote_operation",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled { .. } => "cancelled",
            Self::Validation { .. } => "validation",
            Self::Unsupported { .. } => "unsupported",
            Self::NotFound { .. } => "not_found",
            Self::Api { .. } => "api",
            Self::Config { .. } => "config",
            Self::Internal(_) => "internal",
        }
    }

    /// Shorthand for a `Validation` error.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Re-target a `NotAuthenticated` error at a specific profile name.
    #[must_use]
    pub fn for_profile(self, profile: &str) -> Self {
        match self {
            Self::NotAuthenticated { .. } => Self::NotAuthenticated {
                profile: profile.to_owned(),
            },
            other => other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vcloud_api::Error> for CoreError {
    fn from(err: vcloud_api::Error) -> Self {
        if err.is_transient() {
            return CoreError::TransientNetwork {
                operation: "request".into(),
                attempts: 1,
                message: err.to_string(),
            };
        }

        match err {
            vcloud_api::Error::SessionExpired | vcloud_api::Error::MissingToken => {
                CoreError::NotAuthenticated {
                    profile: "active".into(),
                }
            }
            vcloud_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            vcloud_api::Error::NotFound { path } => CoreError::NotFound {
                entity_type: "resource".into(),
                identifier: path,
            },
            vcloud_api::Error::Api {
                status,
                message,
                code,
            } => CoreError::Api {
                message,
                code,
                status: Some(status),
            },
            vcloud_api::Error::Transport(e) => CoreError::Api {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
                code: None,
            },
            vcloud_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            vcloud_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            vcloud_api::Error::Timeout { timeout_secs } => CoreError::TransientNetwork {
                operation: "request".into(),
                attempts: 1,
                message: format!("timed out after {timeout_secs}s"),
            },
            vcloud_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn expired_session_maps_to_not_authenticated() {
        let err = CoreError::from(vcloud_api::Error::SessionExpired).for_profile("lab");
        assert!(matches!(err, CoreError::NotAuthenticated { ref profile } if profile == "lab"));
        assert_eq!(err.kind(), "not_authenticated");
    }

    #[test]
    fn timeouts_and_gateway_errors_are_transient() {
        let err = CoreError::from(vcloud_api::Error::Timeout { timeout_secs: 5 });
        assert!(matches!(err, CoreError::TransientNetwork { .. }));

        let err = CoreError::from(vcloud_api::Error::Api {
            status: 503,
            message: "maintenance".into(),
            code: None,
        });
        assert!(matches!(err, CoreError::TransientNetwork { .. }));
    }

    #[test]
    fn api_errors_keep_status_and_code() {
        let err = CoreError::from(vcloud_api::Error::Api {
            status: 409,
            message: "busy".into(),
            code: Some("BUSY".into()),
        });
        match err {
            CoreError::Api { status, code, .. } => {
                assert_eq!(status, Some(409));
                assert_eq!(code.as_deref(), Some("BUSY"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
