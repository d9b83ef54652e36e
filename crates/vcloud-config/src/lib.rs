//! Persistent configuration for the `vcd` CLI.
//!
//! Two independent sources live here:
//!
//! - the **profile store** (`~/.vcd-cli.yaml`): named connection profiles,
//!   the active profile, and the session token each one last obtained.
//!   Every mutation writes through atomically.
//! - **settings** (`~/.config/vcloud/config.toml` + `VCD_*` env): output
//!   defaults, timeouts, and retry budgets, loaded through figment.

mod settings;
mod store;

use thiserror::Error;

pub use settings::{Settings, settings_path};
pub use store::{ProfileStore, default_profiles_path};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' does not exist")]
    UnknownProfile { name: String },

    #[error("failed to serialize profiles: {0}")]
    Serialization(#[from] serde_yaml::Error),

    #[error("settings loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<vcloud_core::CoreError> for ConfigError {
    fn from(err: vcloud_core::CoreError) -> Self {
        match err {
            vcloud_core::CoreError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Validation {
                field: "profile".into(),
                reason: other.to_string(),
            },
        }
    }
}
