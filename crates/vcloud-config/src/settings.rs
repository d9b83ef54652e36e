// ── CLI settings ──
//
// Defaults → `~/.config/vcloud/config.toml` → `VCD_*` environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use vcloud_core::{MonitorOptions, SessionOptions};

use crate::ConfigError;

/// Resolve the settings file path via XDG / platform conventions.
pub fn settings_path() -> PathBuf {
    ProjectDirs::from("", "", "vcloud").map_or_else(
        || {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()))
                .join(".config")
                .join("vcloud")
                .join("config.toml")
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Default output format: table, json, json-compact, yaml.
    pub output: String,
    /// Color mode: auto, always, never.
    pub color: String,
    /// Per-request timeout in seconds.
    pub request_timeout: u64,
    /// Delay between task polls in milliseconds.
    pub poll_interval_ms: u64,
    /// How long to wait for a task, in seconds. Zero returns immediately.
    pub task_timeout: u64,
    /// Consecutive transient poll failures tolerated.
    pub poll_retries: u32,
    /// Extra session validation attempts after a transient failure.
    pub validate_retries: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output: "table".into(),
            color: "auto".into(),
            request_timeout: 30,
            poll_interval_ms: 2000,
            task_timeout: 1800,
            poll_retries: 3,
            validate_retries: 2,
        }
    }
}

impl Settings {
    /// Load from the canonical path and environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&settings_path())
    }

    /// Load from `path` (missing is fine) and environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::figment(path).extract::<Self>()?.validated()
    }

    pub fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("VCD_").only(&[
                "output",
                "color",
                "request_timeout",
                "poll_interval_ms",
                "task_timeout",
                "poll_retries",
                "validate_retries",
            ]))
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Validation {
                field: "poll_interval_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.request_timeout == 0 {
            return Err(ConfigError::Validation {
                field: "request_timeout".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            call_timeout: self.request_timeout(),
            validate_retries: self.validate_retries,
            ..SessionOptions::default()
        }
    }

    pub fn monitor_options(&self) -> MonitorOptions {
        MonitorOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_secs(self.task_timeout),
            max_poll_retries: self.poll_retries,
            call_timeout: self.request_timeout(),
        }
    }
}
