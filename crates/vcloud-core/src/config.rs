// ── Runtime connection configuration ──
//
// Describes how to reach one vCloud Director endpoint. Built by the CLI
// from a persisted profile plus settings; core never reads config files.

use std::time::Duration;

use url::Url;
use vcloud_api::{TlsMode, TransportConfig};

use crate::error::CoreError;
use crate::profile::Profile;

/// TLS verification strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Skip verification (self-signed lab installs). Matches profiles
    /// where `verify` was never switched on.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for connecting to a single endpoint.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Endpoint URL (e.g., `https://vcd.example.com`).
    pub url: Url,
    /// API version negotiated through the `Accept` header.
    pub api_version: String,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ConnectionConfig {
    /// Derive the connection settings for `profile`.
    ///
    /// Bare hostnames are treated as `https://` endpoints.
    pub fn from_profile(profile: &Profile, timeout: Duration) -> Result<Self, CoreError> {
        let host = profile.host.trim();
        if host.is_empty() {
            return Err(CoreError::validation(
                "host",
                format!("profile '{}' has no host configured", profile.name),
            ));
        }

        let raw = if host.contains("://") {
            host.to_owned()
        } else {
            format!("https://{host}")
        };
        let url = Url::parse(&raw).map_err(|e| CoreError::validation("host", e.to_string()))?;

        let api_version = if profile.api_version.is_empty() {
            Profile::DEFAULT_API_VERSION.to_owned()
        } else {
            profile.api_version.clone()
        };

        Ok(Self {
            url,
            api_version,
            tls: if profile.verify {
                TlsVerification::SystemDefaults
            } else {
                TlsVerification::DangerAcceptInvalid
            },
            timeout,
        })
    }

    /// Transport settings for the low-level client.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
            api_version: self.api_version.clone(),
        }
    }
}
