//! Per-invocation command context and the authenticated connection.
//!
//! Nothing here is global: `main` builds one [`CommandContext`] and
//! handlers open a [`Connection`] from it when they need the remote.

use std::future::Future;
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vcloud_api::{TaskRecord, VcdClient};
use vcloud_config::{ProfileStore, Settings};
use vcloud_core::{
    ConnectionConfig, MonitorOptions, OperationHandle, Profile, Session, SessionManager,
    SessionOptions, TaskMonitor, TaskSnapshot,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::Renderer;
use crate::progress::BarSink;

// ── Command context ──────────────────────────────────────────────────

pub struct CommandContext {
    pub global: GlobalOpts,
    pub settings: Settings,
    pub store: ProfileStore,
    pub renderer: Renderer,
    pub cancel: CancellationToken,
}

impl CommandContext {
    /// Profile selected by `--profile`, else the active one.
    pub fn require_profile(&self) -> Result<Profile, CliError> {
        match &self.global.profile {
            Some(name) => self.named_profile(name),
            None => self.store.active_profile().cloned().ok_or_else(|| CliError::NoProfile {
                path: self.store.path().display().to_string(),
            }),
        }
    }

    pub fn named_profile(&self, name: &str) -> Result<Profile, CliError> {
        self.store
            .profile(name)
            .cloned()
            .ok_or_else(|| CliError::ProfileNotFound {
                name: name.to_owned(),
                available: self.available_profiles(),
            })
    }

    pub fn available_profiles(&self) -> String {
        let names: Vec<&str> = self.store.profiles().iter().map(|p| p.name.as_str()).collect();
        if names.is_empty() {
            "(none)".into()
        } else {
            names.join(", ")
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.global
            .timeout
            .map_or_else(|| self.settings.request_timeout(), Duration::from_secs)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            call_timeout: self.request_timeout(),
            ..self.settings.session_options()
        }
    }

    pub fn monitor_options(&self) -> MonitorOptions {
        let mut options = self.settings.monitor_options();
        options.call_timeout = self.request_timeout();
        if let Some(secs) = self.global.task_timeout {
            options.timeout = Duration::from_secs(secs);
        }
        options
    }

    pub fn show_progress(&self) -> bool {
        !self.renderer.is_structured()
            && !self.renderer.is_quiet()
            && std::io::stderr().is_terminal()
    }
}

// ── Connection ───────────────────────────────────────────────────────

/// Client, session manager, and (once authorized) the live session for
/// one profile.
pub struct Connection {
    client: Arc<VcdClient>,
    sessions: SessionManager<VcdClient>,
    profile: Profile,
    session: Option<Arc<Session>>,
}

impl Connection {
    /// Build a client for `profile` without contacting the remote.
    pub fn open(ctx: &CommandContext, profile: Profile) -> Result<Self, CliError> {
        let config = ConnectionConfig::from_profile(&profile, ctx.request_timeout())?;
        debug!(profile = %profile.name, url = %config.url, "opening connection");

        let client = Arc::new(VcdClient::new(config.url.clone(), &config.transport())?);
        let sessions = SessionManager::new(
            Arc::clone(&client),
            ctx.session_options(),
            ctx.cancel.clone(),
        );
        Ok(Self {
            client,
            sessions,
            profile,
            session: None,
        })
    }

    /// Open a connection for the selected profile and pass the
    /// authorization gate. Fails with `NotAuthenticated` before any
    /// privileged call is made.
    pub async fn authorize(ctx: &CommandContext) -> Result<Self, CliError> {
        let profile = ctx.require_profile()?;
        let mut conn = Self::open(ctx, profile)?;
        let session = conn.sessions.ensure_session(&conn.profile).await?;
        conn.session = Some(session);
        Ok(conn)
    }

    pub fn client(&self) -> &VcdClient {
        &self.client
    }

    pub fn sessions(&self) -> &SessionManager<VcdClient> {
        &self.sessions
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    /// Organization of the live session, else the profile's.
    pub fn org(&self) -> &str {
        self.session.as_ref().map_or(self.profile.org.as_str(), |s| s.org())
    }

    /// VDC from `--vdc`, else the one selected with `vdc use`.
    pub fn vdc(&self, flag: Option<&str>) -> Result<String, CliError> {
        flag.or_else(|| self.profile.vdc())
            .map(str::to_owned)
            .ok_or_else(|| {
                CliError::validation("vdc", "no VDC selected; pass --vdc or run `vcd vdc use --vdc <name>`")
            })
    }

    /// Run a privileged call, racing cancellation. A rejected token marks
    /// the session stale and surfaces as `NotAuthenticated`.
    pub async fn call<T, F>(&self, call: F) -> Result<T, CliError>
    where
        F: Future<Output = Result<T, vcloud_api::Error>>,
    {
        let result = tokio::select! {
            biased;
            () = self.sessions.cancel_token().cancelled() => {
                return Err(CliError::Interrupted {
                    message: "request interrupted".into(),
                });
            }
            result = call => result,
        };

        match result {
            Ok(value) => Ok(value),
            Err(err) if err.is_auth_expired() => {
                self.sessions.invalidate(&self.profile.name).await;
                Err(CliError::NotAuthenticated {
                    profile: self.profile.name.clone(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Monitor the task a mutating call returned, unless `--no-wait`.
    pub async fn await_task(
        &self,
        ctx: &CommandContext,
        record: TaskRecord,
        label: &str,
    ) -> Result<TaskSnapshot, CliError> {
        let handle = OperationHandle::from_task(&record, &self.profile.name);
        if ctx.global.no_wait {
            info!(task = handle.id(), "submitted, not waiting");
            return Ok(TaskSnapshot::from(record));
        }
        self.monitor(ctx, handle, label).await
    }

    /// Monitor an existing task by handle.
    pub async fn monitor(
        &self,
        ctx: &CommandContext,
        handle: OperationHandle,
        label: &str,
    ) -> Result<TaskSnapshot, CliError> {
        let monitor = TaskMonitor::new(self.client.as_ref(), ctx.monitor_options(), ctx.cancel.clone());
        let mut sink = BarSink::new(label, ctx.show_progress());
        let report = monitor.await_completion(handle, &mut sink).await?;
        Ok(report.into_result()?)
    }
}
