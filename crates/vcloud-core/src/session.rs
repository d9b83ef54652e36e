//! Session lifecycle per profile.
//!
//! A profile's session is `Absent` until a token is validated or minted,
//! `Valid` once the remote has accepted it in this process, and `Stale`
//! after the remote rejected it. All work on one profile's session runs
//! under that profile's async mutex, so concurrent callers never race a
//! validation or a login.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use secrecy::{ExposeSecret, SecretString};
use strum::Display;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vcloud_api::SessionInfo;

use crate::call::{CallOutcome, bounded};
use crate::error::CoreError;
use crate::profile::Profile;
use crate::remote::{ControlPlane, Credentials};

// ── Options ──────────────────────────────────────────────────────────

/// Timeouts and retry policy for session calls.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Upper bound for a single remote call.
    pub call_timeout: Duration,
    /// Extra validation attempts after a transient failure.
    pub validate_retries: u32,
    /// Pause between validation attempts.
    pub retry_delay: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            validate_retries: 2,
            retry_delay: Duration::from_secs(1),
        }
    }
}

// ── Session ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    Absent,
    Stale,
    Valid,
}

/// A session the remote has accepted.
#[derive(Debug)]
pub struct Session {
    profile: String,
    host: String,
    user: String,
    org: String,
    vdc: Option<String>,
    roles: Vec<String>,
    token: SecretString,
    established_at: DateTime<Utc>,
}

impl Session {
    fn new(profile: &Profile, token: SecretString, info: SessionInfo) -> Self {
        let pick = |remote: String, local: &str| {
            if remote.is_empty() {
                local.to_owned()
            } else {
                remote
            }
        };
        Self {
            profile: profile.name.clone(),
            host: profile.host.clone(),
            user: pick(info.user, &profile.user),
            org: pick(info.org, &profile.org),
            vdc: profile.vdc().map(str::to_owned),
            roles: info.roles,
            token,
            established_at: Utc::now(),
        }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn vdc(&self) -> Option<&str> {
        self.vdc.as_deref()
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn established_at(&self) -> DateTime<Utc> {
        self.established_at
    }

    fn matches(&self, profile: &Profile) -> bool {
        self.host == profile.host && self.token.expose_secret() == profile.token
    }
}

/// Result of a successful [`SessionManager::login`]: the live session and
/// the profile updated with the new token, ready to be persisted.
#[derive(Debug)]
pub struct LoginOutcome {
    pub session: Arc<Session>,
    pub profile: Profile,
}

#[derive(Default)]
enum Slot {
    #[default]
    Absent,
    Stale,
    Valid(Arc<Session>),
}

impl Slot {
    fn state(&self) -> SessionState {
        match self {
            Self::Absent => SessionState::Absent,
            Self::Stale => SessionState::Stale,
            Self::Valid(_) => SessionState::Valid,
        }
    }

    fn demote(&mut self) {
        if matches!(self, Self::Valid(_)) {
            *self = Self::Stale;
        }
    }
}

// ── Manager ──────────────────────────────────────────────────────────

/// Owns the sessions for every profile used in this process.
pub struct SessionManager<A> {
    api: Arc<A>,
    options: SessionOptions,
    cancel: CancellationToken,
    slots: DashMap<String, Arc<Mutex<Slot>>>,
}

impl<A: ControlPlane> SessionManager<A> {
    pub fn new(api: Arc<A>, options: SessionOptions, cancel: CancellationToken) -> Self {
        Self {
            api,
            options,
            cancel,
            slots: DashMap::new(),
        }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    fn slot(&self, profile: &str) -> Arc<Mutex<Slot>> {
        Arc::clone(self.slots.entry(profile.to_owned()).or_default().value())
    }

    /// Current state of `profile`'s session in this process.
    pub async fn state(&self, profile: &str) -> SessionState {
        let slot = self.slots.get(profile).map(|entry| Arc::clone(entry.value()));
        match slot {
            Some(slot) => slot.lock().await.state(),
            None => SessionState::Absent,
        }
    }

    /// Return a valid session for `profile`.
    ///
    /// Reuses a session already validated in this process, otherwise
    /// validates the persisted token. A profile without a token fails
    /// with [`CoreError::NotAuthenticated`] without any remote call.
    pub async fn ensure_session(&self, profile: &Profile) -> Result<Arc<Session>, CoreError> {
        let slot = self.slot(&profile.name);
        let mut guard = slot.lock().await;

        if let Slot::Valid(session) = &*guard {
            if session.matches(profile) {
                debug!(profile = %profile.name, "reusing validated session");
                return Ok(Arc::clone(session));
            }
        }

        if !profile.has_token() {
            *guard = Slot::Absent;
            return Err(CoreError::NotAuthenticated {
                profile: profile.name.clone(),
            });
        }

        let token = SecretString::from(profile.token.clone());
        match self.validate(&profile.name, &token).await {
            Ok(info) => {
                self.api.install_token(&token);
                let session = Arc::new(Session::new(profile, token, info));
                *guard = Slot::Valid(Arc::clone(&session));
                debug!(profile = %profile.name, user = %session.user, "session restored from token");
                Ok(session)
            }
            Err(err) => {
                if matches!(err, CoreError::NotAuthenticated { .. }) {
                    *guard = Slot::Stale;
                } else {
                    guard.demote();
                }
                Err(err)
            }
        }
    }

    /// Establish a session from credentials.
    ///
    /// Logging in with the token of the session that is already valid is a
    /// no-op with no remote call.
    pub async fn login(
        &self,
        profile: &Profile,
        credentials: Credentials,
    ) -> Result<LoginOutcome, CoreError> {
        let slot = self.slot(&profile.name);
        let mut guard = slot.lock().await;
        let mut updated = profile.clone();

        let (token, info) = match credentials {
            Credentials::Token(token) => {
                if let Slot::Valid(session) = &*guard {
                    if session.token.expose_secret() == token.expose_secret() {
                        debug!(profile = %profile.name, "token already active");
                        updated.token = token.expose_secret().to_owned();
                        return Ok(LoginOutcome {
                            session: Arc::clone(session),
                            profile: updated,
                        });
                    }
                }
                let info = self
                    .validate(&profile.name, &token)
                    .await
                    .map_err(|err| match err {
                        CoreError::NotAuthenticated { .. } => CoreError::AuthenticationFailed {
                            message: "the server rejected the supplied token".into(),
                        },
                        other => other,
                    })?;
                (token, info)
            }
            Credentials::Password {
                user,
                org,
                password,
            } => {
                let limit = self.options.call_timeout;
                let pair = match bounded(self.api.login(&user, &org, &password), limit, &self.cancel)
                    .await
                {
                    CallOutcome::Done(pair) => pair,
                    CallOutcome::Failed(err) => return Err(err.into()),
                    CallOutcome::TimedOut => {
                        return Err(CoreError::TransientNetwork {
                            operation: "login".into(),
                            attempts: 1,
                            message: format!("timed out after {}s", limit.as_secs()),
                        });
                    }
                    CallOutcome::Cancelled => {
                        return Err(CoreError::Cancelled {
                            message: "login interrupted".into(),
                        });
                    }
                };
                updated.user = user;
                updated.org = org;
                pair
            }
        };

        self.api.install_token(&token);
        updated.token = token.expose_secret().to_owned();
        let session = Arc::new(Session::new(&updated, token, info));
        if updated.user.is_empty() {
            updated.user = session.user.clone();
        }
        if updated.org.is_empty() {
            updated.org = session.org.clone();
        }
        *guard = Slot::Valid(Arc::clone(&session));

        info!(profile = %updated.name, user = %session.user, org = %session.org, "logged in");
        Ok(LoginOutcome {
            session,
            profile: updated,
        })
    }

    /// End `profile`'s session. Remote failures are logged, not returned:
    /// the local session is discarded either way.
    pub async fn logout(&self, profile: &Profile) -> Result<(), CoreError> {
        let slot = self.slot(&profile.name);
        let mut guard = slot.lock().await;

        let token = match &*guard {
            Slot::Valid(session) => Some(session.token.clone()),
            _ if profile.has_token() => Some(SecretString::from(profile.token.clone())),
            _ => None,
        };

        if let Some(token) = token {
            self.api.install_token(&token);
            match bounded(self.api.logout(), self.options.call_timeout, &self.cancel).await {
                CallOutcome::Done(()) => debug!(profile = %profile.name, "remote session ended"),
                CallOutcome::Failed(err) => {
                    warn!(profile = %profile.name, error = %err, "remote logout failed");
                }
                CallOutcome::TimedOut => warn!(profile = %profile.name, "remote logout timed out"),
                CallOutcome::Cancelled => {
                    *guard = Slot::Absent;
                    return Err(CoreError::Cancelled {
                        message: "logout interrupted".into(),
                    });
                }
            }
        }

        *guard = Slot::Absent;
        Ok(())
    }

    /// Mark `profile`'s session stale after the remote rejected its token
    /// mid-command.
    pub async fn invalidate(&self, profile: &str) {
        let slot = self.slots.get(profile).map(|entry| Arc::clone(entry.value()));
        if let Some(slot) = slot {
            slot.lock().await.demote();
            debug!(profile, "session marked stale");
        }
    }

    /// Validate `token`, retrying transient failures.
    async fn validate(&self, profile: &str, token: &SecretString) -> Result<SessionInfo, CoreError> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let limit = self.options.call_timeout;
            let message = match bounded(self.api.validate_session(token), limit, &self.cancel).await {
                CallOutcome::Done(info) => return Ok(info),
                CallOutcome::Failed(err) if err.is_auth_expired() => {
                    info!(profile, "stored session token was rejected");
                    return Err(CoreError::NotAuthenticated {
                        profile: profile.to_owned(),
                    });
                }
                CallOutcome::Failed(err) if err.is_transient() => err.to_string(),
                CallOutcome::Failed(err) => return Err(CoreError::from(err).for_profile(profile)),
                CallOutcome::TimedOut => format!("timed out after {}s", limit.as_secs()),
                CallOutcome::Cancelled => {
                    return Err(CoreError::Cancelled {
                        message: "session validation interrupted".into(),
                    });
                }
            };

            if attempts > self.options.validate_retries {
                return Err(CoreError::TransientNetwork {
                    operation: "session validation".into(),
                    attempts,
                    message,
                });
            }
            warn!(profile, attempt = attempts, error = %message, "session validation failed, retrying");

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    return Err(CoreError::Cancelled {
                        message: "session validation interrupted".into(),
                    });
                }
                () = tokio::time::sleep(self.options.retry_delay) => {}
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fake::{FakeControlPlane, session_info, transient};

    fn profile(token: &str) -> Profile {
        Profile {
            name: "lab".into(),
            host: "vcd.lab".into(),
            org: "acme".into(),
            user: "admin".into(),
            token: token.into(),
            ..Profile::default()
        }
    }

    fn manager(api: &Arc<FakeControlPlane>) -> SessionManager<FakeControlPlane> {
        SessionManager::new(Arc::clone(api), SessionOptions::default(), CancellationToken::new())
    }

    #[tokio::test(start_paused = true)]
    async fn missing_token_fails_without_remote_call() {
        let api = Arc::new(FakeControlPlane::default());
        let sessions = manager(&api);

        let err = sessions.ensure_session(&profile("")).await.unwrap_err();

        assert!(matches!(err, CoreError::NotAuthenticated { ref profile } if profile == "lab"));
        assert_eq!(api.validate_calls(), 0);
        assert_eq!(sessions.state("lab").await, SessionState::Absent);
    }

    #[tokio::test(start_paused = true)]
    async fn valid_token_is_restored_once_and_reused() {
        let api = Arc::new(FakeControlPlane::default());
        api.push_validations([Ok(session_info("admin", "acme"))]);
        let sessions = manager(&api);

        let first = sessions.ensure_session(&profile("tok-1")).await.unwrap();
        let second = sessions.ensure_session(&profile("tok-1")).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(api.validate_calls(), 1);
        assert_eq!(api.installed_token().as_deref(), Some("tok-1"));
        assert_eq!(first.user(), "admin");
        assert_eq!(sessions.state("lab").await, SessionState::Valid);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_token_marks_session_stale() {
        let api = Arc::new(FakeControlPlane::default());
        api.push_validations([Err(vcloud_api::Error::SessionExpired)]);
        let sessions = manager(&api);

        let err = sessions.ensure_session(&profile("old")).await.unwrap_err();

        assert!(matches!(err, CoreError::NotAuthenticated { .. }));
        assert_eq!(api.validate_calls(), 1);
        assert_eq!(sessions.state("lab").await, SessionState::Stale);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_validation_failures_are_bounded() {
        let api = Arc::new(FakeControlPlane::default());
        api.push_validations([Err(transient()), Err(transient()), Err(transient())]);
        let sessions = manager(&api);

        let err = sessions.ensure_session(&profile("tok")).await.unwrap_err();

        assert!(matches!(err, CoreError::TransientNetwork { attempts: 3, .. }));
        assert_eq!(api.validate_calls(), 3);
        assert_ne!(sessions.state("lab").await, SessionState::Valid);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_then_success_validates() {
        let api = Arc::new(FakeControlPlane::default());
        api.push_validations([Err(transient()), Ok(session_info("admin", "acme"))]);
        let sessions = manager(&api);

        sessions.ensure_session(&profile("tok")).await.unwrap();
        assert_eq!(api.validate_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_validation() {
        let api = Arc::new(FakeControlPlane::default());
        api.push_validations([Ok(session_info("admin", "acme"))]);
        api.set_validate_delay(Duration::from_millis(200));
        let sessions = manager(&api);
        let p = profile("tok");

        let (a, b) = tokio::join!(sessions.ensure_session(&p), sessions.ensure_session(&p));

        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(api.validate_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn password_login_returns_updated_profile() {
        let api = Arc::new(FakeControlPlane::default());
        api.push_login(Ok((SecretString::from("fresh".to_owned()), session_info("ops", "acme"))));
        let sessions = manager(&api);
        let mut p = profile("");
        p.user = String::new();

        let outcome = sessions
            .login(
                &p,
                Credentials::Password {
                    user: "ops".into(),
                    org: "acme".into(),
                    password: SecretString::from("pw".to_owned()),
                },
            )
            .await
            .unwrap();

        assert_eq!(api.login_calls(), 1);
        assert_eq!(outcome.profile.token, "fresh");
        assert_eq!(outcome.profile.user, "ops");
        assert_eq!(api.installed_token().as_deref(), Some("fresh"));

        // The persisted profile now resolves without another validation.
        sessions.ensure_session(&outcome.profile).await.unwrap();
        assert_eq!(api.validate_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_password_is_authentication_failure() {
        let api = Arc::new(FakeControlPlane::default());
        api.push_login(Err(vcloud_api::Error::Authentication {
            message: "bad password".into(),
        }));
        let sessions = manager(&api);

        let err = sessions
            .login(
                &profile(""),
                Credentials::Password {
                    user: "admin".into(),
                    org: "acme".into(),
                    password: SecretString::from("nope".to_owned()),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
        assert_eq!(sessions.state("lab").await, SessionState::Absent);
    }

    #[tokio::test(start_paused = true)]
    async fn token_login_is_idempotent() {
        let api = Arc::new(FakeControlPlane::default());
        api.push_validations([Ok(session_info("admin", "acme"))]);
        let sessions = manager(&api);
        let token = || Credentials::Token(SecretString::from("tok".to_owned()));

        let first = sessions.login(&profile(""), token()).await.unwrap();
        let second = sessions.login(&first.profile, token()).await.unwrap();

        assert!(Arc::ptr_eq(&first.session, &second.session));
        assert_eq!(first.profile, second.profile);
        assert_eq!(api.validate_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_token_login_is_authentication_failure() {
        let api = Arc::new(FakeControlPlane::default());
        api.push_validations([Err(vcloud_api::Error::SessionExpired)]);
        let sessions = manager(&api);

        let err = sessions
            .login(&profile(""), Credentials::Token(SecretString::from("bad".to_owned())))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn logout_clears_session() {
        let api = Arc::new(FakeControlPlane::default());
        api.push_validations([Ok(session_info("admin", "acme"))]);
        let sessions = manager(&api);
        sessions.ensure_session(&profile("tok")).await.unwrap();

        sessions.logout(&profile("tok")).await.unwrap();

        assert_eq!(api.logout_calls(), 1);
        assert_eq!(sessions.state("lab").await, SessionState::Absent);
    }

    #[tokio::test(start_paused = true)]
    async fn logout_without_token_skips_remote() {
        let api = Arc::new(FakeControlPlane::default());
        let sessions = manager(&api);

        sessions.logout(&profile("")).await.unwrap();
        assert_eq!(api.logout_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidated_session_is_revalidated() {
        let api = Arc::new(FakeControlPlane::default());
        api.push_validations([
            Ok(session_info("admin", "acme")),
            Ok(session_info("admin", "acme")),
        ]);
        let sessions = manager(&api);
        sessions.ensure_session(&profile("tok")).await.unwrap();

        sessions.invalidate("lab").await;
        assert_eq!(sessions.state("lab").await, SessionState::Stale);

        sessions.ensure_session(&profile("tok")).await.unwrap();
        assert_eq!(api.validate_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_validation() {
        let api = Arc::new(FakeControlPlane::default());
        api.push_validations([Ok(session_info("admin", "acme"))]);
        api.set_validate_delay(Duration::from_secs(10));
        let cancel = CancellationToken::new();
        let sessions =
            SessionManager::new(Arc::clone(&api), SessionOptions::default(), cancel.clone());

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let err = sessions.ensure_session(&profile("tok")).await.unwrap_err();
        assert!(matches!(err, CoreError::Cancelled { .. }));
        assert_ne!(sessions.state("lab").await, SessionState::Valid);
    }
}
