// ── Remote control-plane contract ──
//
// The narrow slice of the remote API the session manager and task
// monitor depend on. `VcdClient` is the production implementation;
// tests drive the state machines through scripted fakes.

use std::future::Future;

use secrecy::SecretString;
use vcloud_api::{SessionInfo, VcdClient};

use crate::task::TaskSnapshot;

/// How `login` should obtain a session.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Exchange user, org, and password for a fresh token.
    Password {
        user: String,
        org: String,
        password: SecretString,
    },
    /// Adopt an existing token after validating it.
    Token(SecretString),
}

/// Operations against the remote control plane.
pub trait ControlPlane: Send + Sync {
    /// Attach `token` to subsequent privileged calls.
    fn install_token(&self, token: &SecretString);

    /// Check `token` without changing which token is installed.
    fn validate_session(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<SessionInfo, vcloud_api::Error>> + Send;

    /// Exchange credentials for a token.
    fn login(
        &self,
        user: &str,
        org: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<(SecretString, SessionInfo), vcloud_api::Error>> + Send;

    /// End the session bound to the installed token.
    fn logout(&self) -> impl Future<Output = Result<(), vcloud_api::Error>> + Send;

    /// Fetch the current state of a remote task.
    fn poll_operation(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<TaskSnapshot, vcloud_api::Error>> + Send;

    /// Ask the remote to cancel a task. `Ok(false)` means the request was
    /// refused (task already finished or not cancellable).
    fn cancel_operation(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<bool, vcloud_api::Error>> + Send;
}

impl ControlPlane for VcdClient {
    fn install_token(&self, token: &SecretString) {
        self.set_token(token.clone());
    }

    async fn validate_session(&self, token: &SecretString) -> Result<SessionInfo, vcloud_api::Error> {
        self.validate_token(token).await
    }

    async fn login(
        &self,
        user: &str,
        org: &str,
        password: &SecretString,
    ) -> Result<(SecretString, SessionInfo), vcloud_api::Error> {
        VcdClient::login(self, user, org, password).await
    }

    async fn logout(&self) -> Result<(), vcloud_api::Error> {
        VcdClient::logout(self).await
    }

    async fn poll_operation(&self, id: &str) -> Result<TaskSnapshot, vcloud_api::Error> {
        self.get_task(id).await.map(TaskSnapshot::from)
    }

    async fn cancel_operation(&self, id: &str) -> Result<bool, vcloud_api::Error> {
        self.cancel_task(id).await
    }
}
