// Scripted control plane for session and task tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use vcloud_api::SessionInfo;

use crate::remote::ControlPlane;
use crate::task::TaskSnapshot;

type Scripted<T> = Mutex<VecDeque<Result<T, vcloud_api::Error>>>;

#[derive(Default)]
pub(crate) struct FakeControlPlane {
    validations: Scripted<SessionInfo>,
    logins: Scripted<(SecretString, SessionInfo)>,
    polls: Scripted<TaskSnapshot>,
    repeat: Mutex<Option<TaskSnapshot>>,
    cancel_result: Mutex<Option<Result<bool, vcloud_api::Error>>>,
    validate_delay: Mutex<Option<Duration>>,
    poll_delay: Mutex<Option<Duration>>,
    installed: Mutex<Option<String>>,
    validate_count: AtomicU32,
    login_count: AtomicU32,
    logout_count: AtomicU32,
    poll_count: AtomicU32,
    cancel_count: AtomicU32,
}

pub(crate) fn transient() -> vcloud_api::Error {
    vcloud_api::Error::Timeout { timeout_secs: 1 }
}

pub(crate) fn session_info(user: &str, org: &str) -> SessionInfo {
    SessionInfo {
        user: user.into(),
        org: org.into(),
        roles: vec!["Organization Administrator".into()],
        location: None,
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl FakeControlPlane {
    pub(crate) fn push_validations<I>(&self, results: I)
    where
        I: IntoIterator<Item = Result<SessionInfo, vcloud_api::Error>>,
    {
        lock(&self.validations).extend(results);
    }

    pub(crate) fn push_login(&self, result: Result<(SecretString, SessionInfo), vcloud_api::Error>) {
        lock(&self.logins).push_back(result);
    }

    pub(crate) fn push_polls<I>(&self, results: I)
    where
        I: IntoIterator<Item = Result<TaskSnapshot, vcloud_api::Error>>,
    {
        lock(&self.polls).extend(results);
    }

    /// Snapshot returned once the scripted polls run out.
    pub(crate) fn repeat_poll(&self, snapshot: TaskSnapshot) {
        *lock(&self.repeat) = Some(snapshot);
    }

    pub(crate) fn set_cancel_result(&self, result: Result<bool, vcloud_api::Error>) {
        *lock(&self.cancel_result) = Some(result);
    }

    pub(crate) fn set_validate_delay(&self, delay: Duration) {
        *lock(&self.validate_delay) = Some(delay);
    }

    pub(crate) fn set_poll_delay(&self, delay: Duration) {
        *lock(&self.poll_delay) = Some(delay);
    }

    pub(crate) fn installed_token(&self) -> Option<String> {
        lock(&self.installed).clone()
    }

    pub(crate) fn validate_calls(&self) -> u32 {
        self.validate_count.load(Ordering::SeqCst)
    }

    pub(crate) fn login_calls(&self) -> u32 {
        self.login_count.load(Ordering::SeqCst)
    }

    pub(crate) fn logout_calls(&self) -> u32 {
        self.logout_count.load(Ordering::SeqCst)
    }

    pub(crate) fn poll_calls(&self) -> u32 {
        self.poll_count.load(Ordering::SeqCst)
    }

    pub(crate) fn cancel_calls(&self) -> u32 {
        self.cancel_count.load(Ordering::SeqCst)
    }
}

impl ControlPlane for FakeControlPlane {
    fn install_token(&self, token: &SecretString) {
        *lock(&self.installed) = Some(token.expose_secret().to_owned());
    }

    async fn validate_session(&self, _token: &SecretString) -> Result<SessionInfo, vcloud_api::Error> {
        self.validate_count.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.validate_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let next = lock(&self.validations).pop_front();
        next.unwrap_or(Err(vcloud_api::Error::SessionExpired))
    }

    async fn login(
        &self,
        _user: &str,
        _org: &str,
        _password: &SecretString,
    ) -> Result<(SecretString, SessionInfo), vcloud_api::Error> {
        self.login_count.fetch_add(1, Ordering::SeqCst);
        let next = lock(&self.logins).pop_front();
        next.unwrap_or_else(|| {
            Err(vcloud_api::Error::Authentication {
                message: "no scripted login".into(),
            })
        })
    }

    async fn logout(&self) -> Result<(), vcloud_api::Error> {
        self.logout_count.fetch_add(1, Ordering::SeqCst);
        *lock(&self.installed) = None;
        Ok(())
    }

    async fn poll_operation(&self, _id: &str) -> Result<TaskSnapshot, vcloud_api::Error> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.poll_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let next = lock(&self.polls).pop_front();
        match next {
            Some(result) => result,
            None => lock(&self.repeat).clone().ok_or_else(transient),
        }
    }

    async fn cancel_operation(&self, _id: &str) -> Result<bool, vcloud_api::Error> {
        self.cancel_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.cancel_result).take().unwrap_or(Ok(false))
    }
}
