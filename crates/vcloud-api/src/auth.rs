// Session authentication
//
// Login exchanges basic credentials for a session token carried in the
// `x-vcloud-authorization` response header. Validation re-reads the
// current session with a candidate token; logout deletes it.

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::{AUTH_HEADER, VcdClient};
use crate::error::Error;
use crate::models::SessionInfo;

impl VcdClient {
    /// Authenticate with `user@org` and a password.
    ///
    /// On success the returned token is also installed on the client, so
    /// subsequent calls are authenticated.
    pub async fn login(
        &self,
        user: &str,
        org: &str,
        password: &SecretString,
    ) -> Result<(SecretString, SessionInfo), Error> {
        let url = self.api_url(&["sessions"])?;
        debug!(%url, user, org, "logging in");

        let resp = self
            .http()
            .post(url)
            .basic_auth(format!("{user}@{org}"), Some(password.expose_secret()))
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        let token = resp
            .headers()
            .get(AUTH_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| SecretString::from(v.to_owned()));

        let info: SessionInfo = Self::decode(resp).await?;
        let token = token.ok_or_else(|| Error::Authentication {
            message: format!("login response carried no {AUTH_HEADER} header"),
        })?;

        self.set_token(token.clone());
        debug!(user = %info.user, org = %info.org, "login successful");
        Ok((token, info))
    }

    /// Check whether `token` still identifies a live session.
    ///
    /// Lightweight `GET /api/session`. A 401 maps to
    /// [`Error::SessionExpired`]; connection problems surface as
    /// transport errors so callers can tell the two apart.
    pub async fn validate_token(&self, token: &SecretString) -> Result<SessionInfo, Error> {
        let url = self.api_url(&["session"])?;
        debug!(%url, "validating session token");
        let resp = self.request(Method::GET, url, Some(token))?.send().await?;
        Self::decode(resp).await
    }

    /// End the current session and forget the installed token.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.api_url(&["session"])?;
        debug!(%url, "logging out");
        let resp = self.request(Method::DELETE, url, None)?.send().await?;
        let result = Self::check_status(resp).await.map(|_| ());
        self.clear_token();
        result
    }
}
