// Control-plane HTTP client
//
// Wraps `reqwest::Client` with URL construction, token injection, and
// response classification. Endpoint groups (auth, tasks, vdcs, ...) are
// inherent methods implemented in sibling files so this module stays
// focused on transport mechanics.

use std::sync::{PoisonError, RwLock};

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Header carrying the session token on every authenticated request.
pub const AUTH_HEADER: &str = "x-vcloud-authorization";

/// Error body shape: `{"message": "...", "code": "..."}`.
#[derive(serde::Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    code: Option<String>,
}

/// Raw HTTP client for the control plane.
///
/// Holds the session token installed after login or validation and
/// attaches it to every request. All methods return decoded payloads;
/// HTTP status handling happens before the caller sees anything.
pub struct VcdClient {
    http: reqwest::Client,
    base_url: Url,
    api_version: String,
    token: RwLock<Option<SecretString>>,
}

impl VcdClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the control-plane root (e.g. `https://vcd.example.com`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            api_version: transport.api_version.clone(),
            token: RwLock::new(None),
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, api_version: String) -> Self {
        Self {
            http,
            base_url,
            api_version,
            token: RwLock::new(None),
        }
    }

    /// The control-plane base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The API version sent in the `Accept` header.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── Token management ─────────────────────────────────────────────

    /// Install the session token used on subsequent requests.
    pub fn set_token(&self, token: SecretString) {
        debug!("installing session token");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Forget the installed session token.
    pub fn clear_token(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a session token is installed.
    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn current_token(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/{segments...}`, percent-encoding each segment.
    pub(crate) fn api_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Start a request carrying an explicit token (or the installed one).
    pub(crate) fn request(
        &self,
        method: Method,
        url: Url,
        token: Option<&SecretString>,
    ) -> Result<RequestBuilder, Error> {
        let builder = self.http.request(method, url);
        match token {
            Some(token) => Ok(builder.header(AUTH_HEADER, token.expose_secret())),
            None => {
                let token = self.current_token().ok_or(Error::MissingToken)?;
                Ok(builder.header(AUTH_HEADER, token.expose_secret()))
            }
        }
    }

    /// Authenticated GET, decoding the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        let url = self.api_url(segments)?;
        debug!("GET {}", url);
        let resp = self.request(Method::GET, url, None)?.send().await?;
        Self::decode(resp).await
    }

    /// Authenticated POST with a JSON body, decoding the JSON response.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let url = self.api_url(segments)?;
        debug!("POST {}", url);
        let resp = self
            .request(Method::POST, url, None)?
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Authenticated DELETE, decoding the JSON response.
    pub(crate) async fn delete<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        let url = self.api_url(segments)?;
        debug!("DELETE {}", url);
        let resp = self.request(Method::DELETE, url, None)?.send().await?;
        Self::decode(resp).await
    }

    /// Authenticated GET with query parameters, decoding the JSON body.
    pub(crate) async fn get_query<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.api_url(segments)?;
        debug!("GET {url} params={query:?}");
        let resp = self
            .request(Method::GET, url, None)?
            .query(query)
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Authenticated PUT with a JSON body, decoding the JSON response.
    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        let url = self.api_url(segments)?;
        debug!("PUT {}", url);
        let resp = self
            .request(Method::PUT, url, None)?
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// Authenticated DELETE whose response body is ignored.
    pub(crate) async fn delete_unit(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<(), Error> {
        let url = self.api_url(segments)?;
        debug!("DELETE {url} params={query:?}");
        let resp = self
            .request(Method::DELETE, url, None)?
            .query(query)
            .send()
            .await?;
        Self::check_status(resp).await.map(|_| ())
    }

    /// Map non-success statuses into `Error`, passing 2xx responses through.
    pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::SessionExpired);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                path: resp.url().path().to_owned(),
            });
        }

        let body = resp.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ApiErrorBody>(&body).ok();
        let (message, code) = match parsed {
            Some(ApiErrorBody {
                message: Some(message),
                code,
            }) => (message, code),
            Some(ApiErrorBody {
                message: None,
                code,
            }) => (preview(&body), code),
            None if status == StatusCode::FORBIDDEN => ("insufficient permissions".into(), None),
            None => (preview(&body), None),
        };

        Err(Error::Api {
            status: status.as_u16(),
            message,
            code,
        })
    }

    /// Check the status, then decode the JSON body.
    pub(crate) async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let resp = Self::check_status(resp).await?;
        let body = resp.text().await?;
        trace!(len = body.len(), "response body received");

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

/// First 200 characters of a response body, for error messages.
fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
