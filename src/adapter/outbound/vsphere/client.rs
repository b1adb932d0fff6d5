//! vCenter REST client and session handling.
//!
//! Speaks the `/api` surface of the vSphere Automation API. A session token
//! obtained from `POST /api/session` is sent on every later request in the
//! `vmware-api-session-id` header.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use super::types::ErrorBody;
use crate::domain::{Tag, TagId};
use crate::error::{Error, Result};
use crate::port::Session;

/// Header carrying the session token.
pub const SESSION_HEADER: &str = "vmware-api-session-id";

/// Connection parameters for a vCenter endpoint.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub url: Url,
    /// Accept any server certificate.
    pub insecure: bool,
    /// Per-request timeout. `None` leaves the transport default.
    pub timeout: Option<Duration>,
}

/// Which API surface a request belongs to, for error reporting.
#[derive(Debug, Clone, Copy)]
pub(super) enum Api {
    Session,
    Inventory,
    Tagging(&'static str),
}

impl Api {
    fn error(self, status: Option<u16>, message: String) -> Error {
        match self {
            Self::Session => Error::Connection(match status {
                Some(status) => format!("session request failed (HTTP {status}): {message}"),
                None => format!("session request failed: {message}"),
            }),
            Self::Inventory => Error::Inventory { status, message },
            Self::Tagging(operation) => Error::TagService {
                operation,
                status,
                message,
            },
        }
    }
}

/// Authenticated client for one vCenter endpoint.
///
/// Implements [`Session`] directly; inventory and tagging live in sibling
/// modules on the same type.
#[derive(Debug)]
pub struct VsphereClient {
    http: Client,
    base: Url,
    token: RwLock<Option<String>>,
    /// Tags fetched by id during this client's lifetime.
    pub(super) tag_cache: Mutex<HashMap<TagId, Tag>>,
}

impl VsphereClient {
    /// Build a client. No request is made until [`login`](Self::login).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(options: &ConnectOptions) -> Result<Self> {
        if options.insecure {
            warn!(url = %options.url, "TLS certificate validation disabled for vCenter");
        }

        let mut builder = Client::builder().danger_accept_invalid_certs(options.insecure);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        // Keep a trailing slash so relative joins append to any path prefix.
        let mut base = options.url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            http: builder.build()?,
            base,
            token: RwLock::new(None),
            tag_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Create a session with basic credentials.
    ///
    /// Returns `Ok(false)` when the endpoint rejects the credentials; the
    /// client then stays without a session.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an unexpected status.
    pub async fn login(&self, username: &str, password: &str) -> Result<bool> {
        let url = self.url("api/session")?;
        let response = self
            .http
            .post(url)
            .basic_auth(username, Some(password))
            .send()
            .await
            .map_err(|e| Api::Session.error(None, e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(endpoint = %self.endpoint(), username, "vCenter rejected credentials");
                *self.token.write() = None;
                Ok(false)
            }
            status if status.is_success() => {
                let token: String = response
                    .json()
                    .await
                    .map_err(|e| Api::Session.error(Some(status.as_u16()), e.to_string()))?;
                *self.token.write() = Some(token);
                info!(endpoint = %self.endpoint(), username, "vCenter session created");
                Ok(true)
            }
            _ => Err(failure(Api::Session, response).await),
        }
    }

    /// Delete the current session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    pub async fn logout(&self) -> Result<()> {
        let Some(token) = self.token.write().take() else {
            return Ok(());
        };
        let response = self
            .http
            .delete(self.url("api/session")?)
            .header(SESSION_HEADER, token)
            .send()
            .await
            .map_err(|e| Api::Session.error(None, e.to_string()))?;
        debug!(status = %response.status(), "vCenter session deleted");
        Ok(())
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    fn request(&self, method: Method, path: &str, query: &[(&str, &str)]) -> Result<RequestBuilder> {
        let mut builder = self.http.request(method, self.url(path)?);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(token) = self.token.read().as_deref() {
            builder = builder.header(SESSION_HEADER, token);
        }
        Ok(builder)
    }

    async fn send(&self, api: Api, builder: RequestBuilder) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| api.error(e.status().map(|s| s.as_u16()), e.to_string()))?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(failure(api, response).await)
        }
    }

    pub(super) async fn get_json<T: DeserializeOwned>(
        &self,
        api: Api,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        debug!(path, "GET");
        let response = self.send(api, self.request(Method::GET, path, query)?).await?;
        let status = response.status().as_u16();
        response
            .json()
            .await
            .map_err(|e| api.error(Some(status), format!("unexpected response body: {e}")))
    }

    pub(super) async fn post_json<B, T>(
        &self,
        api: Api,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!(path, "POST");
        let builder = self.request(Method::POST, path, query)?.json(body);
        let response = self.send(api, builder).await?;
        let status = response.status().as_u16();
        response
            .json()
            .await
            .map_err(|e| api.error(Some(status), format!("unexpected response body: {e}")))
    }

    /// POST whose response body is ignored.
    pub(super) async fn post<B>(
        &self,
        api: Api,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        debug!(path, "POST");
        let builder = self.request(Method::POST, path, query)?.json(body);
        self.send(api, builder).await.map(drop)
    }
}

/// Turn a non-2xx response into the error for `api`.
async fn failure(api: Api, response: Response) -> Error {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.summary())
        .ok()
        .filter(|summary| !summary.is_empty())
        .unwrap_or_else(|| {
            if text.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            }
        });
    api.error(Some(status.as_u16()), message)
}

#[async_trait]
impl Session for VsphereClient {
    async fn is_active(&self) -> Result<bool> {
        if self.token.read().is_none() {
            return Ok(false);
        }
        let response = self
            .request(Method::GET, "api/session", &[])?
            .send()
            .await
            .map_err(|e| Api::Session.error(None, e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(false),
            _ => Err(failure(Api::Session, response).await),
        }
    }

    fn endpoint(&self) -> String {
        self.base.host_str().unwrap_or("vcenter").to_string()
    }
}
