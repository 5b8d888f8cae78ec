//! HTTP transport: auth modes, fixed headers, status classification and
//! JSON decoding.
//!
//! The network send itself sits behind [`HttpBackend`] so the client can be
//! exercised without a server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::error::{BoxError, SccError};

/// Production SCC connect API.
pub const DEFAULT_BASE_URL: &str = "https://scc.suse.com/connect";

const JSON: &str = "application/json";

/// How a request authenticates.
#[derive(Debug)]
pub enum Auth {
    /// `Authorization: Bearer <regcode>`.
    BearerToken(SecretString),
    /// HTTP basic auth with system credentials.
    Basic { login: String, password: SecretString },
    None,
}

impl Auth {
    pub fn bearer(token: &str) -> Self {
        Self::BearerToken(SecretString::from(token.to_string()))
    }

    pub fn basic(login: &str, password: &str) -> Self {
        Self::Basic {
            login: login.to_string(),
            password: SecretString::from(password.to_string()),
        }
    }
}

/// A fully prepared request, ready to be put on the wire.
#[derive(Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub auth: Auth,
    pub body: Option<Vec<u8>>,
}

/// Raw response: status plus body bytes.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Sends a prepared request. Errors mean no response was obtained.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError>;
}

/// [`HttpBackend`] backed by a reqwest client.
pub struct ReqwestBackend {
    client: Client,
}

impl ReqwestBackend {
    /// Build the backend, with an optional whole-request timeout.
    pub fn new(timeout: Option<Duration>) -> Result<Self, SccError> {
        let mut builder =
            Client::builder().user_agent(concat!("sccreg/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| SccError::Request(format!("failed to build http client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);

        builder = match &request.auth {
            Auth::BearerToken(token) => builder.bearer_auth(token.expose_secret()),
            Auth::Basic { login, password } => {
                builder.basic_auth(login, Some(password.expose_secret()))
            }
            Auth::None => builder,
        };

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse { status, body })
    }
}

/// One-shot JSON calls against a fixed base URL.
pub struct Transport<B = ReqwestBackend> {
    backend: B,
    base_url: String,
}

impl<B: HttpBackend> Transport<B> {
    pub fn new(backend: B, base_url: &str) -> Result<Self, SccError> {
        Url::parse(base_url)
            .map_err(|e| SccError::Request(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            backend,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send `body` as JSON and decode a 2xx response into `T`.
    pub async fn call<S, T>(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
        body: &S,
    ) -> Result<T, SccError>
    where
        S: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_vec(body)
            .map_err(|e| SccError::Request(format!("failed to encode body: {e}")))?;

        let response = self.send(method, path, auth, Some(body)).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Send a body-less request; any 2xx response counts as success.
    pub async fn call_no_content(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
    ) -> Result<(), SccError> {
        self.send(method, path, auth, None).await.map(|_| ())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
        body: Option<Vec<u8>>,
    ) -> Result<HttpResponse, SccError> {
        let url = format!("{}{}", self.base_url, path);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON));
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
        }

        debug!(method = %method, url = %url, "sending request");

        let response = self
            .backend
            .send(HttpRequest {
                method,
                url,
                headers,
                auth,
                body,
            })
            .await
            .map_err(SccError::Transport)?;

        debug!(status = response.status, bytes = response.body.len(), "received response");

        if !(200..300).contains(&response.status) {
            return Err(SccError::Status(response.status));
        }

        Ok(response)
    }
}
