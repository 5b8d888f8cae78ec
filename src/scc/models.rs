//! Wire records for the SCC connect API.
//!
//! Response records are validated while deserializing, so a 2xx body with
//! missing or empty fields surfaces as a decode error instead of a
//! zero-valued result.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// System credentials returned by announce.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCredentials")]
pub struct Credentials {
    pub id: u64,
    pub login: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct RawCredentials {
    id: i64,
    login: String,
    password: String,
}

impl TryFrom<RawCredentials> for Credentials {
    type Error = String;

    fn try_from(raw: RawCredentials) -> Result<Self, Self::Error> {
        if raw.id <= 0 {
            return Err(format!("system id must be positive, got {}", raw.id));
        }
        if raw.login.is_empty() {
            return Err("login is empty".to_string());
        }
        if raw.password.is_empty() {
            return Err("password is empty".to_string());
        }

        Ok(Self {
            id: raw.id as u64,
            login: raw.login,
            password: raw.password,
        })
    }
}

/// Repository service granted by a product registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawService")]
pub struct Service {
    pub name: String,
    pub url: String,
}

#[derive(Deserialize)]
struct RawService {
    name: String,
    url: String,
}

impl TryFrom<RawService> for Service {
    type Error = String;

    fn try_from(raw: RawService) -> Result<Self, Self::Error> {
        if raw.name.is_empty() {
            return Err("service name is empty".to_string());
        }
        Url::parse(&raw.url).map_err(|e| format!("invalid service url '{}': {e}", raw.url))?;

        Ok(Self {
            name: raw.name,
            url: raw.url,
        })
    }
}

/// Body of a product registration. The regcode goes on the wire as `token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRequest {
    pub identifier: String,
    pub version: String,
    pub arch: String,
    #[serde(rename = "token")]
    pub regcode: String,
}

/// Body of an announce call: always `{}`.
#[derive(Debug, Serialize)]
pub(super) struct AnnounceRequest {}
