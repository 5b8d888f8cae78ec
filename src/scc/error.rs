//! Registration client errors.

use thiserror::Error;

use crate::retry::Transient;

/// Boxed cause of a failed send, as produced by an [`HttpBackend`](super::HttpBackend).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum SccError {
    /// No response was obtained (connect, DNS, TLS, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The server answered with a status outside `[200, 300)`.
    #[error("request failed with status {0}")]
    Status(u16),

    /// A 2xx body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request could not be built (bad base URL, body serialization).
    #[error("invalid request: {0}")]
    Request(String),
}

/// Coarse classification of an HTTP status failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 401/403 - bad credentials or regcode.
    Unauthorized,
    /// 404 - system or product unknown to the server.
    NotFound,
    /// Any other 4xx, e.g. an unknown product triple.
    Client,
    /// 5xx.
    Server,
    Other,
}

impl StatusClass {
    pub fn of(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            400..=499 => Self::Client,
            500..=599 => Self::Server,
            _ => Self::Other,
        }
    }
}

impl SccError {
    /// The status code for [`SccError::Status`], `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }

    pub fn status_class(&self) -> Option<StatusClass> {
        self.status().map(StatusClass::of)
    }

    /// Whether retrying the same call unchanged could succeed.
    ///
    /// Only transport failures qualify: a status error is the server
    /// rejecting the request, and a decode error is a protocol mismatch.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Whether a failed deregistration means the system is already gone.
    pub fn is_already_deregistered(&self) -> bool {
        matches!(
            self.status_class(),
            Some(StatusClass::Unauthorized | StatusClass::NotFound)
        )
    }
}

impl Transient for SccError {
    fn is_transient(&self) -> bool {
        SccError::is_transient(self)
    }
}
