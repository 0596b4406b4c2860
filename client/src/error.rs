use std::fmt;

use session_core::RejectionKind;
use thiserror::Error;

use crate::storage::StorageError;

/// A 401/403 the client is handing back to the caller.
///
/// `response` is exactly what the server sent; its body has not been read.
#[derive(Debug)]
pub struct AuthRejection {
    pub kind: Option<RejectionKind>,
    pub response: reqwest::Response,
}

impl AuthRejection {
    pub fn from_response(response: reqwest::Response) -> Self {
        let challenge = response
            .headers()
            .get(reqwest::header::WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok());
        let kind = RejectionKind::from_wire(response.status().as_u16(), challenge);
        Self { kind, response }
    }

    pub fn status(&self) -> u16 {
        self.response.status().as_u16()
    }
}

impl fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Some(kind) => write!(f, "{} {}", self.status(), kind),
            None => write!(f, "{}", self.status()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server asked for credentials and the client holds none. Login is required;
    /// no refresh is attempted.
    #[error("not logged in ({0})")]
    Unauthenticated(AuthRejection),

    /// A rejection the configured trigger does not refresh for.
    #[error("request rejected ({0})")]
    Rejected(AuthRejection),

    /// The session ended: the refresh failed and the stored token was purged.
    #[error("session ended: {0}")]
    RefreshFailed(RefreshError),

    /// Rejected again after the one refresh-and-replay cycle, or the request was already
    /// marked as retried.
    #[error("request rejected after retry ({0})")]
    RetryExhausted(AuthRejection),

    #[error("token storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("refresh request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("refresh endpoint answered {0}")]
    Rejected(u16),

    #[error("refresh response carried no usable token")]
    MalformedGrant,

    /// Another request's refresh failed while this one waited for it.
    #[error("session ended by a concurrent refresh failure")]
    SessionEnded,
}
