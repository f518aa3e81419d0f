//! Error types for the auth engine.

use session_storage::StorageError;
use std::sync::Arc;
use thiserror::Error;

/// Failure of an auth transport call.
///
/// The transport never interprets status codes; callers decide what a
/// given status means.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Server answered with a non-2xx status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Server answered 2xx but the envelope reported `success: false`
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// HTTP request error (connect, timeout, body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A protected call sent through the request pipeline failed
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl AuthError {
    /// HTTP status attached to this failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Status { status, .. } => Some(*status),
            AuthError::Http(e) => e.status().map(|s| s.as_u16()),
            AuthError::Pipeline(PipelineError::RefreshTransient(e)) => e.status(),
            _ => None,
        }
    }

    /// Returns true when the pipeline already ended the local session
    /// because the access token could not be renewed.
    pub fn session_ended(&self) -> bool {
        matches!(self, AuthError::Pipeline(e) if e.requires_login())
    }

    /// Returns true for a 401 from the server.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Message supplied by the server, when it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            AuthError::Status { message, .. } | AuthError::Rejected(message)
                if !message.is_empty() =>
            {
                Some(message.as_str())
            }
            _ => None,
        }
    }

    /// Returns true if this error is transient and the operation can be retried.
    ///
    /// Transient errors include:
    /// - Connection failures and timeouts
    /// - 5xx server errors
    /// - 429 rate limiting
    pub fn is_transient(&self) -> bool {
        match self {
            AuthError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                e.status().is_some_and(|s| s.is_server_error())
            }
            AuthError::Status { status, .. } => *status >= 500 || *status == 429,
            AuthError::Pipeline(PipelineError::RefreshTransient(e)) => e.is_transient(),
            AuthError::Pipeline(PipelineError::Http(e)) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

/// Failure of a request sent through the pipeline.
///
/// Non-401 responses are not errors; they come back as `Ok(response)`.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// 401 with no refresh token stored; the session was ended
    #[error("no refresh token available")]
    RefreshUnavailable,

    /// The refresh exchange itself returned 401; the session was ended
    #[error("session expired: {0}")]
    RefreshRejected(#[source] Arc<AuthError>),

    /// The refresh exchange failed for another reason; tokens were kept
    #[error("token refresh failed: {0}")]
    RefreshTransient(#[source] Arc<AuthError>),

    /// Tokens were refreshed but the request body could not be re-sent
    #[error("request body cannot be replayed")]
    NotReplayable,

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl PipelineError {
    /// Returns true when the caller has to sign in again.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            PipelineError::RefreshUnavailable | PipelineError::RefreshRejected(_)
        )
    }
}
