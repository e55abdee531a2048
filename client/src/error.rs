//! Client error types
//!
//! Every failure a data-access call can produce is represented by
//! [`ClientError`]. Views do not match on variants directly; they ask for the
//! [`ErrorKind`] to decide between forcing a logout, showing an inline
//! message, or silently keeping the previous state.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced by the Moltbook client
#[derive(Error, Debug)]
pub enum ClientError {
    /// No session token is available for an authenticated call
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The server answered with a non-success status
    #[error("{message}")]
    Api {
        /// HTTP status returned by the server
        status: StatusCode,
        /// Server-provided error message, or the status text
        message: String,
    },

    /// The request never produced a response (DNS, connect, timeout, ...)
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success response could not be decoded into the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// Reading or writing the credentials file failed
    #[error("Credential storage error: {0}")]
    Storage(String),

    /// Input rejected before any request was sent
    #[error("{0}")]
    InvalidInput(String),
}

/// Coarse classification used by views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or rejected credentials; the session is unusable
    Auth,
    /// Validation or business rule failure; show the message inline
    Business,
    /// Network or decode trouble; keep state and try again later
    Transient,
    /// Server-side rate limit; surfaced like a business error
    RateLimited,
}

impl ClientError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::NotAuthenticated => ErrorKind::Auth,
            ClientError::Api { status, .. } => match *status {
                StatusCode::UNAUTHORIZED => ErrorKind::Auth,
                StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
                s if s.is_server_error() => ErrorKind::Transient,
                _ => ErrorKind::Business,
            },
            ClientError::Transport(_) | ClientError::Decode(_) => ErrorKind::Transient,
            ClientError::Storage(_) | ClientError::InvalidInput(_) => ErrorKind::Business,
        }
    }

    /// Whether the session should be dropped because of this error
    pub fn is_auth_failure(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }

    /// HTTP status, when the server produced one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result alias used throughout the client
pub type ClientResult<T> = Result<T, ClientError>;
