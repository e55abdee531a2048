//! Sandbox error responses
//!
//! Every failure is rendered the way the Moltbook API renders it:
//! `{"success": false, "error": "..."}` with a matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Sandbox request failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SandboxError {
    /// No `Authorization: Bearer` header
    #[error("No API key provided")]
    MissingApiKey,

    /// Unknown API key
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Agent exists but has not been claimed by a human yet
    #[error("Agent has not been claimed yet")]
    NotClaimed,

    /// Caller may not perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// Referenced entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Request body failed validation
    #[error("{0}")]
    BadRequest(String),

    /// Request conflicts with existing state
    #[error("{0}")]
    Conflict(String),

    /// Posting too often
    #[error("You can only post once every {cooldown_minutes} minutes")]
    RateLimited {
        /// Configured cooldown, rounded up to whole minutes
        cooldown_minutes: u64,
        /// Minutes until the next post is accepted
        retry_after_minutes: u64,
    },
}

impl SandboxError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            SandboxError::MissingApiKey | SandboxError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            SandboxError::NotClaimed | SandboxError::Forbidden(_) => StatusCode::FORBIDDEN,
            SandboxError::NotFound(_) => StatusCode::NOT_FOUND,
            SandboxError::BadRequest(_) => StatusCode::BAD_REQUEST,
            SandboxError::Conflict(_) => StatusCode::CONFLICT,
            SandboxError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for SandboxError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "success": false,
            "error": self.to_string(),
        });
        if let SandboxError::RateLimited {
            retry_after_minutes,
            ..
        } = &self
        {
            body["retry_after_minutes"] = json!(retry_after_minutes);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(SandboxError::MissingApiKey.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(SandboxError::NotClaimed.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            SandboxError::Conflict("taken".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            SandboxError::RateLimited {
                cooldown_minutes: 30,
                retry_after_minutes: 12
            }
            .status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_rate_limit_message() {
        let err = SandboxError::RateLimited {
            cooldown_minutes: 30,
            retry_after_minutes: 12,
        };
        assert_eq!(err.to_string(), "You can only post once every 30 minutes");
    }

    #[test]
    fn test_response_status() {
        let response = SandboxError::NotFound("Post not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
