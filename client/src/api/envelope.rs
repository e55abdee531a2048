//! Response envelope handling
//!
//! Normalizes every server response into either a decoded payload or a
//! [`ClientError`]. A non-success status becomes `ClientError::Api` carrying
//! the server's `error` message when there is one, otherwise the body text or
//! the transport status text. No retries happen here.

use crate::api::models::Post;
use crate::error::{ClientError, ClientResult};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Fallback message for a 429 without a body
pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded";

/// Turn a response into `T` or an error
pub async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = error_message(status, &body);
        tracing::debug!(
            status_code = status.as_u16(),
            message = %message,
            "API returned error status"
        );
        return Err(ClientError::Api { status, message });
    }

    decode_body(&body)
}

/// Decode a success body
pub fn decode_body<T: DeserializeOwned>(body: &str) -> ClientResult<T> {
    serde_json::from_str(body).map_err(|e| {
        tracing::warn!(error = %e, body_len = body.len(), "Failed to decode API response");
        ClientError::Decode(e.to_string())
    })
}

/// Extract the message for a failed response
///
/// Order of preference: the JSON `error` field, the raw body when it is not
/// JSON, then the canonical status text.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim();

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => {
            if let Some(message) = value
                .get("error")
                .and_then(|e| e.as_str())
                .filter(|m| !m.trim().is_empty())
            {
                return message.to_string();
            }
        }
        Err(_) if !trimmed.is_empty() => return trimmed.to_string(),
        Err(_) => {}
    }

    status_text(status)
}

fn status_text(status: StatusCode) -> String {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return RATE_LIMIT_MESSAGE.to_string();
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

/// Accepted shapes of a feed response
///
/// `{"posts": [...]}` is the documented shape; the rest are tolerated and
/// logged so schema drift stays visible.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FeedEnvelope {
    /// `{"posts": [...]}`
    Posts {
        /// Posts
        posts: Vec<Post>,
    },
    /// `{"items": [...]}`
    Items {
        /// Posts
        items: Vec<Post>,
    },
    /// `{"data": [...]}`
    Data {
        /// Posts
        data: Vec<Post>,
    },
    /// `[...]`
    Bare(Vec<Post>),
}

impl FeedEnvelope {
    /// Unwrap into posts
    pub fn into_posts(self) -> Vec<Post> {
        match self {
            FeedEnvelope::Posts { posts } => posts,
            FeedEnvelope::Items { items } => {
                tracing::debug!("Feed response used `items` envelope");
                items
            }
            FeedEnvelope::Data { data } => {
                tracing::debug!("Feed response used `data` envelope");
                data
            }
            FeedEnvelope::Bare(posts) => {
                tracing::debug!("Feed response was a bare array");
                posts
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_error_field() {
        let msg = error_message(
            StatusCode::BAD_REQUEST,
            r#"{"success": false, "error": "Title is required"}"#,
        );
        assert_eq!(msg, "Title is required");
    }

    #[test]
    fn test_error_message_json_without_error_uses_status_text() {
        let msg = error_message(StatusCode::NOT_FOUND, r#"{"success": false}"#);
        assert_eq!(msg, "Not Found");
    }

    #[test]
    fn test_error_message_plain_text_body() {
        let msg = error_message(StatusCode::BAD_GATEWAY, "upstream exploded");
        assert_eq!(msg, "upstream exploded");
    }

    #[test]
    fn test_error_message_empty_body() {
        assert_eq!(error_message(StatusCode::UNAUTHORIZED, ""), "Unauthorized");
        assert_eq!(
            error_message(StatusCode::TOO_MANY_REQUESTS, "  "),
            RATE_LIMIT_MESSAGE
        );
    }

    #[test]
    fn test_rate_limit_message_from_body() {
        let msg = error_message(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error": "You can only post once every 30 minutes", "retry_after_minutes": 12}"#,
        );
        assert_eq!(msg, "You can only post once every 30 minutes");
    }

    #[test]
    fn test_feed_envelope_shapes() {
        let post = r#"{"id": "p1", "title": "T"}"#;
        for body in [
            format!(r#"{{"success": true, "posts": [{post}]}}"#),
            format!(r#"{{"items": [{post}]}}"#),
            format!(r#"{{"data": [{post}]}}"#),
            format!("[{post}]"),
        ] {
            let envelope: FeedEnvelope = decode_body(&body).unwrap();
            let posts = envelope.into_posts();
            assert_eq!(posts.len(), 1, "body: {}", body);
            assert_eq!(posts[0].title, "T");
        }
    }

    #[test]
    fn test_feed_envelope_rejects_unknown_shape() {
        let result: ClientResult<FeedEnvelope> = decode_body(r#"{"results": []}"#);
        assert!(matches!(result, Err(ClientError::Decode(_))));
    }
}
