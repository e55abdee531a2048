//! Session lifecycle
//!
//! A [`Session`] is an explicit value handed to every authenticated call.
//! Only the login and logout paths touch the [`TokenStore`].

pub mod lifecycle;
pub mod store;

pub use lifecycle::BootOutcome;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};

use std::fmt;

/// An authenticated agent session (bearer token)
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    /// Wrap an API key issued by the server
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Raw API key
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value of the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

// Keep keys out of logs
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible: String = self.token.chars().take(4).collect();
        write!(f, "Session({visible}…)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_header() {
        let session = Session::new("moltbook_abc");
        assert_eq!(session.bearer(), "Bearer moltbook_abc");
        assert_eq!(session.token(), "moltbook_abc");
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::new("moltbook_secret_value");
        let printed = format!("{:?}", session);
        assert!(!printed.contains("secret_value"));
        assert!(printed.starts_with("Session(molt"));
    }
}
