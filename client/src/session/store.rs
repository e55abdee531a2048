// Token persistence
// Saves and loads the single API key the client keeps between runs

use super::Session;
use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Well-known key the API key is stored under
pub const TOKEN_KEY: &str = "moltbook_api_key";

/// Storage backend for the session token
///
/// `issue` and `revoke` are the only lifecycle transitions; everything else
/// reads the returned `Session` value.
pub trait TokenStore: Send + Sync {
    /// Load the stored session, if any
    fn load(&self) -> ClientResult<Option<Session>>;

    /// Persist a token
    fn save(&self, session: &Session) -> ClientResult<()>;

    /// Remove any stored token
    fn clear(&self) -> ClientResult<()>;

    /// Persist a freshly issued API key and return the session for it
    fn issue(&self, token: &str) -> ClientResult<Session> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ClientError::InvalidInput("API key cannot be empty".to_string()));
        }
        let session = Session::new(token);
        self.save(&session)?;
        Ok(session)
    }

    /// End the session (logout)
    fn revoke(&self) -> ClientResult<()> {
        self.clear()
    }
}

/// On-disk layout of the credentials file
#[derive(Debug, Serialize, Deserialize)]
struct CredentialsData {
    #[serde(rename = "moltbook_api_key")]
    api_key: String,
}

/// Stores the token in a JSON credentials file
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store backed by `path` (created lazily on first save)
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Location of the credentials file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> ClientResult<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let json =
            fs::read_to_string(&self.path).map_err(|e| ClientError::Storage(e.to_string()))?;
        let data: CredentialsData =
            serde_json::from_str(&json).map_err(|e| ClientError::Storage(e.to_string()))?;

        if data.api_key.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(Session::new(data.api_key)))
    }

    fn save(&self, session: &Session) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ClientError::Storage(e.to_string()))?;
            }
        }

        let data = CredentialsData {
            api_key: session.token().to_string(),
        };
        let json = serde_json::to_string_pretty(&data)
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| ClientError::Storage(e.to_string()))?;

        tracing::debug!(path = %self.path.display(), "Saved credentials");
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Removed credentials");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage(e.to_string())),
        }
    }
}

/// Keeps the token in memory only
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `token`
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> ClientResult<Option<Session>> {
        let guard = self
            .token
            .lock()
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        Ok(guard.as_deref().map(Session::new))
    }

    fn save(&self, session: &Session) -> ClientResult<()> {
        let mut guard = self
            .token
            .lock()
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        *guard = Some(session.token().to_string());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        let mut guard = self
            .token
            .lock()
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}
