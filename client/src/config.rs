//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults. Shared by the desktop client, the sandbox server
//! and the `dm_check` utility.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Production API base path
pub const DEFAULT_API_BASE: &str = "https://www.moltbook.com/api/v1";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote API configuration
    pub api: ApiConfig,
    /// Polling cadence configuration
    pub polling: PollingConfig,
    /// Session persistence configuration
    pub session: SessionConfig,
    /// Sandbox server configuration
    pub sandbox: SandboxConfig,
}

/// Remote API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to (no trailing slash)
    pub base_url: String,
    /// Per-request timeout (in seconds)
    pub request_timeout_secs: u64,
}

/// Polling configuration
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Interval of the DM activity heartbeat (in seconds)
    pub heartbeat_secs: u64,
    /// Interval of the open-conversation refresh (in seconds)
    pub thread_refresh_secs: u64,
}

/// Session persistence configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Path of the JSON credentials file holding the API key
    pub credentials_path: PathBuf,
}

/// Sandbox server configuration
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Port to bind the sandbox to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
    /// Minimum delay between two posts by the same agent (0 disables)
    pub post_cooldown_secs: u64,
    /// Mark agents as claimed right after registration
    pub auto_claim: bool,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig {
                base_url: env::var("MOLTBOOK_API_BASE")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
                request_timeout_secs: parse_env("MOLTBOOK_REQUEST_TIMEOUT_SECS", 30),
            },
            polling: PollingConfig {
                heartbeat_secs: parse_env("MOLTBOOK_HEARTBEAT_SECS", 60),
                thread_refresh_secs: parse_env("MOLTBOOK_THREAD_REFRESH_SECS", 10),
            },
            session: SessionConfig {
                credentials_path: env::var_os("MOLTBOOK_CREDENTIALS")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_credentials_path),
            },
            sandbox: SandboxConfig {
                port: parse_env("SANDBOX_PORT", 8787),
                host: env::var("SANDBOX_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                post_cooldown_secs: parse_env("SANDBOX_POST_COOLDOWN_SECS", 0),
                auto_claim: env::var("SANDBOX_AUTO_CLAIM")
                    .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                    .unwrap_or(false),
            },
        }
    }

    /// Get the sandbox address as a string
    pub fn sandbox_addr(&self) -> String {
        format!("{}:{}", self.sandbox.host, self.sandbox.port)
    }
}

impl ApiConfig {
    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl PollingConfig {
    /// Heartbeat interval as a `Duration` (never zero)
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }

    /// Thread refresh interval as a `Duration` (never zero)
    pub fn thread_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.thread_refresh_secs.max(1))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ~/.moltbook/credentials.json, or the current directory without HOME
fn default_credentials_path() -> PathBuf {
    if let Some(home) = env::var_os("HOME") {
        let mut path = PathBuf::from(home);
        path.push(".moltbook");
        path.push("credentials.json");
        path
    } else {
        PathBuf::from("moltbook-credentials.json")
    }
}
