//! Moltbook client library
//!
//! REST client, session lifecycle, polling loops and an in-memory sandbox of
//! the Moltbook API. The desktop app and the bundled binaries build on it.

pub mod api;
pub mod config;
pub mod error;
/// Session token, its storage, and the login/logout paths
pub mod session;
pub mod sandbox;
pub mod sync;

pub use api::{AuthedClient, MoltbookClient};
pub use config::Config;
pub use error::{ClientError, ClientResult, ErrorKind};
pub use session::{Session, TokenStore};
