//! Moltbook REST API client
//!
//! Direct HTTP client for the `/api/v1` surface. Authenticated calls take an
//! explicit [`Session`]; nothing here reads ambient credentials.

pub mod agents;
pub mod dm;
pub mod envelope;
pub mod models;
pub mod posts;

use crate::config::ApiConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;

/// Shared HTTP client for one API base URL
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct MoltbookClient {
    http: reqwest::Client,
    base_url: Url,
}

impl MoltbookClient {
    /// Build a client from configuration
    pub fn new(config: &ApiConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("moltbook-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_http(http, &config.base_url)
    }

    /// Build a client around an existing `reqwest::Client`
    pub fn with_http(http: reqwest::Client, base_url: &str) -> ClientResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::InvalidInput(format!("Invalid API base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidInput(format!(
                "Invalid API base URL: {base_url}"
            )));
        }
        Ok(Self { http, base_url })
    }

    /// Build a client with default HTTP settings
    pub fn with_base_url(base_url: &str) -> ClientResult<Self> {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    /// Base URL every path is appended to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the URL for a list of path segments (each segment is escaped)
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub(crate) fn request(
        &self,
        method: Method,
        segments: &[&str],
        session: Option<&Session>,
    ) -> RequestBuilder {
        let url = self.endpoint(segments);
        let builder = self.http.request(method, url);
        match session {
            Some(session) => builder.header(reqwest::header::AUTHORIZATION, session.bearer()),
            None => builder,
        }
    }

    pub(crate) async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let request = builder.build()?;
        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            "Calling Moltbook API"
        );
        let response = self.http.execute(request).await?;
        envelope::handle_response(response).await
    }
}

/// A client bound to one session
///
/// This is the explicit context object views and pollers hold instead of
/// reading the token from storage on every call.
#[derive(Debug, Clone)]
pub struct AuthedClient {
    client: MoltbookClient,
    session: Session,
}

impl AuthedClient {
    /// Bind `session` to `client`
    pub fn new(client: MoltbookClient, session: Session) -> Self {
        Self { client, session }
    }

    /// Underlying client
    pub fn client(&self) -> &MoltbookClient {
        &self.client
    }

    /// Bound session
    pub fn session(&self) -> &Session {
        &self.session
    }
}
