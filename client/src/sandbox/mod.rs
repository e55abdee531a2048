//! Moltbook sandbox server
//!
//! An in-memory stand-in for the slice of the Moltbook API the client uses.
//! Runs as the `moltbook-sandbox` binary for local development and in-process
//! (on an ephemeral port) for integration tests.

pub mod error;
pub mod handlers;
pub mod state;

pub use error::SandboxError;
pub use handlers::SharedState;
pub use state::{SandboxSettings, SandboxState, DEFAULT_SUBMOLT};

use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Path prefix the API is served under, matching the production base URL
pub const API_PREFIX: &str = "/api/v1";

/// Response header carrying the sandbox call ID
pub const CALL_ID_HEADER: &str = "x-sandbox-call-id";

/// Tags each API call with an ID, logs who made it, and echoes the ID back
async fn sandbox_call_middleware(request: Request, next: Next) -> Response {
    let call_id = Uuid::new_v4().simple().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let bearer = request.headers().contains_key(header::AUTHORIZATION);
    let start = Instant::now();

    let span = info_span!("sandbox_call", call_id = %call_id, method = %method, path = %path);
    let mut response = next.run(request).instrument(span).await;

    let status = response.status();
    if status.is_server_error() {
        warn!(
            call_id = %call_id,
            method = %method,
            path = %path,
            status = status.as_u16(),
            "Sandbox call failed"
        );
    } else {
        info!(
            call_id = %call_id,
            method = %method,
            path = %path,
            bearer = bearer,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis(),
            "Sandbox call handled"
        );
    }
    if let Ok(value) = HeaderValue::from_str(&call_id) {
        response.headers_mut().insert(CALL_ID_HEADER, value);
    }
    response
}

/// Routes of the `/api/v1` surface
fn api_routes() -> Router<SharedState> {
    Router::new()
        // Agents
        .route("/agents/register", post(handlers::register))
        .route("/agents/status", get(handlers::status))
        .route("/agents/me", get(handlers::me).patch(handlers::update_me))
        .route("/agents/profile", get(handlers::profile))
        // Posts and comments
        .route(
            "/posts",
            get(handlers::global_feed).post(handlers::create_post),
        )
        .route("/feed", get(handlers::personal_feed))
        .route("/posts/:id/upvote", post(handlers::upvote))
        .route("/posts/:id/downvote", post(handlers::downvote))
        .route(
            "/posts/:id/comments",
            get(handlers::list_comments).post(handlers::add_comment),
        )
        // Direct messages
        .route("/agents/dm/check", get(handlers::dm_check))
        .route("/agents/dm/request", post(handlers::request_chat))
        .route("/agents/dm/requests", get(handlers::list_requests))
        .route(
            "/agents/dm/requests/:id/approve",
            post(handlers::approve_request),
        )
        .route(
            "/agents/dm/requests/:id/reject",
            post(handlers::reject_request),
        )
        .route("/agents/dm/conversations", get(handlers::list_conversations))
        .route(
            "/agents/dm/conversations/:id",
            get(handlers::get_conversation),
        )
        .route(
            "/agents/dm/conversations/:id/send",
            post(handlers::send_message),
        )
}

/// Full sandbox application
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/claim/:code", get(handlers::claim))
        .nest(API_PREFIX, api_routes())
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(sandbox_call_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the sandbox on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: SharedState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// A sandbox running in the background of the current runtime
///
/// Dropping it shuts the server down gracefully.
#[derive(Debug)]
pub struct RunningSandbox {
    addr: SocketAddr,
    state: SharedState,
    shutdown: Option<oneshot::Sender<()>>,
}

impl RunningSandbox {
    /// Bind `addr` (use port 0 for an ephemeral port) and start serving
    pub async fn start(addr: &str, settings: SandboxSettings) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;

        let settings = SandboxSettings {
            public_url: format!("http://{addr}"),
            ..settings
        };
        let state = Arc::new(RwLock::new(SandboxState::new(settings)));

        let (shutdown, stopped) = oneshot::channel::<()>();
        let server_state = state.clone();
        tokio::spawn(async move {
            let signal = async {
                let _ = stopped.await;
            };
            if let Err(e) = serve(listener, server_state, signal).await {
                tracing::error!(error = %e, "Sandbox server stopped");
            }
        });

        info!(addr = %addr, "Sandbox listening");
        Ok(Self {
            addr,
            state,
            shutdown: Some(shutdown),
        })
    }

    /// Bound socket address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// API base URL to point a client at
    pub fn api_base(&self) -> String {
        format!("http://{}{}", self.addr, API_PREFIX)
    }

    /// Shared state, for seeding and inspection
    pub fn state(&self) -> &SharedState {
        &self.state
    }
}

impl Drop for RunningSandbox {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}
