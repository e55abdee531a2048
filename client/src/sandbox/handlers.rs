//! Sandbox HTTP handlers
//!
//! Thin axum wrappers: pull the bearer key and body out of the request, lock
//! the shared [`SandboxState`] once and render the result.

use super::error::SandboxError;
use super::state::SandboxState;
use crate::api::models::{
    ActionResponse, ChatRequestBody, ChatRequestResponse, ClaimStatus, CommentRequest,
    CommentSort, CreatePostRequest, DmCheck, FeedKind, ItemList, ProfileUpdate, RegisterRequest,
    RegisterResponse, RequestAction, SendMessageRequest, SortOrder,
};
use crate::api::posts::{Vote, DEFAULT_FEED_LIMIT};
use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

/// State shared by all handlers
pub type SharedState = Arc<RwLock<SandboxState>>;

type ApiResult<T> = Result<Json<T>, SandboxError>;

const MAX_FEED_LIMIT: usize = 100;

/// `{"success": true, ...payload}`
#[derive(Debug, Serialize)]
pub struct Success<T> {
    success: bool,
    #[serde(flatten)]
    payload: T,
}

fn success<T>(payload: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        payload,
    })
}

/// Bearer key from the `Authorization` header
fn api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    sort: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    name: Option<String>,
}

// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "message": "Moltbook sandbox is running",
    }))
}

// POST /agents/register
pub async fn register(
    State(state): State<SharedState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), SandboxError> {
    let response = state.write().await.register(request, Utc::now())?;
    Ok((StatusCode::CREATED, Json(response)))
}

// GET /claim/:code
pub async fn claim(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> ApiResult<ActionResponse> {
    let name = state.write().await.claim(&code)?;
    Ok(Json(ActionResponse {
        success: true,
        message: Some(format!("{name} has been claimed")),
    }))
}

#[derive(Debug, Serialize)]
pub struct StatusBody {
    status: ClaimStatus,
}

// GET /agents/status
pub async fn status(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> ApiResult<Success<StatusBody>> {
    let state = state.read().await;
    let caller = state.authenticate(api_key(&headers))?;
    Ok(success(StatusBody {
        status: state.claim_status(&caller),
    }))
}

// GET /agents/me
pub async fn me(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> ApiResult<Success<Value>> {
    let state = state.read().await;
    let caller = state.authenticate(api_key(&headers))?;
    let agent = state.profile(&caller)?;
    Ok(success(json!({ "agent": agent })))
}

// PATCH /agents/me
pub async fn update_me(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Success<Value>> {
    let mut state = state.write().await;
    let caller = state.authenticate(api_key(&headers))?;
    let agent = state.update_description(&caller, &update.description)?;
    Ok(success(json!({ "agent": agent })))
}

// GET /agents/profile?name=
pub async fn profile(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<ProfileQuery>,
) -> ApiResult<Success<Value>> {
    let state = state.read().await;
    state.authenticate(api_key(&headers))?;
    let name = query
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| SandboxError::BadRequest("name is required".to_string()))?;
    let agent = state.profile(name.trim())?;
    Ok(success(json!({ "agent": agent })))
}

async fn feed(
    state: SharedState,
    headers: HeaderMap,
    query: FeedQuery,
    kind: FeedKind,
) -> ApiResult<Success<Value>> {
    let state = state.read().await;
    let caller = state.authenticate_claimed(api_key(&headers))?;
    let sort = query
        .sort
        .as_deref()
        .map(SortOrder::parse)
        .unwrap_or_default();
    let limit = query
        .limit
        .unwrap_or(DEFAULT_FEED_LIMIT as usize)
        .clamp(1, MAX_FEED_LIMIT);

    let posts = state.feed(&caller, kind, sort, limit, Utc::now());
    Ok(success(json!({ "posts": posts })))
}

// GET /posts
pub async fn global_feed(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<FeedQuery>,
) -> ApiResult<Success<Value>> {
    feed(state, headers, query, FeedKind::Global).await
}

// GET /feed
pub async fn personal_feed(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<FeedQuery>,
) -> ApiResult<Success<Value>> {
    feed(state, headers, query, FeedKind::Following).await
}

// POST /posts
pub async fn create_post(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(request): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Success<Value>>), SandboxError> {
    let mut state = state.write().await;
    let caller = state.authenticate_claimed(api_key(&headers))?;
    let post = state.create_post(&caller, request, Utc::now())?;
    Ok((StatusCode::CREATED, success(json!({ "post": post }))))
}

async fn vote(
    state: SharedState,
    headers: HeaderMap,
    post_id: String,
    vote: Vote,
) -> ApiResult<ActionResponse> {
    let mut state = state.write().await;
    let caller = state.authenticate_claimed(api_key(&headers))?;
    Ok(Json(state.vote(&caller, &post_id, vote)?))
}

// POST /posts/:id/upvote
pub async fn upvote(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
) -> ApiResult<ActionResponse> {
    vote(state, headers, post_id, Vote::Up).await
}

// POST /posts/:id/downvote
pub async fn downvote(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
) -> ApiResult<ActionResponse> {
    vote(state, headers, post_id, Vote::Down).await
}

// GET /posts/:id/comments
pub async fn list_comments(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
    Query(query): Query<CommentsQuery>,
) -> ApiResult<Success<Value>> {
    let state = state.read().await;
    state.authenticate_claimed(api_key(&headers))?;
    let sort = query
        .sort
        .as_deref()
        .map(CommentSort::parse)
        .unwrap_or_default();
    let comments = state.comments(&post_id, sort)?;
    Ok(success(json!({ "comments": comments })))
}

// POST /posts/:id/comments
pub async fn add_comment(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Success<Value>>), SandboxError> {
    let mut state = state.write().await;
    let caller = state.authenticate_claimed(api_key(&headers))?;
    let comment = state.add_comment(&caller, &post_id, request, Utc::now())?;
    Ok((StatusCode::CREATED, success(json!({ "comment": comment }))))
}

// GET /agents/dm/check
pub async fn dm_check(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> ApiResult<DmCheck> {
    let state = state.read().await;
    let caller = state.authenticate_claimed(api_key(&headers))?;
    Ok(Json(state.dm_check(&caller)))
}

// POST /agents/dm/request
pub async fn request_chat(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<ChatRequestBody>,
) -> Result<(StatusCode, Json<ChatRequestResponse>), SandboxError> {
    let mut state = state.write().await;
    let caller = state.authenticate_claimed(api_key(&headers))?;
    let response = state.request_chat(&caller, body, Utc::now())?;
    Ok((StatusCode::CREATED, Json(response)))
}

// GET /agents/dm/requests
pub async fn list_requests(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> ApiResult<Success<Value>> {
    let state = state.read().await;
    let caller = state.authenticate_claimed(api_key(&headers))?;
    let requests = ItemList::from_items(state.pending_requests(&caller));
    Ok(success(json!({ "requests": requests })))
}

async fn resolve(
    state: SharedState,
    headers: HeaderMap,
    conversation_id: String,
    action: RequestAction,
) -> ApiResult<ActionResponse> {
    let mut state = state.write().await;
    let caller = state.authenticate_claimed(api_key(&headers))?;
    Ok(Json(state.resolve_request(&caller, &conversation_id, action)?))
}

// POST /agents/dm/requests/:id/approve
pub async fn approve_request(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(conversation_id): Path<String>,
) -> ApiResult<ActionResponse> {
    resolve(state, headers, conversation_id, RequestAction::Approve).await
}

// POST /agents/dm/requests/:id/reject
pub async fn reject_request(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(conversation_id): Path<String>,
) -> ApiResult<ActionResponse> {
    resolve(state, headers, conversation_id, RequestAction::Reject).await
}

// GET /agents/dm/conversations
pub async fn list_conversations(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> ApiResult<Success<Value>> {
    let state = state.read().await;
    let caller = state.authenticate_claimed(api_key(&headers))?;
    let response = state.conversations(&caller);
    Ok(success(json!(response)))
}

// GET /agents/dm/conversations/:id
pub async fn get_conversation(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(conversation_id): Path<String>,
) -> ApiResult<Success<Value>> {
    // Reading marks messages as read
    let mut state = state.write().await;
    let caller = state.authenticate_claimed(api_key(&headers))?;
    let thread = state.thread(&caller, &conversation_id)?;
    Ok(success(json!(thread)))
}

// POST /agents/dm/conversations/:id/send
pub async fn send_message(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(conversation_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> ApiResult<ActionResponse> {
    let mut state = state.write().await;
    let caller = state.authenticate_claimed(api_key(&headers))?;
    Ok(Json(state.send_message(
        &caller,
        &conversation_id,
        body,
        Utc::now(),
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_api_key_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(api_key(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer moltbook_k1"));
        assert_eq!(api_key(&headers), Some("moltbook_k1"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(api_key(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(api_key(&headers), None);
    }

    #[test]
    fn test_success_flattens_payload() {
        let Json(body) = success(json!({ "posts": [] }));
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value, json!({ "success": true, "posts": [] }));
    }
}
