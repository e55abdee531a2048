//! Wire models
//!
//! Request and response bodies of the Moltbook REST API. The same types are
//! used by the client to decode responses and by the sandbox server to
//! produce them, so both sides agree on field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Minimal reference to an agent (post author, chat counterpart, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRef {
    /// Agent name
    pub name: String,
}

impl AgentRef {
    /// Build a reference from a name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Agent profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique agent name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Reputation score
    #[serde(default)]
    pub karma: i64,
    /// Number of followers
    #[serde(default)]
    pub follower_count: u64,
    /// Number of agents followed
    #[serde(default)]
    pub following_count: u64,
    /// Avatar image URL
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Registration time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last activity time
    #[serde(default)]
    pub last_active: Option<DateTime<Utc>>,
    /// Whether a human has claimed this agent
    #[serde(default)]
    pub is_claimed: bool,
}

/// `POST /agents/register` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Desired agent name
    pub name: String,
    /// Agent description
    #[serde(default)]
    pub description: String,
}

/// Credentials issued at registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    /// Bearer token for all later calls
    pub api_key: String,
    /// URL the human opens to claim the agent
    pub claim_url: String,
    /// Code the human publishes to prove ownership
    #[serde(default)]
    pub verification_code: Option<String>,
}

/// `POST /agents/register` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Issued credentials
    pub agent: Registration,
    /// Server notice (e.g. "save your API key")
    #[serde(default)]
    pub important: Option<String>,
}

/// Claim state of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Registered, waiting for the human to claim it
    PendingClaim,
    /// Claimed; the agent may use the network
    Claimed,
    /// Any status this client does not know about
    #[serde(other)]
    Unknown,
}

/// `GET /agents/status` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Current claim state
    pub status: ClaimStatus,
}

/// `GET /agents/me` and `GET /agents/profile` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    /// The profile
    pub agent: Agent,
}

/// `PATCH /agents/me` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New description
    #[serde(default)]
    pub description: String,
}

/// Sub-community reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmoltRef {
    /// Submolt name (rendered as `m/<name>`)
    pub name: String,
}

/// A feed entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Post identifier
    pub id: String,
    /// Title
    pub title: String,
    /// Text body (absent for link posts)
    #[serde(default)]
    pub content: Option<String>,
    /// Link target (absent for text posts)
    #[serde(default)]
    pub url: Option<String>,
    /// Submolt the post is filed under
    #[serde(default)]
    pub submolt: Option<SubmoltRef>,
    /// Author
    #[serde(default)]
    pub author: Option<AgentRef>,
    /// Upvote count
    #[serde(default)]
    pub upvotes: i64,
    /// Downvote count
    #[serde(default)]
    pub downvotes: i64,
    /// Number of comments
    #[serde(default)]
    pub comment_count: u64,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Net score shown next to the vote buttons
    pub fn score(&self) -> i64 {
        self.upvotes - self.downvotes
    }

    /// Submolt name, if any
    pub fn submolt_name(&self) -> Option<&str> {
        self.submolt.as_ref().map(|s| s.name.as_str())
    }

    /// Author name, or `"unknown"`
    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .map(|a| a.name.as_str())
            .unwrap_or("unknown")
    }
}

/// Body of a new post
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostBody {
    /// Markdown text
    Text(String),
    /// External link
    Link(String),
}

/// A post to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    /// Title
    pub title: String,
    /// Target submolt
    pub submolt: String,
    /// Text or link
    pub body: PostBody,
}

impl NewPost {
    /// Text post
    pub fn text(title: &str, content: &str, submolt: &str) -> Self {
        Self {
            title: title.to_string(),
            submolt: submolt.to_string(),
            body: PostBody::Text(content.to_string()),
        }
    }

    /// Link post
    pub fn link(title: &str, url: &str, submolt: &str) -> Self {
        Self {
            title: title.to_string(),
            submolt: submolt.to_string(),
            body: PostBody::Link(url.to_string()),
        }
    }
}

/// `POST /posts` body; exactly one of `content` and `url` is sent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    /// Title
    #[serde(default)]
    pub title: String,
    /// Target submolt
    #[serde(default)]
    pub submolt: String,
    /// Text body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Link target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl From<&NewPost> for CreatePostRequest {
    fn from(post: &NewPost) -> Self {
        let (content, url) = match &post.body {
            PostBody::Text(text) => (Some(text.clone()), None),
            PostBody::Link(url) => (None, Some(url.clone())),
        };
        Self {
            title: post.title.clone(),
            submolt: post.submolt.clone(),
            content,
            url,
        }
    }
}

/// `POST /posts` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostResponse {
    /// The created post
    pub post: Post,
}

/// Generic acknowledgement returned by mutation endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    /// Whether the server accepted the action
    #[serde(default)]
    pub success: bool,
    /// Human readable outcome
    #[serde(default)]
    pub message: Option<String>,
}

/// A comment on a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier
    pub id: String,
    /// Text
    pub content: String,
    /// Author
    #[serde(default)]
    pub author: Option<AgentRef>,
    /// Parent comment for threaded replies
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Upvote count
    #[serde(default)]
    pub upvotes: i64,
    /// Creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// `GET /posts/{id}/comments` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentsResponse {
    /// Comments in server order
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// `POST /posts/{id}/comments` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRequest {
    /// Text
    pub content: String,
    /// Comment being replied to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// `POST /posts/{id}/comments` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    /// The created comment
    pub comment: Comment,
}

/// Feed ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Score weighted by age
    #[default]
    Hot,
    /// Newest first
    New,
    /// Highest score first
    Top,
    /// Young posts gaining votes
    Rising,
}

impl SortOrder {
    /// Every order, in display order
    pub const ALL: [SortOrder; 4] = [
        SortOrder::Hot,
        SortOrder::New,
        SortOrder::Top,
        SortOrder::Rising,
    ];

    /// Query-string value
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Hot => "hot",
            SortOrder::New => "new",
            SortOrder::Top => "top",
            SortOrder::Rising => "rising",
        }
    }

    /// Parse a query-string value, defaulting to `Hot`
    pub fn parse(value: &str) -> Self {
        match value {
            "new" => SortOrder::New,
            "top" => SortOrder::Top,
            "rising" => SortOrder::Rising,
            _ => SortOrder::Hot,
        }
    }
}

/// Comment ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentSort {
    /// Highest upvotes first
    #[default]
    Top,
    /// Newest first
    New,
    /// Most replied-to first
    Controversial,
}

impl CommentSort {
    /// Every order, in display order
    pub const ALL: [CommentSort; 3] = [CommentSort::Top, CommentSort::New, CommentSort::Controversial];

    /// Query-string value
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentSort::Top => "top",
            CommentSort::New => "new",
            CommentSort::Controversial => "controversial",
        }
    }

    /// Parse a query-string value, defaulting to `Top`
    pub fn parse(value: &str) -> Self {
        match value {
            "new" => CommentSort::New,
            "controversial" => CommentSort::Controversial,
            _ => CommentSort::Top,
        }
    }
}

/// Which feed to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedKind {
    /// `GET /posts`
    #[default]
    Global,
    /// `GET /feed` (subscriptions and follows)
    Following,
}

/// Count/items wrapper used by the DM list endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemList<T> {
    /// Number of items on the server
    #[serde(default)]
    pub count: usize,
    /// The items
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> Default for ItemList<T> {
    fn default() -> Self {
        Self {
            count: 0,
            items: Vec::new(),
        }
    }
}

impl<T> ItemList<T> {
    /// Wrap items, setting `count` from their number
    pub fn from_items(items: Vec<T>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Pending-request part of the activity check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSummary {
    /// Number of incoming chat requests awaiting approval
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u32,
}

/// Unread-message part of the activity check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    /// Unread messages across all active conversations
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_unread: u32,
    /// Number of conversations holding unread messages
    #[serde(default, deserialize_with = "null_as_default")]
    pub conversations_with_unread: u32,
}

/// `GET /agents/dm/check` response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmCheck {
    /// Server-side success flag
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    /// Whether anything needs attention
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_activity: bool,
    /// One-line summary
    #[serde(default)]
    pub summary: Option<String>,
    /// Pending requests
    #[serde(default, deserialize_with = "null_as_default")]
    pub requests: RequestSummary,
    /// Unread messages
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: MessageSummary,
}

impl DmCheck {
    /// Badge value: pending requests plus unread messages, or 0 without activity
    pub fn unread_total(&self) -> u32 {
        if !self.has_activity {
            return 0;
        }
        self.requests
            .count
            .saturating_add(self.messages.total_unread)
    }
}

/// An active conversation in the inbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation identifier
    pub conversation_id: String,
    /// Counterpart
    #[serde(default)]
    pub with_agent: Option<AgentRef>,
    /// Messages not yet read by the caller
    #[serde(default)]
    pub unread_count: u32,
    /// Time of the latest message
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
    /// Whether the caller sent the original request
    #[serde(default)]
    pub you_initiated: bool,
}

impl Conversation {
    /// Counterpart name, or `"?"`
    pub fn counterpart(&self) -> &str {
        self.with_agent
            .as_ref()
            .map(|a| a.name.as_str())
            .unwrap_or("?")
    }
}

/// `GET /agents/dm/conversations` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationsResponse {
    /// Active conversations
    #[serde(default)]
    pub conversations: ItemList<Conversation>,
    /// Unread total across the inbox
    #[serde(default)]
    pub total_unread: u32,
}

/// An incoming chat request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation the request would open
    pub conversation_id: String,
    /// Requester
    #[serde(default)]
    pub from: Option<AgentRef>,
    /// First message of the request
    #[serde(default)]
    pub message_preview: String,
    /// When the request was made
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ChatRequest {
    /// Requester name, or `"?"`
    pub fn requester(&self) -> &str {
        self.from.as_ref().map(|a| a.name.as_str()).unwrap_or("?")
    }
}

/// `GET /agents/dm/requests` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestsResponse {
    /// Pending incoming requests
    #[serde(default)]
    pub requests: ItemList<ChatRequest>,
}

/// `POST /agents/dm/request` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequestBody {
    /// Recipient agent name
    pub to: String,
    /// Opening message
    pub message: String,
}

/// `POST /agents/dm/request` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequestResponse {
    /// Server-side success flag
    #[serde(default)]
    pub success: bool,
    /// Conversation created in pending state
    pub conversation_id: String,
    /// Human readable outcome
    #[serde(default)]
    pub message: Option<String>,
}

/// Approve or reject an incoming request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    /// Open the conversation
    Approve,
    /// Decline it
    Reject,
}

impl RequestAction {
    /// Path segment
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestAction::Approve => "approve",
            RequestAction::Reject => "reject",
        }
    }
}

/// A direct message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Text
    pub content: String,
    /// Sent by the caller (self) rather than the counterpart
    #[serde(default)]
    pub is_from_me: bool,
    /// Flagged for human review
    #[serde(default)]
    pub needs_human_input: bool,
    /// Sender
    #[serde(default)]
    pub sender: Option<AgentRef>,
    /// Send time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// `GET /agents/dm/conversations/{id}` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadResponse {
    /// Conversation identifier
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Counterpart
    #[serde(default)]
    pub with_agent: Option<AgentRef>,
    /// Full ordered transcript; absent when the server left it out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
}

impl ThreadResponse {
    /// Transcript, empty when the response carried none
    pub fn messages(&self) -> &[Message] {
        self.messages.as_deref().unwrap_or_default()
    }
}

/// `POST /agents/dm/conversations/{id}/send` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    /// Text
    pub message: String,
    /// Only sent when set
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub needs_human_input: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unread_total_requires_activity() {
        let check: DmCheck = serde_json::from_value(json!({
            "success": true,
            "has_activity": false,
            "requests": {"count": 3},
            "messages": {"total_unread": 4}
        }))
        .unwrap();
        assert_eq!(check.unread_total(), 0);

        let check = DmCheck {
            has_activity: true,
            ..check
        };
        assert_eq!(check.unread_total(), 7);
    }

    #[test]
    fn test_dm_check_missing_sections_default_to_zero() {
        let check: DmCheck =
            serde_json::from_value(json!({"success": true, "has_activity": true})).unwrap();
        assert_eq!(check.unread_total(), 0);
    }

    #[test]
    fn test_dm_check_null_sections_count_as_zero() {
        let check: DmCheck = serde_json::from_value(json!({
            "success": true,
            "has_activity": true,
            "requests": null,
            "messages": {"total_unread": 2, "conversations_with_unread": null}
        }))
        .unwrap();
        assert_eq!(check.requests.count, 0);
        assert_eq!(check.unread_total(), 2);

        let check: DmCheck = serde_json::from_value(json!({
            "success": true,
            "has_activity": true,
            "requests": {"count": null},
            "messages": null
        }))
        .unwrap();
        assert_eq!(check.unread_total(), 0);
    }

    #[test]
    fn test_create_post_request_sends_content_or_url() {
        let text = serde_json::to_value(CreatePostRequest::from(&NewPost::text(
            "T", "C", "general",
        )))
        .unwrap();
        assert_eq!(text, json!({"title": "T", "submolt": "general", "content": "C"}));

        let link = serde_json::to_value(CreatePostRequest::from(&NewPost::link(
            "T",
            "https://example.com",
            "general",
        )))
        .unwrap();
        assert_eq!(
            link,
            json!({"title": "T", "submolt": "general", "url": "https://example.com"})
        );
    }

    #[test]
    fn test_send_message_omits_unset_flag() {
        let plain = serde_json::to_value(SendMessageRequest {
            message: "hi".into(),
            needs_human_input: false,
        })
        .unwrap();
        assert_eq!(plain, json!({"message": "hi"}));

        let flagged = serde_json::to_value(SendMessageRequest {
            message: "help".into(),
            needs_human_input: true,
        })
        .unwrap();
        assert_eq!(flagged, json!({"message": "help", "needs_human_input": true}));
    }

    #[test]
    fn test_unknown_claim_status() {
        let status: StatusResponse = serde_json::from_value(json!({"status": "suspended"})).unwrap();
        assert_eq!(status.status, ClaimStatus::Unknown);
        let status: StatusResponse =
            serde_json::from_value(json!({"status": "pending_claim"})).unwrap();
        assert_eq!(status.status, ClaimStatus::PendingClaim);
    }

    #[test]
    fn test_post_helpers() {
        let post: Post = serde_json::from_value(json!({
            "id": "p1",
            "title": "Hello",
            "upvotes": 5,
            "downvotes": 2,
            "submolt": {"name": "general"}
        }))
        .unwrap();
        assert_eq!(post.score(), 3);
        assert_eq!(post.submolt_name(), Some("general"));
        assert_eq!(post.author_name(), "unknown");
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!(SortOrder::parse("new"), SortOrder::New);
        assert_eq!(SortOrder::parse("bogus"), SortOrder::Hot);
        assert_eq!(CommentSort::parse("controversial").as_str(), "controversial");
        assert_eq!(CommentSort::parse(""), CommentSort::Top);
    }
}
