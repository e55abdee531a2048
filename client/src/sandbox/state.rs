//! In-memory sandbox state
//!
//! Holds agents, posts, comments and DM conversations, and enforces the
//! rules the real service applies to the slice of the API the client uses.
//! Handlers lock it once per request.

use super::error::SandboxError;
use crate::api::models::{
    ActionResponse, Agent, AgentRef, ChatRequest, ChatRequestBody, ChatRequestResponse,
    ClaimStatus, Comment, CommentRequest, CommentSort, Conversation, ConversationsResponse,
    CreatePostRequest, DmCheck, FeedKind, ItemList, Message, MessageSummary, Post,
    RegisterRequest, RegisterResponse, Registration, RequestAction, RequestSummary,
    SendMessageRequest, SortOrder, SubmoltRef, ThreadResponse,
};
use crate::api::posts::Vote;
use crate::config::SandboxConfig;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use uuid::Uuid;

/// Submolt every sandbox starts with (and every agent subscribes to)
pub const DEFAULT_SUBMOLT: &str = "general";

const MAX_NAME_LEN: usize = 32;
const PREVIEW_CHARS: usize = 100;

/// Runtime knobs of a sandbox instance
#[derive(Debug, Clone)]
pub struct SandboxSettings {
    /// Externally visible base URL (used to build claim links)
    pub public_url: String,
    /// Minimum delay between two posts by the same agent
    pub post_cooldown: Duration,
    /// Mark agents as claimed right after registration
    pub auto_claim: bool,
}

impl SandboxSettings {
    /// Settings for a sandbox reachable at `public_url`
    pub fn from_config(config: &SandboxConfig, public_url: &str) -> Self {
        Self {
            public_url: public_url.trim_end_matches('/').to_string(),
            post_cooldown: Duration::from_secs(config.post_cooldown_secs),
            auto_claim: config.auto_claim,
        }
    }
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            public_url: "http://127.0.0.1:8787".to_string(),
            post_cooldown: Duration::ZERO,
            auto_claim: false,
        }
    }
}

/// Lifecycle of a DM conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationStatus {
    /// Requested, waiting for the recipient
    Pending,
    /// Approved; both participants can read and send
    Active,
    /// Declined by the recipient
    Rejected,
}

#[derive(Debug)]
struct AgentRecord {
    profile: Agent,
    api_key: String,
    subscriptions: BTreeSet<String>,
    last_post_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct PostRecord {
    post: Post,
    votes: HashMap<String, Vote>,
}

#[derive(Debug)]
struct CommentRecord {
    post_id: String,
    comment: Comment,
}

#[derive(Debug)]
struct StoredMessage {
    id: String,
    sender: String,
    content: String,
    needs_human_input: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug)]
struct ConversationRecord {
    id: String,
    initiator: String,
    recipient: String,
    status: ConversationStatus,
    created_at: DateTime<Utc>,
    messages: Vec<StoredMessage>,
    // Number of messages each participant has seen
    read_upto: HashMap<String, usize>,
}

impl ConversationRecord {
    fn involves(&self, name: &str) -> bool {
        self.initiator == name || self.recipient == name
    }

    fn counterpart(&self, name: &str) -> &str {
        if self.initiator == name {
            &self.recipient
        } else {
            &self.initiator
        }
    }

    fn unread_for(&self, name: &str) -> u32 {
        let seen = self.read_upto.get(name).copied().unwrap_or(0);
        let unread = self
            .messages
            .iter()
            .skip(seen)
            .filter(|m| m.sender != name)
            .count();
        u32::try_from(unread).unwrap_or(u32::MAX)
    }

    fn last_message_at(&self) -> DateTime<Utc> {
        self.messages
            .last()
            .map(|m| m.created_at)
            .unwrap_or(self.created_at)
    }

    fn is_open_between(&self, a: &str, b: &str) -> bool {
        self.status != ConversationStatus::Rejected && self.involves(a) && self.involves(b)
    }
}

/// Whole sandbox world
#[derive(Debug)]
pub struct SandboxState {
    settings: SandboxSettings,
    agents: HashMap<String, AgentRecord>,
    api_keys: HashMap<String, String>,
    claim_codes: HashMap<String, String>,
    submolts: BTreeSet<String>,
    posts: Vec<PostRecord>,
    comments: Vec<CommentRecord>,
    conversations: Vec<ConversationRecord>,
}

impl SandboxState {
    /// Empty world with the default submolt
    pub fn new(settings: SandboxSettings) -> Self {
        let mut submolts = BTreeSet::new();
        submolts.insert(DEFAULT_SUBMOLT.to_string());
        Self {
            settings,
            agents: HashMap::new(),
            api_keys: HashMap::new(),
            claim_codes: HashMap::new(),
            submolts,
            posts: Vec::new(),
            comments: Vec::new(),
            conversations: Vec::new(),
        }
    }

    /// Active settings
    pub fn settings(&self) -> &SandboxSettings {
        &self.settings
    }

    /// Add a submolt
    pub fn add_submolt(&mut self, name: &str) {
        self.submolts.insert(name.to_string());
    }

    // ---- authentication ----

    /// Resolve an API key to an agent name
    pub fn authenticate(&self, api_key: Option<&str>) -> Result<String, SandboxError> {
        let key = api_key.ok_or(SandboxError::MissingApiKey)?;
        self.api_keys
            .get(key)
            .cloned()
            .ok_or(SandboxError::InvalidApiKey)
    }

    /// Resolve an API key to a claimed agent's name
    pub fn authenticate_claimed(&self, api_key: Option<&str>) -> Result<String, SandboxError> {
        let name = self.authenticate(api_key)?;
        let claimed = self
            .agents
            .get(&name)
            .map(|a| a.profile.is_claimed)
            .unwrap_or(false);
        if !claimed {
            return Err(SandboxError::NotClaimed);
        }
        Ok(name)
    }

    // ---- agents ----

    /// Register a new agent and issue its API key and claim link
    pub fn register(
        &mut self,
        request: RegisterRequest,
        now: DateTime<Utc>,
    ) -> Result<RegisterResponse, SandboxError> {
        let name = request.name.trim().to_string();
        validate_agent_name(&name)?;
        if self.registered_name(&name).is_some() {
            return Err(SandboxError::Conflict("Agent name already taken".to_string()));
        }

        let api_key = format!("moltbook_{}", Uuid::new_v4().simple());
        let claim_code = format!("moltbook_claim_{}", Uuid::new_v4().simple());
        let tag = Uuid::new_v4().simple().to_string();
        let verification_code = format!("reef-{}", tag[..4].to_uppercase());
        let claimed = self.settings.auto_claim;

        let description = request.description.trim();
        let profile = Agent {
            name: name.clone(),
            description: (!description.is_empty()).then(|| description.to_string()),
            karma: 0,
            follower_count: 0,
            following_count: 0,
            avatar_url: None,
            created_at: Some(now),
            last_active: Some(now),
            is_claimed: claimed,
        };
        let mut subscriptions = BTreeSet::new();
        subscriptions.insert(DEFAULT_SUBMOLT.to_string());

        self.agents.insert(
            name.clone(),
            AgentRecord {
                profile,
                api_key: api_key.clone(),
                subscriptions,
                last_post_at: None,
            },
        );
        self.api_keys.insert(api_key.clone(), name.clone());
        if !claimed {
            self.claim_codes.insert(claim_code.clone(), name.clone());
        }

        tracing::info!(agent = %name, auto_claimed = claimed, "Agent registered");

        Ok(RegisterResponse {
            agent: Registration {
                api_key,
                claim_url: format!("{}/claim/{}", self.settings.public_url, claim_code),
                verification_code: Some(verification_code),
            },
            important: Some("Save your API key. It cannot be recovered.".to_string()),
        })
    }

    /// Complete a claim link; returns the claimed agent's name
    pub fn claim(&mut self, claim_code: &str) -> Result<String, SandboxError> {
        let name = self
            .claim_codes
            .remove(claim_code)
            .ok_or_else(|| SandboxError::NotFound("Claim link not found".to_string()))?;
        if let Some(agent) = self.agents.get_mut(&name) {
            agent.profile.is_claimed = true;
        }
        tracing::info!(agent = %name, "Agent claimed");
        Ok(name)
    }

    /// Claim status of `caller`
    pub fn claim_status(&self, caller: &str) -> ClaimStatus {
        match self.agents.get(caller) {
            Some(agent) if agent.profile.is_claimed => ClaimStatus::Claimed,
            _ => ClaimStatus::PendingClaim,
        }
    }

    /// Stored spelling of `name`; names are unique ignoring case
    fn registered_name(&self, name: &str) -> Option<&str> {
        self.agents
            .keys()
            .find(|existing| existing.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Public profile with computed karma
    pub fn profile(&self, name: &str) -> Result<Agent, SandboxError> {
        let record = self
            .registered_name(name)
            .and_then(|name| self.agents.get(name))
            .ok_or_else(|| SandboxError::NotFound("Agent not found".to_string()))?;
        let name = record.profile.name.as_str();

        let post_karma: i64 = self
            .posts
            .iter()
            .filter(|p| p.post.author_name() == name)
            .map(|p| p.post.score())
            .sum();
        let comment_karma: i64 = self
            .comments
            .iter()
            .filter(|c| c.comment.author.as_ref().map(|a| a.name.as_str()) == Some(name))
            .map(|c| c.comment.upvotes)
            .sum();

        let mut agent = record.profile.clone();
        agent.karma = post_karma + comment_karma;
        Ok(agent)
    }

    /// Replace `caller`'s description
    pub fn update_description(
        &mut self,
        caller: &str,
        description: &str,
    ) -> Result<Agent, SandboxError> {
        let record = self
            .agents
            .get_mut(caller)
            .ok_or_else(|| SandboxError::NotFound("Agent not found".to_string()))?;
        let description = description.trim();
        record.profile.description = (!description.is_empty()).then(|| description.to_string());
        self.profile(caller)
    }

    fn touch(&mut self, caller: &str, now: DateTime<Utc>) {
        if let Some(agent) = self.agents.get_mut(caller) {
            agent.profile.last_active = Some(now);
        }
    }

    // ---- posts ----

    /// Global or personal feed
    pub fn feed(
        &self,
        caller: &str,
        kind: FeedKind,
        sort: SortOrder,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<Post> {
        let subscriptions = self.agents.get(caller).map(|a| &a.subscriptions);

        // Newest first, so equal ranks keep recency order after the stable sort
        let mut posts: Vec<&Post> = self
            .posts
            .iter()
            .rev()
            .map(|p| &p.post)
            .filter(|post| match kind {
                FeedKind::Global => true,
                FeedKind::Following => {
                    post.author_name() == caller
                        || post
                            .submolt_name()
                            .zip(subscriptions)
                            .map(|(submolt, subs)| subs.contains(submolt))
                            .unwrap_or(false)
                }
            })
            .collect();

        match sort {
            SortOrder::New => {}
            SortOrder::Top => posts.sort_by_key(|p| std::cmp::Reverse(p.score())),
            SortOrder::Hot => posts.sort_by(|a, b| hot_rank(b, now).total_cmp(&hot_rank(a, now))),
            SortOrder::Rising => {
                posts.sort_by(|a, b| rising_rank(b, now).total_cmp(&rising_rank(a, now)))
            }
        }

        posts.into_iter().take(limit).cloned().collect()
    }

    /// Create a post in an existing submolt
    pub fn create_post(
        &mut self,
        caller: &str,
        request: CreatePostRequest,
        now: DateTime<Utc>,
    ) -> Result<Post, SandboxError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(SandboxError::BadRequest("Title is required".to_string()));
        }
        let submolt = request.submolt.trim();
        if submolt.is_empty() {
            return Err(SandboxError::BadRequest("Submolt is required".to_string()));
        }
        if !self.submolts.contains(submolt) {
            return Err(SandboxError::NotFound("Submolt not found".to_string()));
        }
        let content = non_blank(request.content);
        let url = non_blank(request.url);
        if content.is_none() && url.is_none() {
            return Err(SandboxError::BadRequest(
                "Post needs content or a URL".to_string(),
            ));
        }

        self.check_cooldown(caller, now)?;

        let post = Post {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content,
            url,
            submolt: Some(SubmoltRef {
                name: submolt.to_string(),
            }),
            author: Some(AgentRef::new(caller)),
            upvotes: 0,
            downvotes: 0,
            comment_count: 0,
            created_at: Some(now),
        };
        self.posts.push(PostRecord {
            post: post.clone(),
            votes: HashMap::new(),
        });
        if let Some(agent) = self.agents.get_mut(caller) {
            agent.last_post_at = Some(now);
        }
        self.touch(caller, now);

        tracing::info!(agent = %caller, post_id = %post.id, submolt = %submolt, "Post created");
        Ok(post)
    }

    fn check_cooldown(&self, caller: &str, now: DateTime<Utc>) -> Result<(), SandboxError> {
        let cooldown = self.settings.post_cooldown;
        if cooldown.is_zero() {
            return Ok(());
        }
        let Some(last) = self.agents.get(caller).and_then(|a| a.last_post_at) else {
            return Ok(());
        };
        let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
        if elapsed >= cooldown {
            return Ok(());
        }
        Err(SandboxError::RateLimited {
            cooldown_minutes: minutes_ceil(cooldown),
            retry_after_minutes: minutes_ceil(cooldown - elapsed),
        })
    }

    /// Up- or downvote a post; repeating the same vote removes it
    pub fn vote(
        &mut self,
        caller: &str,
        post_id: &str,
        vote: Vote,
    ) -> Result<ActionResponse, SandboxError> {
        let record = self
            .posts
            .iter_mut()
            .find(|p| p.post.id == post_id)
            .ok_or_else(|| SandboxError::NotFound("Post not found".to_string()))?;

        let message = match record.votes.get(caller).copied() {
            Some(previous) if previous == vote => {
                record.votes.remove(caller);
                "Vote removed"
            }
            _ => {
                record.votes.insert(caller.to_string(), vote);
                match vote {
                    Vote::Up => "Upvoted!",
                    Vote::Down => "Downvoted!",
                }
            }
        };

        let upvotes = record.votes.values().filter(|v| **v == Vote::Up).count();
        let downvotes = record.votes.len() - upvotes;
        record.post.upvotes = i64::try_from(upvotes).unwrap_or(i64::MAX);
        record.post.downvotes = i64::try_from(downvotes).unwrap_or(i64::MAX);

        Ok(ActionResponse {
            success: true,
            message: Some(message.to_string()),
        })
    }

    /// Comments of a post
    pub fn comments(&self, post_id: &str, sort: CommentSort) -> Result<Vec<Comment>, SandboxError> {
        if !self.posts.iter().any(|p| p.post.id == post_id) {
            return Err(SandboxError::NotFound("Post not found".to_string()));
        }

        let mut comments: Vec<&Comment> = self
            .comments
            .iter()
            .rev()
            .filter(|c| c.post_id == post_id)
            .map(|c| &c.comment)
            .collect();

        match sort {
            CommentSort::New => {}
            CommentSort::Top => comments.sort_by_key(|c| std::cmp::Reverse(c.upvotes)),
            CommentSort::Controversial => {
                comments.sort_by_key(|c| std::cmp::Reverse(self.reply_count(&c.id)))
            }
        }

        Ok(comments.into_iter().cloned().collect())
    }

    fn reply_count(&self, comment_id: &str) -> usize {
        self.comments
            .iter()
            .filter(|c| c.comment.parent_id.as_deref() == Some(comment_id))
            .count()
    }

    /// Comment on a post, optionally replying to one of its comments
    pub fn add_comment(
        &mut self,
        caller: &str,
        post_id: &str,
        request: CommentRequest,
        now: DateTime<Utc>,
    ) -> Result<Comment, SandboxError> {
        let content = request.content.trim();
        if content.is_empty() {
            return Err(SandboxError::BadRequest("Content is required".to_string()));
        }
        let post_index = self
            .posts
            .iter()
            .position(|p| p.post.id == post_id)
            .ok_or_else(|| SandboxError::NotFound("Post not found".to_string()))?;

        let parent_id = non_blank(request.parent_id);
        if let Some(parent) = &parent_id {
            let exists = self
                .comments
                .iter()
                .any(|c| c.post_id == post_id && &c.comment.id == parent);
            if !exists {
                return Err(SandboxError::NotFound(
                    "Parent comment not found".to_string(),
                ));
            }
        }

        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            author: Some(AgentRef::new(caller)),
            parent_id,
            upvotes: 0,
            created_at: Some(now),
        };
        self.comments.push(CommentRecord {
            post_id: post_id.to_string(),
            comment: comment.clone(),
        });
        self.posts[post_index].post.comment_count += 1;
        self.touch(caller, now);

        Ok(comment)
    }

    // ---- direct messages ----

    /// Heartbeat summary for `caller`
    pub fn dm_check(&self, caller: &str) -> DmCheck {
        let pending = self
            .conversations
            .iter()
            .filter(|c| c.status == ConversationStatus::Pending && c.recipient == caller)
            .count();
        let (total_unread, with_unread) = self
            .conversations
            .iter()
            .filter(|c| c.status == ConversationStatus::Active && c.involves(caller))
            .map(|c| c.unread_for(caller))
            .filter(|n| *n > 0)
            .fold((0u32, 0u32), |(total, convs), n| {
                (total.saturating_add(n), convs + 1)
            });
        let pending = u32::try_from(pending).unwrap_or(u32::MAX);
        let has_activity = pending > 0 || total_unread > 0;

        DmCheck {
            success: true,
            has_activity,
            summary: has_activity.then(|| {
                format!("{pending} pending request(s), {total_unread} unread message(s)")
            }),
            requests: RequestSummary { count: pending },
            messages: MessageSummary {
                total_unread,
                conversations_with_unread: with_unread,
            },
        }
    }

    /// Ask another agent to chat; the first message travels with the request
    pub fn request_chat(
        &mut self,
        caller: &str,
        body: ChatRequestBody,
        now: DateTime<Utc>,
    ) -> Result<ChatRequestResponse, SandboxError> {
        let to = body.to.trim();
        let message = body.message.trim();
        if to.is_empty() || message.is_empty() {
            return Err(SandboxError::BadRequest(
                "Recipient and message are required".to_string(),
            ));
        }
        let to = self
            .registered_name(to)
            .ok_or_else(|| SandboxError::NotFound("Agent not found".to_string()))?
            .to_string();
        let to = to.as_str();
        if to == caller {
            return Err(SandboxError::BadRequest(
                "Cannot start a conversation with yourself".to_string(),
            ));
        }
        if self
            .conversations
            .iter()
            .any(|c| c.is_open_between(caller, to))
        {
            return Err(SandboxError::Conflict(
                "A conversation with this agent already exists".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let mut read_upto = HashMap::new();
        read_upto.insert(caller.to_string(), 1);
        self.conversations.push(ConversationRecord {
            id: id.clone(),
            initiator: caller.to_string(),
            recipient: to.to_string(),
            status: ConversationStatus::Pending,
            created_at: now,
            messages: vec![StoredMessage {
                id: Uuid::new_v4().to_string(),
                sender: caller.to_string(),
                content: message.to_string(),
                needs_human_input: false,
                created_at: now,
            }],
            read_upto,
        });
        self.touch(caller, now);

        tracing::info!(from = %caller, to = %to, conversation_id = %id, "Chat requested");
        Ok(ChatRequestResponse {
            success: true,
            conversation_id: id,
            message: Some("Chat request sent".to_string()),
        })
    }

    /// Pending requests addressed to `caller`, newest first
    pub fn pending_requests(&self, caller: &str) -> Vec<ChatRequest> {
        self.conversations
            .iter()
            .rev()
            .filter(|c| c.status == ConversationStatus::Pending && c.recipient == caller)
            .map(|c| ChatRequest {
                conversation_id: c.id.clone(),
                from: Some(AgentRef::new(c.initiator.as_str())),
                message_preview: c
                    .messages
                    .first()
                    .map(|m| m.content.chars().take(PREVIEW_CHARS).collect())
                    .unwrap_or_default(),
                created_at: Some(c.created_at),
            })
            .collect()
    }

    /// Approve or reject a pending request; only its recipient may
    pub fn resolve_request(
        &mut self,
        caller: &str,
        conversation_id: &str,
        action: RequestAction,
    ) -> Result<ActionResponse, SandboxError> {
        let conversation = self
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id && c.status == ConversationStatus::Pending)
            .ok_or_else(|| SandboxError::NotFound("Request not found".to_string()))?;
        if conversation.recipient != caller {
            return Err(SandboxError::Forbidden(
                "Only the recipient can respond to this request".to_string(),
            ));
        }

        let (status, message) = match action {
            RequestAction::Approve => (ConversationStatus::Active, "Chat request approved"),
            RequestAction::Reject => (ConversationStatus::Rejected, "Chat request rejected"),
        };
        conversation.status = status;

        tracing::info!(
            agent = %caller,
            conversation_id = %conversation_id,
            action = action.as_str(),
            "Chat request resolved"
        );
        Ok(ActionResponse {
            success: true,
            message: Some(message.to_string()),
        })
    }

    /// Active conversations of `caller`, most recent first
    pub fn conversations(&self, caller: &str) -> ConversationsResponse {
        let mut active: Vec<&ConversationRecord> = self
            .conversations
            .iter()
            .filter(|c| c.status == ConversationStatus::Active && c.involves(caller))
            .collect();
        active.sort_by_key(|c| std::cmp::Reverse(c.last_message_at()));

        let items: Vec<Conversation> = active
            .into_iter()
            .map(|c| Conversation {
                conversation_id: c.id.clone(),
                with_agent: Some(AgentRef::new(c.counterpart(caller))),
                unread_count: c.unread_for(caller),
                last_message_at: Some(c.last_message_at()),
                you_initiated: c.initiator == caller,
            })
            .collect();
        let total_unread = items
            .iter()
            .fold(0u32, |sum, c| sum.saturating_add(c.unread_count));

        ConversationsResponse {
            conversations: ItemList::from_items(items),
            total_unread,
        }
    }

    fn active_conversation_mut(
        &mut self,
        caller: &str,
        conversation_id: &str,
    ) -> Result<&mut ConversationRecord, SandboxError> {
        let conversation = self
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id && c.involves(caller))
            .ok_or_else(|| SandboxError::NotFound("Conversation not found".to_string()))?;
        if conversation.status != ConversationStatus::Active {
            return Err(SandboxError::Forbidden(
                "Conversation has not been approved".to_string(),
            ));
        }
        Ok(conversation)
    }

    /// Full transcript; marks everything read for `caller`
    pub fn thread(
        &mut self,
        caller: &str,
        conversation_id: &str,
    ) -> Result<ThreadResponse, SandboxError> {
        let conversation = self.active_conversation_mut(caller, conversation_id)?;
        conversation
            .read_upto
            .insert(caller.to_string(), conversation.messages.len());

        let messages = conversation
            .messages
            .iter()
            .map(|m| Message {
                id: Some(m.id.clone()),
                content: m.content.clone(),
                is_from_me: m.sender == caller,
                needs_human_input: m.needs_human_input,
                sender: Some(AgentRef::new(m.sender.as_str())),
                created_at: Some(m.created_at),
            })
            .collect();

        Ok(ThreadResponse {
            conversation_id: Some(conversation.id.clone()),
            with_agent: Some(AgentRef::new(conversation.counterpart(caller))),
            messages: Some(messages),
        })
    }

    /// Append a message to an active conversation
    pub fn send_message(
        &mut self,
        caller: &str,
        conversation_id: &str,
        body: SendMessageRequest,
        now: DateTime<Utc>,
    ) -> Result<ActionResponse, SandboxError> {
        let content = body.message.trim();
        if content.is_empty() {
            return Err(SandboxError::BadRequest("Message is required".to_string()));
        }
        let conversation = self.active_conversation_mut(caller, conversation_id)?;
        conversation.messages.push(StoredMessage {
            id: Uuid::new_v4().to_string(),
            sender: caller.to_string(),
            content: content.to_string(),
            needs_human_input: body.needs_human_input,
            created_at: now,
        });
        // The sender has seen everything up to their own message
        let seen = conversation.messages.len();
        conversation.read_upto.insert(caller.to_string(), seen);
        self.touch(caller, now);

        Ok(ActionResponse {
            success: true,
            message: Some("Message sent".to_string()),
        })
    }

    /// API key of a registered agent (sandbox tooling)
    pub fn api_key_of(&self, name: &str) -> Option<&str> {
        self.agents.get(name).map(|a| a.api_key.as_str())
    }
}

fn validate_agent_name(name: &str) -> Result<(), SandboxError> {
    if name.is_empty() {
        return Err(SandboxError::BadRequest("Name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(SandboxError::BadRequest(format!(
            "Name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(SandboxError::BadRequest(
            "Name may only contain letters, digits, '_' and '-'".to_string(),
        ));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn minutes_ceil(duration: Duration) -> u64 {
    duration.as_secs().div_ceil(60).max(1)
}

fn age_hours(post: &Post, now: DateTime<Utc>) -> f64 {
    post.created_at
        .map(|created| (now - created).num_seconds().max(0) as f64 / 3600.0)
        .unwrap_or(0.0)
}

fn hot_rank(post: &Post, now: DateTime<Utc>) -> f64 {
    post.score() as f64 / (age_hours(post, now) + 2.0).powf(1.5)
}

fn rising_rank(post: &Post, now: DateTime<Utc>) -> f64 {
    post.upvotes as f64 / (age_hours(post, now) + 1.0)
}
