//! Feed, post, vote and comment endpoints

use super::envelope::FeedEnvelope;
use super::models::{
    ActionResponse, Comment, CommentRequest, CommentResponse, CommentSort, CommentsResponse,
    CreatePostRequest, CreatePostResponse, FeedKind, NewPost, Post, PostBody, SortOrder,
};
use super::MoltbookClient;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;
use reqwest::Method;

/// Default page size of feed requests
pub const DEFAULT_FEED_LIMIT: u32 = 25;

/// Vote direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    /// `POST /posts/{id}/upvote`
    Up,
    /// `POST /posts/{id}/downvote`
    Down,
}

impl Vote {
    fn segment(&self) -> &'static str {
        match self {
            Vote::Up => "upvote",
            Vote::Down => "downvote",
        }
    }
}

impl MoltbookClient {
    /// Load the global (`GET /posts`) or personal (`GET /feed`) feed
    pub async fn feed(
        &self,
        session: &Session,
        kind: FeedKind,
        sort: SortOrder,
        limit: u32,
    ) -> ClientResult<Vec<Post>> {
        let path: &[&str] = match kind {
            FeedKind::Global => &["posts"],
            FeedKind::Following => &["feed"],
        };
        let limit = limit.to_string();
        let builder = self
            .request(Method::GET, path, Some(session))
            .query(&[("sort", sort.as_str()), ("limit", limit.as_str())]);
        let envelope: FeedEnvelope = self.send(builder).await?;
        Ok(envelope.into_posts())
    }

    /// `POST /posts`
    pub async fn create_post(&self, session: &Session, post: &NewPost) -> ClientResult<Post> {
        validate_new_post(post)?;
        let body = CreatePostRequest::from(post);
        let builder = self
            .request(Method::POST, &["posts"], Some(session))
            .json(&body);
        let response: CreatePostResponse = self.send(builder).await?;
        Ok(response.post)
    }

    /// `POST /posts/{id}/upvote|downvote`
    pub async fn vote(
        &self,
        session: &Session,
        post_id: &str,
        vote: Vote,
    ) -> ClientResult<ActionResponse> {
        let builder = self.request(
            Method::POST,
            &["posts", post_id, vote.segment()],
            Some(session),
        );
        self.send(builder).await
    }

    /// `GET /posts/{id}/comments?sort=`
    pub async fn comments(
        &self,
        session: &Session,
        post_id: &str,
        sort: CommentSort,
    ) -> ClientResult<Vec<Comment>> {
        let builder = self
            .request(Method::GET, &["posts", post_id, "comments"], Some(session))
            .query(&[("sort", sort.as_str())]);
        let response: CommentsResponse = self.send(builder).await?;
        Ok(response.comments)
    }

    /// `POST /posts/{id}/comments`
    pub async fn add_comment(
        &self,
        session: &Session,
        post_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> ClientResult<Comment> {
        if content.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "Comment cannot be empty".to_string(),
            ));
        }
        let body = CommentRequest {
            content: content.to_string(),
            parent_id: parent_id.map(str::to_string),
        };
        let builder = self
            .request(Method::POST, &["posts", post_id, "comments"], Some(session))
            .json(&body);
        let response: CommentResponse = self.send(builder).await?;
        Ok(response.comment)
    }
}

fn validate_new_post(post: &NewPost) -> ClientResult<()> {
    if post.title.trim().is_empty() {
        return Err(ClientError::InvalidInput("Title is required".to_string()));
    }
    if post.submolt.trim().is_empty() {
        return Err(ClientError::InvalidInput("Submolt is required".to_string()));
    }
    let body_empty = match &post.body {
        PostBody::Text(text) => text.trim().is_empty(),
        PostBody::Link(url) => url.trim().is_empty(),
    };
    if body_empty {
        return Err(ClientError::InvalidInput(
            "Post needs content or a URL".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn session() -> Session {
        Session::new("moltbook_k1")
    }

    #[tokio::test]
    async fn test_global_feed_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/posts")
            .match_header("authorization", "Bearer moltbook_k1")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("sort".into(), "hot".into()),
                Matcher::UrlEncoded("limit".into(), "25".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"success": true, "posts": [
                    {"id": "p1", "title": "Hello", "content": "World",
                     "submolt": {"name": "general"}, "author": {"name": "HelpfulBot"},
                     "upvotes": 3, "downvotes": 1, "comment_count": 2}
                ]}"#,
            )
            .create_async()
            .await;

        let client = MoltbookClient::with_base_url(&server.url()).unwrap();
        let posts = client
            .feed(&session(), FeedKind::Global, SortOrder::Hot, DEFAULT_FEED_LIMIT)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].score(), 2);
        assert_eq!(posts[0].author_name(), "HelpfulBot");
    }

    #[tokio::test]
    async fn test_following_feed_accepts_bare_array() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/feed")
            .match_query(Matcher::UrlEncoded("sort".into(), "new".into()))
            .with_status(200)
            .with_body(r#"[{"id": "p2", "title": "Bare"}]"#)
            .create_async()
            .await;

        let client = MoltbookClient::with_base_url(&server.url()).unwrap();
        let posts = client
            .feed(&session(), FeedKind::Following, SortOrder::New, 10)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(posts[0].title, "Bare");
    }

    #[tokio::test]
    async fn test_create_post_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/posts")
            .match_body(Matcher::Json(json!({
                "title": "T",
                "submolt": "general",
                "content": "C"
            })))
            .with_status(201)
            .with_body(
                r#"{"success": true, "post": {"id": "p9", "title": "T", "content": "C",
                    "submolt": {"name": "general"}}}"#,
            )
            .create_async()
            .await;

        let client = MoltbookClient::with_base_url(&server.url()).unwrap();
        let post = client
            .create_post(&session(), &NewPost::text("T", "C", "general"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(post.id, "p9");
    }

    #[tokio::test]
    async fn test_create_post_validation_happens_before_request() {
        let client = MoltbookClient::with_base_url("http://127.0.0.1:9").unwrap();
        let err = client
            .create_post(&session(), &NewPost::text("  ", "C", "general"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Title is required");

        let err = client
            .create_post(&session(), &NewPost::link("T", "", "general"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_create_post_rate_limited() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/posts")
            .with_status(429)
            .with_body(r#"{"success": false, "error": "You can only post once every 30 minutes"}"#)
            .create_async()
            .await;

        let client = MoltbookClient::with_base_url(&server.url()).unwrap();
        let err = client
            .create_post(&session(), &NewPost::text("T", "C", "general"))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err.kind(), crate::error::ErrorKind::RateLimited);
        assert_eq!(err.to_string(), "You can only post once every 30 minutes");
    }

    #[tokio::test]
    async fn test_vote_paths() {
        let mut server = Server::new_async().await;
        let up = server
            .mock("POST", "/posts/p1/upvote")
            .with_status(200)
            .with_body(r#"{"success": true, "message": "Upvoted!"}"#)
            .create_async()
            .await;
        let down = server
            .mock("POST", "/posts/p1/downvote")
            .with_status(200)
            .with_body(r#"{"success": true}"#)
            .create_async()
            .await;

        let client = MoltbookClient::with_base_url(&server.url()).unwrap();
        let ack = client.vote(&session(), "p1", Vote::Up).await.unwrap();
        assert_eq!(ack.message.as_deref(), Some("Upvoted!"));
        client.vote(&session(), "p1", Vote::Down).await.unwrap();

        up.assert_async().await;
        down.assert_async().await;
    }

    #[tokio::test]
    async fn test_comments_roundtrip() {
        let mut server = Server::new_async().await;
        let list = server
            .mock("GET", "/posts/p1/comments")
            .match_query(Matcher::UrlEncoded("sort".into(), "top".into()))
            .with_status(200)
            .with_body(r#"{"success": true, "comments": [{"id": "c1", "content": "nice"}]}"#)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/posts/p1/comments")
            .match_body(Matcher::Json(json!({"content": "reply", "parent_id": "c1"})))
            .with_status(201)
            .with_body(r#"{"success": true, "comment": {"id": "c2", "content": "reply", "parent_id": "c1"}}"#)
            .create_async()
            .await;

        let client = MoltbookClient::with_base_url(&server.url()).unwrap();
        let comments = client
            .comments(&session(), "p1", CommentSort::Top)
            .await
            .unwrap();
        assert_eq!(comments[0].content, "nice");

        let reply = client
            .add_comment(&session(), "p1", "reply", Some("c1"))
            .await
            .unwrap();
        assert_eq!(reply.parent_id.as_deref(), Some("c1"));

        list.assert_async().await;
        create.assert_async().await;
    }
}
