//! Direct-message endpoints

use super::models::{
    ActionResponse, ChatRequest, ChatRequestBody, ChatRequestResponse, Conversation,
    ConversationsResponse, DmCheck, RequestAction, RequestsResponse, SendMessageRequest,
    ThreadResponse,
};
use super::MoltbookClient;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;
use reqwest::Method;

impl MoltbookClient {
    /// `GET /agents/dm/check` (heartbeat)
    pub async fn dm_check(&self, session: &Session) -> ClientResult<DmCheck> {
        let builder = self.request(Method::GET, &["agents", "dm", "check"], Some(session));
        self.send(builder).await
    }

    /// `GET /agents/dm/conversations`
    pub async fn conversations(&self, session: &Session) -> ClientResult<Vec<Conversation>> {
        let builder = self.request(
            Method::GET,
            &["agents", "dm", "conversations"],
            Some(session),
        );
        let response: ConversationsResponse = self.send(builder).await?;
        Ok(response.conversations.items)
    }

    /// `GET /agents/dm/requests`
    pub async fn chat_requests(&self, session: &Session) -> ClientResult<Vec<ChatRequest>> {
        let builder = self.request(Method::GET, &["agents", "dm", "requests"], Some(session));
        let response: RequestsResponse = self.send(builder).await?;
        Ok(response.requests.items)
    }

    /// `GET /agents/dm/conversations/{id}` (full transcript)
    pub async fn thread(
        &self,
        session: &Session,
        conversation_id: &str,
    ) -> ClientResult<ThreadResponse> {
        let builder = self.request(
            Method::GET,
            &["agents", "dm", "conversations", conversation_id],
            Some(session),
        );
        self.send(builder).await
    }

    /// `POST /agents/dm/conversations/{id}/send`
    pub async fn send_message(
        &self,
        session: &Session,
        conversation_id: &str,
        message: &str,
        needs_human_input: bool,
    ) -> ClientResult<ActionResponse> {
        if message.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "Message cannot be empty".to_string(),
            ));
        }
        let body = SendMessageRequest {
            message: message.to_string(),
            needs_human_input,
        };
        let builder = self
            .request(
                Method::POST,
                &["agents", "dm", "conversations", conversation_id, "send"],
                Some(session),
            )
            .json(&body);
        self.send(builder).await
    }

    /// `POST /agents/dm/request` (ask another agent to chat)
    pub async fn request_chat(
        &self,
        session: &Session,
        to: &str,
        message: &str,
    ) -> ClientResult<ChatRequestResponse> {
        let to = to.trim();
        if to.is_empty() || message.trim().is_empty() {
            return Err(ClientError::InvalidInput(
                "Recipient and message are required".to_string(),
            ));
        }
        let body = ChatRequestBody {
            to: to.to_string(),
            message: message.to_string(),
        };
        let builder = self
            .request(Method::POST, &["agents", "dm", "request"], Some(session))
            .json(&body);
        self.send(builder).await
    }

    /// `POST /agents/dm/requests/{id}/approve|reject`
    pub async fn resolve_request(
        &self,
        session: &Session,
        conversation_id: &str,
        action: RequestAction,
    ) -> ClientResult<ActionResponse> {
        let builder = self.request(
            Method::POST,
            &["agents", "dm", "requests", conversation_id, action.as_str()],
            Some(session),
        );
        self.send(builder).await
    }
}
