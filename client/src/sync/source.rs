//! Data source seam for the pollers

use crate::api::models::{DmCheck, ThreadResponse};
use crate::api::AuthedClient;
use crate::error::ClientResult;
use async_trait::async_trait;

/// Where pollers read DM state from
///
/// Implemented by [`AuthedClient`]; tests substitute scripted sources.
#[async_trait]
pub trait DmSource: Send + Sync + 'static {
    /// Heartbeat activity check
    async fn check_activity(&self) -> ClientResult<DmCheck>;

    /// Full transcript of one conversation
    async fn fetch_thread(&self, conversation_id: &str) -> ClientResult<ThreadResponse>;

    /// Send a message into a conversation
    async fn send_message(
        &self,
        conversation_id: &str,
        message: &str,
        needs_human_input: bool,
    ) -> ClientResult<()>;
}

impl std::fmt::Debug for dyn DmSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DmSource")
    }
}

#[async_trait]
impl DmSource for AuthedClient {
    async fn check_activity(&self) -> ClientResult<DmCheck> {
        self.client().dm_check(self.session()).await
    }

    async fn fetch_thread(&self, conversation_id: &str) -> ClientResult<ThreadResponse> {
        self.client().thread(self.session(), conversation_id).await
    }

    async fn send_message(
        &self,
        conversation_id: &str,
        message: &str,
        needs_human_input: bool,
    ) -> ClientResult<()> {
        self.client()
            .send_message(self.session(), conversation_id, message, needs_human_input)
            .await
            .map(|_| ())
    }
}
