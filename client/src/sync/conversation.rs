//! Open-conversation refresh
//!
//! While a chat window is open its transcript is reloaded immediately, on a
//! fixed interval, and right after each successful send. Closing the window
//! drops the [`ConversationSync`], which stops the loop.

use super::sequence::{Sequenced, Sequencer};
use super::source::DmSource;
use super::{spawn_loop, PollerHandle};
use crate::api::models::{Message, ThreadResponse};
use crate::error::ClientResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{watch, Notify};

/// Published transcript
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadSnapshot {
    /// Full ordered transcript from the last applied fetch
    pub messages: Vec<Message>,
    /// False until the first fetch finished (successfully or not)
    pub loaded: bool,
}

/// Synchronizer for one open conversation
#[derive(Debug)]
pub struct ConversationSync {
    conversation_id: String,
    source: Arc<dyn DmSource>,
    handle: PollerHandle,
    state: watch::Receiver<Sequenced<ThreadSnapshot>>,
}

impl ConversationSync {
    /// Start syncing on the current tokio runtime
    pub fn spawn(source: Arc<dyn DmSource>, conversation_id: &str, interval: Duration) -> Self {
        Self::spawn_on(&Handle::current(), source, conversation_id, interval)
    }

    /// Start syncing on `runtime`
    pub fn spawn_on(
        runtime: &Handle,
        source: Arc<dyn DmSource>,
        conversation_id: &str,
        interval: Duration,
    ) -> Self {
        let (tx, rx) = watch::channel(Sequenced::new(ThreadSnapshot::default()));
        let tx = Arc::new(tx);
        let id = conversation_id.to_string();

        tracing::debug!(conversation_id = %id, "Opening conversation sync");

        let loop_source = source.clone();
        let handle = spawn_loop(runtime, interval, Arc::new(Sequencer::new()), move |ticket| {
            let source = loop_source.clone();
            let tx = tx.clone();
            let id = id.clone();
            async move { poll_thread(source.as_ref(), &id, &tx, ticket).await }
        });

        Self {
            conversation_id: conversation_id.to_string(),
            source,
            handle,
            state: rx,
        }
    }

    /// Conversation being synced
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Borrow the latest snapshot
    pub fn snapshot(&self) -> watch::Ref<'_, Sequenced<ThreadSnapshot>> {
        self.state.borrow()
    }

    /// Watch channel of published snapshots
    pub fn subscribe(&self) -> watch::Receiver<Sequenced<ThreadSnapshot>> {
        self.state.clone()
    }

    /// Reload now instead of waiting for the next tick
    pub fn refresh_now(&self) {
        self.handle.refresh_now();
    }

    /// Handle for sending into this conversation from another task
    pub fn sender(&self) -> ThreadSender {
        ThreadSender {
            source: self.source.clone(),
            conversation_id: self.conversation_id.clone(),
            trigger: self.handle.trigger(),
        }
    }

    /// Stop syncing
    pub fn stop(self) {
        tracing::debug!(conversation_id = %self.conversation_id, "Closing conversation sync");
        self.handle.stop();
    }
}

/// Sends messages and triggers an immediate reload on success
#[derive(Clone)]
pub struct ThreadSender {
    source: Arc<dyn DmSource>,
    conversation_id: String,
    trigger: Arc<Notify>,
}

impl ThreadSender {
    /// Send `message`; the transcript reloads once the send succeeds
    pub async fn send(&self, message: &str, needs_human_input: bool) -> ClientResult<()> {
        self.source
            .send_message(&self.conversation_id, message, needs_human_input)
            .await?;
        tracing::info!(
            conversation_id = %self.conversation_id,
            needs_human_input = needs_human_input,
            "Message sent"
        );
        self.trigger.notify_one();
        Ok(())
    }
}

async fn poll_thread(
    source: &dyn DmSource,
    conversation_id: &str,
    state: &watch::Sender<Sequenced<ThreadSnapshot>>,
    ticket: u64,
) {
    let messages = match source.fetch_thread(conversation_id).await {
        Ok(ThreadResponse {
            messages: Some(messages),
            ..
        }) => messages,
        Ok(_) => {
            tracing::warn!(
                conversation_id = %conversation_id,
                ticket = ticket,
                "Conversation response had no messages, keeping previous messages"
            );
            mark_loaded(state);
            return;
        }
        Err(e) => {
            tracing::warn!(
                conversation_id = %conversation_id,
                ticket = ticket,
                error = %e,
                "Failed to refresh conversation, keeping previous messages"
            );
            mark_loaded(state);
            return;
        }
    };

    let next = ThreadSnapshot {
        messages,
        loaded: true,
    };
    state.send_if_modified(|current| current.apply(ticket, next));
}

/// Flag the first fetch as finished without touching the transcript
fn mark_loaded(state: &watch::Sender<Sequenced<ThreadSnapshot>>) {
    state.send_if_modified(|current| {
        if current.loaded {
            return false;
        }
        current.value_mut().loaded = true;
        true
    });
}
