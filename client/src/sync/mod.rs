//! Timer-driven synchronization
//!
//! Two independent polling loops keep views fresh: the DM activity
//! heartbeat ([`NotificationPoller`]) and the open-conversation refresh
//! ([`ConversationSync`]). Each tick runs as its own task so a slow response
//! never delays the next tick; results are applied newest-request-wins via
//! [`Sequenced`].

pub mod conversation;
pub mod notifications;
pub mod sequence;
pub mod source;

pub use conversation::{ConversationSync, ThreadSender, ThreadSnapshot};
pub use notifications::{NotificationPoller, NotificationState};
pub use sequence::{Sequenced, Sequencer};
pub use source::DmSource;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

/// Owns a running polling loop; dropping it stops the loop
///
/// Aborting the loop also drops its in-flight fetches.
#[derive(Debug)]
pub struct PollerHandle {
    task: JoinHandle<()>,
    trigger: Arc<Notify>,
}

impl PollerHandle {
    /// Run one out-of-cycle tick as soon as possible
    pub fn refresh_now(&self) {
        self.trigger.notify_one();
    }

    /// Stop the loop
    pub fn stop(self) {
        drop(self);
    }

    /// Whether the loop task has ended
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub(crate) fn trigger(&self) -> Arc<Notify> {
        self.trigger.clone()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a loop that calls `tick(ticket)` immediately, then every `interval`
/// and whenever the handle's trigger fires.
pub(crate) fn spawn_loop<F, Fut>(
    runtime: &Handle,
    interval: Duration,
    sequencer: Arc<Sequencer>,
    mut tick: F,
) -> PollerHandle
where
    F: FnMut(u64) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let trigger = Arc::new(Notify::new());
    let notified = trigger.clone();

    let task = runtime.spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = notified.notified() => {}
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => continue,
            }
            in_flight.spawn(tick(sequencer.next()));
        }
    });

    PollerHandle { task, trigger }
}
