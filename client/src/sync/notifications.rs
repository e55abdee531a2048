//! DM activity heartbeat
//!
//! Polls `GET /agents/dm/check` immediately and then on a fixed interval
//! while a session is authenticated. The published [`NotificationState`]
//! drives the unread badge and the "last heartbeat" display.

use super::sequence::{Sequenced, Sequencer};
use super::source::DmSource;
use super::{spawn_loop, PollerHandle};
use crate::api::models::DmCheck;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;

/// Badge state derived from the most recent successful check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationState {
    /// Pending requests plus unread messages
    pub unread_count: u32,
    /// When the last successful check completed
    pub last_check: Option<DateTime<Utc>>,
}

impl NotificationState {
    /// State for a check completed at `at`; `None` when the server reported failure
    pub fn from_check(check: &DmCheck, at: DateTime<Utc>) -> Option<Self> {
        if !check.success {
            return None;
        }
        Some(Self {
            unread_count: check.unread_total(),
            last_check: Some(at),
        })
    }
}

/// Running heartbeat loop
///
/// Dropping the poller stops it.
#[derive(Debug)]
pub struct NotificationPoller {
    handle: PollerHandle,
    state: watch::Receiver<Sequenced<NotificationState>>,
}

impl NotificationPoller {
    /// Start polling on the current tokio runtime
    ///
    /// Panics when called outside a runtime, like `tokio::spawn`.
    pub fn spawn(source: Arc<dyn DmSource>, interval: Duration) -> Self {
        Self::spawn_on(&Handle::current(), source, interval)
    }

    /// Start polling on `runtime`
    pub fn spawn_on(runtime: &Handle, source: Arc<dyn DmSource>, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(Sequenced::new(NotificationState::default()));
        let tx = Arc::new(tx);

        tracing::info!(
            interval_secs = interval.as_secs_f64(),
            "Starting DM activity heartbeat"
        );

        let handle = spawn_loop(runtime, interval, Arc::new(Sequencer::new()), move |ticket| {
            let source = source.clone();
            let tx = tx.clone();
            async move { poll_activity(source.as_ref(), &tx, ticket).await }
        });

        Self { handle, state: rx }
    }

    /// Latest published state
    pub fn current(&self) -> NotificationState {
        self.state.borrow().value().clone()
    }

    /// Watch channel of published states
    pub fn subscribe(&self) -> watch::Receiver<Sequenced<NotificationState>> {
        self.state.clone()
    }

    /// Check now instead of waiting for the next tick
    pub fn refresh_now(&self) {
        self.handle.refresh_now();
    }

    /// Stop polling
    pub fn stop(self) {
        tracing::info!("Stopping DM activity heartbeat");
        self.handle.stop();
    }
}

async fn poll_activity(
    source: &dyn DmSource,
    state: &watch::Sender<Sequenced<NotificationState>>,
    ticket: u64,
) {
    let check = match source.check_activity().await {
        Ok(check) => check,
        Err(e) => {
            tracing::warn!(ticket = ticket, error = %e, "DM activity check failed, keeping previous state");
            return;
        }
    };

    let Some(next) = NotificationState::from_check(&check, Utc::now()) else {
        tracing::warn!(ticket = ticket, "DM activity check reported failure, keeping previous state");
        return;
    };

    let unread = next.unread_count;
    if state.send_if_modified(|current| current.apply(ticket, next)) {
        tracing::debug!(ticket = ticket, unread_count = unread, "DM activity updated");
    }
}

#[cfg(test)]
mod tests {
    use super::super::source::scripted::{activity, wait_until, ScriptedSource};
    use super::*;
    use crate::error::ClientError;
    use reqwest::StatusCode;

    #[test]
    fn test_state_from_check() {
        let at = Utc::now();
        let state = NotificationState::from_check(&activity(1, 2), at).unwrap();
        assert_eq!(state.unread_count, 3);
        assert_eq!(state.last_check, Some(at));

        let quiet = NotificationState::from_check(&activity(0, 0), at).unwrap();
        assert_eq!(quiet.unread_count, 0);

        let failed = DmCheck {
            success: false,
            ..activity(4, 4)
        };
        assert!(NotificationState::from_check(&failed, at).is_none());
    }

    #[tokio::test]
    async fn test_first_check_runs_immediately() {
        let source = Arc::new(ScriptedSource::new().check(0, Ok(activity(1, 4))));
        let poller = NotificationPoller::spawn(source.clone(), Duration::from_secs(3600));

        let mut rx = poller.subscribe();
        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("first check should not wait for the interval")
            .unwrap();

        let state = poller.current();
        assert_eq!(state.unread_count, 5);
        assert!(state.last_check.is_some());
    }

    #[tokio::test]
    async fn test_failed_check_keeps_previous_state() {
        let source = Arc::new(
            ScriptedSource::new()
                .check(0, Ok(activity(0, 2)))
                .check(
                    0,
                    Err(ClientError::Api {
                        status: StatusCode::INTERNAL_SERVER_ERROR,
                        message: "boom".to_string(),
                    }),
                )
                .check(0, Ok(DmCheck::default())),
        );
        let poller = NotificationPoller::spawn(source.clone(), Duration::from_secs(3600));
        wait_until(|| source.completed() == 1).await;
        let before = poller.current();
        assert_eq!(before.unread_count, 2);

        poller.refresh_now();
        wait_until(|| source.completed() == 2).await;
        poller.refresh_now();
        wait_until(|| source.completed() == 3).await;
        // Give the last result a chance to be (not) applied
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(poller.current(), before);
        assert_eq!(poller.subscribe().borrow().applied_ticket(), 1);
    }

    #[tokio::test]
    async fn test_stale_check_does_not_overwrite_newer() {
        // First (older) request is slow, the refresh right after it is fast
        let source = Arc::new(
            ScriptedSource::new()
                .check(200, Ok(activity(0, 9)))
                .check(10, Ok(activity(0, 1))),
        );
        let poller = NotificationPoller::spawn(source.clone(), Duration::from_secs(3600));
        wait_until(|| source.calls() == 1).await;
        poller.refresh_now();

        wait_until(|| source.completed() == 2).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(poller.current().unread_count, 1);
        assert_eq!(poller.subscribe().borrow().applied_ticket(), 2);
    }

    #[tokio::test]
    async fn test_interval_keeps_polling() {
        let source = Arc::new(
            ScriptedSource::new()
                .check(0, Ok(activity(0, 1)))
                .check(0, Ok(activity(0, 2)))
                .check(0, Ok(activity(0, 3))),
        );
        let poller = NotificationPoller::spawn(source.clone(), Duration::from_millis(20));

        wait_until(|| source.completed() == 3).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(poller.current().unread_count, 3);
    }

    #[tokio::test]
    async fn test_stop_ends_polling() {
        let source = Arc::new(
            ScriptedSource::new()
                .check(0, Ok(activity(0, 1)))
                .check(0, Ok(activity(0, 1)))
                .check(0, Ok(activity(0, 1)))
                .check(0, Ok(activity(0, 1))),
        );
        let poller = NotificationPoller::spawn(source.clone(), Duration::from_millis(20));
        wait_until(|| source.calls() >= 1).await;
        poller.stop();

        tokio::time::sleep(Duration::from_millis(30)).await;
        let calls = source.calls();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(source.calls(), calls);
    }
}
