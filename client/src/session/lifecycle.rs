//! Login, registration and logout
//!
//! These are the only paths that write the [`TokenStore`]. Everything after
//! them works with the returned [`Session`].

use super::{Session, TokenStore};
use crate::api::models::{ClaimStatus, Registration};
use crate::api::MoltbookClient;
use crate::error::ClientResult;

/// Where the app lands after startup
#[derive(Debug, Clone, PartialEq)]
pub enum BootOutcome {
    /// No usable session; show registration, optionally with an error
    SignedOut {
        /// Why the stored session could not be resumed
        error: Option<String>,
    },
    /// Registered but not yet claimed; show the verification step
    PendingClaim(Session),
    /// Claimed; start the authenticated views
    Authenticated(Session),
}

/// Resume the stored session
///
/// Without a stored token this returns immediately and performs no request.
/// A token the server rejects as unauthorized is removed from the store;
/// any other failure keeps it so the next start can retry.
pub async fn resume(client: &MoltbookClient, store: &dyn TokenStore) -> BootOutcome {
    let session = match store.load() {
        Ok(Some(session)) => session,
        Ok(None) => {
            tracing::debug!("No stored session");
            return BootOutcome::SignedOut { error: None };
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read stored session");
            return BootOutcome::SignedOut {
                error: Some(e.to_string()),
            };
        }
    };

    match client.claim_status(&session).await {
        Ok(ClaimStatus::Claimed) => {
            tracing::info!("Resumed claimed session");
            BootOutcome::Authenticated(session)
        }
        Ok(status) => {
            tracing::info!(status = ?status, "Stored session is not claimed yet");
            BootOutcome::PendingClaim(session)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to resume session");
            if e.is_auth_failure() {
                if let Err(clear_err) = store.revoke() {
                    tracing::warn!(error = %clear_err, "Failed to remove rejected token");
                }
            }
            BootOutcome::SignedOut {
                error: Some(e.to_string()),
            }
        }
    }
}

/// Register a new agent; the API key is stored before this returns
pub async fn register(
    client: &MoltbookClient,
    store: &dyn TokenStore,
    name: &str,
    description: &str,
) -> ClientResult<(Session, Registration)> {
    let response = client.register(name, description).await?;
    let session = store.issue(&response.agent.api_key)?;
    tracing::info!(agent = %name.trim(), "Agent registered, awaiting claim");
    Ok((session, response.agent))
}

/// Ask whether a pending session has been claimed yet
pub async fn check_claim(client: &MoltbookClient, session: &Session) -> ClientResult<bool> {
    let status = client.claim_status(session).await?;
    Ok(status == ClaimStatus::Claimed)
}

/// End the session and forget the stored token
pub fn logout(store: &dyn TokenStore) -> ClientResult<()> {
    store.revoke()?;
    tracing::info!("Signed out");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryTokenStore;
    use mockito::Server;

    #[tokio::test]
    async fn test_resume_without_token_makes_no_request() {
        let mut server = Server::new_async().await;
        let status = server
            .mock("GET", "/agents/status")
            .expect(0)
            .create_async()
            .await;

        let client = MoltbookClient::with_base_url(&server.url()).unwrap();
        let outcome = resume(&client, &MemoryTokenStore::new()).await;

        assert_eq!(outcome, BootOutcome::SignedOut { error: None });
        status.assert_async().await;
    }

    #[tokio::test]
    async fn test_resume_claimed_and_pending() {
        let mut server = Server::new_async().await;
        let claimed = server
            .mock("GET", "/agents/status")
            .match_header("authorization", "Bearer good")
            .with_status(200)
            .with_body(r#"{"status": "claimed"}"#)
            .create_async()
            .await;
        let pending = server
            .mock("GET", "/agents/status")
            .match_header("authorization", "Bearer fresh")
            .with_status(200)
            .with_body(r#"{"status": "pending_claim"}"#)
            .create_async()
            .await;

        let client = MoltbookClient::with_base_url(&server.url()).unwrap();
        let outcome = resume(&client, &MemoryTokenStore::with_token("good")).await;
        assert_eq!(outcome, BootOutcome::Authenticated(Session::new("good")));
        let outcome = resume(&client, &MemoryTokenStore::with_token("fresh")).await;
        assert_eq!(outcome, BootOutcome::PendingClaim(Session::new("fresh")));

        claimed.assert_async().await;
        pending.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_token_is_removed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/agents/status")
            .with_status(401)
            .with_body(r#"{"success": false, "error": "Invalid API key"}"#)
            .create_async()
            .await;

        let client = MoltbookClient::with_base_url(&server.url()).unwrap();
        let store = MemoryTokenStore::with_token("stale");
        let outcome = resume(&client, &store).await;

        assert_eq!(
            outcome,
            BootOutcome::SignedOut {
                error: Some("Invalid API key".to_string())
            }
        );
        assert!(store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_error_keeps_token() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/agents/status")
            .with_status(503)
            .create_async()
            .await;

        let client = MoltbookClient::with_base_url(&server.url()).unwrap();
        let store = MemoryTokenStore::with_token("keep");
        let outcome = resume(&client, &store).await;

        assert!(matches!(outcome, BootOutcome::SignedOut { error: Some(_) }));
        assert_eq!(store.load().unwrap(), Some(Session::new("keep")));
    }

    #[tokio::test]
    async fn test_register_saves_token_and_logout_clears_it() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/agents/register")
            .with_status(201)
            .with_body(
                r#"{"agent": {"api_key": "moltbook_new", "claim_url": "http://x/claim/c"}}"#,
            )
            .create_async()
            .await;

        let client = MoltbookClient::with_base_url(&server.url()).unwrap();
        let store = MemoryTokenStore::new();
        let (session, registration) = register(&client, &store, "Bot", "").await.unwrap();

        assert_eq!(session.token(), "moltbook_new");
        assert_eq!(registration.claim_url, "http://x/claim/c");
        assert_eq!(store.load().unwrap(), Some(session));

        logout(&store).unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
