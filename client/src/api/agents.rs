//! Agent endpoints: registration, claim status and profiles

use super::models::{
    Agent, ClaimStatus, ProfileResponse, ProfileUpdate, RegisterRequest, RegisterResponse,
    StatusResponse,
};
use super::MoltbookClient;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;
use reqwest::Method;

impl MoltbookClient {
    /// `POST /agents/register` (unauthenticated)
    pub async fn register(&self, name: &str, description: &str) -> ClientResult<RegisterResponse> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::InvalidInput(
                "Agent name cannot be empty".to_string(),
            ));
        }

        let body = RegisterRequest {
            name: name.to_string(),
            description: description.trim().to_string(),
        };
        let builder = self
            .request(Method::POST, &["agents", "register"], None)
            .json(&body);
        self.send(builder).await
    }

    /// `GET /agents/status`
    pub async fn claim_status(&self, session: &Session) -> ClientResult<ClaimStatus> {
        let builder = self.request(Method::GET, &["agents", "status"], Some(session));
        let response: StatusResponse = self.send(builder).await?;
        Ok(response.status)
    }

    /// `GET /agents/me`
    pub async fn me(&self, session: &Session) -> ClientResult<Agent> {
        let builder = self.request(Method::GET, &["agents", "me"], Some(session));
        let response: ProfileResponse = self.send(builder).await?;
        Ok(response.agent)
    }

    /// `GET /agents/profile?name=`
    pub async fn profile(&self, session: &Session, name: &str) -> ClientResult<Agent> {
        let builder = self
            .request(Method::GET, &["agents", "profile"], Some(session))
            .query(&[("name", name)]);
        let response: ProfileResponse = self.send(builder).await?;
        Ok(response.agent)
    }

    /// `PATCH /agents/me` with a new description
    pub async fn update_description(
        &self,
        session: &Session,
        description: &str,
    ) -> ClientResult<Agent> {
        let body = ProfileUpdate {
            description: description.to_string(),
        };
        let builder = self
            .request(Method::PATCH, &["agents", "me"], Some(session))
            .json(&body);
        let response: ProfileResponse = self.send(builder).await?;
        Ok(response.agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn test_register_sends_name_and_description() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/agents/register")
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::Json(json!({
                "name": "HelpfulBot",
                "description": "I help"
            })))
            .with_status(201)
            .with_body(
                r#"{
                    "agent": {
                        "api_key": "moltbook_k1",
                        "claim_url": "https://www.moltbook.com/claim/moltbook_claim_x",
                        "verification_code": "reef-X4B2"
                    },
                    "important": "SAVE YOUR API KEY!"
                }"#,
            )
            .create_async()
            .await;

        let client = MoltbookClient::with_base_url(&server.url()).unwrap();
        let response = client.register(" HelpfulBot ", "I help").await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.agent.api_key, "moltbook_k1");
        assert_eq!(response.agent.verification_code.as_deref(), Some("reef-X4B2"));
    }

    #[tokio::test]
    async fn test_register_rejects_empty_name_locally() {
        let client = MoltbookClient::with_base_url("http://127.0.0.1:9").unwrap();
        let result = client.register("  ", "desc").await;
        assert!(matches!(result, Err(ClientError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_register_conflict_surfaces_message() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/agents/register")
            .with_status(409)
            .with_body(r#"{"success": false, "error": "Agent name already taken"}"#)
            .create_async()
            .await;

        let client = MoltbookClient::with_base_url(&server.url()).unwrap();
        let err = client.register("HelpfulBot", "").await.unwrap_err();

        mock.assert_async().await;
        assert_eq!(err.to_string(), "Agent name already taken");
        assert_eq!(err.status().map(|s| s.as_u16()), Some(409));
    }

    #[tokio::test]
    async fn test_claim_status_uses_bearer_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/agents/status")
            .match_header("authorization", "Bearer moltbook_k1")
            .with_status(200)
            .with_body(r#"{"status": "claimed"}"#)
            .create_async()
            .await;

        let client = MoltbookClient::with_base_url(&server.url()).unwrap();
        let status = client
            .claim_status(&Session::new("moltbook_k1"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(status, ClaimStatus::Claimed);
    }

    #[tokio::test]
    async fn test_me_invalid_key_is_auth_failure() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/agents/me")
            .with_status(401)
            .with_body(r#"{"success": false, "error": "Invalid API key"}"#)
            .create_async()
            .await;

        let client = MoltbookClient::with_base_url(&server.url()).unwrap();
        let err = client.me(&Session::new("bad")).await.unwrap_err();

        mock.assert_async().await;
        assert!(err.is_auth_failure());
        assert_eq!(err.to_string(), "Invalid API key");
    }

    #[tokio::test]
    async fn test_profile_by_name() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/agents/profile")
            .match_query(Matcher::UrlEncoded("name".into(), "Other Bot".into()))
            .with_status(200)
            .with_body(r#"{"success": true, "agent": {"name": "Other Bot", "karma": 12}}"#)
            .create_async()
            .await;

        let client = MoltbookClient::with_base_url(&server.url()).unwrap();
        let agent = client
            .profile(&Session::new("k"), "Other Bot")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(agent.name, "Other Bot");
        assert_eq!(agent.karma, 12);
    }

    #[tokio::test]
    async fn test_update_description_patches_me() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/agents/me")
            .match_header("authorization", "Bearer k")
            .match_body(Matcher::Json(json!({"description": "new words"})))
            .with_status(200)
            .with_body(
                r#"{"success": true, "agent": {"name": "HelpfulBot", "description": "new words"}}"#,
            )
            .create_async()
            .await;

        let client = MoltbookClient::with_base_url(&server.url()).unwrap();
        let agent = client
            .update_description(&Session::new("k"), "new words")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(agent.description.as_deref(), Some("new words"));
    }
}
