//! Client for the external users service.
//!
//! The service owns user records; this crate only registers a user after a
//! successful login (`POST /users/{id}`) and looks one up to show who owns a
//! note (`GET /users/{id}`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("users service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("users service returned an unreadable user: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A user record as returned by the users service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredUser {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Username")]
    pub username: String,
    #[serde(default, alias = "CreatedAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[async_trait]
pub trait UserRegistry: Send + Sync {
    /// Create or refresh the record for `user_id`. The response body is not
    /// validated beyond being readable.
    async fn provision(&self, user_id: &str, username: &str) -> Result<(), RegistryError>;

    async fn lookup(&self, user_id: &str) -> Result<RegisteredUser, RegistryError>;
}

/// [`UserRegistry`] backed by the users service's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpUserRegistry {
    base_url: String,
    http: reqwest::Client,
}

impl HttpUserRegistry {
    pub fn new(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    fn user_url(&self, user_id: &str) -> String {
        format!("{}/users/{}", self.base_url, user_id)
    }
}

#[async_trait]
impl UserRegistry for HttpUserRegistry {
    async fn provision(&self, user_id: &str, username: &str) -> Result<(), RegistryError> {
        let body = self
            .http
            .post(self.user_url(user_id))
            .json(&json!({ "username": username }))
            .send()
            .await?
            .text()
            .await?;

        tracing::debug!(user_id, response = %body, "users service answered provisioning");
        Ok(())
    }

    async fn lookup(&self, user_id: &str) -> Result<RegisteredUser, RegistryError> {
        let body = self
            .http
            .get(self.user_url(user_id))
            .send()
            .await?
            .text()
            .await?;

        Ok(serde_json::from_str(&body)?)
    }
}
