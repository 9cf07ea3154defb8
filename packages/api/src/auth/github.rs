//! # GitHub OAuth 2.0 exchange flow
//!
//! Turns a GitHub authorization code into a local session token.
//!
//! ## Types
//!
//! - [`GitHubUser`]: deserialization target for the profile endpoint (`/user`).
//! - [`ConfiguredClient`]: a fully-typed `oauth2::Client` alias with auth and token
//!   endpoints set.
//! - [`GitHubOAuth`]: the flow itself, holding its collaborators.
//! - [`SessionGrant`]: what a successful exchange produces.
//!
//! ## Flow
//!
//! 1. **[`generate_auth_url`](GitHubOAuth::generate_auth_url)**: builds the provider
//!    authorization URL with a random CSRF `state` and stores that state with a
//!    10-minute expiry.
//!
//! 2. **[`exchange_code`](GitHubOAuth::exchange_code)**: called by the
//!    `/github/callback` route. Runs each step in order, stopping at the first failure:
//!    - Consumes the `state` (single use, must be unexpired).
//!    - Exchanges the code for an access token (client id and secret go in the
//!      form body).
//!    - Fetches `{profile_url}/user` with the access token.
//!    - Provisions the user in the external users service.
//!    - Issues the session token.
//!
//! Nothing is rolled back: a user provisioned before a signing failure stays
//! provisioned. Re-provisioning the same id on the next login is harmless.

use std::sync::Arc;

use chrono::Utc;
use oauth2::basic::BasicClient;
use oauth2::{AuthType, AuthorizationCode, CsrfToken, EndpointNotSet, EndpointSet, TokenResponse};
use serde::Deserialize;
use store::{StateStore, StoreError};
use thiserror::Error;

use super::config::OAuthConfig;
use super::session::{SessionTokenCodec, TokenError};
use crate::users::{RegistryError, UserRegistry};

/// GitHub user info from API.
#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: i64,
    login: String,
}

/// OAuth client type with auth URL and token URL set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("oauth state is missing, unknown or expired")]
    InvalidState,

    #[error("oauth state store failed: {0}")]
    StateStore(#[source] StoreError),

    #[error("token exchange failed: {0}")]
    Exchange(String),

    #[error("profile fetch failed: {0}")]
    Profile(#[source] reqwest::Error),

    #[error("user provisioning failed: {0}")]
    Provisioning(#[source] RegistryError),

    #[error("session token issuance failed: {0}")]
    Signing(#[source] TokenError),
}

/// Result of a completed exchange.
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub user_id: String,
    pub username: String,
    pub token: String,
}

impl SessionGrant {
    /// Plain-text body returned to the browser after login.
    pub fn welcome_message(&self) -> String {
        format!(
            "Welcome {}!\nYour session token: {}\n\nSend it as 'Authorization: Bearer <token>' to use the /notes API.",
            self.username, self.token
        )
    }
}

/// GitHub OAuth handler.
pub struct GitHubOAuth {
    config: OAuthConfig,
    http: reqwest::Client,
    states: Arc<dyn StateStore>,
    users: Arc<dyn UserRegistry>,
    codec: Arc<SessionTokenCodec>,
}

impl GitHubOAuth {
    pub fn new(
        config: OAuthConfig,
        http: reqwest::Client,
        states: Arc<dyn StateStore>,
        users: Arc<dyn UserRegistry>,
        codec: Arc<SessionTokenCodec>,
    ) -> Self {
        Self {
            config,
            http,
            states,
            users,
            codec,
        }
    }

    fn create_client(&self) -> ConfiguredClient {
        BasicClient::new(self.config.client_id.clone())
            .set_client_secret(self.config.client_secret.clone())
            .set_auth_uri(self.config.auth_url.clone())
            .set_token_uri(self.config.token_url.clone())
            .set_redirect_uri(self.config.redirect_url.clone())
            .set_auth_type(AuthType::RequestBody)
    }

    /// Generate the provider authorization URL and remember its state.
    pub async fn generate_auth_url(&self) -> Result<String, FlowError> {
        let (auth_url, csrf_state) = self
            .create_client()
            .authorize_url(CsrfToken::new_random)
            .url();

        let expires_at = Utc::now() + self.config.state_ttl;
        self.states
            .save(csrf_state.secret(), expires_at)
            .await
            .map_err(FlowError::StateStore)?;

        Ok(auth_url.to_string())
    }

    /// Exchange an authorization code for a session token.
    pub async fn exchange_code(&self, code: &str, state: &str) -> Result<SessionGrant, FlowError> {
        self.consume_state(state).await?;

        let access_token = self.request_access_token(code).await?;
        let user = self.fetch_profile(&access_token).await?;
        let user_id = user.id.to_string();

        self.users
            .provision(&user_id, &user.login)
            .await
            .map_err(FlowError::Provisioning)?;
        tracing::debug!(user_id = %user_id, username = %user.login, "user provisioned");

        let token = self
            .codec
            .issue(&user_id, &user.login)
            .map_err(FlowError::Signing)?;

        Ok(SessionGrant {
            user_id,
            username: user.login,
            token,
        })
    }

    async fn consume_state(&self, state: &str) -> Result<(), FlowError> {
        if state.is_empty() {
            return Err(FlowError::InvalidState);
        }

        let valid = self
            .states
            .take(state, Utc::now())
            .await
            .map_err(FlowError::StateStore)?;
        if !valid {
            return Err(FlowError::InvalidState);
        }
        Ok(())
    }

    async fn request_access_token(&self, code: &str) -> Result<String, FlowError> {
        let token_result = self
            .create_client()
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| FlowError::Exchange(e.to_string()))?;

        Ok(token_result.access_token().secret().clone())
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<GitHubUser, FlowError> {
        self.http
            .get(format!("{}/user", self.config.profile_url))
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(FlowError::Profile)?
            .json()
            .await
            .map_err(FlowError::Profile)
    }
}
