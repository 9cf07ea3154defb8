//! GitHub OAuth configuration.

use chrono::Duration;
use oauth2::{AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl};

use crate::config::{ConfigError, Vars};

/// How long an issued `state` can be redeemed.
const STATE_TTL_MINUTES: i64 = 10;

/// OAuth provider configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub auth_url: AuthUrl,
    pub token_url: TokenUrl,
    pub redirect_url: RedirectUrl,
    /// Base of the profile API; the flow requests `{profile_url}/user`.
    pub profile_url: String,
    pub state_ttl: Duration,
}

impl OAuthConfig {
    pub(crate) fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        let client_id = vars.required("GITHUB_CLIENT_ID")?;
        let client_secret = vars.required("GITHUB_CLIENT_SECRET")?;

        let auth_url = vars.or("LOGIN_URI", "https://github.com/login/oauth/authorize");
        let token_url = vars.or(
            "ACCESS_TOKEN_URI",
            "https://github.com/login/oauth/access_token",
        );
        let redirect_url = vars.or("REDIRECT_URI", "http://localhost:4000/github/callback");
        let profile_url = vars.or("PROFILE_URI", "https://api.github.com");

        Ok(Self {
            client_id: ClientId::new(client_id),
            client_secret: ClientSecret::new(client_secret),
            auth_url: AuthUrl::new(auth_url).map_err(|e| invalid("LOGIN_URI", e))?,
            token_url: TokenUrl::new(token_url).map_err(|e| invalid("ACCESS_TOKEN_URI", e))?,
            redirect_url: RedirectUrl::new(redirect_url)
                .map_err(|e| invalid("REDIRECT_URI", e))?,
            profile_url: profile_url.trim_end_matches('/').to_string(),
            state_ttl: Duration::minutes(STATE_TTL_MINUTES),
        })
    }
}

fn invalid(key: &'static str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: err.to_string(),
    }
}
