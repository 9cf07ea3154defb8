//! # Session token codec
//!
//! A session token is a compact HS256 JWT carrying `{sub, username, exp}`.
//! Tokens are self-contained: there is no server-side session store and no
//! revocation before expiry.
//!
//! - [`SessionTokenCodec::issue`] signs a fresh claim set with `exp = now + ttl`.
//! - [`SessionTokenCodec::verify`] checks signature and expiry. A token is valid
//!   strictly before `exp`; at `now >= exp` it is [`TokenError::Expired`].
//! - [`decode`] turns verified [`Claims`] into an [`Identity`], rejecting empty
//!   or absent `sub` / `username` regardless of the signature.
//!
//! The signing secret comes from [`SessionConfig`]; it is never compiled in.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SessionConfig;

/// Claim set carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub username: String,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

/// The authenticated caller, as decoded from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign session token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("invalid session token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("session token expired")]
    Expired,

    #[error("session token claim '{0}' is missing or empty")]
    Claim(&'static str),

    #[error("session token expiry is out of range")]
    ExpiryOutOfRange,
}

/// Signs and verifies session tokens with a shared secret.
pub struct SessionTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionTokenCodec {
    pub fn new(config: &SessionConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in verify_at against an explicit clock, with no leeway.
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            ttl: config.ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `user_id` / `username` expiring `ttl` from now.
    pub fn issue(&self, user_id: &str, username: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, username, Utc::now())
    }

    pub fn issue_at(
        &self,
        user_id: &str,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::ExpiryOutOfRange)?;
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: exp.timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    /// Check signature, algorithm and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(TokenError::Invalid)?;

        if now.timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }

    /// Verify `token` and decode the caller's identity from it.
    pub fn authenticate(&self, token: &str) -> Result<Identity, TokenError> {
        let claims = self.verify(token)?;
        decode(&claims)
    }
}

/// Extract the identity from already-verified claims.
pub fn decode(claims: &Claims) -> Result<Identity, TokenError> {
    if claims.sub.is_empty() {
        return Err(TokenError::Claim("sub"));
    }
    if claims.username.is_empty() {
        return Err(TokenError::Claim("username"));
    }

    Ok(Identity {
        user_id: claims.sub.clone(),
        username: claims.username.clone(),
    })
}
