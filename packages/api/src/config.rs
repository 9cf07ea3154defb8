//! # Service configuration from environment variables
//!
//! [`Config::from_env`] loads `.env` (via `dotenvy`, if present) and reads the
//! process environment once at startup. [`Config::from_lookup`] does the same
//! work against any key lookup, which is what the tests use.
//!
//! Empty values are treated as unset. Required variables:
//!
//! - `GITHUB_CLIENT_ID`, `GITHUB_CLIENT_SECRET`
//! - `USERS_SERVICE`: base URL of the external users service
//! - `SESSION_TOKEN_SECRET`: HMAC key for session tokens
//! - `DATABASE_URL`, or all of `POSTGRES_USER`, `POSTGRES_PASSWORD`,
//!   `POSTGRES_HOST`, `POSTGRES_DB` (`POSTGRES_PORT` defaults to `5432`)
//!
//! Everything else has a default; see [`OAuthConfig::from_vars`] for the
//! provider endpoints.

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::Duration;
use thiserror::Error;

pub use crate::auth::OAuthConfig;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24 * 7;
/// One year.
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("env variable {0} is not set or empty")]
    Missing(&'static str),

    #[error("env variable {key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Key lookup with "empty means unset" semantics.
pub(crate) struct Vars<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl<'a> Vars<'a> {
    pub(crate) fn new(lookup: &'a dyn Fn(&str) -> Option<String>) -> Self {
        Self { lookup }
    }

    pub(crate) fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub(crate) fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    pub(crate) fn or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    pub(crate) fn parsed<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.optional(key) {
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }
}

/// PostgreSQL connection settings.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        let url = match vars.optional("DATABASE_URL") {
            Some(url) => url,
            None => {
                let user = vars.required("POSTGRES_USER")?;
                let password = vars.required("POSTGRES_PASSWORD")?;
                let host = vars.required("POSTGRES_HOST")?;
                let port: u16 = vars.parsed("POSTGRES_PORT", 5432)?;
                let database = vars.required("POSTGRES_DB")?;
                format!("postgres://{user}:{password}@{host}:{port}/{database}")
            }
        };

        Ok(Self {
            url,
            max_connections: vars.parsed("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
        })
    }
}

// The url carries the password.
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Session token signing settings.
#[derive(Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl: Duration,
}

impl SessionConfig {
    fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        let secret = vars.required("SESSION_TOKEN_SECRET")?;
        let hours: i64 = vars.parsed("SESSION_TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?;
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
            return Err(ConfigError::Invalid {
                key: "SESSION_TOKEN_TTL_HOURS",
                reason: format!("must be between 1 and {}", MAX_TOKEN_TTL_HOURS),
            });
        }

        Ok(Self {
            secret,
            ttl: Duration::hours(hours),
        })
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Complete service configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub oauth: OAuthConfig,
    pub session: SessionConfig,
    /// Base URL of the external users service.
    pub users_service: String,
    /// Timeout applied to every outbound HTTP call.
    pub http_timeout: StdDuration,
    pub port: u16,
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars::new(&lookup);

        Ok(Self {
            database: DatabaseConfig::from_vars(&vars)?,
            oauth: OAuthConfig::from_vars(&vars)?,
            session: SessionConfig::from_vars(&vars)?,
            users_service: vars
                .required("USERS_SERVICE")?
                .trim_end_matches('/')
                .to_string(),
            http_timeout: StdDuration::from_secs(
                vars.parsed("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            ),
            port: vars.parsed("PORT", DEFAULT_PORT)?,
        })
    }

    /// Shared client for the provider and the users service. Redirects are
    /// not followed.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(self.http_timeout)
            .user_agent(concat!("notes-server/", env!("CARGO_PKG_VERSION")))
            .build()
    }
}
