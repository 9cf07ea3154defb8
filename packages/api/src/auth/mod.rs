//! Authentication: session tokens and the GitHub OAuth exchange flow.

mod config;
mod github;
mod session;

pub use config::OAuthConfig;
pub use github::{FlowError, GitHubOAuth, SessionGrant};
pub use session::{decode, Claims, Identity, SessionTokenCodec, TokenError};
