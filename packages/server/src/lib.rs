//! # HTTP surface of the notes service
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/login/github` | [`handlers::auth::login`] |
//! | GET | `/github/callback` | [`handlers::auth::callback`] |
//! | GET, POST | `/notes` | [`handlers::notes::list`], [`handlers::notes::create`] |
//! | GET, PUT, DELETE | `/notes/{note_id}` | [`handlers::notes::read`], [`handlers::notes::update`], [`handlers::notes::delete`] |
//!
//! Every `/notes` route requires a bearer session token, see
//! [`AuthenticatedUser`]. Failures become [`AppError`] responses.

use std::sync::Arc;

use api::auth::{GitHubOAuth, SessionTokenCodec};
use api::users::UserRegistry;
use axum::routing::get;
use axum::Router;
use store::NoteStore;
use tower_http::trace::TraceLayer;

pub mod error;
mod extract;
pub mod handlers;

pub use error::{AppError, AppResult};
pub use extract::AuthenticatedUser;

/// Shared, immutable per-process state. Cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<dyn NoteStore>,
    pub users: Arc<dyn UserRegistry>,
    pub codec: Arc<SessionTokenCodec>,
    pub oauth: Arc<GitHubOAuth>,
}

pub fn router(state: AppState) -> Router {
    use handlers::{auth, notes};

    Router::new()
        .route("/login/github", get(auth::login))
        .route("/github/callback", get(auth::callback))
        .route("/notes", get(notes::list).post(notes::create))
        .route(
            "/notes/{note_id}",
            get(notes::read).put(notes::update).delete(notes::delete),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
