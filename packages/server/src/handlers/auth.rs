use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    #[serde(default)]
    state: String,
}

/// Send the browser to the provider's consent page.
pub async fn login(State(state): State<AppState>) -> AppResult<Response> {
    let url = state.oauth.generate_auth_url().await?;
    Ok((StatusCode::FOUND, [(LOCATION, url)]).into_response())
}

/// Provider redirect target. Answers with the session token as plain text.
pub async fn callback(
    State(state): State<AppState>,
    query: Result<Query<CallbackParams>, QueryRejection>,
) -> AppResult<String> {
    let Query(params) = query?;
    let code = params
        .code
        .filter(|code| !code.is_empty())
        .ok_or(AppError::Callback("missing code"))?;

    let grant = state.oauth.exchange_code(&code, &params.state).await?;
    tracing::info!(user_id = %grant.user_id, username = %grant.username, "user logged in");

    Ok(grant.welcome_message())
}
