use api::auth::{FlowError, TokenError};
use api::users::RegistryError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use store::StoreError;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Everything a handler can fail with. Owns the mapping to status codes and
/// the client-facing message; the detailed `Display` text only goes to logs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing or malformed bearer token")]
    MissingToken,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("invalid request body: {0}")]
    Body(#[from] JsonRejection),

    #[error("invalid oauth callback: {0}")]
    Callback(&'static str),

    #[error("invalid oauth callback query: {0}")]
    CallbackQuery(#[from] QueryRejection),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("owner lookup failed: {0}")]
    Owner(#[source] RegistryError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingToken | AppError::Token(_) => StatusCode::UNAUTHORIZED,
            AppError::Body(_) | AppError::Callback(_) | AppError::CallbackQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Flow(FlowError::InvalidState) => StatusCode::BAD_REQUEST,
            AppError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Flow(_) | AppError::Store(_) | AppError::Owner(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::MissingToken | AppError::Token(_) => "Unauthorized",
            AppError::Body(_) => "invalid request body",
            AppError::Callback(_)
            | AppError::CallbackQuery(_)
            | AppError::Flow(FlowError::InvalidState) => {
                "invalid oauth callback"
            }
            AppError::Flow(_) => "error during authentication",
            AppError::Store(StoreError::NotFound { .. }) => "note not found",
            AppError::Store(_) => "storage error",
            AppError::Owner(_) => "error while reading user",
        }
    }

    /// Server faults at error, rejected credentials at warn, other client
    /// mistakes at debug.
    pub fn log(&self) {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let body = Json(json!({ "error": self.user_message() }));
        (self.status_code(), body).into_response()
    }
}
