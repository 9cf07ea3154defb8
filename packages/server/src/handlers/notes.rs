//! `/notes` handlers. Each one pulls the caller from the token, hands the
//! caller's id to the store as the ownership filter, and maps the outcome.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use store::{Note, NoteDraft};

use crate::error::{AppError, AppResult};
use crate::extract::AuthenticatedUser;
use crate::AppState;

/// A note together with its owner's display name.
#[derive(Debug, Serialize)]
pub struct NoteWithOwner {
    #[serde(flatten)]
    pub note: Note,
    pub username: String,
}

fn message(msg: String) -> Json<Value> {
    Json(json!({ "msg": msg }))
}

pub async fn list(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<Json<Vec<Note>>> {
    let notes = state.notes.read_all(&user.user_id).await?;
    Ok(Json(notes))
}

pub async fn create(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    payload: Result<Json<NoteDraft>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let Json(draft) = payload?;
    let note = state.notes.create(&user.user_id, draft).await?;
    tracing::debug!(user_id = %user.user_id, note_id = %note.id, "note created");

    Ok((
        StatusCode::CREATED,
        message(format!("note '{}' created successfully", note.id)),
    ))
}

pub async fn read(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(note_id): Path<String>,
) -> AppResult<Json<NoteWithOwner>> {
    let note = state.notes.read(&user.user_id, &note_id).await?;
    let owner = state
        .users
        .lookup(&note.user_id)
        .await
        .map_err(AppError::Owner)?;

    Ok(Json(NoteWithOwner {
        note,
        username: owner.username,
    }))
}

/// Replaces both fields. Unlike a patch, a body without `body` (or `title`)
/// is rejected with 400 rather than keeping the stored value.
pub async fn update(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(note_id): Path<String>,
    payload: Result<Json<NoteDraft>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(draft) = payload?;
    state.notes.update(&user.user_id, &note_id, draft).await?;
    tracing::debug!(user_id = %user.user_id, note_id = %note_id, "note updated");

    Ok(message(format!("note '{}' is updated successfully", note_id)))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(note_id): Path<String>,
) -> AppResult<(StatusCode, Json<Value>)> {
    state.notes.delete(&user.user_id, &note_id).await?;
    tracing::debug!(user_id = %user.user_id, note_id = %note_id, "note deleted");

    // 201 rather than 200/204: existing clients check for it.
    Ok((
        StatusCode::CREATED,
        message(format!("note '{}' deleted successfully", note_id)),
    ))
}
