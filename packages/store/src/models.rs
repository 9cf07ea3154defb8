//! # Domain models for notes
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`Note`] | A persisted note. `id` and `created_at` are assigned by the store on creation and never change; `user_id` is the single owner. |
//! | [`NoteDraft`] | The client-editable part of a note (`title`, `body`), used by create and update. |
//!
//! Both types are `Serialize + Deserialize` so they can be returned from and
//! parsed by the HTTP handlers directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A note owned by exactly one user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub body: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// Build a brand new note for `user_id`, assigning a fresh UUID v4 id and
    /// stamping `created_at` with `now`.
    pub fn create(user_id: &str, draft: NoteDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            body: draft.body,
            user_id: user_id.to_string(),
            created_at: now,
        }
    }
}

/// Title and body of a note as sent by the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    pub title: String,
    pub body: String,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}
