//! # Storage traits: ownership-scoped notes and single-use OAuth states
//!
//! Everything that persists data goes through the two traits defined here, so
//! the HTTP layer and the OAuth flow work the same against PostgreSQL (the
//! `api` crate) or the in-process [`crate::MemoryStore`].
//!
//! ## [`NoteStore`]
//!
//! Every method takes the requesting user's id as its **first, mandatory**
//! parameter. Implementations must fold it into the query predicate (`id` AND
//! `user_id`) instead of checking ownership in a separate step, so the check is
//! atomic with the read or write.
//!
//! | Method | Success | Failure |
//! |--------|---------|---------|
//! | [`create`](NoteStore::create) | the stored [`Note`] with its new id and `created_at` | [`StoreError::NotWritten`] if nothing was inserted |
//! | [`read`](NoteStore::read) | the note | [`StoreError::NotFound`] if absent **or** owned by someone else |
//! | [`read_all`](NoteStore::read_all) | all of the user's notes, oldest first (may be empty) | backend errors only |
//! | [`update`](NoteStore::update) | `()`; only `title`/`body` change | [`StoreError::NotFound`] when zero rows match |
//! | [`delete`](NoteStore::delete) | `()`; the row is physically removed | [`StoreError::NotFound`] when zero rows match |
//!
//! ## [`StateStore`]
//!
//! Holds the CSRF `state` values handed out when a login is initiated.
//! [`take`](StateStore::take) removes the state and reports whether it was
//! present and unexpired in one step, so a state can be redeemed only once.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::StoreError;
use crate::models::{Note, NoteDraft};

/// Ownership-scoped persistence for notes.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn create(&self, user_id: &str, draft: NoteDraft) -> Result<Note, StoreError>;

    async fn read(&self, user_id: &str, note_id: &str) -> Result<Note, StoreError>;

    async fn read_all(&self, user_id: &str) -> Result<Vec<Note>, StoreError>;

    async fn update(&self, user_id: &str, note_id: &str, draft: NoteDraft)
        -> Result<(), StoreError>;

    async fn delete(&self, user_id: &str, note_id: &str) -> Result<(), StoreError>;
}

/// Single-use OAuth `state` values with an expiry.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn save(&self, state: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Remove `state`, returning `true` only if it existed and `now` is before
    /// its expiry.
    async fn take(&self, state: &str, now: DateTime<Utc>) -> Result<bool, StoreError>;
}
