use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::StoreError;
use crate::models::{Note, NoteDraft};
use crate::repo::{NoteStore, StateStore};

/// In-memory NoteStore and StateStore for testing and local development.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    notes: Arc<Mutex<HashMap<String, Note>>>,
    states: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn create(&self, user_id: &str, draft: NoteDraft) -> Result<Note, StoreError> {
        let note = Note::create(user_id, draft, Utc::now());
        let mut notes = self.notes.lock().unwrap();
        if notes.contains_key(&note.id) {
            return Err(StoreError::NotWritten { operation: "store note" });
        }
        notes.insert(note.id.clone(), note.clone());
        Ok(note)
    }

    async fn read(&self, user_id: &str, note_id: &str) -> Result<Note, StoreError> {
        self.notes
            .lock()
            .unwrap()
            .get(note_id)
            .filter(|n| n.user_id == user_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(note_id))
    }

    async fn read_all(&self, user_id: &str) -> Result<Vec<Note>, StoreError> {
        let mut notes: Vec<Note> = self
            .notes
            .lock()
            .unwrap()
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(notes)
    }

    async fn update(
        &self,
        user_id: &str,
        note_id: &str,
        draft: NoteDraft,
    ) -> Result<(), StoreError> {
        let mut notes = self.notes.lock().unwrap();
        match notes.get_mut(note_id).filter(|n| n.user_id == user_id) {
            Some(note) => {
                note.title = draft.title;
                note.body = draft.body;
                Ok(())
            }
            None => Err(StoreError::not_found(note_id)),
        }
    }

    async fn delete(&self, user_id: &str, note_id: &str) -> Result<(), StoreError> {
        let mut notes = self.notes.lock().unwrap();
        let owned = notes.get(note_id).is_some_and(|n| n.user_id == user_id);
        if !owned {
            return Err(StoreError::not_found(note_id));
        }
        notes.remove(note_id);
        Ok(())
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn save(&self, state: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut states = self.states.lock().unwrap();
        let now = Utc::now();
        states.retain(|_, exp| *exp > now);
        states.insert(state.to_string(), expires_at);
        Ok(())
    }

    async fn take(&self, state: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let removed = self.states.lock().unwrap().remove(state);
        Ok(removed.is_some_and(|exp| now < exp))
    }
}
