use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::{FromRow, PgPool};
use store::{Note, NoteDraft, NoteStore, StoreError};

/// `NoteStore` over the `notes` table. Every statement filters on `user_id`.
#[derive(Debug, Clone)]
pub struct PgNoteStore {
    pool: PgPool,
}

impl PgNoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct NoteRow {
    id: String,
    title: String,
    body: String,
    user_id: String,
    created_at: DateTime<Utc>,
}

impl From<NoteRow> for Note {
    fn from(row: NoteRow) -> Self {
        Note {
            id: row.id,
            title: row.title,
            body: row.body,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn create(&self, user_id: &str, draft: NoteDraft) -> Result<Note, StoreError> {
        // TIMESTAMPTZ keeps microseconds.
        let note = Note::create(user_id, draft, Utc::now().trunc_subsecs(6));

        let result = sqlx::query(
            "INSERT INTO notes (user_id, id, title, body, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&note.user_id)
        .bind(&note.id)
        .bind(&note.title)
        .bind(&note.body)
        .bind(note.created_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotWritten {
                operation: "store note",
            });
        }
        Ok(note)
    }

    async fn read(&self, user_id: &str, note_id: &str) -> Result<Note, StoreError> {
        let row: Option<NoteRow> = sqlx::query_as(
            "SELECT id, title, body, user_id, created_at FROM notes WHERE id = $1 AND user_id = $2",
        )
        .bind(note_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        row.map(Note::from)
            .ok_or_else(|| StoreError::not_found(note_id))
    }

    async fn read_all(&self, user_id: &str) -> Result<Vec<Note>, StoreError> {
        let rows: Vec<NoteRow> = sqlx::query_as(
            r#"
            SELECT id, title, body, user_id, created_at
            FROM notes
            WHERE user_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(rows.into_iter().map(Note::from).collect())
    }

    async fn update(
        &self,
        user_id: &str,
        note_id: &str,
        draft: NoteDraft,
    ) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE notes SET title = $1, body = $2 WHERE id = $3 AND user_id = $4")
                .bind(&draft.title)
                .bind(&draft.body)
                .bind(note_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(StoreError::backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(note_id));
        }
        Ok(())
    }

    async fn delete(&self, user_id: &str, note_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
            .bind(note_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(note_id));
        }
        Ok(())
    }
}
