use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use store::{StateStore, StoreError};

/// `StateStore` over the `oauth_states` table.
#[derive(Debug, Clone)]
pub struct PgStateStore {
    pool: PgPool,
}

impl PgStateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StateStore for PgStateStore {
    async fn save(&self, state: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        // Abandoned logins leave rows behind; sweep them on the way in.
        sqlx::query("DELETE FROM oauth_states WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        sqlx::query("INSERT INTO oauth_states (state, expires_at) VALUES ($1, $2)")
            .bind(state)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn take(&self, state: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let row: Option<(DateTime<Utc>,)> =
            sqlx::query_as("DELETE FROM oauth_states WHERE state = $1 RETURNING expires_at")
                .bind(state)
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::backend)?;

        Ok(row.is_some_and(|(expires_at,)| now < expires_at))
    }
}
