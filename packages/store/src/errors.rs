use thiserror::Error;

/// Boxed backend error (database driver, connection pool, ...).
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched both the note id and the owner. A note owned by someone
    /// else is reported exactly like a missing one.
    #[error("note '{id}' is not found")]
    NotFound { id: String },

    /// An insert reported zero affected rows.
    #[error("rows affected for {operation} call is 0")]
    NotWritten { operation: &'static str },

    #[error("storage backend error: {0}")]
    Backend(#[source] BackendError),
}

impl StoreError {
    pub fn not_found(id: impl Into<String>) -> Self {
        StoreError::NotFound { id: id.into() }
    }

    pub fn backend(err: impl Into<BackendError>) -> Self {
        StoreError::Backend(err.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
