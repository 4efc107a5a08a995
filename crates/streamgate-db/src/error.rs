//! Database-specific error types and conversions.

use streamgate_core::error::StreamgateError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record decode failed: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for StreamgateError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => StreamgateError::NotFound { entity, id },
            other => StreamgateError::Database(other.to_string()),
        }
    }
}
