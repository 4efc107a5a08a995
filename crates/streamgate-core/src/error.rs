//! Error types for the STREAMGATE control plane.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamgateError {
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Application quota exceeded: {used} of {limit} in use")]
    QuotaExceeded { used: u64, limit: u64 },

    #[error("Resource not ready: {resource} is {state}")]
    ResourceNotReady { resource: String, state: String },

    #[error("Rate limited: retry in {remaining_seconds}s")]
    RateLimited { remaining_seconds: u64 },

    /// A workflow trigger or gateway configuration push failed. Where
    /// applicable the local change has already been rolled back.
    #[error("Sync failure during {operation}: {detail}")]
    SyncFailure { operation: String, detail: String },

    /// An admin gateway operation failed after a successful sync.
    #[error("Gateway operation {operation} failed: {detail}")]
    Gateway { operation: String, detail: String },

    /// A rollback failed after a sync failure. Local and remote state
    /// have diverged and automated recovery is not possible; the
    /// record must be reconciled manually.
    #[error("Critical inconsistency — contact support: {detail}")]
    CriticalInconsistency { detail: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type StreamgateResult<T> = Result<T, StreamgateError>;
