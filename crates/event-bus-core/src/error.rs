//! Error types for the event bus core.
//!
//! Mirrors the error kinds named in the coordination engine's design:
//! `StorageError` for persistence failures, `ValidationError` for bad
//! input, and `TransientDeliveryError`/`PermanentDeliveryError` for
//! webhook dispatch outcomes. `NotFound` is not a variant here — lookup
//! misses are represented as `Option`/structured `{success: false}`
//! results at the call site, never as an `Err`.

/// Standard result type for event bus operations.
pub type EventBusResult<T> = Result<T, EventBusError>;

/// Failures from the embedded store. Never panics the process; every
/// I/O or codec failure from `redb`/`serde_json` surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures from validating caller-supplied input before it reaches
/// the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("event_type must not be empty")]
    EmptyEventType,

    #[error("url '{0}' is not a valid absolute http(s) url")]
    InvalidUrl(String),
}

/// A webhook delivery attempt that may succeed on retry: non-2xx
/// status, connection failure, or timeout.
#[derive(Debug, thiserror::Error)]
pub enum TransientDeliveryError {
    #[error("webhook {webhook_id} returned status {status}")]
    HttpStatus { webhook_id: u64, status: u16 },

    #[error("webhook {webhook_id} request failed: {source}")]
    Request {
        webhook_id: u64,
        #[source]
        source: reqwest::Error,
    },

    #[error("webhook {webhook_id} timed out")]
    Timeout { webhook_id: u64 },
}

/// A webhook delivery that exhausted its retry budget.
#[derive(Debug, thiserror::Error)]
#[error("webhook {webhook_id} delivery failed after {attempts} attempts: {last_error}")]
pub struct PermanentDeliveryError {
    pub webhook_id: u64,
    pub attempts: u32,
    pub last_error: String,
}

/// Top-level error type returned by the `EventBus` facade.
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}
