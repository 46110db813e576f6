use kin_types::{EntityKind, Handle};

/// Errors from datastore operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested record was not found.
    #[error("{kind} not found: {handle}")]
    NotFound { kind: EntityKind, handle: Handle },

    /// The handle belonged to a deleted record and cannot be reused.
    #[error("handle {0} has been retired")]
    HandleRetired(Handle),

    /// Attempted to write a record with the null handle.
    #[error("cannot store record with null handle")]
    NullHandle,

    /// A handle is already used by a record of the other kind.
    #[error("handle {handle} is already a {existing}")]
    KindMismatch { handle: Handle, existing: EntityKind },

    /// A lock protecting shared state was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error while reading or writing a snapshot file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
