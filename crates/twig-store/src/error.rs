use twig_types::ObjectId;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The bytes read back do not hash to the requested id.
    #[error("hash mismatch for {id}: computed {computed}")]
    HashMismatch { id: ObjectId, computed: ObjectId },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The object data is malformed or of the wrong kind.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// I/O error from an external storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
