//! Error types for commit graph operations.

use twig_store::StoreError;

/// Errors that can occur during commit graph operations.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// A commit may record at most two parents.
    #[error("commit cannot have {count} parents (maximum is 2)")]
    TooManyParents { count: usize },

    /// Object store failure, including a referenced commit that is missing.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience alias for DAG results.
pub type DagResult<T> = Result<T, DagError>;
