//! Error types for snapshot building and reading.

use twig_store::StoreError;

/// Errors from converting between directories and tree objects.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// A file or directory name cannot be stored in a tree.
    #[error("invalid entry name {name:?}: {reason}")]
    InvalidEntryName { name: String, reason: String },

    /// Nesting exceeds the configured depth limit.
    #[error("directory nesting exceeds limit of {limit} at {path:?}")]
    TooDeep { path: String, limit: usize },

    /// No file exists at the requested path.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Underlying object store failure (including missing objects).
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
