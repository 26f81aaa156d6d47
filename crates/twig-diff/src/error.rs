//! Error types for the diff crate.

use twig_store::StoreError;
use twig_tree::TreeError;

/// Errors that can occur during diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Store operation failed, including a referenced tree that is missing.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A tree exceeded the nesting limit.
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
