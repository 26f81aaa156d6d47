//! Error types for reference operations.

use thiserror::Error;
use twig_dag::DagError;
use twig_types::ObjectId;

/// Short form of a branch head for messages: its short hex, or `unborn`.
pub fn describe_head(head: &Option<ObjectId>) -> String {
    match head {
        Some(id) => id.short_hex(),
        None => "unborn".to_string(),
    }
}

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// A branch with this name is already bound.
    #[error("branch already exists: {name}")]
    AlreadyExists { name: String },

    /// The branch head moved since the caller observed it.
    #[error(
        "stale update of {name}: expected {}, found {}",
        describe_head(.expected),
        describe_head(.actual)
    )]
    Stale {
        name: String,
        expected: Option<ObjectId>,
        actual: Option<ObjectId>,
    },

    /// The branch name is invalid.
    #[error("invalid branch name: {name}: {reason}")]
    InvalidBranchName { name: String, reason: String },

    /// A writer panicked while holding the table lock.
    #[error("ref table lock poisoned: {0}")]
    LockPoisoned(String),

    /// Classifying an update needed a commit that could not be read.
    #[error("commit graph error: {0}")]
    Dag(#[from] DagError),
}

/// Convenience type alias for ref operations.
pub type RefResult<T> = Result<T, RefError>;
