//! Error types for merge operations.

use twig_dag::DagError;
use twig_refs::RefError;
use twig_store::StoreError;
use twig_tree::TreeError;

use crate::tree_merge::Conflict;

/// Errors that can occur while merging branches.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// A branch taking part in the merge has no commits.
    #[error("branch has no commits: {0}")]
    UnbornBranch(String),

    /// The trees could not be combined automatically. Nothing was committed.
    #[error("merge conflict in {} path(s)", .conflicts.len())]
    MergeConflict { conflicts: Vec<Conflict> },

    /// Object store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Tree nesting limit exceeded.
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    /// Commit graph failure.
    #[error("commit graph error: {0}")]
    Dag(#[from] DagError),

    /// Branch table failure, including a stale target head.
    #[error("ref error: {0}")]
    Ref(#[from] RefError),
}

impl MergeError {
    /// Paths of the conflicts, if this is a conflict.
    pub fn conflict_paths(&self) -> Vec<String> {
        match self {
            MergeError::MergeConflict { conflicts } => {
                conflicts.iter().map(|c| c.path.clone()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
