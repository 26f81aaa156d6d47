use thiserror::Error;
use twig_dag::DagError;
use twig_diff::DiffError;
use twig_merge::{Conflict, MergeError};
use twig_refs::{describe_head, RefError};
use twig_store::StoreError;
use twig_tree::TreeError;
use twig_types::ObjectId;

fn list(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|c| c.path.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors surfaced by [`Repository`](crate::Repository).
#[derive(Debug, Error)]
pub enum RepoError {
    /// A commit, tree or blob id is not in the object store.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The branch moved between reading its head and publishing. Retryable.
    #[error(
        "branch {branch} moved: expected {}, found {}",
        describe_head(.expected),
        describe_head(.actual)
    )]
    Stale {
        branch: String,
        expected: Option<ObjectId>,
        actual: Option<ObjectId>,
    },

    /// A branch or first commit already exists under this name.
    #[error("branch already exists: {0}")]
    AlreadyExists(String),

    /// No branch is bound under this name.
    #[error("branch not found: {0}")]
    UnknownBranch(String),

    /// The branch exists but has no head commit to merge.
    #[error("branch has no commits: {0}")]
    UnbornBranch(String),

    /// The merge stopped; conflicts are sorted by path.
    #[error("merge conflict: {}", list(.conflicts))]
    MergeConflict { conflicts: Vec<Conflict> },

    /// No file at this path in the snapshot.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// The branch name breaks the naming rules.
    #[error("invalid branch name {name:?}: {reason}")]
    InvalidBranchName { name: String, reason: String },

    /// A directory entry name cannot be stored in a tree.
    #[error("invalid entry name {name:?}: {reason}")]
    InvalidEntryName { name: String, reason: String },

    /// Directory nesting passed the configured limit.
    #[error("tree nested too deeply at {path:?} (limit {limit})")]
    TooDeep { path: String, limit: usize },

    /// Any other object store failure.
    #[error("store error: {0}")]
    Store(StoreError),

    /// Configuration could not be read or is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// A lower layer failed in a way callers cannot act on.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RepoError {
    /// Only a lost compare-and-swap race is worth retrying as is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RepoError::Stale { .. })
    }

    /// Conflicting paths of a failed merge, sorted.
    pub fn conflict_paths(&self) -> Vec<String> {
        match self {
            RepoError::MergeConflict { conflicts } => {
                conflicts.iter().map(|c| c.path.clone()).collect()
            }
            _ => Vec::new(),
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => RepoError::NotFound(id),
            other => RepoError::Store(other),
        }
    }
}

impl From<TreeError> for RepoError {
    fn from(e: TreeError) -> Self {
        match e {
            TreeError::InvalidEntryName { name, reason } => {
                RepoError::InvalidEntryName { name, reason }
            }
            TreeError::TooDeep { path, limit } => RepoError::TooDeep { path, limit },
            TreeError::FileNotFound(path) => RepoError::FileNotFound(path),
            TreeError::Store(e) => e.into(),
        }
    }
}

impl From<DagError> for RepoError {
    fn from(e: DagError) -> Self {
        match e {
            DagError::Store(e) => e.into(),
            other @ DagError::TooManyParents { .. } => RepoError::Internal(other.to_string()),
        }
    }
}

impl From<RefError> for RepoError {
    fn from(e: RefError) -> Self {
        match e {
            RefError::Stale {
                name,
                expected,
                actual,
            } => RepoError::Stale {
                branch: name,
                expected,
                actual,
            },
            RefError::AlreadyExists { name } => RepoError::AlreadyExists(name),
            RefError::InvalidBranchName { name, reason } => {
                RepoError::InvalidBranchName { name, reason }
            }
            RefError::Dag(e) => e.into(),
            other @ RefError::LockPoisoned(_) => RepoError::Internal(other.to_string()),
        }
    }
}

impl From<DiffError> for RepoError {
    fn from(e: DiffError) -> Self {
        match e {
            DiffError::Store(e) => e.into(),
            DiffError::Tree(e) => e.into(),
        }
    }
}

impl From<MergeError> for RepoError {
    fn from(e: MergeError) -> Self {
        match e {
            MergeError::UnbornBranch(name) => RepoError::UnbornBranch(name),
            MergeError::MergeConflict { conflicts } => RepoError::MergeConflict { conflicts },
            MergeError::Store(e) => e.into(),
            MergeError::Tree(e) => e.into(),
            MergeError::Dag(e) => e.into(),
            MergeError::Ref(e) => e.into(),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
