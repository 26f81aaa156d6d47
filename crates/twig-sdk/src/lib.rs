//! High-level API for Twig.
//!
//! [`Repository`] ties the object store, the commit graph, the branch table,
//! and the merge engine together behind the operations an application
//! actually calls: commit a directory to a branch, branch off, merge, and
//! read snapshots back.

pub mod commit;
pub mod config;
pub mod error;
pub mod repository;

pub use commit::CommitReceipt;
pub use config::RepoConfig;
pub use error::{RepoError, RepoResult};
pub use repository::Repository;

// Re-export key types
pub use twig_dag::CommitInfo;
pub use twig_diff::{TreeChange, TreeDiff};
pub use twig_merge::{Conflict, ConflictKind, MergeOutcome};
pub use twig_refs::UpdateResult;
pub use twig_tree::{Directory, Node};
pub use twig_types::{Identity, ObjectId, Signature, Timestamp};
