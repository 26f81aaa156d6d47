//! Commit graph for Twig.
//!
//! Commits are immutable nodes stored in the object store; the graph is
//! never materialized separately. Every query here is a pure function over
//! an [`ObjectStore`](twig_store::ObjectStore), so it can be exercised
//! against a small hand-built in-memory history.
//!
//! - [`create_commit`] / [`load_commit`] -- append and fetch nodes
//! - [`is_ancestor`] / [`is_first_parent_descendant`] -- reachability
//! - [`merge_base`] -- lowest common ancestor of two commits
//! - [`history`] -- every reachable commit, newest first

pub mod commit;
pub mod error;
pub mod graph;

pub use commit::{create_commit, load_commit, CommitInfo};
pub use error::{DagError, DagResult};
pub use graph::{history, is_ancestor, is_first_parent_descendant, merge_base};
