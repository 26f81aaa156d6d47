//! Merge engine for Twig.
//!
//! Implements three-way merge of snapshot trees at whole-file granularity and
//! the branch-level operation that turns a clean merge into a two-parent
//! commit.
//!
//! - [`merge_trees`] -- pure merge of three trees into a [`TreeMerge`]
//! - [`merge_branches`] -- merge one branch into another and advance it

pub mod branch;
pub mod error;
pub mod tree_merge;

pub use branch::{merge_branches, MergeOutcome};
pub use error::{MergeError, MergeResult};
pub use tree_merge::{merge_trees, Conflict, ConflictKind, TreeMerge};
