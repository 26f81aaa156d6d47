//! Diff engine for Twig.
//!
//! Compares two snapshot trees and reports what happened to each file path.
//! Subtrees with identical ids are skipped without being read, so the cost
//! of a diff follows the size of the change rather than of the snapshot.
//!
//! # Key Types
//!
//! - [`TreeDiff`] / [`TreeChange`] -- file-level changes between two trees

pub mod error;
pub mod tree_diff;

pub use error::{DiffError, DiffResult};
pub use tree_diff::{diff_trees, diff_trees_with_limits, TreeChange, TreeDiff};
