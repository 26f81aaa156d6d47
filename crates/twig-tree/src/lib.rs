//! Snapshot trees for Twig.
//!
//! Converts between the caller-owned [`Directory`] model and the
//! hash-addressed tree/blob object graph in an
//! [`ObjectStore`](twig_store::ObjectStore).
//!
//! - [`build_tree`] -- post-order serialization of a `Directory`
//! - [`read_tree`] / [`read_file`] / [`list_paths`] -- the inverse direction
//!
//! Both directions share [`TreeLimits`], which bounds nesting depth so that
//! adversarial input cannot grow the stack without bound.

pub mod builder;
pub mod directory;
pub mod error;
pub mod reader;

pub use builder::{build_tree, validate_entry_name, TreeLimits, DEFAULT_MAX_DEPTH};
pub use directory::{Directory, Node};
pub use error::{TreeError, TreeResult};
pub use reader::{list_paths, open_file, read_file, read_tree};
