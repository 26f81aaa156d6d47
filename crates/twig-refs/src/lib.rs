//! Branch pointer table for Twig.
//!
//! Branches are the only mutable state in a repository: a name bound to the
//! id of its head commit, or to nothing while the branch is unborn. Every
//! change after creation goes through [`RefStore::compare_and_swap`], so two
//! writers racing on the same head cannot both win.
//!
//! # Modules
//!
//! - [`error`] -- Error types for ref operations
//! - [`names`] -- Branch name validation
//! - [`traits`] -- The [`RefStore`] trait defining the storage interface
//! - [`memory`] -- In-memory [`InMemoryRefStore`]
//! - [`update`] -- [`advance`], which classifies an update before applying it

pub mod error;
pub mod memory;
pub mod names;
pub mod traits;
pub mod update;

pub use error::{describe_head, RefError, RefResult};
pub use memory::InMemoryRefStore;
pub use names::validate_branch_name;
pub use traits::RefStore;
pub use update::{advance, UpdateResult};
