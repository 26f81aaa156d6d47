//! Foundation types for Twig.
//!
//! Every other Twig crate depends on `twig-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- content address of a stored object (BLAKE3 digest)
//! - [`Identity`] / [`Signature`] -- commit authorship
//! - [`Timestamp`] -- wall-clock milliseconds recorded in signatures

pub mod error;
pub mod identity;
pub mod object;
pub mod temporal;

pub use error::TypeError;
pub use identity::{Identity, Signature};
pub use object::ObjectId;
pub use temporal::Timestamp;
