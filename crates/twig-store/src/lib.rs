//! Content-addressed object storage for Twig.
//!
//! Every piece of repository data (file contents, directory listings, commit
//! nodes) is stored as an immutable object identified by the BLAKE3 hash of
//! its kind and bytes. This crate defines the object kinds, their canonical
//! encodings, and the [`ObjectStore`] interface the rest of the workspace is
//! written against.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw file content
//! - [`Tree`] -- one directory level: sorted [`TreeEntry`] list
//! - [`Commit`] -- tree snapshot plus parents and authorship
//!
//! # Storage Backends
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! Durable backends live outside this workspace and only need to implement
//! [`ObjectStore::read`], [`ObjectStore::write`] and [`ObjectStore::exists`].
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written.
//! 2. Writing identical content twice is a no-op returning the same id.
//! 3. Concurrent reads and concurrent identical writes are always safe.
//! 4. The store never interprets object contents; typed codecs sit on top.

pub mod error;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryObjectStore;
pub use object::{
    entry_name_problem, Blob, Commit, EntryKind, ObjectKind, StoredObject, Tree, TreeEntry,
    MAX_PARENTS,
};
pub use traits::ObjectStore;
