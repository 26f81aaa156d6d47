//! Content hashing for Twig.
//!
//! Wraps BLAKE3 with per-kind domain tags so that a blob, a tree, and a
//! commit with byte-identical payloads never share an address.

pub mod hasher;

pub use hasher::ContentHasher;
