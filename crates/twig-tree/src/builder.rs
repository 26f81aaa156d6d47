//! Directory → tree object serialization.

use serde::{Deserialize, Serialize};
use tracing::debug;
use twig_store::{entry_name_problem, ObjectStore, Tree, TreeEntry};
use twig_types::ObjectId;

use crate::directory::{join_path, Directory, Node};
use crate::error::{TreeError, TreeResult};

/// Default bound on directory nesting below the root.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Resource limits shared by tree building, reading, and merging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeLimits {
    /// Maximum number of directory levels below the root.
    pub max_depth: usize,
}

impl Default for TreeLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl TreeLimits {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Fail with [`TreeError::TooDeep`] if `depth` is past the limit.
    pub fn check_depth(&self, depth: usize, path: &str) -> TreeResult<()> {
        if depth > self.max_depth {
            return Err(TreeError::TooDeep {
                path: path.to_string(),
                limit: self.max_depth,
            });
        }
        Ok(())
    }
}

/// Check that `name` can be stored as a single tree entry.
pub fn validate_entry_name(name: &str) -> TreeResult<()> {
    match entry_name_problem(name) {
        None => Ok(()),
        Some(reason) => Err(TreeError::InvalidEntryName {
            name: name.to_string(),
            reason: reason.into(),
        }),
    }
}

/// Store `dir` as a tree object graph and return the root tree id.
///
/// Children are written before their parents, so every tree entry refers to
/// an object that is already in the store. Building the same directory twice
/// yields the same id and writes nothing new the second time.
pub fn build_tree(
    store: &dyn ObjectStore,
    dir: &Directory,
    limits: TreeLimits,
) -> TreeResult<ObjectId> {
    let id = build_level(store, dir, "", 0, limits)?;
    debug!(tree = %id.short_hex(), files = dir.file_count(), "built snapshot tree");
    Ok(id)
}

fn build_level(
    store: &dyn ObjectStore,
    dir: &Directory,
    path: &str,
    depth: usize,
    limits: TreeLimits,
) -> TreeResult<ObjectId> {
    limits.check_depth(depth, path)?;

    let mut entries = Vec::with_capacity(dir.len());
    for (name, node) in dir.entries() {
        validate_entry_name(name)?;
        let entry = match node {
            Node::File(bytes) => TreeEntry::blob(name, store.put_blob(bytes)?),
            Node::Dir(child) => {
                let child_path = join_path(path, name);
                let child_id = build_level(store, child, &child_path, depth + 1, limits)?;
                TreeEntry::tree(name, child_id)
            }
        };
        entries.push(entry);
    }

    Ok(store.put_tree(&Tree::new(entries))?)
}
