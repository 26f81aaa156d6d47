//! Tree-level diff: compare two snapshots and list file-level changes.
//!
//! Entries are matched by name at every level. Directories are descended
//! rather than reported, so every change names a file path, except for
//! [`TreeChange::KindChanged`] where a path switched between file and
//! directory. Renames are detected by exact content: a deleted file and an
//! added file with the same blob id pair up.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;
use twig_store::{EntryKind, ObjectStore, Tree, TreeEntry};
use twig_tree::TreeLimits;
use twig_types::ObjectId;

use crate::error::DiffResult;

/// The result of comparing two trees.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDiff {
    /// Changes sorted by [`TreeChange::path`].
    pub changes: Vec<TreeChange>,
}

impl TreeDiff {
    /// Create an empty tree diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// The change touching `path`, if any.
    pub fn get(&self, path: &str) -> Option<&TreeChange> {
        self.changes.iter().find(|c| c.path() == path)
    }
}

/// A single change between two trees.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeChange {
    /// A file appeared.
    Added { path: String, new_id: ObjectId },
    /// A file disappeared.
    Deleted { path: String, old_id: ObjectId },
    /// A file's content changed in place.
    Modified {
        path: String,
        old_id: ObjectId,
        new_id: ObjectId,
    },
    /// A file moved with its content unchanged.
    Renamed {
        old_path: String,
        new_path: String,
        id: ObjectId,
    },
    /// A path switched between file and directory.
    KindChanged {
        path: String,
        old_kind: EntryKind,
        new_kind: EntryKind,
        old_id: ObjectId,
        new_id: ObjectId,
    },
}

impl TreeChange {
    /// The path this change is reported under (the new path for renames).
    pub fn path(&self) -> &str {
        match self {
            TreeChange::Added { path, .. }
            | TreeChange::Deleted { path, .. }
            | TreeChange::Modified { path, .. }
            | TreeChange::KindChanged { path, .. } => path,
            TreeChange::Renamed { new_path, .. } => new_path,
        }
    }
}

/// Compare two trees and produce a diff.
///
/// - `old_tree`: the previous tree (or `None` for an empty tree).
/// - `new_tree`: the current tree ID.
pub fn diff_trees(
    store: &dyn ObjectStore,
    old_tree: Option<&ObjectId>,
    new_tree: &ObjectId,
) -> DiffResult<TreeDiff> {
    diff_trees_with_limits(store, old_tree, new_tree, TreeLimits::default())
}

/// [`diff_trees`] with an explicit nesting limit.
pub fn diff_trees_with_limits(
    store: &dyn ObjectStore,
    old_tree: Option<&ObjectId>,
    new_tree: &ObjectId,
    limits: TreeLimits,
) -> DiffResult<TreeDiff> {
    let mut walk = Walk {
        store,
        limits,
        changes: Vec::new(),
        deleted: Vec::new(),
        added: Vec::new(),
    };

    if old_tree != Some(new_tree) {
        let old = match old_tree {
            Some(id) => load_entries(store, id)?,
            None => BTreeMap::new(),
        };
        let new = load_entries(store, new_tree)?;
        walk.compare("", 0, &old, &new)?;
    }

    let diff = walk.finish();
    debug!(
        old = ?old_tree.map(|id| id.short_hex()),
        new = %new_tree.short_hex(),
        changes = diff.len(),
        "diffed trees"
    );
    Ok(diff)
}

fn load_entries(
    store: &dyn ObjectStore,
    tree_id: &ObjectId,
) -> DiffResult<BTreeMap<String, TreeEntry>> {
    let tree: Tree = store.get_tree(tree_id)?;
    Ok(tree
        .entries
        .into_iter()
        .map(|e| (e.name.clone(), e))
        .collect())
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

struct Walk<'a> {
    store: &'a dyn ObjectStore,
    limits: TreeLimits,
    changes: Vec<TreeChange>,
    /// Removed files awaiting rename pairing, as (path, blob id).
    deleted: Vec<(String, ObjectId)>,
    added: Vec<(String, ObjectId)>,
}

impl Walk<'_> {
    fn compare(
        &mut self,
        prefix: &str,
        depth: usize,
        old: &BTreeMap<String, TreeEntry>,
        new: &BTreeMap<String, TreeEntry>,
    ) -> DiffResult<()> {
        self.limits.check_depth(depth, prefix)?;

        for (name, old_entry) in old {
            let path = join(prefix, name);
            match new.get(name) {
                None => self.collect_files(&path, depth, old_entry, Side::Deleted)?,
                Some(new_entry) if new_entry == old_entry => {}
                Some(new_entry) => match (old_entry.kind, new_entry.kind) {
                    (EntryKind::Blob, EntryKind::Blob) => self.changes.push(TreeChange::Modified {
                        path,
                        old_id: old_entry.object_id,
                        new_id: new_entry.object_id,
                    }),
                    (EntryKind::Tree, EntryKind::Tree) => {
                        let old_children = load_entries(self.store, &old_entry.object_id)?;
                        let new_children = load_entries(self.store, &new_entry.object_id)?;
                        self.compare(&path, depth + 1, &old_children, &new_children)?;
                    }
                    (old_kind, new_kind) => self.changes.push(TreeChange::KindChanged {
                        path,
                        old_kind,
                        new_kind,
                        old_id: old_entry.object_id,
                        new_id: new_entry.object_id,
                    }),
                },
            }
        }

        for (name, new_entry) in new {
            if !old.contains_key(name) {
                self.collect_files(&join(prefix, name), depth, new_entry, Side::Added)?;
            }
        }
        Ok(())
    }

    /// Record every file under an entry that exists on one side only.
    fn collect_files(
        &mut self,
        path: &str,
        depth: usize,
        entry: &TreeEntry,
        side: Side,
    ) -> DiffResult<()> {
        match entry.kind {
            EntryKind::Blob => {
                let slot = match side {
                    Side::Deleted => &mut self.deleted,
                    Side::Added => &mut self.added,
                };
                slot.push((path.to_string(), entry.object_id));
            }
            EntryKind::Tree => {
                self.limits.check_depth(depth + 1, path)?;
                for (name, child) in load_entries(self.store, &entry.object_id)? {
                    self.collect_files(&join(path, &name), depth + 1, &child, side)?;
                }
            }
        }
        Ok(())
    }

    fn finish(mut self) -> TreeDiff {
        // Pair deletions with additions of identical content, first come
        // first served in path order.
        let mut unmatched: HashMap<ObjectId, Vec<String>> = HashMap::new();
        for (path, id) in self.deleted {
            unmatched.entry(id).or_default().push(path);
        }
        for paths in unmatched.values_mut() {
            paths.sort();
            paths.reverse();
        }

        self.added.sort();
        for (new_path, id) in self.added {
            match unmatched.get_mut(&id).and_then(Vec::pop) {
                Some(old_path) => self.changes.push(TreeChange::Renamed {
                    old_path,
                    new_path,
                    id,
                }),
                None => self.changes.push(TreeChange::Added {
                    path: new_path,
                    new_id: id,
                }),
            }
        }
        for (id, paths) in unmatched {
            self.changes.extend(
                paths
                    .into_iter()
                    .map(|path| TreeChange::Deleted { path, old_id: id }),
            );
        }

        self.changes.sort_by(|a, b| a.path().cmp(b.path()));
        TreeDiff {
            changes: self.changes,
        }
    }
}

#[derive(Clone, Copy)]
enum Side {
    Deleted,
    Added,
}
