//! Three-way merge of snapshot trees.
//!
//! Every entry name present in any of (base, ours, theirs) is decided on its
//! own:
//!
//! | situation                         | result              |
//! |-----------------------------------|---------------------|
//! | ours == theirs                    | ours                |
//! | ours == base                      | theirs (even gone)  |
//! | theirs == base                    | ours (even gone)    |
//! | both changed, both directories    | recurse             |
//! | anything else                     | [`Conflict`]        |
//!
//! Files are never merged line by line. A conflicted merge makes no commit
//! or ref update, though subtrees that merged cleanly may already be stored.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use twig_store::{EntryKind, ObjectStore, Tree, TreeEntry};
use twig_tree::TreeLimits;
use twig_types::ObjectId;

use crate::error::MergeResult;

/// Why a path could not be merged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Both sides changed an existing file differently.
    BothModified,
    /// Both sides added the path with different content.
    BothAdded,
    /// Ours changed the path, theirs deleted it.
    ModifyDelete,
    /// Ours deleted the path, theirs changed it.
    DeleteModify,
    /// One side has a file where the other has a directory.
    KindMismatch,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConflictKind::BothModified => "both modified",
            ConflictKind::BothAdded => "both added",
            ConflictKind::ModifyDelete => "modified by us, deleted by them",
            ConflictKind::DeleteModify => "deleted by us, modified by them",
            ConflictKind::KindMismatch => "file/directory mismatch",
        };
        f.write_str(label)
    }
}

/// A path the merge could not decide.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub path: String,
    pub kind: ConflictKind,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.kind)
    }
}

/// Outcome of [`merge_trees`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeMerge {
    /// The merged tree, already stored.
    Clean(ObjectId),
    /// Every conflicting path, sorted.
    Conflicted(Vec<Conflict>),
}

impl TreeMerge {
    pub fn is_clean(&self) -> bool {
        matches!(self, TreeMerge::Clean(_))
    }
}

/// Merge `theirs` into `ours` relative to `base`.
///
/// `base = None` merges against the empty tree, which is what unrelated
/// histories get. Nesting is bounded by `limits`.
pub fn merge_trees(
    store: &dyn ObjectStore,
    base: Option<ObjectId>,
    ours: ObjectId,
    theirs: ObjectId,
    limits: TreeLimits,
) -> MergeResult<TreeMerge> {
    if ours == theirs || base == Some(theirs) {
        return Ok(TreeMerge::Clean(ours));
    }
    if base == Some(ours) {
        return Ok(TreeMerge::Clean(theirs));
    }

    let mut merger = Merger {
        store,
        limits,
        conflicts: Vec::new(),
    };
    let merged = merger.merge_level("", 0, base.as_ref(), &ours, &theirs)?;

    match merged {
        Some(id) if merger.conflicts.is_empty() => {
            debug!(tree = %id.short_hex(), "merged trees cleanly");
            Ok(TreeMerge::Clean(id))
        }
        _ => {
            let mut conflicts = merger.conflicts;
            conflicts.sort_by(|a, b| a.path.cmp(&b.path));
            debug!(conflicts = conflicts.len(), "tree merge conflicted");
            Ok(TreeMerge::Conflicted(conflicts))
        }
    }
}

/// What one side holds at a name.
type Slot = Option<(EntryKind, ObjectId)>;

fn slot(entry: Option<&TreeEntry>) -> Slot {
    entry.map(|e| (e.kind, e.object_id))
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

struct Merger<'a> {
    store: &'a dyn ObjectStore,
    limits: TreeLimits,
    conflicts: Vec<Conflict>,
}

impl Merger<'_> {
    fn load(&self, id: Option<&ObjectId>) -> MergeResult<BTreeMap<String, TreeEntry>> {
        let Some(id) = id else {
            return Ok(BTreeMap::new());
        };
        Ok(self
            .store
            .get_tree(id)?
            .entries
            .into_iter()
            .map(|e| (e.name.clone(), e))
            .collect())
    }

    /// Merge one directory level. Returns the stored tree id, or `None` if
    /// anything at or below this level conflicted.
    fn merge_level(
        &mut self,
        path: &str,
        depth: usize,
        base: Option<&ObjectId>,
        ours: &ObjectId,
        theirs: &ObjectId,
    ) -> MergeResult<Option<ObjectId>> {
        self.limits.check_depth(depth, path)?;

        let base_entries = self.load(base)?;
        let our_entries = self.load(Some(ours))?;
        let their_entries = self.load(Some(theirs))?;

        let names: BTreeSet<&String> = base_entries
            .keys()
            .chain(our_entries.keys())
            .chain(their_entries.keys())
            .collect();

        let conflicts_before = self.conflicts.len();
        let mut merged = Vec::with_capacity(names.len());
        for name in names {
            let b = slot(base_entries.get(name));
            let o = slot(our_entries.get(name));
            let t = slot(their_entries.get(name));

            let resolved = if o == t || t == b {
                o
            } else if o == b {
                t
            } else {
                let child_path = join(path, name);
                match (b, o, t) {
                    (_, Some((EntryKind::Tree, o_id)), Some((EntryKind::Tree, t_id))) => {
                        let base_tree = match b {
                            Some((EntryKind::Tree, b_id)) => Some(b_id),
                            _ => None,
                        };
                        self.merge_level(&child_path, depth + 1, base_tree.as_ref(), &o_id, &t_id)?
                            .map(|id| (EntryKind::Tree, id))
                    }
                    _ => {
                        self.conflicts.push(Conflict {
                            path: child_path,
                            kind: classify(b, o, t),
                        });
                        None
                    }
                }
            };

            if let Some((kind, id)) = resolved {
                merged.push(TreeEntry::new(name.as_str(), kind, id));
            }
        }

        if self.conflicts.len() > conflicts_before {
            return Ok(None);
        }
        Ok(Some(self.store.put_tree(&Tree::new(merged))?))
    }
}

/// Name the conflict for a slot where both sides diverged from base.
fn classify(base: Slot, ours: Slot, theirs: Slot) -> ConflictKind {
    match (base, ours, theirs) {
        (_, Some((ok, _)), Some((tk, _))) if ok != tk => ConflictKind::KindMismatch,
        (None, Some(_), Some(_)) => ConflictKind::BothAdded,
        (Some(_), Some(_), None) => ConflictKind::ModifyDelete,
        (Some(_), None, Some(_)) => ConflictKind::DeleteModify,
        _ => ConflictKind::BothModified,
    }
}
