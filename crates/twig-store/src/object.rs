use serde::{Deserialize, Serialize};
use twig_crypto::ContentHasher;
use twig_types::{ObjectId, Signature};

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Raw file content.
    Blob,
    /// Directory listing.
    Tree,
    /// Snapshot plus history links.
    Commit,
}

impl ObjectKind {
    fn hasher(self) -> &'static ContentHasher {
        match self {
            Self::Blob => &ContentHasher::BLOB,
            Self::Tree => &ContentHasher::TREE,
            Self::Commit => &ContentHasher::COMMIT,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::Tree => write!(f, "tree"),
            Self::Commit => write!(f, "commit"),
        }
    }
}

/// A stored object: kind tag + serialized data + cached size.
///
/// `StoredObject` is the unit of storage. Backends key it by
/// [`StoredObject::compute_id`] and never look inside `data`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
    pub size: u64,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Content address of this object under its kind's hash domain.
    pub fn compute_id(&self) -> ObjectId {
        self.kind.hasher().hash(&self.data)
    }

    fn expect_kind(&self, kind: ObjectKind) -> StoreResult<()> {
        if self.kind != kind {
            return Err(StoreError::CorruptObject {
                id: self.compute_id(),
                reason: format!("expected {kind}, got {}", self.kind),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// File content. Identity is the hash of the bytes and nothing else.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Blob)?;
        Ok(Self {
            data: obj.data.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Why `name` cannot be a single tree entry, or `None` if it can.
pub fn entry_name_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("name must not be empty")
    } else if name == "." || name == ".." {
        Some("name must not be '.' or '..'")
    } else if name.contains('/') {
        Some("name must not contain '/'")
    } else if name.contains('\0') {
        Some("name must not contain NUL")
    } else {
        None
    }
}

/// What a tree entry points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntryKind {
    Blob,
    Tree,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::Tree => write!(f, "tree"),
        }
    }
}

/// A single named entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    pub kind: EntryKind,
    pub object_id: ObjectId,
}

impl TreeEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind, object_id: ObjectId) -> Self {
        Self {
            name: name.into(),
            kind,
            object_id,
        }
    }

    pub fn blob(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self::new(name, EntryKind::Blob, object_id)
    }

    pub fn tree(name: impl Into<String>, object_id: ObjectId) -> Self {
        Self::new(name, EntryKind::Tree, object_id)
    }

    pub fn is_tree(&self) -> bool {
        self.kind == EntryKind::Tree
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name
            .cmp(&other.name)
            .then(self.kind.cmp(&other.kind))
            .then(self.object_id.cmp(&other.object_id))
    }
}

/// One directory level.
///
/// Entries are kept sorted by name so that the serialized form, and thus the
/// id, depends only on the entry set and never on insertion order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort();
        Self { entries }
    }

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Encode the tree. Fails with [`StoreError::CorruptObject`] on a tree
    /// that decoding would reject, so nothing unreadable reaches a store.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let data =
            serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let obj = StoredObject::new(ObjectKind::Tree, data);
        self.check_entries(&obj)?;
        Ok(obj)
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Tree)?;
        let tree: Self = serde_json::from_slice(&obj.data)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        tree.check_entries(obj)?;
        Ok(tree)
    }

    /// Names must be valid and strictly ascending, hence unique.
    fn check_entries(&self, obj: &StoredObject) -> StoreResult<()> {
        let corrupt = |reason: String| StoreError::CorruptObject {
            id: obj.compute_id(),
            reason,
        };
        for entry in &self.entries {
            if let Some(problem) = entry_name_problem(&entry.name) {
                return Err(corrupt(format!("entry {:?}: {problem}", entry.name)));
            }
        }
        if let Some(pair) = self.entries.windows(2).find(|w| w[0].name >= w[1].name) {
            return Err(corrupt(format!(
                "tree entries are not strictly sorted by name at {:?}",
                pair[1].name
            )));
        }
        Ok(())
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// Maximum number of parents a commit may record.
pub const MAX_PARENTS: usize = 2;

/// Immutable history node.
///
/// `parents` is ordered: for a merge commit the first parent is the branch
/// that was merged into ("ours") and the second is the branch merged from
/// ("theirs"). Parent order is part of the hashed content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

impl Commit {
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn first_parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let data =
            serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoredObject::new(ObjectKind::Commit, data))
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Commit)?;
        let commit: Self = serde_json::from_slice(&obj.data)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        if commit.parents.len() > MAX_PARENTS {
            return Err(StoreError::CorruptObject {
                id: obj.compute_id(),
                reason: format!("commit records {} parents", commit.parents.len()),
            });
        }
        Ok(commit)
    }
}
