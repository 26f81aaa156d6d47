//! Commit creation and lookup.

use serde::{Deserialize, Serialize};
use tracing::debug;
use twig_store::{Commit, ObjectStore, MAX_PARENTS};
use twig_types::{ObjectId, Signature};

use crate::error::{DagError, DagResult};

/// A commit together with its id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub id: ObjectId,
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

impl CommitInfo {
    pub fn new(id: ObjectId, commit: Commit) -> Self {
        Self {
            id,
            tree: commit.tree,
            parents: commit.parents,
            author: commit.author,
            committer: commit.committer,
            message: commit.message,
        }
    }

    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// Build and store a commit node.
///
/// Parents are recorded by id only; whether they exist is the caller's
/// concern. `parents` is ordered, and for merges the first entry is the
/// branch being merged into.
pub fn create_commit(
    store: &dyn ObjectStore,
    tree: ObjectId,
    parents: &[ObjectId],
    author: Signature,
    committer: Signature,
    message: impl Into<String>,
) -> DagResult<ObjectId> {
    if parents.len() > MAX_PARENTS {
        return Err(DagError::TooManyParents {
            count: parents.len(),
        });
    }

    let commit = Commit {
        tree,
        parents: parents.to_vec(),
        author,
        committer,
        message: message.into(),
    };
    let id = store.put_commit(&commit)?;
    debug!(
        commit = %id.short_hex(),
        tree = %tree.short_hex(),
        parents = parents.len(),
        "created commit"
    );
    Ok(id)
}

/// Fetch a commit that must exist.
pub fn load_commit(store: &dyn ObjectStore, id: &ObjectId) -> DagResult<CommitInfo> {
    let commit = store.get_commit(id)?;
    Ok(CommitInfo::new(*id, commit))
}
