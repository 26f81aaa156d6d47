use serde::{Deserialize, Serialize};
use twig_refs::UpdateResult;
use twig_types::ObjectId;

/// Result of a commit operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    /// The new commit, now the branch head.
    pub commit: ObjectId,
    /// Root tree of the committed snapshot.
    pub tree: ObjectId,
    /// How the branch moved.
    pub update: UpdateResult,
}
