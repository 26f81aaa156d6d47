//! The [`RefStore`] trait defining the branch table interface.

use twig_types::ObjectId;

use crate::error::RefResult;

/// Storage backend for branch heads.
///
/// A branch is either absent, bound but unborn (`None`), or bound to a
/// commit id. Implementations must be thread-safe and must apply
/// [`compare_and_swap`](RefStore::compare_and_swap) atomically: the
/// comparison and the write happen under one exclusive section.
pub trait RefStore: Send + Sync {
    /// Current head of `name`. Unknown and unborn branches both give `None`.
    fn head(&self, name: &str) -> RefResult<Option<ObjectId>>;

    /// Whether `name` is bound, including as an unborn branch.
    fn contains(&self, name: &str) -> RefResult<bool>;

    /// Bind a new branch. Fails with `AlreadyExists` if `name` is bound.
    fn create(&self, name: &str, head: Option<ObjectId>) -> RefResult<()>;

    /// Move `name` to `new` if and only if its head is currently `expected`.
    ///
    /// An unknown branch has head `None`, so `expected = None` creates it.
    /// On mismatch nothing is written and `Stale` reports what was found.
    fn compare_and_swap(
        &self,
        name: &str,
        expected: Option<ObjectId>,
        new: ObjectId,
    ) -> RefResult<()>;

    /// All bound branch names, sorted.
    fn list(&self) -> RefResult<Vec<String>>;
}
