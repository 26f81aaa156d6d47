use twig_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{Blob, Commit, ObjectKind, StoredObject, Tree};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. The same kind and bytes always
///   produce the same id.
/// - `write` is idempotent and safe to call concurrently with identical
///   content.
/// - Concurrent reads are always safe.
/// - The store never interprets object contents.
/// - All backend errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read an object by id.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content-addressed id.
    ///
    /// If the object already exists, this is a no-op.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Store `data` as an object of `kind` and return its id.
    fn put(&self, kind: ObjectKind, data: Vec<u8>) -> StoreResult<ObjectId> {
        self.write(&StoredObject::new(kind, data))
    }

    /// Fetch an object that must exist.
    ///
    /// Fails with [`StoreError::NotFound`] when absent and with
    /// [`StoreError::HashMismatch`] when the backend hands back bytes that do
    /// not hash to `id`.
    fn get(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        let object = self.read(id)?.ok_or(StoreError::NotFound(*id))?;
        let computed = object.compute_id();
        if computed != *id {
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(object)
    }

    fn put_blob(&self, data: &[u8]) -> StoreResult<ObjectId> {
        self.write(&Blob::new(data.to_vec()).to_stored_object())
    }

    fn get_blob(&self, id: &ObjectId) -> StoreResult<Blob> {
        Blob::from_stored_object(&self.get(id)?)
    }

    fn put_tree(&self, tree: &Tree) -> StoreResult<ObjectId> {
        self.write(&tree.to_stored_object()?)
    }

    fn get_tree(&self, id: &ObjectId) -> StoreResult<Tree> {
        Tree::from_stored_object(&self.get(id)?)
    }

    fn put_commit(&self, commit: &Commit) -> StoreResult<ObjectId> {
        self.write(&commit.to_stored_object()?)
    }

    fn get_commit(&self, id: &ObjectId) -> StoreResult<Commit> {
        Commit::from_stored_object(&self.get(id)?)
    }

    /// Read multiple objects in a batch.
    ///
    /// Default implementation calls `read()` for each id. Backends may
    /// override for fewer round-trips.
    fn read_batch(&self, ids: &[ObjectId]) -> StoreResult<Vec<Option<StoredObject>>> {
        ids.iter().map(|id| self.read(id)).collect()
    }

    /// Write multiple objects in a batch and return their ids.
    fn write_batch(&self, objects: &[StoredObject]) -> StoreResult<Vec<ObjectId>> {
        objects.iter().map(|obj| self.write(obj)).collect()
    }
}
