use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;
use twig_types::ObjectId;

use crate::error::StoreResult;
use crate::object::{ObjectKind, StoredObject};
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. All objects are held behind a `RwLock`;
/// objects are cloned on read and write.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Number of stored objects of one kind.
    pub fn count_kind(&self, kind: ObjectKind) -> usize {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|obj| obj.kind == kind)
            .count()
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|obj| obj.size)
            .sum()
    }

    /// Sorted list of all object ids in the store.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let map = self.objects.read().expect("lock poisoned");
        let mut ids: Vec<ObjectId> = map.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let mut map = self.objects.write().expect("lock poisoned");
        if let Entry::Vacant(slot) = map.entry(id) {
            debug!(id = %id.short_hex(), kind = %object.kind, size = object.size, "stored object");
            slot.insert(object.clone());
        }
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}
