//! In-memory branch table.
//!
//! [`InMemoryRefStore`] keeps every binding in a `HashMap` behind a
//! `RwLock`. Reads share the lock; creation and CAS take it exclusively, so
//! the compare and the write of one update can never interleave with another.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};
use twig_types::ObjectId;

use crate::error::{RefError, RefResult};
use crate::names::validate_branch_name;
use crate::traits::RefStore;

/// An in-memory implementation of [`RefStore`].
///
/// A `None` value is a branch that was created unborn. Data is lost when the
/// store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    heads: RwLock<HashMap<String, Option<ObjectId>>>,
}

impl InMemoryRefStore {
    /// Create a new empty ref store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read_heads(&self) -> RefResult<RwLockReadGuard<'_, HashMap<String, Option<ObjectId>>>> {
        self.heads
            .read()
            .map_err(|e| RefError::LockPoisoned(e.to_string()))
    }

    fn write_heads(&self) -> RefResult<RwLockWriteGuard<'_, HashMap<String, Option<ObjectId>>>> {
        self.heads
            .write()
            .map_err(|e| RefError::LockPoisoned(e.to_string()))
    }
}

impl RefStore for InMemoryRefStore {
    fn head(&self, name: &str) -> RefResult<Option<ObjectId>> {
        Ok(self.read_heads()?.get(name).copied().flatten())
    }

    fn contains(&self, name: &str) -> RefResult<bool> {
        Ok(self.read_heads()?.contains_key(name))
    }

    fn create(&self, name: &str, head: Option<ObjectId>) -> RefResult<()> {
        validate_branch_name(name)?;

        let mut heads = self.write_heads()?;
        if heads.contains_key(name) {
            return Err(RefError::AlreadyExists {
                name: name.to_string(),
            });
        }
        heads.insert(name.to_string(), head);
        debug!(branch = name, head = ?head.map(|id| id.short_hex()), "created branch");
        Ok(())
    }

    fn compare_and_swap(
        &self,
        name: &str,
        expected: Option<ObjectId>,
        new: ObjectId,
    ) -> RefResult<()> {
        validate_branch_name(name)?;

        let mut heads = self.write_heads()?;
        let actual = heads.get(name).copied().flatten();
        if actual != expected {
            warn!(
                branch = name,
                expected = ?expected.map(|id| id.short_hex()),
                actual = ?actual.map(|id| id.short_hex()),
                "rejected stale branch update"
            );
            return Err(RefError::Stale {
                name: name.to_string(),
                expected,
                actual,
            });
        }
        heads.insert(name.to_string(), Some(new));
        debug!(branch = name, head = %new.short_hex(), "moved branch");
        Ok(())
    }

    fn list(&self) -> RefResult<Vec<String>> {
        let mut names: Vec<String> = self.read_heads()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn id(tag: &str) -> ObjectId {
        ObjectId::from_bytes(tag.as_bytes())
    }

    #[test]
    fn unknown_branch_has_no_head() {
        let refs = InMemoryRefStore::new();
        assert_eq!(refs.head("master").unwrap(), None);
        assert!(!refs.contains("master").unwrap());
        assert!(refs.list().unwrap().is_empty());
    }

    #[test]
    fn create_unborn_then_bound() {
        let refs = InMemoryRefStore::new();
        refs.create("master", None).unwrap();
        assert!(refs.contains("master").unwrap());
        assert_eq!(refs.head("master").unwrap(), None);

        let err = refs.create("master", Some(id("a"))).unwrap_err();
        assert!(matches!(err, RefError::AlreadyExists { ref name } if name == "master"));
    }

    #[test]
    fn create_rejects_bad_name() {
        let refs = InMemoryRefStore::new();
        let err = refs.create("bad..name", None).unwrap_err();
        assert!(matches!(err, RefError::InvalidBranchName { .. }));
        assert!(refs.list().unwrap().is_empty());
    }

    #[test]
    fn cas_moves_head_when_expected_matches() {
        let refs = InMemoryRefStore::new();
        refs.create("master", Some(id("a"))).unwrap();
        refs.compare_and_swap("master", Some(id("a")), id("b")).unwrap();
        assert_eq!(refs.head("master").unwrap(), Some(id("b")));
    }

    #[test]
    fn cas_with_none_creates_branch() {
        let refs = InMemoryRefStore::new();
        refs.compare_and_swap("develop", None, id("a")).unwrap();
        assert_eq!(refs.head("develop").unwrap(), Some(id("a")));
        assert_eq!(refs.list().unwrap(), vec!["develop"]);
    }

    #[test]
    fn cas_on_unborn_branch() {
        let refs = InMemoryRefStore::new();
        refs.create("master", None).unwrap();
        refs.compare_and_swap("master", None, id("first")).unwrap();
        assert_eq!(refs.head("master").unwrap(), Some(id("first")));
    }

    #[test]
    fn stale_cas_changes_nothing() {
        let refs = InMemoryRefStore::new();
        refs.create("master", Some(id("a"))).unwrap();
        refs.compare_and_swap("master", Some(id("a")), id("b")).unwrap();

        let err = refs
            .compare_and_swap("master", Some(id("a")), id("c"))
            .unwrap_err();
        match err {
            RefError::Stale {
                name,
                expected,
                actual,
            } => {
                assert_eq!(name, "master");
                assert_eq!(expected, Some(id("a")));
                assert_eq!(actual, Some(id("b")));
            }
            other => panic!("expected Stale, got {other:?}"),
        }
        assert_eq!(refs.head("master").unwrap(), Some(id("b")));
    }

    #[test]
    fn list_is_sorted() {
        let refs = InMemoryRefStore::new();
        for name in ["zeta", "alpha", "feature/x", "master"] {
            refs.create(name, None).unwrap();
        }
        assert_eq!(refs.list().unwrap(), vec!["alpha", "feature/x", "master", "zeta"]);
    }

    #[test]
    fn concurrent_cas_has_one_winner() {
        const WRITERS: usize = 8;
        let refs = Arc::new(InMemoryRefStore::new());
        refs.create("master", Some(id("base"))).unwrap();
        let barrier = Arc::new(Barrier::new(WRITERS));

        let handles: Vec<_> = (0..WRITERS)
            .map(|i| {
                let refs = Arc::clone(&refs);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    refs.compare_and_swap("master", Some(id("base")), id(&format!("w{i}")))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, RefError::Stale { .. })));
        assert_ne!(refs.head("master").unwrap(), Some(id("base")));
    }
}
