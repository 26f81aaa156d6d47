//! Classified branch updates.

use serde::{Deserialize, Serialize};
use tracing::debug;
use twig_dag::is_first_parent_descendant;
use twig_store::ObjectStore;
use twig_types::ObjectId;

use crate::error::RefResult;
use crate::traits::RefStore;

/// How a successful update relates the new head to the old one.
///
/// The classification is informational; every kind is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateResult {
    /// The branch had no head before.
    Created,
    /// The old head lies on the new head's first-parent chain.
    FastForward,
    /// Anything else, for example a head moved sideways.
    Forced,
}

/// Classify and apply `name: expected -> new` with compare-and-swap.
///
/// Classification reads commits before the swap; the swap alone decides
/// whether the update wins, and a lost race is returned as `Stale` without
/// retrying.
pub fn advance(
    refs: &dyn RefStore,
    store: &dyn ObjectStore,
    name: &str,
    expected: Option<ObjectId>,
    new: ObjectId,
) -> RefResult<UpdateResult> {
    let kind = match expected {
        None => UpdateResult::Created,
        Some(old) if is_first_parent_descendant(store, &new, &old)? => UpdateResult::FastForward,
        Some(_) => UpdateResult::Forced,
    };

    refs.compare_and_swap(name, expected, new)?;
    debug!(branch = name, head = %new.short_hex(), update = ?kind, "advanced branch");
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RefError;
    use crate::memory::InMemoryRefStore;
    use twig_dag::create_commit;
    use twig_store::{InMemoryObjectStore, Tree};
    use twig_types::{Identity, Timestamp};

    fn commit(store: &InMemoryObjectStore, parents: &[ObjectId], message: &str) -> ObjectId {
        let tree = store.put_tree(&Tree::empty()).unwrap();
        let sig = Identity::new("Ident", "Ident@Ident.com").sign(Timestamp::from_millis(1_000));
        create_commit(store, tree, parents, sig.clone(), sig, message).unwrap()
    }

    #[test]
    fn first_update_is_created() {
        let store = InMemoryObjectStore::new();
        let refs = InMemoryRefStore::new();
        let root = commit(&store, &[], "root");
        assert_eq!(
            advance(&refs, &store, "master", None, root).unwrap(),
            UpdateResult::Created
        );
        assert_eq!(refs.head("master").unwrap(), Some(root));
    }

    #[test]
    fn child_commit_fast_forwards() {
        let store = InMemoryObjectStore::new();
        let refs = InMemoryRefStore::new();
        let root = commit(&store, &[], "root");
        let child = commit(&store, &[root], "child");
        refs.create("master", Some(root)).unwrap();

        assert_eq!(
            advance(&refs, &store, "master", Some(root), child).unwrap(),
            UpdateResult::FastForward
        );
    }

    #[test]
    fn sideways_move_is_forced() {
        let store = InMemoryObjectStore::new();
        let refs = InMemoryRefStore::new();
        let root = commit(&store, &[], "root");
        let a = commit(&store, &[root], "a");
        let b = commit(&store, &[root], "b");
        refs.create("master", Some(a)).unwrap();

        assert_eq!(
            advance(&refs, &store, "master", Some(a), b).unwrap(),
            UpdateResult::Forced
        );
        assert_eq!(refs.head("master").unwrap(), Some(b));
    }

    #[test]
    fn stale_expectation_is_not_applied() {
        let store = InMemoryObjectStore::new();
        let refs = InMemoryRefStore::new();
        let root = commit(&store, &[], "root");
        let a = commit(&store, &[root], "a");
        let b = commit(&store, &[root], "b");
        refs.create("master", Some(a)).unwrap();

        let err = advance(&refs, &store, "master", Some(root), b).unwrap_err();
        assert!(matches!(err, RefError::Stale { actual: Some(h), .. } if h == a));
        assert_eq!(refs.head("master").unwrap(), Some(a));
    }
}
