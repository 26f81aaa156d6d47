//! Branch-level merge: combine two heads into a merge commit.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use twig_dag::{create_commit, is_ancestor, load_commit, merge_base};
use twig_refs::{advance, RefStore, UpdateResult};
use twig_store::ObjectStore;
use twig_tree::TreeLimits;
use twig_types::{ObjectId, Signature};

use crate::error::{MergeError, MergeResult};
use crate::tree_merge::{merge_trees, TreeMerge};

/// Result of a successful [`merge_branches`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeOutcome {
    /// A merge commit was created and the target branch now points at it.
    Merged {
        commit: ObjectId,
        tree: ObjectId,
        update: UpdateResult,
    },
    /// The source is already contained in the target; nothing was written.
    UpToDate { head: ObjectId },
}

/// Merge branch `source` into branch `target`.
///
/// The merge commit records `[target head, source head]` as parents, uses
/// `committer` as both author and committer, and is published with a
/// compare-and-swap against the target head read at the start. If the target
/// moved in the meantime the merge fails with a stale ref error and the
/// branch is left alone; only unreferenced objects remain.
pub fn merge_branches(
    store: &dyn ObjectStore,
    refs: &dyn RefStore,
    source: &str,
    target: &str,
    committer: Signature,
    message: impl Into<String>,
    limits: TreeLimits,
) -> MergeResult<MergeOutcome> {
    let target_head = refs
        .head(target)?
        .ok_or_else(|| MergeError::UnbornBranch(target.to_string()))?;
    let source_head = refs
        .head(source)?
        .ok_or_else(|| MergeError::UnbornBranch(source.to_string()))?;

    if is_ancestor(store, &source_head, &target_head)? {
        debug!(source, target, head = %target_head.short_hex(), "already up to date");
        return Ok(MergeOutcome::UpToDate { head: target_head });
    }

    let base_tree = match merge_base(store, &target_head, &source_head)? {
        Some(base) => Some(load_commit(store, &base)?.tree),
        None => None,
    };
    let ours = load_commit(store, &target_head)?.tree;
    let theirs = load_commit(store, &source_head)?.tree;

    let tree = match merge_trees(store, base_tree, ours, theirs, limits)? {
        TreeMerge::Clean(tree) => tree,
        TreeMerge::Conflicted(conflicts) => {
            info!(source, target, conflicts = conflicts.len(), "merge stopped on conflicts");
            return Err(MergeError::MergeConflict { conflicts });
        }
    };

    let commit = create_commit(
        store,
        tree,
        &[target_head, source_head],
        committer.clone(),
        committer,
        message,
    )?;
    let update = advance(refs, store, target, Some(target_head), commit)?;
    info!(
        source,
        target,
        commit = %commit.short_hex(),
        tree = %tree.short_hex(),
        "merged branches"
    );
    Ok(MergeOutcome::Merged {
        commit,
        tree,
        update,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree_merge::ConflictKind;
    use twig_refs::{InMemoryRefStore, RefError};
    use twig_store::InMemoryObjectStore;
    use twig_tree::{build_tree, read_file, Directory};
    use twig_types::{Identity, Timestamp};

    struct Fixture {
        store: InMemoryObjectStore,
        refs: InMemoryRefStore,
        clock: std::cell::Cell<u64>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: InMemoryObjectStore::new(),
                refs: InMemoryRefStore::new(),
                clock: std::cell::Cell::new(1_000),
            }
        }

        fn sig(&self) -> Signature {
            let now = self.clock.get() + 1;
            self.clock.set(now);
            Identity::new("Ident", "Ident@Ident.com").sign(Timestamp::from_millis(now))
        }

        /// Commit `files` on top of `branch`, creating it if needed.
        fn commit(&self, branch: &str, files: &[(&str, &str)]) -> ObjectId {
            let mut dir = Directory::new();
            for (path, content) in files {
                dir.put_path(path, *content).unwrap();
            }
            let tree = build_tree(&self.store, &dir, TreeLimits::default()).unwrap();
            let head = self.refs.head(branch).unwrap();
            let parents: Vec<ObjectId> = head.into_iter().collect();
            let sig = self.sig();
            let id = create_commit(&self.store, tree, &parents, sig.clone(), sig, "commit").unwrap();
            self.refs.compare_and_swap(branch, head, id).unwrap();
            id
        }

        fn merge(&self, source: &str, target: &str) -> MergeResult<MergeOutcome> {
            merge_branches(
                &self.store,
                &self.refs,
                source,
                target,
                self.sig(),
                format!("Merge {source} into {target}"),
                TreeLimits::default(),
            )
        }

        fn file(&self, branch: &str, path: &str) -> String {
            let head = self.refs.head(branch).unwrap().unwrap();
            let tree = load_commit(&self.store, &head).unwrap().tree;
            String::from_utf8(read_file(&self.store, &tree, path).unwrap()).unwrap()
        }
    }

    #[test]
    fn disjoint_changes_produce_merge_commit() {
        let fx = Fixture::new();
        let root = fx.commit("master", &[("README.md", "initial")]);
        fx.refs.create("develop", Some(root)).unwrap();
        let dev = fx.commit("develop", &[("README.md", "initial"), ("feature.txt", "new")]);
        let master = fx.commit("master", &[("README.md", "updated")]);

        let MergeOutcome::Merged { commit, update, .. } = fx.merge("develop", "master").unwrap()
        else {
            panic!("expected a merge commit");
        };
        assert_eq!(update, UpdateResult::FastForward);
        assert_eq!(fx.refs.head("master").unwrap(), Some(commit));
        assert_eq!(load_commit(&fx.store, &commit).unwrap().parents, vec![master, dev]);
        assert_eq!(fx.file("master", "README.md"), "updated");
        assert_eq!(fx.file("master", "feature.txt"), "new");
        // source branch is untouched
        assert_eq!(fx.refs.head("develop").unwrap(), Some(dev));
    }

    #[test]
    fn fast_forwardable_merge_still_commits() {
        let fx = Fixture::new();
        let root = fx.commit("master", &[("a.txt", "1")]);
        fx.refs.create("develop", Some(root)).unwrap();
        let dev = fx.commit("develop", &[("a.txt", "2")]);

        let MergeOutcome::Merged { commit, tree, .. } = fx.merge("develop", "master").unwrap() else {
            panic!("expected a merge commit");
        };
        let info = load_commit(&fx.store, &commit).unwrap();
        assert_eq!(info.parents, vec![root, dev]);
        assert_eq!(tree, load_commit(&fx.store, &dev).unwrap().tree);
    }

    #[test]
    fn merging_an_ancestor_is_up_to_date() {
        let fx = Fixture::new();
        let root = fx.commit("master", &[("a.txt", "1")]);
        fx.refs.create("old", Some(root)).unwrap();
        let head = fx.commit("master", &[("a.txt", "2")]);
        let objects = fx.store.len();

        assert_eq!(fx.merge("old", "master").unwrap(), MergeOutcome::UpToDate { head });
        assert_eq!(fx.merge("master", "master").unwrap(), MergeOutcome::UpToDate { head });
        assert_eq!(fx.store.len(), objects);
    }

    #[test]
    fn conflict_leaves_target_untouched() {
        let fx = Fixture::new();
        let root = fx.commit("master", &[("README.md", "initial")]);
        fx.refs.create("develop", Some(root)).unwrap();
        fx.commit("develop", &[("README.md", "develop")]);
        let master = fx.commit("master", &[("README.md", "master")]);

        let err = fx.merge("develop", "master").unwrap_err();
        match &err {
            MergeError::MergeConflict { conflicts } => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].path, "README.md");
                assert_eq!(conflicts[0].kind, ConflictKind::BothModified);
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert_eq!(err.conflict_paths(), vec!["README.md"]);
        assert_eq!(fx.refs.head("master").unwrap(), Some(master));
    }

    #[test]
    fn unborn_branches_are_rejected() {
        let fx = Fixture::new();
        fx.commit("master", &[("a.txt", "1")]);
        fx.refs.create("empty", None).unwrap();

        assert!(matches!(fx.merge("empty", "master"), Err(MergeError::UnbornBranch(b)) if b == "empty"));
        assert!(matches!(fx.merge("master", "missing"), Err(MergeError::UnbornBranch(b)) if b == "missing"));
    }

    #[test]
    fn unrelated_histories_merge() {
        let fx = Fixture::new();
        fx.commit("master", &[("mine.txt", "m")]);
        fx.commit("other", &[("theirs.txt", "t")]);

        assert!(matches!(fx.merge("other", "master").unwrap(), MergeOutcome::Merged { .. }));
        assert_eq!(fx.file("master", "mine.txt"), "m");
        assert_eq!(fx.file("master", "theirs.txt"), "t");
    }

    /// A branch table that moves the target just before the merge publishes.
    struct RacingRefs {
        inner: InMemoryRefStore,
        interloper: ObjectId,
    }

    impl RefStore for RacingRefs {
        fn head(&self, name: &str) -> twig_refs::RefResult<Option<ObjectId>> {
            self.inner.head(name)
        }
        fn contains(&self, name: &str) -> twig_refs::RefResult<bool> {
            self.inner.contains(name)
        }
        fn create(&self, name: &str, head: Option<ObjectId>) -> twig_refs::RefResult<()> {
            self.inner.create(name, head)
        }
        fn compare_and_swap(
            &self,
            name: &str,
            expected: Option<ObjectId>,
            new: ObjectId,
        ) -> twig_refs::RefResult<()> {
            self.inner.compare_and_swap(name, expected, self.interloper)?;
            self.inner.compare_and_swap(name, expected, new)
        }
        fn list(&self) -> twig_refs::RefResult<Vec<String>> {
            self.inner.list()
        }
    }

    #[test]
    fn target_moving_mid_merge_is_stale() {
        let fx = Fixture::new();
        let root = fx.commit("master", &[("a.txt", "1")]);
        fx.refs.create("develop", Some(root)).unwrap();
        fx.commit("develop", &[("a.txt", "1"), ("b.txt", "2")]);
        let master = fx.commit("master", &[("a.txt", "3")]);

        let interloper = ObjectId::from_bytes(b"someone else");
        let racing = RacingRefs {
            inner: InMemoryRefStore::new(),
            interloper,
        };
        for name in fx.refs.list().unwrap() {
            racing.create(&name, fx.refs.head(&name).unwrap()).unwrap();
        }

        let err = merge_branches(
            &fx.store,
            &racing,
            "develop",
            "master",
            fx.sig(),
            "merge",
            TreeLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MergeError::Ref(RefError::Stale { expected: Some(e), actual: Some(a), .. })
                if e == master && a == interloper
        ));
        assert_eq!(racing.head("master").unwrap(), Some(interloper));
    }
}
