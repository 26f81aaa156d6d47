//! Traversal algorithms over the commit graph.
//!
//! # Invariants
//!
//! - The graph is acyclic: a commit's id covers its parent ids, so no commit
//!   can (feasibly) be its own ancestor.
//! - Every walk visits each commit at most once.

use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use tracing::debug;
use twig_store::{Commit, ObjectStore};
use twig_types::ObjectId;

use crate::commit::CommitInfo;
use crate::error::DagResult;

/// Loads commits on demand and remembers them for the rest of one query.
struct CommitCache<'a> {
    store: &'a dyn ObjectStore,
    commits: HashMap<ObjectId, Commit>,
}

impl<'a> CommitCache<'a> {
    fn new(store: &'a dyn ObjectStore) -> Self {
        Self {
            store,
            commits: HashMap::new(),
        }
    }

    fn get(&mut self, id: &ObjectId) -> DagResult<&Commit> {
        if !self.commits.contains_key(id) {
            let commit = self.store.get_commit(id)?;
            self.commits.insert(*id, commit);
        }
        Ok(&self.commits[id])
    }

    /// All ancestors of `id`, including `id` itself (BFS upward).
    fn ancestors_inclusive(&mut self, id: &ObjectId) -> DagResult<HashSet<ObjectId>> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(*id);
        queue.push_back(*id);

        while let Some(current) = queue.pop_front() {
            for parent in self.get(&current)?.parents.clone() {
                if visited.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }

        Ok(visited)
    }
}

/// Returns `true` if `ancestor` is reachable from `descendant` through any
/// parent links. A commit counts as its own ancestor.
pub fn is_ancestor(
    store: &dyn ObjectStore,
    ancestor: &ObjectId,
    descendant: &ObjectId,
) -> DagResult<bool> {
    if ancestor == descendant {
        return Ok(true);
    }

    let mut cache = CommitCache::new(store);
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(*descendant);
    queue.push_back(*descendant);

    while let Some(current) = queue.pop_front() {
        for parent in cache.get(&current)?.parents.clone() {
            if parent == *ancestor {
                return Ok(true);
            }
            if visited.insert(parent) {
                queue.push_back(parent);
            }
        }
    }

    Ok(false)
}

/// Returns `true` if `old` lies on the first-parent chain of `new`
/// (including `new` itself). This is the fast-forward test for branch
/// updates.
pub fn is_first_parent_descendant(
    store: &dyn ObjectStore,
    new: &ObjectId,
    old: &ObjectId,
) -> DagResult<bool> {
    let mut current = *new;
    loop {
        if current == *old {
            return Ok(true);
        }
        match store.get_commit(&current)?.parents.first() {
            Some(parent) => current = *parent,
            None => return Ok(false),
        }
    }
}

/// Find the lowest common ancestor of two commits.
///
/// Computes the inclusive ancestor sets of both commits and intersects them.
/// Any common ancestor that is a parent of another common ancestor cannot be
/// lowest and is discarded. When several candidates remain (criss-cross
/// histories), the one with the latest committer timestamp wins, then the
/// larger id, so the answer is deterministic.
///
/// Returns `None` for unrelated histories.
pub fn merge_base(
    store: &dyn ObjectStore,
    a: &ObjectId,
    b: &ObjectId,
) -> DagResult<Option<ObjectId>> {
    if a == b {
        return Ok(Some(*a));
    }

    let mut cache = CommitCache::new(store);
    let ancestors_a = cache.ancestors_inclusive(a)?;
    let ancestors_b = cache.ancestors_inclusive(b)?;
    let common: HashSet<ObjectId> = ancestors_a.intersection(&ancestors_b).copied().collect();

    // Every strict ancestor of a common ancestor is itself common, and is a
    // parent of some common ancestor along the way.
    let mut dominated = HashSet::new();
    for id in &common {
        dominated.extend(cache.get(id)?.parents.iter().copied());
    }

    let mut best: Option<(twig_types::Timestamp, ObjectId)> = None;
    for id in common.difference(&dominated) {
        let key = (cache.get(id)?.committer.when, *id);
        if best.map_or(true, |current| key > current) {
            best = Some(key);
        }
    }

    let base = best.map(|(_, id)| id);
    debug!(
        a = %a.short_hex(),
        b = %b.short_hex(),
        base = ?base.map(|id| id.short_hex()),
        candidates = common.len(),
        "computed merge base"
    );
    Ok(base)
}

/// Every commit reachable from `head`, newest first.
///
/// Ordered by committer timestamp descending, ties broken by id, each commit
/// listed once. A commit is never listed before one of its descendants, so a
/// skewed or coarse clock cannot put a parent ahead of its child.
pub fn history(store: &dyn ObjectStore, head: &ObjectId) -> DagResult<Vec<CommitInfo>> {
    let mut cache = CommitCache::new(store);
    let reachable = cache.ancestors_inclusive(head)?;

    // Number of not-yet-listed children of each commit.
    let mut pending_children: HashMap<ObjectId, usize> = HashMap::new();
    for id in &reachable {
        for parent in &cache.get(id)?.parents {
            *pending_children.entry(*parent).or_default() += 1;
        }
    }

    let mut ready = BinaryHeap::new();
    ready.push((cache.get(head)?.committer.when, *head));
    let mut commits = Vec::with_capacity(reachable.len());

    while let Some((_, id)) = ready.pop() {
        let Some(commit) = cache.commits.remove(&id) else {
            continue;
        };
        for parent in &commit.parents {
            let Some(count) = pending_children.get_mut(parent) else {
                continue;
            };
            *count -= 1;
            if *count == 0 {
                ready.push((cache.get(parent)?.committer.when, *parent));
            }
        }
        commits.push(CommitInfo::new(id, commit));
    }
    Ok(commits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::create_commit;
    use crate::error::DagError;
    use twig_store::{InMemoryObjectStore, StoreError, Tree};
    use twig_types::{Identity, Timestamp};

    /// Small helper that stamps commits with increasing timestamps.
    struct Graph {
        store: InMemoryObjectStore,
        tree: ObjectId,
        clock: std::cell::Cell<u64>,
    }

    impl Graph {
        fn new() -> Self {
            let store = InMemoryObjectStore::new();
            let tree = store.put_tree(&Tree::empty()).unwrap();
            Self {
                store,
                tree,
                clock: std::cell::Cell::new(1_000),
            }
        }

        fn commit(&self, parents: &[ObjectId], message: &str) -> ObjectId {
            let now = self.clock.get() + 1;
            self.clock.set(now);
            let sig = Identity::new("t", "t@example.com").sign(Timestamp::from_millis(now));
            create_commit(&self.store, self.tree, parents, sig.clone(), sig, message).unwrap()
        }
    }

    #[test]
    fn linear_ancestry() {
        let g = Graph::new();
        let a = g.commit(&[], "a");
        let b = g.commit(&[a], "b");
        let c = g.commit(&[b], "c");

        assert!(is_ancestor(&g.store, &a, &c).unwrap());
        assert!(is_ancestor(&g.store, &c, &c).unwrap());
        assert!(!is_ancestor(&g.store, &c, &a).unwrap());
        assert!(is_first_parent_descendant(&g.store, &c, &a).unwrap());
        assert!(!is_first_parent_descendant(&g.store, &a, &c).unwrap());
    }

    #[test]
    fn first_parent_chain_ignores_second_parent() {
        let g = Graph::new();
        let root = g.commit(&[], "root");
        let ours = g.commit(&[root], "ours");
        let theirs = g.commit(&[root], "theirs");
        let merge = g.commit(&[ours, theirs], "merge");

        assert!(is_first_parent_descendant(&g.store, &merge, &ours).unwrap());
        assert!(!is_first_parent_descendant(&g.store, &merge, &theirs).unwrap());
        assert!(is_ancestor(&g.store, &theirs, &merge).unwrap());
    }

    #[test]
    fn merge_base_of_fork() {
        let g = Graph::new();
        let root = g.commit(&[], "root");
        let base = g.commit(&[root], "base");
        let left = g.commit(&[base], "left");
        let right = g.commit(&[base], "right");
        let right2 = g.commit(&[right], "right2");

        assert_eq!(merge_base(&g.store, &left, &right2).unwrap(), Some(base));
        assert_eq!(merge_base(&g.store, &right2, &left).unwrap(), Some(base));
    }

    #[test]
    fn merge_base_when_one_contains_the_other() {
        let g = Graph::new();
        let a = g.commit(&[], "a");
        let b = g.commit(&[a], "b");
        assert_eq!(merge_base(&g.store, &a, &b).unwrap(), Some(a));
        assert_eq!(merge_base(&g.store, &b, &b).unwrap(), Some(b));
    }

    #[test]
    fn merge_base_after_previous_merge() {
        let g = Graph::new();
        let root = g.commit(&[], "root");
        let feature = g.commit(&[root], "feature");
        let main = g.commit(&[root], "main");
        let merged = g.commit(&[main, feature], "merge feature");
        let feature2 = g.commit(&[feature], "feature again");
        let main2 = g.commit(&[merged], "main again");

        // `root` is common too, but `feature` is lower.
        assert_eq!(merge_base(&g.store, &main2, &feature2).unwrap(), Some(feature));
    }

    #[test]
    fn merge_base_criss_cross_is_deterministic() {
        let g = Graph::new();
        let root = g.commit(&[], "root");
        let x = g.commit(&[root], "x");
        let y = g.commit(&[root], "y");
        let left = g.commit(&[x, y], "left");
        let right = g.commit(&[y, x], "right");

        // x and y are both lowest; y is newer.
        assert_eq!(merge_base(&g.store, &left, &right).unwrap(), Some(y));
    }

    #[test]
    fn unrelated_histories_have_no_base() {
        let g = Graph::new();
        let a = g.commit(&[], "a");
        let b = g.commit(&[], "b");
        assert_eq!(merge_base(&g.store, &a, &b).unwrap(), None);
        assert!(!is_ancestor(&g.store, &a, &b).unwrap());
    }

    #[test]
    fn history_is_newest_first_and_unique() {
        let g = Graph::new();
        let root = g.commit(&[], "root");
        let left = g.commit(&[root], "left");
        let right = g.commit(&[root], "right");
        let merge = g.commit(&[left, right], "merge");

        let log = history(&g.store, &merge).unwrap();
        let ids: Vec<ObjectId> = log.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![merge, right, left, root]);
        assert_eq!(log[0].summary(), "merge");
    }

    #[test]
    fn history_keeps_children_first_on_equal_timestamps() {
        let g = Graph::new();
        let sig = Identity::new("t", "t@example.com").sign(Timestamp::from_millis(7));
        let mut head = create_commit(&g.store, g.tree, &[], sig.clone(), sig.clone(), "0").unwrap();
        let mut expected = vec![head];
        for i in 1..10 {
            head = create_commit(&g.store, g.tree, &[head], sig.clone(), sig.clone(), i.to_string())
                .unwrap();
            expected.push(head);
        }
        expected.reverse();

        let ids: Vec<ObjectId> = history(&g.store, &head).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn missing_parent_is_reported() {
        let g = Graph::new();
        let ghost = ObjectId::from_bytes(b"ghost");
        let child = g.commit(&[ghost], "child");
        let err = history(&g.store, &child).unwrap_err();
        assert!(matches!(err, DagError::Store(StoreError::NotFound(id)) if id == ghost));
    }
}
