use std::io::Cursor;
use std::sync::Arc;

use tracing::info;
use twig_dag::{create_commit, history, load_commit, CommitInfo};
use twig_diff::{diff_trees_with_limits, TreeDiff};
use twig_merge::{merge_branches, MergeOutcome};
use twig_refs::{advance, InMemoryRefStore, RefStore};
use twig_store::{InMemoryObjectStore, ObjectStore};
use twig_tree::{build_tree, list_paths, open_file, read_file, read_tree, Directory};
use twig_types::{Identity, ObjectId};

use crate::commit::CommitReceipt;
use crate::config::RepoConfig;
use crate::error::{RepoError, RepoResult};

/// High-level Twig repository API.
///
/// Cheap to share across threads behind an `Arc`: the object store only
/// grows with immutable objects, and the branch table is guarded by
/// compare-and-swap. No lock is held between reading a head and publishing
/// the commit built on it.
pub struct Repository {
    store: Arc<dyn ObjectStore>,
    refs: Arc<dyn RefStore>,
    config: RepoConfig,
}

impl Repository {
    /// Open an empty in-memory repository with the default configuration.
    /// No branches exist yet.
    pub fn new() -> Self {
        Self::with_backends(
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(InMemoryRefStore::new()),
            RepoConfig::default(),
        )
    }

    /// Open an in-memory repository and register the configured default
    /// branch as unborn.
    pub fn init(config: RepoConfig) -> RepoResult<Self> {
        config.validate()?;
        let repo = Self::with_backends(
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(InMemoryRefStore::new()),
            config,
        );
        repo.refs.create(&repo.config.default_branch, None)?;
        info!(branch = %repo.config.default_branch, "initialized repository");
        Ok(repo)
    }

    /// Use caller-supplied storage. Nothing is created.
    pub fn with_backends(
        store: Arc<dyn ObjectStore>,
        refs: Arc<dyn RefStore>,
        config: RepoConfig,
    ) -> Self {
        Self {
            store,
            refs,
            config,
        }
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn refs(&self) -> &dyn RefStore {
        self.refs.as_ref()
    }

    // ---- Commit operations ----

    /// Give `branch` its first commit.
    ///
    /// Fails with `AlreadyExists` if the branch already has a head. An unborn
    /// branch, or one that does not exist yet, is fine. This is the only
    /// commit operation that may bring a branch into existence.
    pub fn initialize(
        &self,
        branch: &str,
        dir: &Directory,
        message: &str,
        author: &Identity,
    ) -> RepoResult<CommitReceipt> {
        if self.refs.head(branch)?.is_some() {
            return Err(RepoError::AlreadyExists(branch.to_string()));
        }
        self.publish(branch, None, dir, message, author)
    }

    /// Commit `dir` on top of the current head of `branch`.
    ///
    /// The head is read once; if another writer moves the branch before the
    /// commit is published this fails with `Stale` and the caller decides
    /// whether to try again.
    pub fn commit(
        &self,
        branch: &str,
        dir: &Directory,
        message: &str,
        author: &Identity,
    ) -> RepoResult<CommitReceipt> {
        self.require_branch(branch)?;
        let head = self.refs.head(branch)?;
        self.publish(branch, head, dir, message, author)
    }

    /// Commit `dir` as the child of `expected_head`, publishing only if the
    /// branch still points there. `None` commits a root onto an unborn
    /// branch. Unknown branches fail with `UnknownBranch`.
    pub fn commit_onto(
        &self,
        branch: &str,
        expected_head: Option<ObjectId>,
        dir: &Directory,
        message: &str,
        author: &Identity,
    ) -> RepoResult<CommitReceipt> {
        self.require_branch(branch)?;
        self.publish(branch, expected_head, dir, message, author)
    }

    fn require_branch(&self, branch: &str) -> RepoResult<()> {
        if !self.refs.contains(branch)? {
            return Err(RepoError::UnknownBranch(branch.to_string()));
        }
        Ok(())
    }

    fn publish(
        &self,
        branch: &str,
        expected_head: Option<ObjectId>,
        dir: &Directory,
        message: &str,
        author: &Identity,
    ) -> RepoResult<CommitReceipt> {
        let tree = build_tree(self.store(), dir, self.config.limits())?;
        let parents: Vec<ObjectId> = expected_head.into_iter().collect();
        let signature = author.sign_now();
        let commit = create_commit(
            self.store(),
            tree,
            &parents,
            signature.clone(),
            signature,
            message,
        )?;

        let update = advance(self.refs(), self.store(), branch, expected_head, commit)?;
        info!(
            branch,
            commit = %commit.short_hex(),
            tree = %tree.short_hex(),
            update = ?update,
            "committed"
        );
        Ok(CommitReceipt {
            commit,
            tree,
            update,
        })
    }

    // ---- Branch operations ----

    /// Create `name` pointing at the current head of `from`.
    ///
    /// Branching from an unborn branch yields another unborn branch.
    pub fn create_branch(&self, name: &str, from: &str) -> RepoResult<()> {
        self.require_branch(from)?;
        let head = self.refs.head(from)?;
        self.refs.create(name, head)?;
        info!(branch = name, from, "created branch");
        Ok(())
    }

    pub fn list_branches(&self) -> RepoResult<Vec<String>> {
        Ok(self.refs.list()?)
    }

    /// Current head of `branch`; `None` if unborn or unknown.
    pub fn head(&self, branch: &str) -> RepoResult<Option<ObjectId>> {
        Ok(self.refs.head(branch)?)
    }

    /// Merge `source` into `target` as the configured identity.
    pub fn merge(&self, source: &str, target: &str) -> RepoResult<MergeOutcome> {
        let committer = self
            .config
            .identity()?
            .unwrap_or_else(|| Identity::new("Twig", "twig@localhost"));
        self.merge_as(source, target, &committer)
    }

    /// Merge `source` into `target`, recording `committer` on the merge
    /// commit. The message comes from the configured template.
    pub fn merge_as(
        &self,
        source: &str,
        target: &str,
        committer: &Identity,
    ) -> RepoResult<MergeOutcome> {
        self.require_branch(source)?;
        self.require_branch(target)?;
        let outcome = merge_branches(
            self.store(),
            self.refs(),
            source,
            target,
            committer.sign_now(),
            self.config.merge_message(source, target),
            self.config.limits(),
        )?;
        Ok(outcome)
    }

    // ---- Snapshot reads ----

    fn tree_of(&self, commit: &ObjectId) -> RepoResult<ObjectId> {
        Ok(load_commit(self.store(), commit)?.tree)
    }

    /// The full snapshot recorded by `commit`.
    pub fn read_tree(&self, commit: &ObjectId) -> RepoResult<Directory> {
        let tree = self.tree_of(commit)?;
        Ok(read_tree(self.store(), &tree, self.config.limits())?)
    }

    /// One file of the snapshot recorded by `commit`.
    pub fn read_file(&self, commit: &ObjectId, path: &str) -> RepoResult<Vec<u8>> {
        let tree = self.tree_of(commit)?;
        Ok(read_file(self.store(), &tree, path)?)
    }

    /// Streaming form of [`read_file`](Self::read_file).
    pub fn open_file(&self, commit: &ObjectId, path: &str) -> RepoResult<Cursor<Vec<u8>>> {
        let tree = self.tree_of(commit)?;
        Ok(open_file(self.store(), &tree, path)?)
    }

    /// Every file path in the snapshot recorded by `commit`.
    pub fn list_paths(&self, commit: &ObjectId) -> RepoResult<Vec<String>> {
        let tree = self.tree_of(commit)?;
        Ok(list_paths(self.store(), &tree, self.config.limits())?)
    }

    // ---- History ----

    pub fn commit_info(&self, commit: &ObjectId) -> RepoResult<CommitInfo> {
        Ok(load_commit(self.store(), commit)?)
    }

    /// Every commit reachable from the head of `branch`, newest first.
    pub fn history(&self, branch: &str) -> RepoResult<Vec<CommitInfo>> {
        self.require_branch(branch)?;
        match self.refs.head(branch)? {
            Some(head) => Ok(history(self.store(), &head)?),
            None => Ok(Vec::new()),
        }
    }

    /// File-level changes from the snapshot of `from` to that of `to`.
    pub fn diff(&self, from: &ObjectId, to: &ObjectId) -> RepoResult<TreeDiff> {
        let old = self.tree_of(from)?;
        let new = self.tree_of(to)?;
        Ok(diff_trees_with_limits(
            self.store(),
            Some(&old),
            &new,
            self.config.limits(),
        )?)
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}
