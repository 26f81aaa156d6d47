//! The in-memory directory model.
//!
//! A [`Directory`] is what callers stage before a commit and what they get
//! back when reading one. It is a plain recursive value: each level maps a
//! name to either file bytes or a nested `Directory`. There are no
//! back-references and no hash identity until it is built into a tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};

/// A single entry in a [`Directory`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    File(Vec<u8>),
    Dir(Directory),
}

impl Node {
    pub fn as_file(&self) -> Option<&[u8]> {
        match self {
            Node::File(bytes) => Some(bytes),
            Node::Dir(_) => None,
        }
    }

    pub fn as_dir(&self) -> Option<&Directory> {
        match self {
            Node::Dir(dir) => Some(dir),
            Node::File(_) => None,
        }
    }
}

/// Mutable staging snapshot: name → file bytes or subdirectory.
///
/// Names are unique per level; inserting a file where a directory of the
/// same name exists replaces it, and vice versa.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    entries: BTreeMap<String, Node>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a file, returning whatever was there before.
    pub fn insert_file(&mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Option<Node> {
        self.entries.insert(name.into(), Node::File(content.into()))
    }

    /// Insert or replace a subdirectory, returning whatever was there before.
    pub fn insert_dir(&mut self, name: impl Into<String>, dir: Directory) -> Option<Node> {
        self.entries.insert(name.into(), Node::Dir(dir))
    }

    /// Builder-style [`insert_file`](Self::insert_file).
    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert_file(name, content);
        self
    }

    /// Builder-style [`insert_dir`](Self::insert_dir).
    pub fn with_dir(mut self, name: impl Into<String>, dir: Directory) -> Self {
        self.insert_dir(name, dir);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.entries.get(name)
    }

    pub fn file(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).and_then(Node::as_file)
    }

    pub fn dir(&self, name: &str) -> Option<&Directory> {
        self.entries.get(name).and_then(Node::as_dir)
    }

    pub fn dir_mut(&mut self, name: &str) -> Option<&mut Directory> {
        match self.entries.get_mut(name) {
            Some(Node::Dir(dir)) => Some(dir),
            _ => None,
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Node> {
        self.entries.remove(name)
    }

    /// Store `content` at a `/`-separated path, creating intermediate
    /// directories as needed. Empty segments are ignored.
    ///
    /// Fails if the path is empty or an intermediate segment is a file.
    pub fn put_path(&mut self, path: &str, content: impl Into<Vec<u8>>) -> TreeResult<()> {
        let segments: Vec<&str> = split_path(path).collect();
        let Some((file_name, parents)) = segments.split_last() else {
            return Err(TreeError::InvalidEntryName {
                name: path.to_string(),
                reason: "path has no components".into(),
            });
        };

        let mut current = self;
        for segment in parents {
            let node = current
                .entries
                .entry((*segment).to_string())
                .or_insert_with(|| Node::Dir(Directory::new()));
            current = match node {
                Node::Dir(dir) => dir,
                Node::File(_) => {
                    return Err(TreeError::InvalidEntryName {
                        name: path.to_string(),
                        reason: format!("{segment:?} is a file"),
                    })
                }
            };
        }
        current.insert_file(*file_name, content);
        Ok(())
    }

    /// Resolve a `/`-separated path to a node.
    pub fn get_path(&self, path: &str) -> Option<&Node> {
        let mut segments = split_path(path).peekable();
        segments.peek()?;
        let mut current = self;
        while let Some(segment) = segments.next() {
            let node = current.entries.get(segment)?;
            if segments.peek().is_none() {
                return Some(node);
            }
            current = node.as_dir()?;
        }
        None
    }

    /// Entries of this level in name order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Number of entries at this level.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of files at any depth.
    pub fn file_count(&self) -> usize {
        self.entries
            .values()
            .map(|node| match node {
                Node::File(_) => 1,
                Node::Dir(dir) => dir.file_count(),
            })
            .sum()
    }

    /// Every file path at any depth, depth-first in name order.
    pub fn file_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_paths("", &mut out);
        out
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<String>) {
        for (name, node) in &self.entries {
            let path = join_path(prefix, name);
            match node {
                Node::File(_) => out.push(path),
                Node::Dir(dir) => dir.collect_paths(&path, out),
            }
        }
    }
}

pub(crate) fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

pub(crate) fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}
