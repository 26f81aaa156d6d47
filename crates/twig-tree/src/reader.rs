//! Tree object → directory reconstruction and single-path lookups.

use std::io::Cursor;

use twig_store::{EntryKind, ObjectStore};
use twig_types::ObjectId;

use crate::builder::TreeLimits;
use crate::directory::{join_path, split_path, Directory};
use crate::error::{TreeError, TreeResult};

/// Rebuild the full [`Directory`] stored under `tree_id`.
pub fn read_tree(
    store: &dyn ObjectStore,
    tree_id: &ObjectId,
    limits: TreeLimits,
) -> TreeResult<Directory> {
    read_level(store, tree_id, "", 0, limits)
}

fn read_level(
    store: &dyn ObjectStore,
    tree_id: &ObjectId,
    path: &str,
    depth: usize,
    limits: TreeLimits,
) -> TreeResult<Directory> {
    limits.check_depth(depth, path)?;

    let tree = store.get_tree(tree_id)?;
    let mut dir = Directory::new();
    for entry in tree.entries {
        match entry.kind {
            EntryKind::Blob => {
                let blob = store.get_blob(&entry.object_id)?;
                dir.insert_file(entry.name, blob.data);
            }
            EntryKind::Tree => {
                let child_path = join_path(path, &entry.name);
                let child = read_level(store, &entry.object_id, &child_path, depth + 1, limits)?;
                dir.insert_dir(entry.name, child);
            }
        }
    }
    Ok(dir)
}

/// Read one file by `/`-separated path without materializing the snapshot.
///
/// Only the trees along the path and the final blob are loaded. Fails with
/// [`TreeError::FileNotFound`] if the path is empty, any segment is missing,
/// an intermediate segment is a file, or the final segment is a directory.
pub fn read_file(store: &dyn ObjectStore, tree_id: &ObjectId, path: &str) -> TreeResult<Vec<u8>> {
    let not_found = || TreeError::FileNotFound(path.to_string());

    let segments: Vec<&str> = split_path(path).collect();
    let Some((file_name, parents)) = segments.split_last() else {
        return Err(not_found());
    };

    let mut current = *tree_id;
    for segment in parents {
        let tree = store.get_tree(&current)?;
        match tree.get(segment) {
            Some(entry) if entry.kind == EntryKind::Tree => current = entry.object_id,
            _ => return Err(not_found()),
        }
    }

    let tree = store.get_tree(&current)?;
    match tree.get(file_name) {
        Some(entry) if entry.kind == EntryKind::Blob => {
            Ok(store.get_blob(&entry.object_id)?.data)
        }
        _ => Err(not_found()),
    }
}

/// Streaming form of [`read_file`].
pub fn open_file(
    store: &dyn ObjectStore,
    tree_id: &ObjectId,
    path: &str,
) -> TreeResult<Cursor<Vec<u8>>> {
    read_file(store, tree_id, path).map(Cursor::new)
}

/// Every file path under `tree_id`, depth-first in entry order.
///
/// Directories are not listed. Tree entries are stored sorted, so repeated
/// calls against the same tree return the same sequence.
pub fn list_paths(
    store: &dyn ObjectStore,
    tree_id: &ObjectId,
    limits: TreeLimits,
) -> TreeResult<Vec<String>> {
    let mut out = Vec::new();
    collect_paths(store, tree_id, "", 0, limits, &mut out)?;
    Ok(out)
}

fn collect_paths(
    store: &dyn ObjectStore,
    tree_id: &ObjectId,
    prefix: &str,
    depth: usize,
    limits: TreeLimits,
    out: &mut Vec<String>,
) -> TreeResult<()> {
    limits.check_depth(depth, prefix)?;

    for entry in store.get_tree(tree_id)?.entries {
        let path = join_path(prefix, &entry.name);
        match entry.kind {
            EntryKind::Blob => out.push(path),
            EntryKind::Tree => collect_paths(store, &entry.object_id, &path, depth + 1, limits, out)?,
        }
    }
    Ok(())
}
