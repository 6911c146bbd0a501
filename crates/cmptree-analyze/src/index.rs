//! Concurrent index of NEW and DELETE files for move detection.

use std::path::{Path, PathBuf};

use dashmap::DashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use cmptree_core::MoveKey;

/// Directories in which one key was seen, keyed by [`MoveKey`].
///
/// Filled concurrently while the walk runs. A key listed under more than
/// one directory cannot be paired unambiguously.
#[derive(Debug, Default)]
pub struct MoveIndex {
    new: DashMap<MoveKey, Vec<PathBuf>>,
    deleted: DashMap<MoveKey, Vec<PathBuf>>,
}

/// One key of the index with its directories, both sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub key: MoveKey,
    pub dirs: Vec<PathBuf>,
}

impl MoveIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file that exists only in the source tree.
    pub fn insert_new(&self, key: MoveKey, dir: &Path) {
        self.new.entry(key).or_default().push(dir.to_path_buf());
    }

    /// Record a file that exists only in the target tree.
    pub fn insert_deleted(&self, key: MoveKey, dir: &Path) {
        self.deleted.entry(key).or_default().push(dir.to_path_buf());
    }

    pub fn new_len(&self) -> usize {
        self.new.len()
    }

    pub fn deleted_len(&self) -> usize {
        self.deleted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.deleted.is_empty()
    }

    /// NEW keys in ascending key order.
    pub fn sorted_new(&self) -> Vec<IndexEntry> {
        sorted(&self.new)
    }

    /// DELETE keys in ascending key order.
    pub fn sorted_deleted(&self) -> Vec<IndexEntry> {
        sorted(&self.deleted)
    }
}

fn sorted(map: &DashMap<MoveKey, Vec<PathBuf>>) -> Vec<IndexEntry> {
    map.iter()
        .map(|item| IndexEntry {
            key: item.key().clone(),
            dirs: item.value().iter().cloned().sorted().collect(),
        })
        .sorted_by(|a, b| a.key.cmp(&b.key))
        .collect()
}
