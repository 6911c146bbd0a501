//! Move detection over the NEW/DELETE index.
//!
//! The two key-sorted index halves are merged with the sorted differ using
//! the full move key and no attribute comparison, so every key present on
//! both sides comes out as SAMESAME. Such a key is a move when each side
//! names exactly one directory, and ambiguous otherwise.

use std::path::PathBuf;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use tracing::debug;

use cmptree_core::{CompareError, DiffState, MergeOptions, ignore_attributes, merge_sorted};

use crate::index::{IndexEntry, MoveIndex};

/// A file that was deleted in one directory and appeared in another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCandidate {
    /// File name.
    pub name: CompactString,
    /// Directory the file was deleted from (target side).
    pub from: PathBuf,
    /// Directory the file appeared in (source side).
    pub to: PathBuf,
    /// File size in bytes.
    pub size: u64,
}

/// A matching key found in more than one directory on either side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousMove {
    pub name: CompactString,
    pub size: u64,
    /// Directories where the key is NEW.
    pub new_dirs: Vec<PathBuf>,
    /// Directories where the key is DELETE.
    pub deleted_dirs: Vec<PathBuf>,
}

/// Results of move detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoveReport {
    /// Unambiguous moves, in key order.
    pub moves: Vec<MoveCandidate>,
    /// Keys that could not be paired.
    pub ambiguous: Vec<AmbiguousMove>,
    /// Total size of all moved files.
    pub moved_bytes: u64,
}

impl MoveReport {
    pub fn has_moves(&self) -> bool {
        !self.moves.is_empty()
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }
}

/// Pairs NEW and DELETE files with identical keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct MoveDetector;

impl MoveDetector {
    pub fn new() -> Self {
        Self
    }

    /// Run detection over a filled index.
    pub fn detect(&self, index: &MoveIndex) -> Result<MoveReport, CompareError> {
        let mut moves = Vec::new();
        let mut ambiguous = Vec::new();
        self.detect_with(
            &index.sorted_new(),
            &index.sorted_deleted(),
            |candidate| moves.push(candidate),
            |entry| ambiguous.push(entry),
        )?;

        let report = MoveReport {
            moved_bytes: moves.iter().map(|m: &MoveCandidate| m.size).sum(),
            moves,
            ambiguous,
        };

        debug!(
            moves = report.moves.len(),
            ambiguous = report.ambiguous.len(),
            "Move detection finished"
        );
        Ok(report)
    }

    /// Run detection over key-sorted index entries.
    ///
    /// Fails with [`CompareError::SortOrder`] when either input is not
    /// sorted by key.
    pub fn detect_with<M, A>(
        &self,
        new: &[IndexEntry],
        deleted: &[IndexEntry],
        mut on_move: M,
        mut on_ambiguous: A,
    ) -> Result<(), CompareError>
    where
        M: FnMut(MoveCandidate),
        A: FnMut(AmbiguousMove),
    {
        merge_sorted(
            deleted,
            new,
            |a, b| a.key.cmp(&b.key),
            ignore_attributes,
            MergeOptions::default().report_same(true),
            |state, deleted, new| {
                let (DiffState::SameSame, Some(deleted), Some(new)) = (state, deleted, new) else {
                    return;
                };
                match (deleted.dirs.as_slice(), new.dirs.as_slice()) {
                    ([from], [to]) => on_move(MoveCandidate {
                        name: new.key.name.clone(),
                        from: from.clone(),
                        to: to.clone(),
                        size: new.key.size,
                    }),
                    _ => on_ambiguous(AmbiguousMove {
                        name: new.key.name.clone(),
                        size: new.key.size,
                        new_dirs: new.dirs.clone(),
                        deleted_dirs: deleted.dirs.clone(),
                    }),
                }
            },
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmptree_core::{DirEntry, FileTime, MoveKey};

    fn key(name: &str, size: u64) -> MoveKey {
        DirEntry::file(name, size, FileTime::from_ticks(5)).move_key()
    }

    fn entry(key: MoveKey, dirs: &[&str]) -> IndexEntry {
        IndexEntry {
            key,
            dirs: dirs.iter().map(PathBuf::from).collect(),
        }
    }

    fn run(new: &[IndexEntry], deleted: &[IndexEntry]) -> (Vec<MoveCandidate>, Vec<AmbiguousMove>) {
        let mut moves = Vec::new();
        let mut ambiguous = Vec::new();
        MoveDetector::new()
            .detect_with(new, deleted, |m| moves.push(m), |a| ambiguous.push(a))
            .unwrap();
        (moves, ambiguous)
    }

    #[test]
    fn test_single_move() {
        let (moves, ambiguous) = run(&[entry(key("f", 10), &["b"])], &[entry(key("f", 10), &["a"])]);

        assert!(ambiguous.is_empty());
        assert_eq!(
            moves,
            vec![MoveCandidate {
                name: "f".into(),
                from: PathBuf::from("a"),
                to: PathBuf::from("b"),
                size: 10,
            }]
        );
    }

    #[test]
    fn test_ambiguous_key() {
        let (moves, ambiguous) = run(
            &[entry(key("f", 10), &["b", "c"])],
            &[entry(key("f", 10), &["a"])],
        );

        assert!(moves.is_empty());
        assert_eq!(ambiguous.len(), 1);
        assert_eq!(ambiguous[0].new_dirs.len(), 2);
        assert_eq!(ambiguous[0].deleted_dirs, vec![PathBuf::from("a")]);
    }

    #[test]
    fn test_size_mismatch_is_not_a_move() {
        let (moves, ambiguous) = run(&[entry(key("f", 10), &["b"])], &[entry(key("f", 11), &["a"])]);
        assert!(moves.is_empty());
        assert!(ambiguous.is_empty());
    }

    #[test]
    fn test_unsorted_index_is_rejected() {
        let new = [entry(key("b", 1), &["x"]), entry(key("a", 1), &["y"])];
        let result = MoveDetector::new().detect_with(&new, &[], |_| {}, |_| {});
        assert!(matches!(result, Err(CompareError::SortOrder { .. })));
    }

    #[test]
    fn test_report_from_index() {
        let index = MoveIndex::new();
        index.insert_new(key("one", 4), std::path::Path::new("to"));
        index.insert_deleted(key("one", 4), std::path::Path::new("from"));
        index.insert_new(key("two", 6), std::path::Path::new("to"));
        index.insert_deleted(key("two", 6), std::path::Path::new("from"));
        index.insert_new(key("lonely", 1), std::path::Path::new("to"));

        let report = MoveDetector::new().detect(&index).unwrap();
        assert_eq!(report.move_count(), 2);
        assert_eq!(report.moved_bytes, 10);
        assert!(report.ambiguous.is_empty());
    }
}
