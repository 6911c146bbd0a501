//! Running totals of a comparison.
//!
//! Every counter is updated independently from many threads; only the
//! end-of-run snapshot is meant to be consistent.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use cmptree_core::{DiffEvent, DiffState};

/// Atomic diff counters.
#[derive(Debug, Default)]
pub struct DiffStats {
    files_new: AtomicU64,
    files_new_bytes: AtomicU64,
    files_modified: AtomicU64,
    files_modified_delta: AtomicI64,
    files_deleted: AtomicU64,
    files_deleted_bytes: AtomicU64,
    files_same: AtomicU64,
    dirs_new: AtomicU64,
    dirs_deleted: AtomicU64,
    write_errors: AtomicU64,
}

/// Point-in-time copy of [`DiffStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub files_new: u64,
    pub files_new_bytes: u64,
    pub files_modified: u64,
    /// Sum of (source size - target size) over modified files.
    pub files_modified_delta: i64,
    pub files_deleted: u64,
    pub files_deleted_bytes: u64,
    pub files_same: u64,
    pub dirs_new: u64,
    pub dirs_deleted: u64,
    /// Output lines that could not be written.
    pub write_errors: u64,
}

impl StatsSnapshot {
    /// Number of NEW, MODIFY and DELETE classifications.
    pub fn differences(&self) -> u64 {
        self.files_new + self.files_modified + self.files_deleted + self.dirs_new + self.dirs_deleted
    }
}

impl DiffStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one classified pair.
    pub fn record(&self, event: &DiffEvent<'_>) {
        let is_dir = event.is_dir();
        match (event.state, event.source, event.target) {
            (DiffState::New, Some(_), _) if is_dir => bump(&self.dirs_new),
            (DiffState::New, Some(src), _) => {
                bump(&self.files_new);
                self.files_new_bytes.fetch_add(src.size, Ordering::Relaxed);
            }
            (DiffState::Delete, _, Some(_)) if is_dir => bump(&self.dirs_deleted),
            (DiffState::Delete, _, Some(trg)) => {
                bump(&self.files_deleted);
                self.files_deleted_bytes.fetch_add(trg.size, Ordering::Relaxed);
            }
            (DiffState::Modify, Some(src), Some(trg)) if !is_dir => {
                bump(&self.files_modified);
                let delta = src.size as i64 - trg.size as i64;
                self.files_modified_delta.fetch_add(delta, Ordering::Relaxed);
            }
            (DiffState::SameSame, _, _) if !is_dir => bump(&self.files_same),
            _ => {}
        }
    }

    pub fn record_write_error(&self) {
        bump(&self.write_errors);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            files_new: self.files_new.load(Ordering::Relaxed),
            files_new_bytes: self.files_new_bytes.load(Ordering::Relaxed),
            files_modified: self.files_modified.load(Ordering::Relaxed),
            files_modified_delta: self.files_modified_delta.load(Ordering::Relaxed),
            files_deleted: self.files_deleted.load(Ordering::Relaxed),
            files_deleted_bytes: self.files_deleted_bytes.load(Ordering::Relaxed),
            files_same: self.files_same.load(Ordering::Relaxed),
            dirs_new: self.dirs_new.load(Ordering::Relaxed),
            dirs_deleted: self.dirs_deleted.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmptree_core::{DirEntry, FileTime};
    use std::path::Path;

    fn event<'a>(
        state: DiffState,
        source: Option<&'a DirEntry>,
        target: Option<&'a DirEntry>,
    ) -> DiffEvent<'a> {
        DiffEvent { state, base_dir: Path::new(""), source, target }
    }

    #[test]
    fn test_record_counts_by_kind() {
        let t = FileTime::from_ticks(7);
        let big = DirEntry::file("f", 100, t);
        let small = DirEntry::file("f", 40, t);
        let dir = DirEntry::directory("d", t);

        let stats = DiffStats::new();
        stats.record(&event(DiffState::New, Some(&big), None));
        stats.record(&event(DiffState::New, Some(&dir), None));
        stats.record(&event(DiffState::Delete, None, Some(&small)));
        stats.record(&event(DiffState::Delete, None, Some(&dir)));
        stats.record(&event(DiffState::Modify, Some(&small), Some(&big)));
        stats.record(&event(DiffState::SameSame, Some(&big), Some(&big)));
        stats.record(&event(DiffState::SameSame, Some(&dir), Some(&dir)));
        stats.record_write_error();

        let snap = stats.snapshot();
        assert_eq!(snap.files_new, 1);
        assert_eq!(snap.files_new_bytes, 100);
        assert_eq!(snap.dirs_new, 1);
        assert_eq!(snap.files_deleted, 1);
        assert_eq!(snap.files_deleted_bytes, 40);
        assert_eq!(snap.dirs_deleted, 1);
        assert_eq!(snap.files_modified, 1);
        assert_eq!(snap.files_modified_delta, -60);
        assert_eq!(snap.files_same, 1);
        assert_eq!(snap.write_errors, 1);
        assert_eq!(snap.differences(), 5);
    }
}
