//! Callback seams between the walker and its consumers.
//!
//! Both handlers are invoked concurrently from many worker threads and must
//! not panic; results from different directories arrive interleaved.

use std::path::{Path, PathBuf};

use crate::entry::DirEntry;
use crate::error::WalkWarning;
use crate::state::DiffState;

/// One classified entry pair.
#[derive(Debug, Clone, Copy)]
pub struct DiffEvent<'a> {
    /// Classification of the pair.
    pub state: DiffState,
    /// Directory of the entries, relative to both roots (empty for the roots).
    pub base_dir: &'a Path,
    /// Source-side entry, absent for DELETE.
    pub source: Option<&'a DirEntry>,
    /// Target-side entry, absent for NEW.
    pub target: Option<&'a DirEntry>,
}

impl<'a> DiffEvent<'a> {
    /// The entry this event is about: the source side when present,
    /// otherwise the target side.
    pub fn entry(&self) -> &'a DirEntry {
        match (self.source, self.target) {
            (Some(entry), _) | (None, Some(entry)) => entry,
            (None, None) => unreachable!("diff event without entries"),
        }
    }

    /// Whether the reported entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.entry().is_dir()
    }

    /// Path of the entry relative to the roots.
    pub fn relative_path(&self) -> PathBuf {
        self.base_dir.join(self.entry().name.as_str())
    }
}

/// Receives every classified entry pair of a walk.
pub trait DiffHandler: Send + Sync {
    fn on_diff(&self, event: &DiffEvent<'_>);
}

impl<F> DiffHandler for F
where
    F: Fn(&DiffEvent<'_>) + Send + Sync,
{
    fn on_diff(&self, event: &DiffEvent<'_>) {
        self(event)
    }
}

/// Receives recoverable per-directory problems.
pub trait ErrorHandler: Send + Sync {
    fn on_error(&self, warning: &WalkWarning);
}

impl<F> ErrorHandler for F
where
    F: Fn(&WalkWarning) + Send + Sync,
{
    fn on_error(&self, warning: &WalkWarning) {
        self(warning)
    }
}

/// Error handler that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreErrors;

impl ErrorHandler for IgnoreErrors {
    fn on_error(&self, _warning: &WalkWarning) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::FileTime;

    #[test]
    fn test_event_entry_side() {
        let src = DirEntry::file("new.txt", 3, FileTime::default());
        let trg = DirEntry::file("old.txt", 3, FileTime::default());
        let base = Path::new("sub");

        let new = DiffEvent { state: DiffState::New, base_dir: base, source: Some(&src), target: None };
        assert_eq!(new.entry().name, "new.txt");
        assert_eq!(new.relative_path(), Path::new("sub").join("new.txt"));

        let del = DiffEvent { state: DiffState::Delete, base_dir: base, source: None, target: Some(&trg) };
        assert_eq!(del.entry().name, "old.txt");
        assert!(!del.is_dir());
    }
}
