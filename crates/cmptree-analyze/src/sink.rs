//! Output categories and the sink seam.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use cmptree_core::{DiffState, DirEntry};

/// Category of a reported entry, one output stream each.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    New,
    Modified,
    Deleted,
    Same,
    NewDirs,
    DeletedDirs,
}

impl Category {
    /// Category of a classified entry; `None` for pairs nothing is written for.
    pub fn of(state: DiffState, is_dir: bool) -> Option<Self> {
        match (state, is_dir) {
            (DiffState::New, false) => Some(Self::New),
            (DiffState::New, true) => Some(Self::NewDirs),
            (DiffState::Delete, false) => Some(Self::Deleted),
            (DiffState::Delete, true) => Some(Self::DeletedDirs),
            (DiffState::Modify, false) => Some(Self::Modified),
            (DiffState::SameSame, false) => Some(Self::Same),
            _ => None,
        }
    }

    /// Output file name.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::New => "new.txt",
            Self::Modified => "mod.txt",
            Self::Deleted => "del.txt",
            Self::Same => "same.txt",
            Self::NewDirs => "newDirs.txt",
            Self::DeletedDirs => "delDirs.txt",
        }
    }

    pub fn is_dirs(&self) -> bool {
        matches!(self, Self::NewDirs | Self::DeletedDirs)
    }
}

/// Destination for categorized entries.
///
/// Called concurrently from walker threads.
pub trait DiffSink: Send + Sync {
    fn record(&self, category: Category, base_dir: &Path, entry: &DirEntry) -> io::Result<()>;
}
