//! Core types for cmptree.
//!
//! This crate provides the data structures shared by the walker and the
//! analyzers: directory entries, classification states, ordering rules,
//! configuration, error types, the callback seams, and the sorted-merge
//! differ that everything else is built on.

mod config;
mod entry;
mod error;
mod handler;
mod merge;
mod order;
mod state;

pub use config::{CompareConfig, CompareConfigBuilder};
pub use entry::{DirEntry, EntryKind, FileAttributes, FileTime, MoveKey, is_dot_or_dotdot, join_halves};
pub use error::{CompareError, MergeSide, WalkWarning, WarningKind};
pub use handler::{DiffEvent, DiffHandler, ErrorHandler, IgnoreErrors};
pub use merge::{MergeOptions, merge_sorted};
pub use order::{EntryOrder, NameOrder, compare_attributes, ignore_attributes};
pub use state::DiffState;
