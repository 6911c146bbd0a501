//! Parallel directory pair walker for cmptree.
//!
//! # Overview
//!
//! `cmptree-walk` compares a source tree against a target tree. Each
//! directory pair is listed, merged with the sorted differ from
//! `cmptree-core` and its sub-directories are fanned out to a worker pool.
//!
//! - **Parallel traversal** via a rayon pool, one task per directory pair
//! - **Progress updates** via broadcast channels
//! - **Cancellation** via a shared token; queued directories drain quickly
//! - **Pluggable listing** through the [`DirEnumerator`] trait
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cmptree_walk::{CompareConfig, DiffEvent, TreeWalker};
//!
//! let config = CompareConfig::new("/data/new", "/data/old");
//! let walker = TreeWalker::new(
//!     config,
//!     Arc::new(|event: &DiffEvent<'_>| {
//!         println!("{} {}", event.state, event.relative_path().display());
//!     }),
//! );
//! let summary = walker.run().unwrap();
//! println!("Compared {} directories", summary.counters.done);
//! ```

mod counters;
mod enumerate;
mod progress;
mod walker;

pub use counters::{CounterSnapshot, WalkCounters};
pub use enumerate::{DirEnumerator, Entries, FsEnumerator};
pub use progress::WalkProgress;
pub use walker::{TreeWalker, WalkSummary};

// Re-export core types for convenience
pub use cmptree_core::{
    CompareConfig, CompareError, DiffEvent, DiffHandler, DiffState, DirEntry, ErrorHandler,
    NameOrder, WalkWarning, WarningKind,
};
