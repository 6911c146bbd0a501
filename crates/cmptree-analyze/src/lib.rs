//! Diff accounting, output writers and move detection for cmptree.
//!
//! This crate consumes the classified pairs produced by `cmptree-walk`:
//!
//! - **Statistics** - Atomic counters of new, modified, deleted and same entries
//! - **Output files** - One text file per category (`new.txt`, `del.txt`, ...)
//! - **Move detection** - Pair NEW and DELETE files by name, size and mtime
//!
//! # Move Detection
//!
//! The [`DiffProcessor`] indexes every NEW and DELETE file while the walk
//! runs. Afterwards the [`MoveDetector`] merges both halves of the index:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cmptree_analyze::DiffProcessor;
//! use cmptree_walk::{CompareConfig, TreeWalker};
//!
//! let processor = Arc::new(DiffProcessor::new());
//! let config = CompareConfig::new("/data/new", "/data/old");
//! TreeWalker::new(config, processor.clone()).run().unwrap();
//!
//! let report = processor.detect_moves().unwrap();
//! for m in &report.moves {
//!     println!("{}: {} -> {}", m.name, m.from.display(), m.to.display());
//! }
//! ```

mod index;
mod moves;
mod processing;
mod sink;
mod stats;
pub mod writer;

pub use index::{IndexEntry, MoveIndex};
pub use moves::{AmbiguousMove, MoveCandidate, MoveDetector, MoveReport};
pub use processing::DiffProcessor;
pub use sink::{Category, DiffSink};
pub use stats::{DiffStats, StatsSnapshot};
pub use writer::DiffWriter;

// Re-export core types
pub use cmptree_core::{DiffState, MoveKey};
