//! Diff consumer fed by the walker.

use std::sync::Arc;

use tracing::warn;

use cmptree_core::{CompareError, DiffEvent, DiffHandler, DiffState};

use crate::index::MoveIndex;
use crate::moves::{MoveDetector, MoveReport};
use crate::sink::{Category, DiffSink};
use crate::stats::DiffStats;

/// Accumulates statistics, indexes NEW/DELETE files and forwards
/// categorized entries to an optional sink.
///
/// Safe to call from many walker threads at once.
pub struct DiffProcessor {
    stats: DiffStats,
    index: Option<MoveIndex>,
    sink: Option<Arc<dyn DiffSink>>,
}

impl Default for DiffProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffProcessor {
    /// Processor with move detection enabled and no sink.
    pub fn new() -> Self {
        Self {
            stats: DiffStats::new(),
            index: Some(MoveIndex::new()),
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiffSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Enable or disable indexing for move detection.
    pub fn with_move_detection(mut self, enabled: bool) -> Self {
        self.index = enabled.then(MoveIndex::new);
        self
    }

    pub fn stats(&self) -> &DiffStats {
        &self.stats
    }

    pub fn index(&self) -> Option<&MoveIndex> {
        self.index.as_ref()
    }

    /// Pair the indexed NEW and DELETE files. Empty when detection is off.
    pub fn detect_moves(&self) -> Result<MoveReport, CompareError> {
        match &self.index {
            Some(index) => MoveDetector::new().detect(index),
            None => Ok(MoveReport::default()),
        }
    }
}

impl DiffHandler for DiffProcessor {
    fn on_diff(&self, event: &DiffEvent<'_>) {
        self.stats.record(event);

        let entry = event.entry();
        let is_dir = entry.is_dir();

        if let Some(index) = self.index.as_ref().filter(|_| !is_dir) {
            match event.state {
                DiffState::New => index.insert_new(entry.move_key(), event.base_dir),
                DiffState::Delete => index.insert_deleted(entry.move_key(), event.base_dir),
                _ => {}
            }
        }

        let (Some(sink), Some(category)) = (&self.sink, Category::of(event.state, is_dir)) else {
            return;
        };
        if let Err(err) = sink.record(category, event.base_dir, entry) {
            self.stats.record_write_error();
            warn!(
                path = %event.relative_path().display(),
                %category,
                "Failed to write diff entry: {err}"
            );
        }
    }
}
