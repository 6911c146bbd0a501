//! Walk progress reporting.

use std::path::PathBuf;
use std::time::Duration;

use crate::counters::CounterSnapshot;

/// Progress information during a walk.
#[derive(Debug, Clone)]
pub struct WalkProgress {
    /// Task counters at the time of the update.
    pub counters: CounterSnapshot,
    /// Number of warnings reported so far.
    pub errors_count: u64,
    /// Directory (relative to the roots) whose task just completed.
    pub current_dir: PathBuf,
    /// Time elapsed since the walk started.
    pub elapsed: Duration,
    /// Whether this is the final update of the walk.
    pub finished: bool,
}

impl WalkProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            counters: CounterSnapshot::default(),
            errors_count: 0,
            current_dir: PathBuf::new(),
            elapsed: Duration::ZERO,
            finished: false,
        }
    }

    /// Calculate throughput in directories per second.
    pub fn dirs_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.counters.done as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for WalkProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_per_second() {
        let mut progress = WalkProgress::new();
        assert_eq!(progress.dirs_per_second(), 0.0);

        progress.counters.done = 50;
        progress.elapsed = Duration::from_secs(2);
        assert_eq!(progress.dirs_per_second(), 25.0);
    }
}
