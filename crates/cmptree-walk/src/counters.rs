//! Shared task accounting for a walk.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Live task counters of a walk.
///
/// A task is counted as queued from the moment it is enqueued until it has
/// been processed completely, including enqueueing every sub-task it found.
/// Sub-tasks are therefore counted before their parent leaves the queue, and
/// the queued count reaches zero exactly once: when the whole walk is done.
#[derive(Debug, Default)]
pub struct WalkCounters {
    queued: AtomicU64,
    running: AtomicU64,
    done: AtomicU64,
    skipped: AtomicU64,
}

/// Point-in-time copy of [`WalkCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub queued: u64,
    pub running: u64,
    pub done: u64,
    /// Tasks drained without work after cancellation.
    pub skipped: u64,
}

impl WalkCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a task entering the queue.
    pub fn enqueue(&self) {
        self.queued.fetch_add(1, Ordering::SeqCst);
    }

    /// Count a task picked up by a worker.
    pub fn begin(&self) {
        self.running.fetch_add(1, Ordering::SeqCst);
    }

    /// Count a task that was drained without being processed.
    pub fn skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a finished task. Returns `true` when it was the last one.
    pub fn finish(&self) -> bool {
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.done.fetch_add(1, Ordering::SeqCst);
        self.queued.fetch_sub(1, Ordering::SeqCst) == 1
    }

    pub fn queued(&self) -> u64 {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn running(&self) -> u64 {
        self.running.load(Ordering::SeqCst)
    }

    pub fn done(&self) -> u64 {
        self.done.load(Ordering::SeqCst)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            queued: self.queued(),
            running: self.running(),
            done: self.done(),
            skipped: self.skipped(),
        }
    }
}

/// One-shot completion signal.
#[derive(Debug, Default)]
pub(crate) struct Completion {
    finished: Mutex<bool>,
    cond: Condvar,
}

impl Completion {
    pub fn signal(&self) {
        let mut finished = self.finished.lock().unwrap_or_else(PoisonError::into_inner);
        *finished = true;
        self.cond.notify_all();
    }

    pub fn is_set(&self) -> bool {
        *self.finished.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn wait(&self) {
        let mut finished = self.finished.lock().unwrap_or_else(PoisonError::into_inner);
        while !*finished {
            finished = self.cond.wait(finished).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Wait up to `timeout`; returns whether the signal is set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let finished = self.finished.lock().unwrap_or_else(PoisonError::into_inner);
        let (finished, _) = self
            .cond
            .wait_timeout_while(finished, timeout, |finished| !*finished)
            .unwrap_or_else(PoisonError::into_inner);
        *finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_last_finish_reports_completion() {
        let counters = WalkCounters::new();
        counters.enqueue();
        counters.begin();
        // the root spawns a child before finishing
        counters.enqueue();
        assert!(!counters.finish());
        assert_eq!(counters.queued(), 1);

        counters.begin();
        assert!(counters.finish());
        assert_eq!(counters.snapshot(), CounterSnapshot { queued: 0, running: 0, done: 2, skipped: 0 });
    }

    #[test]
    fn test_completion_wakes_waiters() {
        let completion = Arc::new(Completion::default());
        assert!(!completion.wait_timeout(Duration::from_millis(10)));

        let signaller = Arc::clone(&completion);
        let handle = std::thread::spawn(move || signaller.signal());
        completion.wait();
        handle.join().unwrap();

        assert!(completion.is_set());
        assert!(completion.wait_timeout(Duration::ZERO));
    }
}
