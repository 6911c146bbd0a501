//! Parallel walker comparing two directory trees.
//!
//! Every directory pair is one task. A task lists both sides, merges the
//! listings, forwards the classified pairs and enqueues the sub-directories
//! it found as new tasks on the shared worker pool, so any idle worker can
//! pick them up.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use cmptree_core::{
    CompareConfig, CompareError, DiffEvent, DiffHandler, DiffState, DirEntry, EntryOrder,
    ErrorHandler, IgnoreErrors, MergeOptions, MergeSide, WalkWarning, compare_attributes,
    merge_sorted,
};

use crate::counters::{Completion, CounterSnapshot, WalkCounters};
use crate::enumerate::{DirEnumerator, Entries, FsEnumerator};
use crate::progress::WalkProgress;

/// Send a progress update every this many finished tasks.
const PROGRESS_INTERVAL: u64 = 256;

/// Result of a finished (or cancelled) walk.
#[derive(Debug, Clone, Serialize)]
pub struct WalkSummary {
    /// Final task counters.
    pub counters: CounterSnapshot,
    /// Number of warnings reported.
    pub errors: u64,
    /// Whether the walk was cancelled before completing.
    pub cancelled: bool,
    /// Time from start to completion.
    pub duration: Duration,
}

/// State shared between the walker handle and its tasks.
#[derive(Debug)]
struct WalkState {
    counters: WalkCounters,
    errors: AtomicU64,
    cancel: CancellationToken,
    completion: Completion,
    progress_tx: broadcast::Sender<WalkProgress>,
    started: OnceLock<Instant>,
    duration: OnceLock<Duration>,
}

impl WalkState {
    fn elapsed(&self) -> Duration {
        self.started.get().map(Instant::elapsed).unwrap_or_default()
    }
}

/// Parallel comparison of a source tree against a target tree.
pub struct TreeWalker {
    config: CompareConfig,
    enumerator: Arc<dyn DirEnumerator>,
    diff_handler: Arc<dyn DiffHandler>,
    error_handler: Arc<dyn ErrorHandler>,
    state: Arc<WalkState>,
    pool: Option<ThreadPool>,
}

impl TreeWalker {
    /// Create a walker over the local filesystem.
    pub fn new(config: CompareConfig, diff_handler: Arc<dyn DiffHandler>) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            config,
            enumerator: Arc::new(FsEnumerator::new()),
            diff_handler,
            error_handler: Arc::new(IgnoreErrors),
            state: Arc::new(WalkState {
                counters: WalkCounters::new(),
                errors: AtomicU64::new(0),
                cancel: CancellationToken::new(),
                completion: Completion::default(),
                progress_tx,
                started: OnceLock::new(),
                duration: OnceLock::new(),
            }),
            pool: None,
        }
    }

    /// Receive recoverable per-directory errors.
    pub fn with_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = handler;
        self
    }

    /// List directories with a different enumerator.
    pub fn with_enumerator(mut self, enumerator: Arc<dyn DirEnumerator>) -> Self {
        self.enumerator = enumerator;
        self
    }

    /// Use an externally owned cancellation token. Has no effect once the
    /// walk has started.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        if let Some(state) = Arc::get_mut(&mut self.state) {
            state.cancel = token;
        }
        self
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Subscribe to progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<WalkProgress> {
        self.state.progress_tx.subscribe()
    }

    /// Live task counters.
    pub fn counters(&self) -> &WalkCounters {
        &self.state.counters
    }

    /// Number of warnings reported so far.
    pub fn errors(&self) -> u64 {
        self.state.errors.load(Ordering::Relaxed)
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.state.cancel.clone()
    }

    /// Ask the walk to wind down. Running listings finish, queued
    /// directories are drained without being compared.
    pub fn cancel(&self) {
        self.state.cancel.cancel();
    }

    /// Build the worker pool and enqueue the root pair.
    ///
    /// `max_threads` of 0 lets rayon pick the thread count.
    pub fn start(&mut self, max_threads: usize) -> Result<(), CompareError> {
        if self.pool.is_some() {
            return Err(CompareError::AlreadyStarted);
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(max_threads)
            .thread_name(|i| format!("cmptree-walk-{i}"))
            .build()
            .map_err(|e| CompareError::ThreadPool { message: e.to_string() })?;

        info!(
            source = %self.config.source.display(),
            target = %self.config.target.display(),
            threads = pool.current_num_threads(),
            "Starting tree comparison"
        );

        let _ = self.state.started.set(Instant::now());
        let ctx = Arc::new(TaskContext {
            order: EntryOrder::new(self.config.name_order),
            config: self.config.clone(),
            enumerator: Arc::clone(&self.enumerator),
            diff_handler: Arc::clone(&self.diff_handler),
            error_handler: Arc::clone(&self.error_handler),
            state: Arc::clone(&self.state),
        });

        self.state.counters.enqueue();
        pool.spawn_fifo(move || run_task(ctx, DirTask::root()));
        self.pool = Some(pool);
        Ok(())
    }

    /// Whether the walk has completed.
    pub fn is_finished(&self) -> bool {
        self.state.completion.is_set()
    }

    /// Block until the walk completes. Returns immediately if it never started.
    pub fn wait(&self) {
        if self.pool.is_some() {
            self.state.completion.wait();
        }
    }

    /// Block up to `timeout`; returns whether the walk has completed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.pool.is_some() && self.state.completion.wait_timeout(timeout)
    }

    /// Summary of the walk so far.
    pub fn summary(&self) -> WalkSummary {
        WalkSummary {
            counters: self.state.counters.snapshot(),
            errors: self.errors(),
            cancelled: self.state.cancel.is_cancelled(),
            duration: self
                .state
                .duration
                .get()
                .copied()
                .unwrap_or_else(|| self.state.elapsed()),
        }
    }

    /// Start with the configured thread count and wait for completion.
    pub fn run(mut self) -> Result<WalkSummary, CompareError> {
        let threads = self.config.threads;
        self.start(threads)?;
        self.wait();
        Ok(self.summary())
    }

    /// Cancel, wait for the queue to drain and release the worker pool.
    pub fn shutdown(mut self) -> WalkSummary {
        self.cancel();
        self.wait();
        self.pool.take();
        self.summary()
    }
}

/// A directory pair to compare, relative to the source and target roots.
///
/// The two paths differ in case only, when names are matched ignoring case.
#[derive(Debug, Clone)]
struct DirTask {
    source: PathBuf,
    target: PathBuf,
    depth: u32,
}

impl DirTask {
    fn root() -> Self {
        Self {
            source: PathBuf::new(),
            target: PathBuf::new(),
            depth: 0,
        }
    }

    fn child(&self, source_name: &str, target_name: &str) -> Self {
        Self {
            source: self.source.join(source_name),
            target: self.target.join(target_name),
            depth: self.depth + 1,
        }
    }
}

/// Everything a task needs, shared by all tasks of one walk.
struct TaskContext {
    config: CompareConfig,
    order: EntryOrder,
    enumerator: Arc<dyn DirEnumerator>,
    diff_handler: Arc<dyn DiffHandler>,
    error_handler: Arc<dyn ErrorHandler>,
    state: Arc<WalkState>,
}

impl ErrorHandler for TaskContext {
    fn on_error(&self, warning: &WalkWarning) {
        self.state.errors.fetch_add(1, Ordering::Relaxed);
        warn!(path = %warning.path.display(), kind = %warning.kind, "{}", warning.message);
        self.error_handler.on_error(warning);
    }
}

impl TaskContext {
    fn enqueue(self: &Arc<Self>, task: DirTask) {
        self.state.counters.enqueue();
        let ctx = Arc::clone(self);
        rayon::spawn_fifo(move || run_task(ctx, task));
    }

    /// Compare one directory pair.
    fn compare(self: &Arc<Self>, task: &DirTask) {
        let source_dir = CompareConfig::resolve(&self.config.source, &task.source);
        let target_dir = CompareConfig::resolve(&self.config.target, &task.target);

        let target = self.listing(&target_dir, self.config.force_sort_target);
        let source = self.listing(&source_dir, self.config.force_sort_source);

        let result = merge_sorted(
            target,
            source,
            |a, b| self.order.compare(a, b),
            compare_attributes,
            MergeOptions::default().report_same(true),
            |state, target, source| self.classified(task, state, source, target),
        );

        match result {
            Ok(differences) => {
                trace!(dir = %task.source.display(), differences, "Directory compared");
            }
            Err(err) => {
                let dir = match &err {
                    CompareError::SortOrder { side: MergeSide::A, .. } => &target_dir,
                    _ => &source_dir,
                };
                self.on_error(&WalkWarning::sort_order(dir, &err));
            }
        }
    }

    fn listing<'a>(&'a self, dir: &'a Path, force_sort: bool) -> Entries<'a> {
        let entries = self.enumerator.enumerate(dir, self);
        if force_sort || !self.enumerator.is_sorted(self.config.name_order) {
            let mut sorted: Vec<DirEntry> = entries.collect();
            self.order.sort(&mut sorted);
            Box::new(sorted.into_iter())
        } else {
            entries
        }
    }

    fn classified(
        self: &Arc<Self>,
        task: &DirTask,
        state: DiffState,
        source: Option<&DirEntry>,
        target: Option<&DirEntry>,
    ) {
        let descended = match descent(state, source, target) {
            Some(next) if self.should_descend(next.entry, task) => {
                self.enqueue(task.child(next.source_name, next.target_name));
                true
            }
            _ => false,
        };

        if state == DiffState::SameSame && !self.config.report_same {
            return;
        }
        if descended && !self.config.report_recursed {
            return;
        }

        self.diff_handler.on_diff(&DiffEvent {
            state,
            base_dir: &task.source,
            source,
            target,
        });
    }

    fn should_descend(&self, dir: &DirEntry, task: &DirTask) -> bool {
        if self.state.cancel.is_cancelled() || !self.config.may_descend(task.depth) {
            return false;
        }
        if dir.is_reparse_point() && !self.config.follow_junctions {
            trace!(dir = %task.source.join(dir.name.as_str()).display(), "Skipping reparse point");
            return false;
        }
        true
    }

    fn publish(&self, task: &DirTask, finished: bool) {
        let counters = self.state.counters.snapshot();
        if !finished && counters.done % PROGRESS_INTERVAL != 0 {
            return;
        }
        let _ = self.state.progress_tx.send(WalkProgress {
            counters,
            errors_count: self.state.errors.load(Ordering::Relaxed),
            current_dir: task.source.clone(),
            elapsed: self.state.elapsed(),
            finished,
        });
    }
}

/// Sub-directory pair found by a classification.
struct Descent<'a> {
    /// Entry whose attributes decide about reparse points.
    entry: &'a DirEntry,
    source_name: &'a str,
    target_name: &'a str,
}

/// The directory pair to descend into for a classified pair, if any.
fn descent<'a>(
    state: DiffState,
    source: Option<&'a DirEntry>,
    target: Option<&'a DirEntry>,
) -> Option<Descent<'a>> {
    let (entry, other) = match (state, source, target) {
        (DiffState::New, Some(src), _) if src.is_dir() => (src, src),
        (DiffState::Delete, _, Some(trg)) if trg.is_dir() => (trg, trg),
        (DiffState::SameSame | DiffState::Modify, Some(src), Some(trg))
            if src.is_dir() && trg.is_dir() =>
        {
            (src, trg)
        }
        _ => return None,
    };
    Some(Descent {
        entry,
        source_name: entry.name.as_str(),
        target_name: other.name.as_str(),
    })
}

/// Task entry point on a pool thread.
///
/// Never unwinds: panics from the comparison are reported as warnings and
/// the task is still accounted for, so the walk can always complete.
fn run_task(ctx: Arc<TaskContext>, task: DirTask) {
    let state = Arc::clone(&ctx.state);
    state.counters.begin();

    if state.cancel.is_cancelled() {
        state.counters.skip();
    } else {
        debug!(dir = %task.source.display(), depth = task.depth, "Comparing directory");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| ctx.compare(&task)));
        if let Err(payload) = outcome {
            let dir = CompareConfig::resolve(&ctx.config.source, &task.source);
            ctx.on_error(&WalkWarning::task_panicked(dir, &panic_message(payload.as_ref())));
        }
    }

    let last = state.counters.finish();
    if last {
        let _ = state.duration.set(state.elapsed());
    }
    ctx.publish(&task, last);
    if last {
        let counters = state.counters.snapshot();
        info!(
            dirs = counters.done,
            skipped = counters.skipped,
            errors = state.errors.load(Ordering::Relaxed),
            cancelled = state.cancel.is_cancelled(),
            "Tree comparison finished"
        );
        state.completion.signal();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmptree_core::FileTime;

    #[test]
    fn test_descent_rules() {
        let t = FileTime::default();
        let dir = DirEntry::directory("d", t);
        let file = DirEntry::file("f", 1, t);

        assert!(descent(DiffState::New, Some(&dir), None).is_some());
        assert!(descent(DiffState::New, Some(&file), None).is_none());
        assert!(descent(DiffState::Delete, None, Some(&dir)).is_some());
        assert!(descent(DiffState::SameSame, Some(&dir), Some(&dir)).is_some());
        assert!(descent(DiffState::SameSame, Some(&file), Some(&file)).is_none());
    }

    #[test]
    fn test_descent_keeps_both_names() {
        let t = FileTime::default();
        let src = DirEntry::directory("Foo", t);
        let trg = DirEntry::directory("foo", t);

        let next = descent(DiffState::SameSame, Some(&src), Some(&trg)).unwrap();
        assert_eq!(next.source_name, "Foo");
        assert_eq!(next.target_name, "foo");

        let next = descent(DiffState::Delete, None, Some(&trg)).unwrap();
        assert_eq!((next.source_name, next.target_name), ("foo", "foo"));
    }

    #[test]
    fn test_child_task() {
        let child = DirTask::root().child("a", "A").child("b", "b");
        assert_eq!(child.source, Path::new("a").join("b"));
        assert_eq!(child.target, Path::new("A").join("b"));
        assert_eq!(child.depth, 2);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }

    #[test]
    fn test_wait_without_start_returns() {
        let walker = TreeWalker::new(CompareConfig::new("/a", "/b"), Arc::new(|_: &DiffEvent<'_>| {}));
        walker.wait();
        assert!(!walker.wait_timeout(Duration::from_millis(1)));
        assert!(!walker.is_finished());
    }
}
