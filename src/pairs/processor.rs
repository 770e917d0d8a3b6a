// ChunkedProcessor: a fixed pool of OS threads draining one shared work queue.
//
// The queue is any iterator, pulled lazily in chunks under a single lock, so
// peak memory is bounded by `workers * chunk_size` items no matter how long
// the input is. The same lock guards the progress counter; per-item work runs
// outside it. Each worker registers with a monitor when it starts and
// deregisters when it exits (also when it unwinds), and the driver blocks on
// the monitor until every worker is gone.
//
// A failing work item is logged and skipped. Cancellation is cooperative: the
// flag is checked before every chunk fetch.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};

/// Progress is logged every time completion crosses a multiple of this percentage.
pub const REPORT_STEP_PERCENT: u32 = 5;

/// Shared flag that asks running workers to stop at their next chunk fetch.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Outcome of one `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Items the caller said the queue holds
    pub total: usize,
    /// Items taken off the queue and handed to the work closure
    pub processed: usize,
    /// Items whose work closure returned an error
    pub failed: usize,
    /// Whether cancellation was requested during the run
    pub cancelled: bool,
}

/// Percentage complete; an empty run counts as finished.
pub fn percent_complete(processed: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        processed as f64 * 100.0 / total as f64
    }
}

/// Report thresholds passed when progress moves from `before` to `after` of `total`.
///
/// A threshold t (a multiple of `REPORT_STEP_PERCENT` up to 100) is crossed
/// when `before/total < t% <= after/total`. Integer arithmetic, so each
/// threshold is crossed by exactly one step of a monotone counter. An empty
/// run (`total == 0`) crosses nothing.
pub fn crossed_thresholds(before: usize, after: usize, total: usize) -> Vec<u32> {
    let (before, after, total) = (before as u128 * 100, after as u128 * 100, total as u128);
    (1..=100 / REPORT_STEP_PERCENT)
        .map(|step| step * REPORT_STEP_PERCENT)
        .filter(|&t| {
            let mark = u128::from(t) * total;
            before < mark && mark <= after
        })
        .collect()
}

/// Queue and progress counter: the only state workers contend on.
struct Shared<I> {
    pending: I,
    processed: usize,
}

/// Tracks live worker ids so the driver can wait for all of them.
#[derive(Default)]
struct Monitor {
    active: Mutex<HashSet<usize>>,
    idle: Condvar,
}

impl Monitor {
    fn register(&self, id: usize) {
        self.active.lock().insert(id);
    }

    fn deregister(&self, id: usize) {
        let mut active = self.active.lock();
        active.remove(&id);
        if active.is_empty() {
            self.idle.notify_all();
        }
    }

    fn wait_until_idle(&self) {
        let mut active = self.active.lock();
        while !active.is_empty() {
            self.idle.wait(&mut active);
        }
    }
}

/// Deregisters a worker on drop, including during a panic.
struct Registration<'a> {
    monitor: &'a Monitor,
    id: usize,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.monitor.deregister(self.id);
    }
}

/// Fixed-size thread pool that applies a closure to every item of an iterator.
#[derive(Debug, Clone)]
pub struct ChunkedProcessor {
    workers: usize,
    chunk_size: usize,
    cancel: CancellationToken,
    progress_bar: bool,
    label: String,
}

impl ChunkedProcessor {
    /// Fails with `InvalidArgument` when `workers` is zero.
    pub fn new(workers: usize) -> Result<Self> {
        if workers < 1 {
            return Err(Error::InvalidArgument(format!(
                "worker count must be at least 1, got {workers}"
            )));
        }
        Ok(Self {
            workers,
            chunk_size: 1000,
            cancel: CancellationToken::new(),
            progress_bar: false,
            label: "items".to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.workers)?
            .with_chunk_size(config.chunk_size)
            .with_progress_bar(config.progress_bar))
    }

    /// Items popped per lock acquisition (at least 1).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_progress_bar(mut self, enabled: bool) -> Self {
        self.progress_bar = enabled;
        self
    }

    /// Name used in progress log lines.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Apply `work` to every item of `items`, blocking until all workers have finished.
    ///
    /// `total` is only used for progress reporting.
    pub fn run<I, F>(&self, items: I, total: usize, work: F) -> RunSummary
    where
        I: Iterator + Send,
        I::Item: Send,
        F: Fn(I::Item) -> anyhow::Result<()> + Sync,
    {
        let shared = Mutex::new(Shared {
            pending: items,
            processed: 0,
        });
        let monitor = Monitor::default();
        let failed = AtomicUsize::new(0);
        let bar = self.progress_bar.then(|| self.make_bar(total));

        info!(
            label = self.label.as_str(),
            total,
            workers = self.workers,
            chunk_size = self.chunk_size,
            "Starting parallel run"
        );

        thread::scope(|scope| {
            for id in 0..self.workers {
                // Register before spawning so the driver never sees an empty set early
                monitor.register(id);
                let shared = &shared;
                let monitor = &monitor;
                let failed = &failed;
                let work = &work;
                let bar = bar.as_ref();
                scope.spawn(move || {
                    let _registration = Registration { monitor, id };
                    self.worker_loop(id, shared, total, work, failed, bar);
                });
            }
            monitor.wait_until_idle();
        });

        if let Some(bar) = bar {
            bar.finish_and_clear();
        }

        let processed = shared.into_inner().processed;
        let summary = RunSummary {
            total,
            processed,
            failed: failed.into_inner(),
            cancelled: self.cancel.is_cancelled(),
        };
        info!(
            label = self.label.as_str(),
            processed = summary.processed,
            failed = summary.failed,
            cancelled = summary.cancelled,
            percent = percent_complete(summary.processed, total),
            "Parallel run finished"
        );
        summary
    }

    fn worker_loop<I, F>(
        &self,
        id: usize,
        shared: &Mutex<Shared<I>>,
        total: usize,
        work: &F,
        failed: &AtomicUsize,
        bar: Option<&ProgressBar>,
    ) where
        I: Iterator,
        F: Fn(I::Item) -> anyhow::Result<()>,
    {
        let mut done = 0usize;
        loop {
            if self.cancel.is_cancelled() {
                debug!(worker = id, "Cancellation requested, stopping");
                break;
            }

            let chunk: Vec<I::Item> = {
                let mut guard = shared.lock();
                guard.pending.by_ref().take(self.chunk_size).collect()
            };
            if chunk.is_empty() {
                break;
            }

            let size = chunk.len();
            for item in chunk {
                if let Err(e) = work(item) {
                    failed.fetch_add(1, Ordering::Relaxed);
                    warn!(worker = id, error = %e, "Work item failed, skipping");
                }
            }
            done += size;
            self.report(shared, size, total, bar);
        }
        debug!(worker = id, done, "Worker exiting");
    }

    fn report<I>(&self, shared: &Mutex<Shared<I>>, size: usize, total: usize, bar: Option<&ProgressBar>) {
        {
            let mut guard = shared.lock();
            let before = guard.processed;
            guard.processed += size;
            for percent in crossed_thresholds(before, guard.processed, total) {
                info!(
                    label = self.label.as_str(),
                    processed = guard.processed,
                    total,
                    percent,
                    "Progress"
                );
            }
        }
        if let Some(bar) = bar {
            bar.inc(size as u64);
        }
    }

    fn make_bar(&self, total: usize) -> ProgressBar {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template(&format!("  {} [{{bar:30}}] {{pos}}/{{len}} ({{eta}})", self.label))
        {
            bar.set_style(style);
        }
        bar
    }
}
