//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressReporter`] for observing a batch,
//! [`CancellationToken`] for cooperative cancellation, and [`ProgressInfo`]
//! for coarse progress snapshots.
//!
//! # Example
//!
//! ```
//! use framezip::{ItemStatus, ProgressInfo, ProgressReporter, QueueItem};
//!
//! struct PrintProgress;
//!
//! impl ProgressReporter for PrintProgress {
//!     fn on_status(&self, index: usize, item: &QueueItem) {
//!         println!("#{index} {}: {}", item.source.name, item.status());
//!     }
//!
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{:.1}% complete", info.percentage);
//!     }
//! }
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use crate::{error::FramezipError, queue::QueueItem};

/// A snapshot of batch progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Queue index of the item being processed.
    pub item_index: usize,
    /// Number of items in the batch.
    pub total_items: usize,
    /// Frames captured so far for the current item.
    pub frames_done: u64,
    /// Frames scheduled for the current item.
    pub frames_total: u64,
    /// Overall completion percentage (0.0 – 100.0).
    pub percentage: f32,
    /// Wall-clock time elapsed since the batch started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
}

/// Receives status transitions and progress updates from a running batch.
///
/// Reporters observe but cannot influence the run; use a
/// [`CancellationToken`] to stop it. All methods default to doing nothing.
pub trait ProgressReporter: Send + Sync {
    /// Called after every status transition of the item at `index`.
    fn on_status(&self, _index: usize, _item: &QueueItem) {}

    /// Called after every captured frame and at item boundaries.
    fn on_progress(&self, _info: &ProgressInfo) {}

    /// Called once when a batch-level operation (the shared archive) fails.
    fn on_batch_error(&self, _error: &FramezipError) {}
}

/// A reporter that discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpReporter;

impl ProgressReporter for NoOpReporter {}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clones share state. The orchestrator polls the token before each queue
/// item and before each frame capture; an in-flight capture, encode, or
/// archive step always runs to completion.
///
/// # Example
///
/// ```
/// use framezip::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Clear a previous request so the token can guard a new run.
    pub(crate) fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks batch-wide progress and builds [`ProgressInfo`] snapshots.
pub(crate) struct ProgressTracker {
    total_items: usize,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(total_items: usize) -> Self {
        Self {
            total_items,
            start_time: Instant::now(),
        }
    }

    /// Snapshot for `frames_done` of `frames_total` within item `item_index`.
    ///
    /// Each item contributes an equal share of the percentage.
    pub(crate) fn snapshot(
        &self,
        item_index: usize,
        frames_done: u64,
        frames_total: u64,
    ) -> ProgressInfo {
        let elapsed = self.start_time.elapsed();

        let item_fraction = if frames_total > 0 {
            (frames_done as f64 / frames_total as f64).min(1.0)
        } else {
            0.0
        };
        let fraction = if self.total_items > 0 {
            ((item_index as f64 + item_fraction) / self.total_items as f64).min(1.0)
        } else {
            1.0
        };

        let estimated_remaining = (fraction > 0.0 && fraction < 1.0).then(|| {
            let total = elapsed.as_secs_f64() / fraction;
            Duration::from_secs_f64(total - elapsed.as_secs_f64())
        });

        ProgressInfo {
            item_index,
            total_items: self.total_items,
            frames_done,
            frames_total,
            percentage: (fraction * 100.0) as f32,
            elapsed,
            estimated_remaining,
        }
    }

    /// Snapshot reporting the whole batch as finished.
    pub(crate) fn finished(&self) -> ProgressInfo {
        self.snapshot(self.total_items, 0, 0)
    }
}
