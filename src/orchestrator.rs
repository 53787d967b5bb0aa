//! Sequential batch orchestration.
//!
//! [`BatchOrchestrator`] walks a queue of videos one at a time. For each video
//! it resolves metadata, schedules capture timestamps, and runs every
//! timestamp through capture, encoding and archiving before moving on. Per-file
//! failures are recorded on the queue item and never stop the batch.
//!
//! The orchestrator is `Sync`: share it behind an [`Arc`](std::sync::Arc) to
//! call [`request_cancel`](BatchOrchestrator::request_cancel) from another
//! thread while [`start_batch`](BatchOrchestrator::start_batch) runs.
//!
//! # Example
//!
//! ```no_run
//! use framezip::{
//!     BatchOrchestrator, DirectorySink, ExtractionSettings, NoOpReporter, SourceVideo,
//! };
//!
//! let files = vec![
//!     SourceVideo::from_path("a.mp4")?,
//!     SourceVideo::from_path("b.mp4")?,
//! ];
//! let orchestrator = BatchOrchestrator::new();
//! let report = orchestrator.start_batch(
//!     files,
//!     &ExtractionSettings::interval(2.0),
//!     &DirectorySink::new("out"),
//!     &NoOpReporter,
//! )?;
//! println!("delivered {:?}", report.delivered);
//! # Ok::<(), framezip::FramezipError>(())
//! ```

use std::sync::{Mutex, MutexGuard};

use crate::{
    archive::{self, ArchiveBuilder, ArchiveEntry},
    capture::{FfmpegOpener, SourceOpener},
    configuration::{CancelPolicy, ExtractionMode, ExtractionSettings, ImageFormat},
    encoder,
    error::FramezipError,
    progress::{CancellationToken, ProgressReporter, ProgressTracker},
    queue::{ItemStatus, QueueItem},
    scheduler,
    sink::ArchiveSink,
    source::SourceVideo,
};

/// Lifecycle state of a [`BatchOrchestrator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// No batch has run yet.
    Idle,
    /// A batch is in progress.
    Running,
    /// The last batch ran to the end of its queue.
    Completed,
    /// The last batch stopped because cancellation was requested.
    Cancelled,
}

/// How a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every item was attempted.
    Completed,
    /// Cancellation was requested during the run.
    Cancelled,
}

/// Summary of a finished batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// How the batch ended.
    pub outcome: BatchOutcome,
    /// Final state of every queue item, in queue order.
    pub items: Vec<QueueItem>,
    /// Names of the archives handed to the sink, in delivery order.
    pub delivered: Vec<String>,
    /// Message of a batch-level failure (shared archive finalize or delivery).
    pub batch_error: Option<String>,
}

impl BatchReport {
    /// Number of items that ended with `status`.
    pub fn count(&self, status: ItemStatus) -> usize {
        self.items
            .iter()
            .filter(|item| item.status() == status)
            .count()
    }
}

/// One encoded capture, produced and consumed within a single pipeline step.
#[derive(Debug, Clone)]
pub struct FrameSample {
    /// Queue index of the source video.
    pub queue_index: usize,
    /// Capture time in seconds.
    pub timestamp: f64,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
    /// Format of `bytes`.
    pub format: ImageFormat,
}

impl FrameSample {
    /// Turn the sample into an archive entry named for `mode`.
    pub fn into_entry(self, stem: &str, mode: ExtractionMode) -> ArchiveEntry {
        let name = match mode {
            ExtractionMode::IntervalMultiArchive => {
                archive::per_source_entry_name(stem, self.timestamp, self.format)
            }
            ExtractionMode::SingleFrameSharedArchive => {
                archive::shared_entry_name(stem, self.queue_index, self.format)
            }
        };
        ArchiveEntry {
            name,
            bytes: self.bytes,
        }
    }
}

/// State of one run, dropped when the run ends.
struct BatchSession<'a> {
    settings: &'a ExtractionSettings,
    items: Vec<QueueItem>,
    shared_archive: Option<ArchiveBuilder>,
    delivered: Vec<String>,
    tracker: ProgressTracker,
    last_stamp: i64,
}

impl BatchSession<'_> {
    /// Unix milliseconds for the next archive name, strictly increasing within
    /// the session so two archives of the same stem never share a name.
    fn next_archive_stamp(&mut self) -> i64 {
        let stamp = chrono::Utc::now().timestamp_millis().max(self.last_stamp + 1);
        self.last_stamp = stamp;
        stamp
    }
}

/// Drives a queue of videos through the extraction pipeline.
pub struct BatchOrchestrator<O = FfmpegOpener> {
    opener: O,
    state: Mutex<BatchState>,
    cancellation: CancellationToken,
}

impl BatchOrchestrator<FfmpegOpener> {
    /// Create an orchestrator that decodes with FFmpeg.
    pub fn new() -> Self {
        Self::with_opener(FfmpegOpener)
    }
}

impl Default for BatchOrchestrator<FfmpegOpener> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: SourceOpener> BatchOrchestrator<O> {
    /// Create an orchestrator that opens sources with `opener`.
    pub fn with_opener(opener: O) -> Self {
        Self {
            opener,
            state: Mutex::new(BatchState::Idle),
            cancellation: CancellationToken::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BatchState {
        *self.lock_state()
    }

    /// Request cooperative cancellation of the running batch. Idempotent.
    ///
    /// The flag is observed before the next queue item and before the next
    /// frame capture. Starting a new batch clears it.
    pub fn request_cancel(&self) {
        log::info!("Cancellation requested");
        self.cancellation.cancel();
    }

    /// A handle sharing this orchestrator's cancellation flag, suitable for
    /// signal handlers.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Process `files` in order and deliver the resulting archives to `sink`.
    ///
    /// Per-item failures are recorded in the returned report and never abort
    /// the batch. In interval mode every video gets its own archive; in
    /// single-frame mode one shared archive is delivered after the last
    /// video, unless the batch was cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`FramezipError::BatchAlreadyRunning`] if another batch is in
    /// progress; that batch is not affected.
    pub fn start_batch(
        &self,
        files: Vec<SourceVideo>,
        settings: &ExtractionSettings,
        sink: &dyn ArchiveSink,
        reporter: &dyn ProgressReporter,
    ) -> Result<BatchReport, FramezipError> {
        let mut guard = self.enter_running()?;

        log::info!(
            "Starting {} batch of {} file(s), time parameter {}s, {:?}",
            settings.mode,
            files.len(),
            settings.time_parameter,
            settings.image_format,
        );

        let total_items = files.len();
        let mut session = BatchSession {
            settings,
            items: files.into_iter().map(QueueItem::new).collect(),
            shared_archive: (settings.mode == ExtractionMode::SingleFrameSharedArchive)
                .then(|| ArchiveBuilder::new(settings.compression)),
            delivered: Vec::new(),
            tracker: ProgressTracker::new(total_items),
            last_stamp: 0,
        };
        for (index, item) in session.items.iter().enumerate() {
            reporter.on_status(index, item);
        }

        for index in 0..total_items {
            if self.cancellation.is_cancelled() {
                log::info!(
                    "Cancelled before item {index}; {} item(s) left pending",
                    total_items - index
                );
                break;
            }
            self.run_item(index, &mut session, sink, reporter)?;
        }

        let cancelled = self.cancellation.is_cancelled();
        let mut batch_error = None;

        if let Some(shared_archive) = session.shared_archive.take() {
            if cancelled {
                log::warn!(
                    "Discarding shared archive with {} entries after cancellation",
                    shared_archive.len()
                );
            } else if total_items > 0 {
                let name = archive::shared_archive_name(session.next_archive_stamp());
                match finalize_and_deliver(shared_archive, &name, sink) {
                    Ok(()) => session.delivered.push(name),
                    Err(error) => {
                        log::error!("Shared archive failed: {error}");
                        reporter.on_batch_error(&error);
                        batch_error = Some(error.to_string());
                    }
                }
            }
        }

        reporter.on_progress(&session.tracker.finished());

        let (outcome, state) = if cancelled {
            (BatchOutcome::Cancelled, BatchState::Cancelled)
        } else {
            (BatchOutcome::Completed, BatchState::Completed)
        };
        guard.finish(state);

        let report = BatchReport {
            outcome,
            items: session.items,
            delivered: session.delivered,
            batch_error,
        };
        log::info!(
            "Batch {:?}: {} done, {} failed, {} pending, {} archive(s) delivered",
            report.outcome,
            report.count(ItemStatus::Done),
            report.count(ItemStatus::Error),
            report.count(ItemStatus::Pending),
            report.delivered.len(),
        );
        Ok(report)
    }

    /// Move the item at `index` through its whole lifecycle.
    fn run_item(
        &self,
        index: usize,
        session: &mut BatchSession<'_>,
        sink: &dyn ArchiveSink,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), FramezipError> {
        session.items[index].start()?;
        reporter.on_status(index, &session.items[index]);
        reporter.on_progress(&session.tracker.snapshot(index, 0, 0));

        match self.process_item(index, session, sink, reporter) {
            Ok(()) => {
                log::debug!("Finished {}", session.items[index].source.name);
                session.items[index].complete()?;
            }
            Err(error) => {
                log::warn!("Failed {}: {error}", session.items[index].source.name);
                session.items[index].fail(error.to_string())?;
            }
        }
        reporter.on_status(index, &session.items[index]);
        Ok(())
    }

    /// Capture, encode and archive every scheduled frame of one video.
    fn process_item(
        &self,
        index: usize,
        session: &mut BatchSession<'_>,
        sink: &dyn ArchiveSink,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), FramezipError> {
        let settings = session.settings;
        let source = session.items[index].source.clone();
        let stem = source.stem();

        let mut frames = self.opener.open(&source)?;
        let timestamps = scheduler::schedule(frames.properties().duration, settings);
        let frames_total = timestamps.len() as u64;
        log::debug!(
            "{}: {frames_total} frame(s) scheduled over {:.2}s",
            source.name,
            frames.properties().duration
        );

        let mut per_source_archive = (settings.mode == ExtractionMode::IntervalMultiArchive)
            .then(|| ArchiveBuilder::new(settings.compression));
        let mut interrupted = false;

        for (position, timestamp) in timestamps.enumerate() {
            if self.cancellation.is_cancelled() {
                interrupted = true;
                break;
            }

            let frame = frames.capture(timestamp)?;
            let sample = FrameSample {
                queue_index: index,
                timestamp,
                bytes: encoder::encode(&frame, settings.image_format, settings.quality)?,
                format: settings.image_format,
            };
            let entry = sample.into_entry(stem, settings.mode);

            match per_source_archive.as_mut().or(session.shared_archive.as_mut()) {
                Some(archive) => archive.push(&entry)?,
                None => {
                    return Err(FramezipError::Archive(
                        "no archive is open for this batch".to_string(),
                    ));
                }
            }

            reporter.on_progress(&session.tracker.snapshot(
                index,
                position as u64 + 1,
                frames_total,
            ));
        }

        // Release the decoder before the potentially slow finalize.
        drop(frames);

        if interrupted {
            match (settings.cancel_policy, &per_source_archive) {
                (CancelPolicy::DeliverPartial, Some(archive)) if !archive.is_empty() => {
                    log::info!("{}: delivering partial archive after cancellation", source.name);
                }
                _ => {
                    log::info!("{}: abandoning frames after cancellation", source.name);
                    return Err(FramezipError::Cancelled);
                }
            }
        }

        if let Some(per_source_archive) = per_source_archive {
            let name = archive::per_source_archive_name(stem, session.next_archive_stamp());
            finalize_and_deliver(per_source_archive, &name, sink)?;
            session.delivered.push(name);
        }

        Ok(())
    }

    fn enter_running(&self) -> Result<RunningGuard<'_>, FramezipError> {
        let mut state = self.lock_state();
        if *state == BatchState::Running {
            log::warn!("Ignoring start request: a batch is already running");
            return Err(FramezipError::BatchAlreadyRunning);
        }
        *state = BatchState::Running;
        self.cancellation.reset();
        Ok(RunningGuard {
            state: &self.state,
            final_state: BatchState::Idle,
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, BatchState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Leaves the `Running` state when dropped, so a run that unwinds early does
/// not block later batches.
struct RunningGuard<'a> {
    state: &'a Mutex<BatchState>,
    final_state: BatchState,
}

impl RunningGuard<'_> {
    fn finish(&mut self, state: BatchState) {
        self.final_state = state;
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *state = self.final_state;
    }
}

fn finalize_and_deliver(
    archive: ArchiveBuilder,
    name: &str,
    sink: &dyn ArchiveSink,
) -> Result<(), FramezipError> {
    let bytes = archive.finalize()?;
    log::info!("Delivering {name} ({} bytes)", bytes.len());
    sink.deliver(name, bytes)
}
