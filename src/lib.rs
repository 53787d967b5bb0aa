//! # framezip
//!
//! Extract still frames from batches of video files and package them into
//! ZIP archives.
//!
//! `framezip` decodes videos with FFmpeg (via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next)), encodes frames as
//! PNG or JPEG with the [`image`](https://crates.io/crates/image) crate, and
//! writes archives with [`zip`](https://crates.io/crates/zip).
//!
//! ## Quick Start
//!
//! ### One archive of frames per video
//!
//! ```no_run
//! use framezip::{
//!     BatchOrchestrator, DirectorySink, ExtractionSettings, ImageFormat, NoOpReporter,
//!     SourceVideo,
//! };
//!
//! let files = vec![SourceVideo::from_path("talk.mp4")?];
//! let settings = ExtractionSettings::interval(5.0).with_image_format(ImageFormat::Jpeg);
//!
//! let report = BatchOrchestrator::new().start_batch(
//!     files,
//!     &settings,
//!     &DirectorySink::new("frames"),
//!     &NoOpReporter,
//! )?;
//! // frames/talk_frames_<millis>.zip contains talk/frame_0_00.jpg, talk/frame_5_00.jpg, ...
//! # Ok::<(), framezip::FramezipError>(())
//! ```
//!
//! ### One thumbnail per video, all in one archive
//!
//! ```no_run
//! use framezip::{
//!     BatchOrchestrator, DirectorySink, ExtractionSettings, NoOpReporter, SourceVideo,
//! };
//!
//! let files = vec![
//!     SourceVideo::from_path("a/clip.mp4")?,
//!     SourceVideo::from_path("b/clip.mp4")?,
//! ];
//! BatchOrchestrator::new().start_batch(
//!     files,
//!     &ExtractionSettings::single_frame(10.0),
//!     &DirectorySink::new("thumbs"),
//!     &NoOpReporter,
//! )?;
//! // thumbs/thumbnails_<millis>.zip contains clip_0.png and clip_1.png
//! # Ok::<(), framezip::FramezipError>(())
//! ```
//!
//! ## Pipeline
//!
//! - **Scheduling**: [`schedule`] yields capture timestamps lazily
//! - **Capture**: [`SourceOpener`] / [`FrameSource`] decode one frame per
//!   timestamp, reusing buffers within a video
//! - **Encoding**: [`encode`] produces PNG or JPEG bytes
//! - **Archiving**: [`ArchiveBuilder`] collects uniquely named entries
//! - **Orchestration**: [`BatchOrchestrator`] runs the queue strictly in
//!   order, isolates per-file failures, and honours cooperative cancellation
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod archive;
pub mod capture;
pub mod configuration;
mod conversion;
pub mod encoder;
pub mod error;
pub mod ffmpeg;
pub mod orchestrator;
pub mod progress;
pub mod queue;
pub mod scheduler;
pub mod sink;
pub mod source;

pub use archive::{
    ArchiveBuilder, ArchiveEntry, per_source_archive_name, per_source_entry_name,
    shared_archive_name, shared_entry_name,
};
pub use capture::{FfmpegFrameSource, FfmpegOpener, FrameSource, SourceOpener, probe};
pub use configuration::{
    ArchiveCompression, CancelPolicy, DEFAULT_JPEG_QUALITY, ExtractionMode, ExtractionSettings,
    ImageFormat,
};
pub use encoder::{encode, jpeg_quality};
pub use error::FramezipError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use orchestrator::{BatchOrchestrator, BatchOutcome, BatchReport, BatchState, FrameSample};
pub use progress::{CancellationToken, NoOpReporter, ProgressInfo, ProgressReporter};
pub use queue::{ItemStatus, QueueItem};
pub use scheduler::{FALLBACK_INTERVAL, Schedule, effective_interval, schedule, snapshot_timestamp};
pub use sink::{ArchiveSink, DirectorySink, MemorySink};
pub use source::{SourceVideo, VideoProperties, strip_extension};
