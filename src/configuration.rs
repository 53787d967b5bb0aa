//! Extraction settings.
//!
//! [`ExtractionSettings`] is captured once when a batch starts and stays
//! immutable for the rest of the run. It selects the extraction mode, the
//! meaning of the time parameter, and how captured frames are encoded and
//! stored.
//!
//! # Example
//!
//! ```
//! use framezip::{ExtractionMode, ExtractionSettings, ImageFormat};
//!
//! // One JPEG every two seconds, one archive per video.
//! let settings = ExtractionSettings::new(ExtractionMode::IntervalMultiArchive, 2.0)
//!     .with_image_format(ImageFormat::Jpeg)
//!     .with_quality(0.8);
//! assert_eq!(settings.image_format.extension(), "jpg");
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use zip::CompressionMethod;

/// Default JPEG quality on the `[0, 1]` scale.
pub const DEFAULT_JPEG_QUALITY: f64 = 0.92;

/// Extraction strategy for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionMode {
    /// Sample frames at a fixed interval, one archive per video.
    #[default]
    IntervalMultiArchive,
    /// Sample one frame per video, every frame pooled into one shared archive.
    SingleFrameSharedArchive,
}

impl Display for ExtractionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ExtractionMode::IntervalMultiArchive => write!(f, "interval"),
            ExtractionMode::SingleFrameSharedArchive => write!(f, "single-frame"),
        }
    }
}

/// Output image format for captured frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// Lossless PNG. Quality is ignored.
    #[default]
    Png,
    /// Lossy JPEG at the configured quality.
    Jpeg,
}

impl ImageFormat {
    /// File extension used for archive entries in this format.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            _ => "jpg",
        }
    }
}

/// What happens to a per-source archive when cancellation interrupts its
/// frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancelPolicy {
    /// Drop the partial archive and mark the item as failed.
    #[default]
    DiscardPartial,
    /// Finalize and deliver the frames captured so far.
    DeliverPartial,
}

/// Compression applied to archive entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveCompression {
    /// DEFLATE compression.
    #[default]
    Deflated,
    /// No compression. PNG and JPEG payloads are already compressed, so this
    /// trades a slightly larger archive for a faster finalize.
    Stored,
}

impl ArchiveCompression {
    pub(crate) fn to_zip_method(self) -> CompressionMethod {
        match self {
            ArchiveCompression::Deflated => CompressionMethod::Deflated,
            ArchiveCompression::Stored => CompressionMethod::Stored,
        }
    }
}

/// Settings for one batch run.
///
/// `time_parameter` is the sampling interval in
/// [`IntervalMultiArchive`](ExtractionMode::IntervalMultiArchive) mode and the
/// snapshot time in
/// [`SingleFrameSharedArchive`](ExtractionMode::SingleFrameSharedArchive) mode,
/// both in seconds.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ExtractionSettings {
    /// Extraction strategy.
    pub mode: ExtractionMode,
    /// Interval or snapshot time in seconds, depending on `mode`.
    pub time_parameter: f64,
    /// Image format of archive entries.
    pub image_format: ImageFormat,
    /// JPEG quality in `[0, 1]`. Ignored for PNG.
    pub quality: f64,
    /// Handling of partially filled per-source archives on cancellation.
    pub cancel_policy: CancelPolicy,
    /// Compression applied to archive entries.
    pub compression: ArchiveCompression,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self::new(ExtractionMode::IntervalMultiArchive, 1.0)
    }
}

impl ExtractionSettings {
    /// Create settings for `mode` with the given time parameter.
    ///
    /// Defaults: PNG output, quality 0.92, partial archives discarded on
    /// cancellation, DEFLATE compression.
    pub fn new(mode: ExtractionMode, time_parameter: f64) -> Self {
        Self {
            mode,
            time_parameter,
            image_format: ImageFormat::Png,
            quality: DEFAULT_JPEG_QUALITY,
            cancel_policy: CancelPolicy::DiscardPartial,
            compression: ArchiveCompression::Deflated,
        }
    }

    /// Interval mode sampling every `interval` seconds.
    pub fn interval(interval: f64) -> Self {
        Self::new(ExtractionMode::IntervalMultiArchive, interval)
    }

    /// Single-frame mode capturing one frame at `timestamp` seconds.
    pub fn single_frame(timestamp: f64) -> Self {
        Self::new(ExtractionMode::SingleFrameSharedArchive, timestamp)
    }

    /// Set the output image format.
    pub fn with_image_format(mut self, format: ImageFormat) -> Self {
        self.image_format = format;
        self
    }

    /// Set the JPEG quality.
    ///
    /// Values are not validated here; the encoder clamps them into range.
    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = quality;
        self
    }

    /// Set the cancellation policy for per-source archives.
    pub fn with_cancel_policy(mut self, policy: CancelPolicy) -> Self {
        self.cancel_policy = policy;
        self
    }

    /// Set the archive entry compression.
    pub fn with_compression(mut self, compression: ArchiveCompression) -> Self {
        self.compression = compression;
        self
    }
}
