//! Error types for the `framezip` crate.
//!
//! This module defines [`FramezipError`], the unified error type returned by
//! every fallible operation in the pipeline. Per-file errors carry the path or
//! timestamp they relate to so they can be shown next to the queue item that
//! failed.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;
use zip::result::ZipError;

use crate::queue::ItemStatus;

/// The unified error type for all `framezip` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramezipError {
    /// The video could not be opened or has no decodable duration.
    #[error("Failed to read video metadata from {path}: {reason}")]
    Metadata {
        /// Path of the source video.
        path: PathBuf,
        /// Underlying reason the metadata could not be resolved.
        reason: String,
    },

    /// Seeking to or decoding the frame at a timestamp failed.
    #[error("Failed to decode frame at {timestamp:.2}s: {reason}")]
    Decode {
        /// Requested capture time in seconds.
        timestamp: f64,
        /// Underlying reason the frame could not be produced.
        reason: String,
    },

    /// The image codec rejected the frame or quality combination.
    #[error("Failed to encode frame: {0}")]
    Encode(String),

    /// Archive compression or finalization failed.
    #[error("Archive error: {0}")]
    Archive(String),

    /// An entry with the same name already exists in the archive.
    #[error("Duplicate archive entry: {0}")]
    DuplicateEntry(String),

    /// The archive sink could not store a finalized archive.
    #[error("Failed to deliver archive {name}: {reason}")]
    Delivery {
        /// Name of the archive that was being delivered.
        name: String,
        /// Underlying reason the delivery failed.
        reason: String,
    },

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// A batch was started while another one is still running.
    #[error("A batch is already running")]
    BatchAlreadyRunning,

    /// A queue item was asked to move backwards or sideways in its lifecycle.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Status the item currently has.
        from: ItemStatus,
        /// Status that was requested.
        to: ItemStatus,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),

    /// An error from the `zip` crate.
    #[error("ZIP error: {0}")]
    Zip(#[from] ZipError),
}

impl From<FfmpegError> for FramezipError {
    fn from(error: FfmpegError) -> Self {
        FramezipError::Ffmpeg(error.to_string())
    }
}
