//! Source video descriptors.
//!
//! A [`SourceVideo`] names one input file of a batch. Its intrinsic
//! [`VideoProperties`] are only known once a
//! [`SourceOpener`](crate::SourceOpener) has opened it.

use std::path::{Path, PathBuf};

use crate::error::FramezipError;

/// One video queued for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceVideo {
    /// File name shown to the user and used to derive entry names.
    pub name: String,
    /// Size of the file in bytes.
    pub byte_size: u64,
    /// Location of the decodable data.
    pub path: PathBuf,
}

impl SourceVideo {
    /// Describe a video with an explicit name and size.
    pub fn new(name: impl Into<String>, byte_size: u64, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            byte_size,
            path: path.into(),
        }
    }

    /// Describe the video at `path`, reading its size from the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`FramezipError::Io`] if the file metadata cannot be read.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FramezipError> {
        let path = path.as_ref();
        let byte_size = std::fs::metadata(path)?.len();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, byte_size, path))
    }

    /// The name without its final extension (`"clip.final.mp4"` → `"clip.final"`).
    pub fn stem(&self) -> &str {
        strip_extension(&self.name)
    }
}

/// Strip the final `.ext` from a file name.
///
/// Names without a dot, or whose only dot is the leading one (`".hidden"`),
/// are returned unchanged.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(index) if index > 0 => &name[..index],
        _ => name,
    }
}

/// Properties resolved when a source is opened.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoProperties {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Duration in seconds.
    pub duration: f64,
    /// Average frames per second, `0.0` when unknown.
    pub frames_per_second: f64,
    /// Codec name (e.g. `"h264"`), `"unknown"` when unavailable.
    pub codec: String,
}
