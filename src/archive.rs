//! ZIP archive assembly.
//!
//! [`ArchiveBuilder`] accumulates named entries and produces the archive
//! bytes on [`finalize`](ArchiveBuilder::finalize). Entry names must be unique
//! within one archive; the naming helpers in this module derive names that
//! are unique by construction for each extraction mode:
//!
//! - [`per_source_entry_name`]: `<stem>/frame_<seconds>.<ext>` for interval
//!   mode, unique because timestamps within one video strictly increase.
//! - [`shared_entry_name`]: `<stem>_<queue index>.<ext>` for single-frame
//!   mode, unique because queue indices are.
//!
//! # Example
//!
//! ```
//! use framezip::{ArchiveBuilder, ArchiveCompression, ImageFormat, per_source_entry_name};
//!
//! let mut builder = ArchiveBuilder::new(ArchiveCompression::Deflated);
//! let name = per_source_entry_name("clip", 3.5, ImageFormat::Png);
//! assert_eq!(name, "clip/frame_3_50.png");
//! builder.add_entry(&name, b"not really a png")?;
//! let bytes = builder.finalize()?;
//! assert!(bytes.starts_with(b"PK"));
//! # Ok::<(), framezip::FramezipError>(())
//! ```

use std::{
    collections::HashSet,
    fmt::{Debug, Formatter, Result as FmtResult},
    io::{Cursor, Write},
};

use zip::{ZipWriter, write::SimpleFileOptions};

use crate::{
    configuration::{ArchiveCompression, ImageFormat},
    error::FramezipError,
};

/// A named byte buffer stored in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path of the entry inside the archive.
    pub name: String,
    /// Entry contents.
    pub bytes: Vec<u8>,
}

/// Mutable accumulator of [`ArchiveEntry`] values.
///
/// Entries are compressed into an in-memory ZIP stream as they are added.
/// [`finalize`](ArchiveBuilder::finalize) consumes the builder, so an archive
/// is finalized at most once and accepts no entries afterwards.
pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    entry_names: Vec<String>,
    seen: HashSet<String>,
    payload_bytes: u64,
}

impl Debug for ArchiveBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ArchiveBuilder")
            .field("entries", &self.entry_names.len())
            .field("payload_bytes", &self.payload_bytes)
            .finish_non_exhaustive()
    }
}

impl ArchiveBuilder {
    /// Create an empty archive using `compression` for every entry.
    pub fn new(compression: ArchiveCompression) -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(compression.to_zip_method()),
            entry_names: Vec::new(),
            seen: HashSet::new(),
            payload_bytes: 0,
        }
    }

    /// Add an entry.
    ///
    /// # Errors
    ///
    /// Returns [`FramezipError::DuplicateEntry`] if an entry with the same
    /// name already exists, or [`FramezipError::Archive`] if compression
    /// fails.
    pub fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<(), FramezipError> {
        if self.seen.contains(name) {
            return Err(FramezipError::DuplicateEntry(name.to_string()));
        }

        self.writer
            .start_file(name, self.options)
            .map_err(|error| FramezipError::Archive(format!("cannot start {name}: {error}")))?;
        self.writer
            .write_all(bytes)
            .map_err(|error| FramezipError::Archive(format!("cannot write {name}: {error}")))?;

        self.seen.insert(name.to_string());
        self.entry_names.push(name.to_string());
        self.payload_bytes += bytes.len() as u64;
        log::trace!("Added archive entry {name} ({} bytes)", bytes.len());
        Ok(())
    }

    /// Add a prepared [`ArchiveEntry`].
    ///
    /// # Errors
    ///
    /// Same as [`add_entry`](ArchiveBuilder::add_entry).
    pub fn push(&mut self, entry: &ArchiveEntry) -> Result<(), FramezipError> {
        self.add_entry(&entry.name, &entry.bytes)
    }

    /// Number of entries added so far.
    pub fn len(&self) -> usize {
        self.entry_names.len()
    }

    /// Returns `true` if no entries have been added.
    pub fn is_empty(&self) -> bool {
        self.entry_names.is_empty()
    }

    /// Names of the entries in insertion order.
    pub fn entry_names(&self) -> &[String] {
        &self.entry_names
    }

    /// Total uncompressed size of all entries.
    pub fn payload_bytes(&self) -> u64 {
        self.payload_bytes
    }

    /// Write the central directory and return the archive bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FramezipError::Archive`] if the archive cannot be completed.
    pub fn finalize(self) -> Result<Vec<u8>, FramezipError> {
        let entries = self.entry_names.len();
        let cursor = self
            .writer
            .finish()
            .map_err(|error| FramezipError::Archive(format!("cannot finalize archive: {error}")))?;
        let bytes = cursor.into_inner();
        log::debug!("Finalized archive with {entries} entries ({} bytes)", bytes.len());
        Ok(bytes)
    }
}

/// Entry name for a frame in a per-source archive.
///
/// The timestamp is written with two decimals and its `.` replaced by `_`.
pub fn per_source_entry_name(stem: &str, timestamp: f64, format: ImageFormat) -> String {
    format!(
        "{stem}/frame_{}.{}",
        format_timestamp(timestamp),
        format.extension()
    )
}

/// Entry name for a frame in the shared archive.
pub fn shared_entry_name(stem: &str, queue_index: usize, format: ImageFormat) -> String {
    format!("{stem}_{queue_index}.{}", format.extension())
}

/// Delivered name of a per-source archive.
pub fn per_source_archive_name(stem: &str, unix_millis: i64) -> String {
    format!("{stem}_frames_{unix_millis}.zip")
}

/// Delivered name of the shared archive.
pub fn shared_archive_name(unix_millis: i64) -> String {
    format!("thumbnails_{unix_millis}.zip")
}

/// `3.5` → `"3_50"`.
fn format_timestamp(timestamp: f64) -> String {
    format!("{timestamp:.2}").replace('.', "_")
}
