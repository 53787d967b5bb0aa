//! Destinations for finalized archives.
//!
//! The orchestrator hands every finalized archive to an [`ArchiveSink`]. Two
//! sinks ship with the crate: [`DirectorySink`] writes archives to disk and
//! [`MemorySink`] keeps them in memory.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::error::FramezipError;

/// Receives finalized archives.
///
/// Called once per per-source archive in interval mode and once per batch in
/// single-frame mode.
pub trait ArchiveSink: Send + Sync {
    /// Store or forward the archive called `name`.
    ///
    /// # Errors
    ///
    /// Implementations return [`FramezipError::Delivery`] (or an I/O error)
    /// when the archive cannot be stored.
    fn deliver(&self, name: &str, bytes: Vec<u8>) -> Result<(), FramezipError>;
}

/// Writes each archive as `<directory>/<name>`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    directory: PathBuf,
    overwrite: bool,
}

impl DirectorySink {
    /// Create a sink writing into `directory`. Existing files are never
    /// replaced unless [`with_overwrite`](DirectorySink::with_overwrite) is set.
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            overwrite: false,
        }
    }

    /// Allow replacing existing files.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Output directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl ArchiveSink for DirectorySink {
    fn deliver(&self, name: &str, bytes: Vec<u8>) -> Result<(), FramezipError> {
        let delivery_error = |reason: String| FramezipError::Delivery {
            name: name.to_string(),
            reason,
        };

        fs::create_dir_all(&self.directory).map_err(|error| delivery_error(error.to_string()))?;
        let path = self.directory.join(name);
        if path.exists() && !self.overwrite {
            return Err(delivery_error(format!(
                "{} already exists",
                path.display()
            )));
        }

        fs::write(&path, &bytes).map_err(|error| delivery_error(error.to_string()))?;
        log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

/// Collects delivered archives in memory, in delivery order.
#[derive(Debug, Default)]
pub struct MemorySink {
    archives: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the delivered archives.
    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    /// Remove and return every delivered archive.
    pub fn take(&self) -> Vec<(String, Vec<u8>)> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of delivered archives.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing has been delivered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, Vec<u8>)>> {
        // A panic while holding the lock cannot leave the list half-written.
        self.archives
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ArchiveSink for MemorySink {
    fn deliver(&self, name: &str, bytes: Vec<u8>) -> Result<(), FramezipError> {
        self.lock().push((name.to_string(), bytes));
        Ok(())
    }
}
