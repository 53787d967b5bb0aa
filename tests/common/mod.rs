//! Shared test doubles: a scripted `SourceOpener` and a recording reporter.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    io::Cursor,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use framezip::{
    CancellationToken, FrameSource, FramezipError, ItemStatus, ProgressInfo, ProgressReporter,
    QueueItem, SourceOpener, SourceVideo, VideoProperties,
};
use image::{DynamicImage, Rgb, RgbImage};

/// Behaviour of one scripted video.
#[derive(Debug, Clone, Default)]
pub struct FakeVideo {
    pub duration: f64,
    pub fail_open: Option<String>,
    pub fail_capture_at: Option<f64>,
}

impl FakeVideo {
    pub fn lasting(duration: f64) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    pub fn unreadable(reason: &str) -> Self {
        Self {
            fail_open: Some(reason.to_string()),
            ..Self::default()
        }
    }
}

/// Opens scripted videos by path and records what the pipeline asked for.
#[derive(Clone, Default)]
pub struct FakeOpener {
    videos: HashMap<String, FakeVideo>,
    pub captures: Arc<Mutex<Vec<(String, f64)>>>,
    pub live_sources: Arc<AtomicUsize>,
    pub max_live_sources: Arc<AtomicUsize>,
}

impl FakeOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `video` under `path`.
    pub fn with(mut self, path: &str, video: FakeVideo) -> Self {
        self.videos.insert(path.to_string(), video);
        self
    }

    pub fn captured(&self) -> Vec<(String, f64)> {
        self.captures.lock().unwrap().clone()
    }

    pub fn capture_count(&self, path: &str) -> usize {
        self.captured()
            .iter()
            .filter(|(captured, _)| captured == path)
            .count()
    }
}

impl SourceOpener for FakeOpener {
    fn open(&self, source: &SourceVideo) -> Result<Box<dyn FrameSource>, FramezipError> {
        let key = source.path.display().to_string();
        let video = self
            .videos
            .get(&key)
            .cloned()
            .ok_or_else(|| FramezipError::Metadata {
                path: source.path.clone(),
                reason: "file not found".to_string(),
            })?;

        if let Some(reason) = video.fail_open {
            return Err(FramezipError::Metadata {
                path: source.path.clone(),
                reason,
            });
        }

        let live = self.live_sources.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live_sources.fetch_max(live, Ordering::SeqCst);

        Ok(Box::new(FakeSource {
            key,
            properties: VideoProperties {
                width: 8,
                height: 6,
                duration: video.duration,
                frames_per_second: 25.0,
                codec: "fake".to_string(),
            },
            fail_capture_at: video.fail_capture_at,
            captures: Arc::clone(&self.captures),
            live_sources: Arc::clone(&self.live_sources),
        }))
    }
}

struct FakeSource {
    key: String,
    properties: VideoProperties,
    fail_capture_at: Option<f64>,
    captures: Arc<Mutex<Vec<(String, f64)>>>,
    live_sources: Arc<AtomicUsize>,
}

impl FrameSource for FakeSource {
    fn properties(&self) -> &VideoProperties {
        &self.properties
    }

    fn capture(&mut self, timestamp: f64) -> Result<DynamicImage, FramezipError> {
        if self.fail_capture_at == Some(timestamp) {
            return Err(FramezipError::Decode {
                timestamp,
                reason: "corrupt packet".to_string(),
            });
        }
        self.captures
            .lock()
            .unwrap()
            .push((self.key.clone(), timestamp));
        let shade = (timestamp * 10.0) as u8;
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            self.properties.width,
            self.properties.height,
            Rgb([shade, 64, 128]),
        )))
    }
}

impl Drop for FakeSource {
    fn drop(&mut self) {
        self.live_sources.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Records every notification and optionally cancels at a chosen point.
#[derive(Default)]
pub struct RecordingReporter {
    pub statuses: Mutex<Vec<(usize, ItemStatus)>>,
    pub progress: Mutex<Vec<ProgressInfo>>,
    pub batch_errors: Mutex<Vec<String>>,
    cancel: Option<(CancelTrigger, CancellationToken)>,
    frames_seen: AtomicUsize,
}

/// When a [`RecordingReporter`] requests cancellation.
#[derive(Debug, Clone, Copy)]
pub enum CancelTrigger {
    /// After this many frames have been captured in total.
    AfterFrames(usize),
    /// As soon as the item at this index reaches a terminal status.
    AfterItem(usize),
    /// As soon as the item at this index starts processing.
    WhenItemStarts(usize),
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling(trigger: CancelTrigger, token: CancellationToken) -> Self {
        Self {
            cancel: Some((trigger, token)),
            ..Self::default()
        }
    }

    pub fn statuses_of(&self, index: usize) -> Vec<ItemStatus> {
        self.statuses
            .lock()
            .unwrap()
            .iter()
            .filter(|(i, _)| *i == index)
            .map(|(_, status)| *status)
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn on_status(&self, index: usize, item: &QueueItem) {
        self.statuses.lock().unwrap().push((index, item.status()));
        if let Some((trigger, token)) = &self.cancel {
            match *trigger {
                CancelTrigger::AfterItem(target)
                    if target == index && item.status().is_terminal() =>
                {
                    token.cancel()
                }
                CancelTrigger::WhenItemStarts(target)
                    if target == index && item.status() == ItemStatus::Processing =>
                {
                    token.cancel()
                }
                _ => {}
            }
        }
    }

    fn on_progress(&self, info: &ProgressInfo) {
        self.progress.lock().unwrap().push(info.clone());
        if info.frames_done == 0 {
            return;
        }
        let seen = self.frames_seen.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((CancelTrigger::AfterFrames(limit), token)) = &self.cancel {
            if seen >= *limit {
                token.cancel();
            }
        }
    }

    fn on_batch_error(&self, error: &FramezipError) {
        self.batch_errors.lock().unwrap().push(error.to_string());
    }
}

/// Source named like a file at `path`.
pub fn source(path: &str) -> SourceVideo {
    let name = path.rsplit('/').next().unwrap_or(path).to_string();
    SourceVideo::new(name, 1024, path)
}

/// Entry names of a ZIP archive, in archive order.
pub fn entry_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip archive");
    (0..archive.len())
        .map(|index| archive.by_index(index).unwrap().name().to_string())
        .collect()
}
