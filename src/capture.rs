//! Frame capture.
//!
//! Capturing is split over two traits. A [`SourceOpener`] resolves a
//! [`SourceVideo`] into an open [`FrameSource`], which is the point where the
//! video's dimensions and duration become known. The frame source then
//! produces one decoded frame per [`capture`](FrameSource::capture) call.
//!
//! [`FfmpegOpener`] is the production implementation. Anything else that can
//! hand out raster frames (a test double, an image sequence) can drive the
//! pipeline by implementing the two traits.
//!
//! # Example
//!
//! ```no_run
//! use framezip::{FfmpegOpener, SourceOpener, SourceVideo};
//!
//! let source = SourceVideo::from_path("input.mp4")?;
//! let mut frames = FfmpegOpener.open(&source)?;
//! println!("{}x{}", frames.properties().width, frames.properties().height);
//! let frame = frames.capture(1.5)?;
//! frame.save("frame.png")?;
//! # Ok::<(), framezip::FramezipError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::{
    conversion,
    error::FramezipError,
    source::{SourceVideo, VideoProperties},
};

/// An opened video that can produce frames at arbitrary timestamps.
///
/// Calls must not overlap: each capture blocks until its frame is ready.
/// Dropping the source releases its decoder and frame buffers.
pub trait FrameSource {
    /// Properties resolved when the source was opened.
    fn properties(&self) -> &VideoProperties;

    /// Decode the frame at, or as close as possible to, `timestamp` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`FramezipError::Decode`] if seeking or decoding fails.
    fn capture(&mut self, timestamp: f64) -> Result<DynamicImage, FramezipError>;
}

/// Opens sources and resolves their metadata.
pub trait SourceOpener {
    /// Open `source` for capturing.
    ///
    /// # Errors
    ///
    /// Returns [`FramezipError::Metadata`] if the video cannot be opened or
    /// has no usable dimensions or duration.
    fn open(&self, source: &SourceVideo) -> Result<Box<dyn FrameSource>, FramezipError>;
}

/// [`SourceOpener`] backed by FFmpeg.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegOpener;

impl SourceOpener for FfmpegOpener {
    fn open(&self, source: &SourceVideo) -> Result<Box<dyn FrameSource>, FramezipError> {
        Ok(Box::new(FfmpegFrameSource::open(&source.path)?))
    }
}

/// Open `path` only long enough to read its properties.
///
/// # Errors
///
/// Same as [`FfmpegFrameSource::open`].
pub fn probe<P: AsRef<Path>>(path: P) -> Result<VideoProperties, FramezipError> {
    Ok(FfmpegFrameSource::open(path)?.properties)
}

/// A video opened through FFmpeg.
///
/// The decoder, the scaler and both scratch frames are allocated once at the
/// source's native resolution and reused for every capture.
pub struct FfmpegFrameSource {
    input_context: Input,
    video_stream_index: usize,
    time_base: Rational,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    decoded_frame: VideoFrame,
    previous_frame: VideoFrame,
    rgb_frame: VideoFrame,
    properties: VideoProperties,
    path: PathBuf,
}

impl Debug for FfmpegFrameSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FfmpegFrameSource")
            .field("path", &self.path)
            .field("video_stream_index", &self.video_stream_index)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

impl FfmpegFrameSource {
    /// Open the video at `path` and resolve its properties.
    ///
    /// # Errors
    ///
    /// Returns [`FramezipError::Metadata`] if FFmpeg cannot open the file, it
    /// has no video stream, or its dimensions or duration are unknown.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramezipError> {
        let path = path.as_ref().to_path_buf();
        let metadata_error = |reason: String| FramezipError::Metadata {
            path: path.clone(),
            reason,
        };

        log::debug!("Opening video: {}", path.display());

        ffmpeg_next::init()
            .map_err(|error| metadata_error(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| metadata_error(error.to_string()))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| metadata_error("no video stream found".to_string()))?;
        let video_stream_index = stream.index();
        let time_base = stream.time_base();
        let frames_per_second = conversion::rational_to_fps(stream.avg_frame_rate());

        // Prefer the container duration, fall back to the stream's own.
        let duration = match input_context.duration() {
            container if container > 0 => conversion::container_duration_to_seconds(container),
            _ if stream.duration() > 0 => conversion::pts_to_seconds(stream.duration(), time_base),
            _ => 0.0,
        };
        if !duration.is_finite() || duration <= 0.0 {
            return Err(metadata_error("no decodable duration".to_string()));
        }

        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| metadata_error(format!("invalid codec parameters: {error}")))?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| metadata_error(format!("failed to create video decoder: {error}")))?;

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err(metadata_error("video has no dimensions".to_string()));
        }

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| metadata_error(format!("failed to create scaler: {error}")))?;

        let properties = VideoProperties {
            width,
            height,
            duration,
            frames_per_second,
            codec,
        };
        log::debug!(
            "Resolved {}: {}x{}, {:.2}s, {:.2} fps, {}",
            path.display(),
            properties.width,
            properties.height,
            properties.duration,
            properties.frames_per_second,
            properties.codec,
        );

        Ok(Self {
            input_context,
            video_stream_index,
            time_base,
            decoder,
            scaler,
            decoded_frame: VideoFrame::empty(),
            previous_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            properties,
            path,
        })
    }

    /// Half of one frame interval, used as the tolerance when matching a
    /// decoded frame to the requested time.
    fn frame_tolerance(&self) -> f64 {
        if self.properties.frames_per_second > 0.0 {
            0.5 / self.properties.frames_per_second
        } else {
            0.0
        }
    }
}

impl FrameSource for FfmpegFrameSource {
    fn properties(&self) -> &VideoProperties {
        &self.properties
    }

    fn capture(&mut self, timestamp: f64) -> Result<DynamicImage, FramezipError> {
        let target = timestamp.max(0.0);
        let threshold = target - self.frame_tolerance();
        let decode_error = |reason: String| FramezipError::Decode { timestamp, reason };

        log::debug!("Capturing {} at {target:.3}s", self.path.display());

        // Seek to the nearest keyframe at or before the target, then decode
        // forward.
        let seek_timestamp = conversion::seconds_to_seek_timestamp(target);
        self.input_context
            .seek(seek_timestamp, ..seek_timestamp)
            .map_err(|error| decode_error(format!("seek failed: {error}")))?;
        self.decoder.flush();

        let width = self.properties.width;
        let height = self.properties.height;
        let mut has_previous = false;

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != self.video_stream_index {
                continue;
            }

            self.decoder
                .send_packet(&packet)
                .map_err(|error| decode_error(error.to_string()))?;

            while self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                let reached = frame_seconds(&self.decoded_frame, self.time_base)
                    .is_none_or(|seconds| seconds >= threshold);
                if reached {
                    return scale_to_image(
                        &mut self.scaler,
                        &self.decoded_frame,
                        &mut self.rgb_frame,
                        width,
                        height,
                    )
                    .map_err(|error| decode_error(error.to_string()));
                }
                // Keep the latest frame before the target in case the stream
                // ends first.
                std::mem::swap(&mut self.decoded_frame, &mut self.previous_frame);
                has_previous = true;
            }
        }

        self.decoder
            .send_eof()
            .map_err(|error| decode_error(error.to_string()))?;
        while self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
            let reached = frame_seconds(&self.decoded_frame, self.time_base)
                .is_none_or(|seconds| seconds >= threshold);
            if reached {
                return scale_to_image(
                    &mut self.scaler,
                    &self.decoded_frame,
                    &mut self.rgb_frame,
                    width,
                    height,
                )
                .map_err(|error| decode_error(error.to_string()));
            }
            std::mem::swap(&mut self.decoded_frame, &mut self.previous_frame);
            has_previous = true;
        }

        if has_previous {
            // The target lies past the last decodable frame.
            return scale_to_image(
                &mut self.scaler,
                &self.previous_frame,
                &mut self.rgb_frame,
                width,
                height,
            )
            .map_err(|error| decode_error(error.to_string()));
        }

        Err(decode_error("no frame could be decoded".to_string()))
    }
}

/// Presentation time of a decoded frame in seconds, if known.
fn frame_seconds(frame: &VideoFrame, time_base: Rational) -> Option<f64> {
    frame
        .timestamp()
        .or_else(|| frame.pts())
        .map(|pts| conversion::pts_to_seconds(pts, time_base))
}

/// Convert a decoded frame to RGB24 and wrap it as an image.
fn scale_to_image(
    scaler: &mut ScalingContext,
    decoded_frame: &VideoFrame,
    rgb_frame: &mut VideoFrame,
    width: u32,
    height: u32,
) -> Result<DynamicImage, FramezipError> {
    scaler.run(decoded_frame, rgb_frame)?;
    let buffer = conversion::frame_to_buffer(rgb_frame, width, height, 3);
    let image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        FramezipError::Ffmpeg("decoded frame does not match the video dimensions".to_string())
    })?;
    Ok(DynamicImage::ImageRgb8(image))
}
