//! Internal helpers shared by the FFmpeg capture path.
//!
//! Timestamp conversions between seconds, stream time bases, and FFmpeg's
//! `AV_TIME_BASE`, plus copying scaled pixel rows out of a padded frame.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Microseconds per second (FFmpeg's `AV_TIME_BASE`).
const AV_TIME_BASE: f64 = 1_000_000.0;

/// Copy the first plane of a packed frame into a buffer without row padding.
///
/// FFmpeg aligns line sizes, so `stride` may exceed `width * bytes_per_pixel`.
pub(crate) fn frame_to_buffer(
    frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = frame.stride(0);
    let row_length = width as usize * bytes_per_pixel;
    let rows = height as usize;
    let data = frame.data(0);

    if stride == row_length {
        return data[..row_length * rows].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_length * rows);
    for row in data.chunks(stride).take(rows) {
        buffer.extend_from_slice(&row[..row_length]);
    }
    buffer
}

/// Convert seconds to a container-level seek position in `AV_TIME_BASE`.
///
/// Negative and NaN inputs seek to the start.
pub(crate) fn seconds_to_seek_timestamp(seconds: f64) -> i64 {
    (seconds.max(0.0) * AV_TIME_BASE) as i64
}

/// Convert a container duration in `AV_TIME_BASE` units to seconds.
pub(crate) fn container_duration_to_seconds(duration: i64) -> f64 {
    duration as f64 / AV_TIME_BASE
}

/// Rescale a timestamp from a stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Frames per second from a rational rate, `0.0` when the rate is undefined.
pub(crate) fn rational_to_fps(rate: Rational) -> f64 {
    if rate.denominator() == 0 || rate.numerator() <= 0 {
        0.0
    } else {
        rate.numerator() as f64 / rate.denominator() as f64
    }
}
