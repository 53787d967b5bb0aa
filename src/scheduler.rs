//! Capture timestamp scheduling.
//!
//! [`schedule`] turns a video duration and the batch settings into a lazy
//! [`Schedule`] of capture instants. The schedule is a plain iterator, so the
//! orchestrator consumes it with an ordinary loop and can check for
//! cancellation between elements. Cloning a schedule restarts it from the
//! position it was cloned at.
//!
//! # Example
//!
//! ```
//! use framezip::{ExtractionSettings, schedule};
//!
//! let timestamps: Vec<f64> = schedule(5.0, &ExtractionSettings::interval(2.0)).collect();
//! assert_eq!(timestamps, vec![0.0, 2.0, 4.0]);
//!
//! // A snapshot past the end falls back to the midpoint.
//! let snapshot: Vec<f64> = schedule(5.0, &ExtractionSettings::single_frame(30.0)).collect();
//! assert_eq!(snapshot, vec![2.5]);
//! ```

use std::iter::FusedIterator;

use crate::configuration::{ExtractionMode, ExtractionSettings};

/// Interval used when the configured one is zero, negative, or not finite.
pub const FALLBACK_INTERVAL: f64 = 1.0;

/// Rounding in `duration / interval` is off by at most a step or two.
const MAX_COUNT_CORRECTION: u32 = 4;

/// Build the capture schedule for a video of `duration` seconds.
///
/// Pure function of its inputs.
pub fn schedule(duration: f64, settings: &ExtractionSettings) -> Schedule {
    match settings.mode {
        ExtractionMode::IntervalMultiArchive => {
            let interval = effective_interval(settings.time_parameter);
            Schedule {
                kind: ScheduleKind::Interval { interval, duration },
                next_index: 0,
            }
        }
        ExtractionMode::SingleFrameSharedArchive => Schedule {
            kind: ScheduleKind::Single {
                timestamp: snapshot_timestamp(duration, settings.time_parameter),
            },
            next_index: 0,
        },
    }
}

/// Resolve the sampling interval, replacing unusable values with
/// [`FALLBACK_INTERVAL`].
pub fn effective_interval(interval: f64) -> f64 {
    if interval.is_finite() && interval > 0.0 {
        interval
    } else {
        FALLBACK_INTERVAL
    }
}

/// Resolve the single-frame capture time: `requested` when it lies within the
/// video, otherwise the midpoint.
pub fn snapshot_timestamp(duration: f64, requested: f64) -> f64 {
    if requested > duration {
        duration / 2.0
    } else {
        requested
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScheduleKind {
    Interval { interval: f64, duration: f64 },
    Single { timestamp: f64 },
}

/// Lazy, finite sequence of capture timestamps in seconds.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a schedule does nothing unless iterated"]
pub struct Schedule {
    kind: ScheduleKind,
    next_index: u64,
}

impl Schedule {
    /// Timestamp at position `index`, if it belongs to the schedule.
    fn timestamp_at(&self, index: u64) -> Option<f64> {
        match self.kind {
            ScheduleKind::Interval { interval, duration } => {
                // Multiplying keeps every element an exact multiple of the
                // interval instead of accumulating rounding error.
                // `u64::MAX` is never an index so the count always fits.
                let timestamp = index as f64 * interval;
                (index < u64::MAX && duration.is_finite() && timestamp <= duration)
                    .then_some(timestamp)
            }
            ScheduleKind::Single { timestamp } => (index == 0).then_some(timestamp),
        }
    }

    /// Total number of timestamps in the schedule, independent of how many
    /// have been consumed.
    pub fn total(&self) -> u64 {
        match self.kind {
            ScheduleKind::Interval { interval, duration } => {
                if !duration.is_finite() || duration < 0.0 {
                    return 0;
                }
                // Start from the quotient and correct for floating point so the
                // count always agrees with `timestamp_at`. The float cast
                // saturates for tiny intervals.
                let mut count = ((duration / interval).floor() as u64).saturating_add(1);
                for _ in 0..MAX_COUNT_CORRECTION {
                    if count == 0 || self.timestamp_at(count - 1).is_some() {
                        break;
                    }
                    count -= 1;
                }
                for _ in 0..MAX_COUNT_CORRECTION {
                    if self.timestamp_at(count).is_none() {
                        break;
                    }
                    count += 1;
                }
                count
            }
            ScheduleKind::Single { .. } => 1,
        }
    }
}

impl Iterator for Schedule {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let timestamp = self.timestamp_at(self.next_index)?;
        self.next_index += 1;
        Some(timestamp)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total().saturating_sub(self.next_index);
        let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Schedule {}

impl FusedIterator for Schedule {}
