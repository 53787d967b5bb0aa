//! Timestamp scheduling tests.

use framezip::{ExtractionSettings, FALLBACK_INTERVAL, effective_interval, schedule};

#[test]
fn interval_schedule_counts() {
    let settings = ExtractionSettings::interval(2.0);
    let counts: Vec<usize> = [10.0, 5.0, 0.5]
        .iter()
        .map(|&duration| schedule(duration, &settings).count())
        .collect();
    assert_eq!(counts, vec![6, 3, 1]);
}

#[test]
fn interval_schedule_length_matches_floor_formula() {
    for &(duration, interval) in &[
        (10.0, 2.0),
        (9.99, 2.0),
        (7.0, 0.25),
        (60.0, 7.0),
        (1.0, 3.0),
        (0.0, 1.0),
    ] {
        let timestamps: Vec<f64> =
            schedule(duration, &ExtractionSettings::interval(interval)).collect();
        let expected = (duration / interval).floor() as usize + 1;
        assert_eq!(
            timestamps.len(),
            expected,
            "duration {duration}, interval {interval}"
        );
        assert!(*timestamps.last().unwrap() <= duration);
        for (index, window) in timestamps.windows(2).enumerate() {
            assert!(window[1] > window[0]);
            assert_eq!(window[1], (index + 1) as f64 * interval);
        }
    }
}

#[test]
fn interval_schedule_starts_at_zero() {
    let first = schedule(3.0, &ExtractionSettings::interval(1.5)).next();
    assert_eq!(first, Some(0.0));
}

#[test]
fn unusable_interval_falls_back() {
    assert_eq!(effective_interval(0.0), FALLBACK_INTERVAL);
    assert_eq!(effective_interval(-3.0), FALLBACK_INTERVAL);
    assert_eq!(effective_interval(f64::NAN), FALLBACK_INTERVAL);
    assert_eq!(effective_interval(f64::INFINITY), FALLBACK_INTERVAL);
    assert_eq!(effective_interval(0.5), 0.5);

    let timestamps: Vec<f64> = schedule(2.5, &ExtractionSettings::interval(-1.0)).collect();
    assert_eq!(timestamps, vec![0.0, 1.0, 2.0]);
}

#[test]
fn single_frame_within_duration_is_exact() {
    let timestamps: Vec<f64> = schedule(10.0, &ExtractionSettings::single_frame(3.3)).collect();
    assert_eq!(timestamps, vec![3.3]);

    let at_end: Vec<f64> = schedule(10.0, &ExtractionSettings::single_frame(10.0)).collect();
    assert_eq!(at_end, vec![10.0]);
}

#[test]
fn single_frame_past_duration_uses_midpoint() {
    let timestamps: Vec<f64> = schedule(7.0, &ExtractionSettings::single_frame(7.01)).collect();
    assert_eq!(timestamps, vec![3.5]);
}

#[test]
fn schedule_is_restartable() {
    let mut original = schedule(4.0, &ExtractionSettings::interval(1.0));
    assert_eq!(original.next(), Some(0.0));

    let restarted = original.clone();
    let rest: Vec<f64> = original.collect();
    let again: Vec<f64> = restarted.collect();
    assert_eq!(rest, vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(rest, again);

    let fresh: Vec<f64> = schedule(4.0, &ExtractionSettings::interval(1.0)).collect();
    assert_eq!(fresh.len(), 5);
}

#[test]
fn schedule_reports_its_length() {
    let mut timestamps = schedule(10.0, &ExtractionSettings::interval(2.0));
    assert_eq!(timestamps.len(), 6);
    assert_eq!(timestamps.total(), 6);
    timestamps.next();
    assert_eq!(timestamps.len(), 5);
    assert_eq!(timestamps.total(), 6);

    assert_eq!(schedule(1.0, &ExtractionSettings::single_frame(9.0)).len(), 1);
}

#[test]
fn exhausted_schedule_stays_exhausted() {
    let mut timestamps = schedule(0.5, &ExtractionSettings::interval(2.0));
    assert_eq!(timestamps.next(), Some(0.0));
    assert_eq!(timestamps.next(), None);
    assert_eq!(timestamps.next(), None);
}

#[test]
fn degenerate_durations_produce_no_interval_frames() {
    assert_eq!(schedule(-1.0, &ExtractionSettings::interval(1.0)).count(), 0);
    assert_eq!(schedule(f64::NAN, &ExtractionSettings::interval(1.0)).count(), 0);
    assert_eq!(schedule(f64::INFINITY, &ExtractionSettings::interval(1.0)).len(), 0);
}

#[test]
fn tiny_interval_length_saturates() {
    let timestamps = schedule(10.0, &ExtractionSettings::interval(1e-300));
    assert_eq!(timestamps.total(), u64::MAX);
    assert!(timestamps.len() > 0);

    let first: Vec<f64> = timestamps.take(3).collect();
    assert_eq!(first, vec![0.0, 1e-300, 2e-300]);
}
