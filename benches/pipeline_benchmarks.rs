//! Benchmarks for scheduling, encoding, archiving, and full batches.
//!
//! Run with: cargo bench
//!
//! The fixture batch benchmark requires `tests/fixtures/sample_video.mp4`.

use std::{hint::black_box, path::Path, time::Duration};

use criterion::{BenchmarkId, Criterion};
use framezip::{
    ArchiveBuilder, ArchiveCompression, BatchOrchestrator, ExtractionSettings, FfmpegLogLevel,
    ImageFormat, MemorySink, NoOpReporter, SourceVideo, encode, per_source_entry_name, schedule,
    set_ffmpeg_log_level,
};
use image::{DynamicImage, Rgb, RgbImage};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

fn synthetic_frame(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    }))
}

fn benchmark_scheduling(criterion: &mut Criterion) {
    let settings = ExtractionSettings::interval(0.5);
    criterion.bench_function("schedule 2h video at 0.5s", |bencher| {
        bencher.iter(|| schedule(black_box(7_200.0), &settings).sum::<f64>());
    });
}

fn benchmark_encoding(criterion: &mut Criterion) {
    let frame = synthetic_frame(640, 360);
    let mut group = criterion.benchmark_group("encode 640x360");

    for format in [ImageFormat::Png, ImageFormat::Jpeg] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format.extension()),
            &format,
            |bencher, &format| {
                bencher.iter(|| encode(black_box(&frame), format, 0.92).unwrap());
            },
        );
    }

    group.finish();
}

fn benchmark_archiving(criterion: &mut Criterion) {
    let frame = encode(&synthetic_frame(320, 180), ImageFormat::Jpeg, 0.92).unwrap();
    let mut group = criterion.benchmark_group("archive 60 frames");

    for (label, compression) in [
        ("deflated", ArchiveCompression::Deflated),
        ("stored", ArchiveCompression::Stored),
    ] {
        group.bench_function(label, |bencher| {
            bencher.iter(|| {
                let mut builder = ArchiveBuilder::new(compression);
                for index in 0..60 {
                    let name = per_source_entry_name("clip", f64::from(index), ImageFormat::Jpeg);
                    builder.add_entry(&name, &frame).unwrap();
                }
                builder.finalize().unwrap()
            });
        });
    }

    group.finish();
}

fn benchmark_fixture_batch(criterion: &mut Criterion) {
    set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let mut group = criterion.benchmark_group("fixture batch");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(10);

    group.bench_function("interval 1s", |bencher| {
        let settings = ExtractionSettings::interval(1.0).with_image_format(ImageFormat::Jpeg);
        bencher.iter(|| {
            let sink = MemorySink::new();
            BatchOrchestrator::new()
                .start_batch(
                    vec![SourceVideo::from_path(SAMPLE_VIDEO).unwrap()],
                    &settings,
                    &sink,
                    &NoOpReporter,
                )
                .unwrap();
        });
    });

    group.bench_function("single frame", |bencher| {
        let settings = ExtractionSettings::single_frame(1.0);
        bencher.iter(|| {
            let sink = MemorySink::new();
            BatchOrchestrator::new()
                .start_batch(
                    vec![SourceVideo::from_path(SAMPLE_VIDEO).unwrap()],
                    &settings,
                    &sink,
                    &NoOpReporter,
                )
                .unwrap();
        });
    });

    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_scheduling,
    benchmark_encoding,
    benchmark_archiving,
    benchmark_fixture_batch,
);
criterion::criterion_main!(benches);
