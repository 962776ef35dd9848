//! Benchmarks for job planning, archive packing, and timeline handling.
//!
//! Run with: cargo bench
//! Run with all features: cargo bench --all-features
//!
//! Every benchmark drives `MemoryEngine`, so the numbers measure framecut's
//! own overhead rather than FFmpeg.

use std::time::Duration;

use criterion::{BenchmarkId, Criterion};
use framecut::{
    ArchiveBuilder, ExtractionJob, ExtractionPipeline, Marker, MediaEngine, MemoryEngine,
    PipelineOptions, SourceMedia, TimelineController, TimelineEvent, validate_job,
};

#[cfg(feature = "async")]
use std::sync::{Arc, Mutex};
#[cfg(feature = "async")]
use tokio::runtime::Runtime;

fn loaded_source() -> (MemoryEngine, SourceMedia) {
    let mut engine = MemoryEngine::new().with_duration(60.0);
    engine.load().unwrap();
    let source = SourceMedia::load(&mut engine, "input.mp4", vec![0; 1 << 16]).unwrap();
    (engine, source)
}

fn benchmark_single_jobs(criterion: &mut Criterion) {
    let (mut engine, source) = loaded_source();

    criterion.bench_function("extract frame (mid-video)", |bencher| {
        let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
        bencher.iter(|| {
            let _frame = pipeline
                .run(&source, &ExtractionJob::ExtractFrame { timestamp: 30.0 })
                .unwrap();
        });
    });

    criterion.bench_function("cut and reverse clip", |bencher| {
        let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
        bencher.iter(|| {
            let _clip = pipeline
                .run(
                    &source,
                    &ExtractionJob::CutClipReversed {
                        start: 10.0,
                        end: 20.0,
                    },
                )
                .unwrap();
            pipeline.engine().clear_commands();
        });
    });
}

fn benchmark_frame_sequences(criterion: &mut Criterion) {
    let (mut engine, source) = loaded_source();

    let mut group = criterion.benchmark_group("frame sequence");
    group.sample_size(30);
    group.measurement_time(Duration::from_secs(5));

    for count in [10usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |bencher, &count| {
            let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
            let job = ExtractionJob::ExtractFrameSequence {
                start: 0.0,
                end: 59.0,
                count,
            };
            bencher.iter(|| {
                let _archive = pipeline.run(&source, &job).unwrap();
                pipeline.engine().clear_commands();
            });
        });
    }

    group.finish();
}

fn benchmark_archive(criterion: &mut Criterion) {
    let frame = vec![0x5A; 64 * 1024];

    criterion.bench_function("pack 100 frames", |bencher| {
        bencher.iter(|| {
            let mut builder = ArchiveBuilder::new();
            for index in 0..100 {
                builder
                    .add(format!("frame_{index:03}.webp"), frame.clone())
                    .unwrap();
            }
            let _bytes = builder.finish().unwrap();
        });
    });
}

fn benchmark_timeline(criterion: &mut Criterion) {
    criterion.bench_function("timeline drag (100 moves)", |bencher| {
        bencher.iter(|| {
            let mut timeline = TimelineController::new();
            timeline.handle(TimelineEvent::MediaLoaded { duration: 60.0 });
            timeline.handle(TimelineEvent::MarkerPointerDown(Marker::Start));
            for step in 0..100 {
                timeline.handle(TimelineEvent::PointerMove {
                    position: step as f64 / 100.0,
                });
            }
            timeline.handle(TimelineEvent::PointerUp);
            timeline.sequence_job(10)
        });
    });
}

fn benchmark_validation(criterion: &mut Criterion) {
    let (_engine, source) = loaded_source();
    let job = ExtractionJob::ExtractFrameSequence {
        start: 0.0,
        end: 59.0,
        count: 100,
    };

    criterion.bench_function("validate sequence job", |bencher| {
        bencher.iter(|| validate_job(&job, source.probe()));
    });
}

#[cfg(feature = "async")]
fn benchmark_async(criterion: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let (engine, source) = loaded_source();
    let engine = Arc::new(Mutex::new(engine));

    criterion.bench_function("spawned frame job", |bencher| {
        bencher.iter(|| {
            runtime.block_on(async {
                let _frame = framecut::spawn_job(
                    engine.clone(),
                    source.clone(),
                    ExtractionJob::ExtractFrame { timestamp: 1.0 },
                    PipelineOptions::new(),
                )
                .await
                .unwrap();
            });
            engine.lock().unwrap().clear_commands();
        });
    });
}

#[cfg(not(feature = "async"))]
fn benchmark_async(_criterion: &mut Criterion) {}

criterion::criterion_group!(
    benches,
    benchmark_single_jobs,
    benchmark_frame_sequences,
    benchmark_archive,
    benchmark_timeline,
    benchmark_validation,
    benchmark_async,
);
criterion::criterion_main!(benches);
