//! Frame sequence integration tests.

use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex};

use zip::ZipArchive;

use framecut::{
    ArtifactKind, CancellationToken, ExtractionJob, ExtractionPipeline, FramecutError, JobStatus,
    MediaEngine, MemoryEngine, MemorySink, PipelineOptions, ProgressCallback, ProgressInfo,
    SourceMedia, StatusSink,
};

const TEN_FRAMES: ExtractionJob = ExtractionJob::ExtractFrameSequence {
    start: 0.0,
    end: 9.0,
    count: 10,
};

fn loaded_engine(duration: f64) -> MemoryEngine {
    let mut engine = MemoryEngine::new().with_duration(duration);
    engine.load().expect("memory engine always loads");
    engine
}

fn load_source(engine: &mut MemoryEngine) -> SourceMedia {
    SourceMedia::load(engine, "input.mp4", vec![0; 32]).expect("Failed to load source")
}

fn entry_names(bytes: Vec<u8>) -> Vec<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("Failed to open archive");
    (0..archive.len())
        .map(|index| {
            archive
                .by_index(index)
                .expect("Failed to read entry")
                .name()
                .to_string()
        })
        .collect()
}

// ── Commands ───────────────────────────────────────────────────────

#[test]
fn one_command_per_frame_with_last_frame_from_eof() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine);

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let artifact = pipeline.run(&source, &TEN_FRAMES).expect("Failed to extract frames");

    assert_eq!(artifact.file_name, "input_frames.zip");
    assert_eq!(artifact.kind, ArtifactKind::FrameArchive);
    assert_eq!(artifact.mime_type(), "application/zip");

    let commands = engine.commands();
    assert_eq!(commands.len(), 10);
    for (index, command) in commands.iter().enumerate().take(9) {
        assert_eq!(command[0], "-ss", "frame {index}");
        assert_eq!(command[1], index.to_string(), "frame {index}");
    }
    assert_eq!(commands[9][0], "-sseof");
    assert_eq!(commands[9][1], "-0.1");
    assert!(engine.files().is_empty());
}

#[test]
fn frames_are_released_as_they_are_read() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine);

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let _archive = pipeline.run(&source, &TEN_FRAMES).expect("Failed to extract frames");

    // The staged source plus one frame at a time.
    assert_eq!(engine.peak_file_count(), 2);
}

#[test]
fn unknown_duration_keeps_forward_seeking() {
    let mut engine = MemoryEngine::new();
    engine.load().expect("memory engine always loads");
    let source = load_source(&mut engine);

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let _archive = pipeline.run(&source, &TEN_FRAMES).expect("Failed to extract frames");

    assert!(engine.commands().iter().all(|command| command[0] == "-ss"));
}

// ── Archive contents ───────────────────────────────────────────────

#[test]
fn archive_entries_are_ordered_and_padded() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine);

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let artifact = pipeline.run(&source, &TEN_FRAMES).expect("Failed to extract frames");

    let expected: Vec<String> = (0..10)
        .map(|index| format!("frame_{index:03}_{index}.00.webp"))
        .collect();
    assert_eq!(entry_names(artifact.bytes), expected);
}

#[test]
fn archive_entries_hold_engine_output() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine);

    let job = ExtractionJob::ExtractFrameSequence {
        start: 1.0,
        end: 2.0,
        count: 3,
    };
    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let artifact = pipeline.run(&source, &job).expect("Failed to extract frames");

    let mut archive = ZipArchive::new(Cursor::new(artifact.bytes)).expect("Failed to open archive");
    let mut middle = String::new();
    archive
        .by_name("frame_001_1.50.webp")
        .expect("missing middle frame")
        .read_to_string(&mut middle)
        .expect("Failed to read entry");
    assert!(middle.starts_with("-ss 1.5 -i input.mp4"), "{middle}");
}

// ── Failures and cancellation ──────────────────────────────────────

#[test]
fn failure_discards_partial_frames_by_default() {
    let mut engine = loaded_engine(10.0).failing_execute_at(4);
    let source = load_source(&mut engine);

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let mut sink = MemorySink::new();
    let status = pipeline.submit(&source, &TEN_FRAMES, &mut sink);

    assert!(status.message().starts_with("Error extracting frames"), "{status}");
    assert!(sink.artifacts().is_empty());
    assert_eq!(engine.commands().len(), 4);
    assert!(engine.files().is_empty());
}

#[test]
fn failure_delivers_partial_archive_when_kept() {
    let mut engine = loaded_engine(10.0).failing_execute_at(4);
    let source = load_source(&mut engine);

    let options = PipelineOptions::new().with_keep_partial(true);
    let mut pipeline = ExtractionPipeline::new(&mut engine, options);
    let mut sink = MemorySink::new();
    let status = pipeline.submit(&source, &TEN_FRAMES, &mut sink);

    assert!(matches!(status, JobStatus::Failed { .. }), "{status}");
    let artifacts = sink.into_artifacts();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].file_name, "input_frames_partial.zip");
    assert_eq!(
        entry_names(artifacts[0].bytes.clone()),
        vec![
            "frame_000_0.00.webp",
            "frame_001_1.00.webp",
            "frame_002_2.00.webp",
        ]
    );
    assert!(engine.files().is_empty());
}

#[test]
fn partial_archive_is_never_returned_from_run() {
    let mut engine = loaded_engine(10.0).failing_execute_at(4);
    let source = load_source(&mut engine);

    let options = PipelineOptions::new().with_keep_partial(true);
    let mut pipeline = ExtractionPipeline::new(&mut engine, options);
    let result = pipeline.run(&source, &TEN_FRAMES);

    assert!(matches!(result, Err(FramecutError::EngineExec { .. })));
}

/// Cancels the shared token once `after` frames are done.
struct CancelAfter {
    token: CancellationToken,
    after: u64,
}

impl ProgressCallback for CancelAfter {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.current >= self.after {
            self.token.cancel();
        }
    }
}

#[test]
fn cancellation_stops_before_the_next_frame() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine);

    let token = CancellationToken::new();
    let options = PipelineOptions::new()
        .with_cancellation(token.clone())
        .with_progress(Arc::new(CancelAfter {
            token: token.clone(),
            after: 3,
        }))
        .with_keep_partial(true);
    let mut pipeline = ExtractionPipeline::new(&mut engine, options);
    let mut sink = MemorySink::new();
    let status = pipeline.submit(&source, &TEN_FRAMES, &mut sink);

    assert!(matches!(status, JobStatus::Cancelled { .. }), "{status}");
    assert_eq!(engine.commands().len(), 3);
    assert_eq!(
        sink.last().map(|artifact| entry_names(artifact.bytes.clone()).len()),
        Some(3)
    );
    assert!(engine.files().is_empty());
}

#[test]
fn single_frame_count_is_rejected() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine);

    let job = ExtractionJob::ExtractFrameSequence {
        start: 0.0,
        end: 9.0,
        count: 1,
    };
    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let result = pipeline.run(&source, &job);

    assert!(matches!(result, Err(FramecutError::InvalidFrameCount(1))));
    assert!(engine.commands().is_empty());
}

// ── Status ─────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingStatus(Mutex<Vec<JobStatus>>);

impl StatusSink for RecordingStatus {
    fn publish(&self, status: &JobStatus) {
        self.0.lock().unwrap().push(status.clone());
    }
}

#[test]
fn progress_status_per_frame() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine);

    let recorder = Arc::new(RecordingStatus::default());
    let options = PipelineOptions::new().with_status(recorder.clone());
    let mut pipeline = ExtractionPipeline::new(&mut engine, options);
    let status = pipeline.submit(&source, &TEN_FRAMES, &mut MemorySink::new());

    assert_eq!(
        status,
        JobStatus::Done {
            message: "Frames extracted and downloaded!".to_string()
        }
    );

    let statuses = recorder.0.lock().unwrap().clone();
    assert_eq!(statuses.len(), 13);
    assert!(matches!(statuses[0], JobStatus::Queued { .. }));
    assert_eq!(
        statuses[1],
        JobStatus::Running {
            message: "Extracting multiple frames...".to_string()
        }
    );
    assert_eq!(
        statuses[2],
        JobStatus::Progress {
            current: 1,
            total: 10,
            message: "Extracted frame 1/10".to_string()
        }
    );
    assert_eq!(statuses[11].to_string(), "[10/10] Extracted frame 10/10");
    assert!(statuses[12].is_finished());
}
