//! Pipeline integration tests.
//!
//! Every test drives [`MemoryEngine`], which records argv instead of running
//! it, so the exact command shapes and the cleanup guarantees can be checked
//! without an FFmpeg install.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use framecut::{
    Artifact, ArtifactKind, ArtifactSink, CancellationToken, DirectorySink, ExtractionJob,
    ExtractionPipeline, FramecutError, JobStatus, MediaEngine, MemoryEngine, MemorySink,
    PipelineOptions, ProbeResult, SourceMedia, StatusSink,
};

fn loaded_engine(duration: f64) -> MemoryEngine {
    let mut engine = MemoryEngine::new().with_duration(duration);
    engine.load().expect("memory engine always loads");
    engine
}

fn load_source(engine: &mut MemoryEngine, name: &str) -> SourceMedia {
    SourceMedia::load(engine, name, b"fake mp4 bytes".to_vec()).expect("Failed to load source")
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}

#[derive(Default)]
struct RecordingStatus {
    seen: Mutex<Vec<JobStatus>>,
}

impl RecordingStatus {
    fn statuses(&self) -> Vec<JobStatus> {
        self.seen.lock().unwrap().clone()
    }
}

impl StatusSink for RecordingStatus {
    fn publish(&self, status: &JobStatus) {
        self.seen.lock().unwrap().push(status.clone());
    }
}

// ── Single frames ──────────────────────────────────────────────────

#[test]
fn frame_near_end_seeks_from_eof() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine, "input.mp4");

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let artifact = pipeline
        .run(&source, &ExtractionJob::ExtractFrame { timestamp: 9.95 })
        .expect("Failed to extract frame");

    assert_eq!(artifact.file_name, "frame_9.95.webp");
    assert_eq!(artifact.kind, ArtifactKind::StillImage(Default::default()));
    assert_eq!(artifact.mime_type(), "image/webp");
    assert_eq!(
        engine.commands(),
        &[strings(&[
            "-sseof",
            "-0.1",
            "-i",
            "input.mp4",
            "-update",
            "1",
            "-vframes",
            "1",
            "-q:v",
            "2",
            "extracted_frame.webp",
        ])]
    );
    assert!(engine.files().is_empty());
}

#[test]
fn frame_in_the_middle_seeks_forward() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine, "input.mp4");

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let artifact = pipeline
        .run(&source, &ExtractionJob::ExtractFrame { timestamp: 5.0 })
        .expect("Failed to extract frame");

    assert_eq!(artifact.file_name, "frame_5.00.webp");
    assert_eq!(
        engine.commands(),
        &[strings(&[
            "-ss",
            "5",
            "-i",
            "input.mp4",
            "-frames:v",
            "1",
            "-q:v",
            "2",
            "extracted_frame.webp",
        ])]
    );
    assert!(engine.files().is_empty());
}

#[test]
fn artifact_bytes_come_from_the_engine_output() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine, "input.mp4");

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let artifact = pipeline
        .run(&source, &ExtractionJob::ExtractFrame { timestamp: 1.5 })
        .expect("Failed to extract frame");

    // MemoryEngine writes the joined argv as the output file's contents.
    let contents = String::from_utf8(artifact.bytes).expect("argv is UTF-8");
    assert!(contents.starts_with("-ss 1.5 -i input.mp4"));
    assert!(contents.ends_with("extracted_frame.webp"));
}

// ── Clips ──────────────────────────────────────────────────────────

#[test]
fn cut_clip_reencodes_the_range() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine, "input.mp4");

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let artifact = pipeline
        .run(&source, &ExtractionJob::CutClip { start: 2.0, end: 5.0 })
        .expect("Failed to cut clip");

    assert_eq!(artifact.file_name, "input_cut.mp4");
    assert_eq!(artifact.kind, ArtifactKind::VideoClip);
    assert_eq!(
        engine.commands(),
        &[strings(&[
            "-i",
            "input.mp4",
            "-ss",
            "2",
            "-t",
            "3",
            "-c:v",
            "libx264",
            "-preset",
            "fast",
            "cut_video.mp4",
        ])]
    );
    assert!(engine.files().is_empty());
}

#[test]
fn reversed_cut_runs_two_passes() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine, "input.mp4");

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let artifact = pipeline
        .run(
            &source,
            &ExtractionJob::CutClipReversed { start: 2.0, end: 5.0 },
        )
        .expect("Failed to cut and reverse clip");

    assert_eq!(artifact.file_name, "input_cut_reversed.mp4");
    let commands = engine.commands();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].last().map(String::as_str), Some("cut_video.mp4"));
    assert_eq!(
        commands[1],
        strings(&["-i", "cut_video.mp4", "-vf", "reverse", "cut_reversed_video.mp4"])
    );
    assert!(engine.files().is_empty());
}

#[test]
fn artifact_stem_stops_at_first_dot() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine, "my.trip.mov");

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let artifact = pipeline
        .run(&source, &ExtractionJob::CutClip { start: 0.0, end: 1.0 })
        .expect("Failed to cut clip");

    assert_eq!(artifact.file_name, "my_cut.mp4");
}

#[test]
fn colliding_source_name_is_staged_under_a_prefix() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine, "cut_video.mp4");

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let artifact = pipeline
        .run(&source, &ExtractionJob::CutClip { start: 1.0, end: 4.0 })
        .expect("Failed to cut clip");

    assert_eq!(artifact.file_name, "cut_video_cut.mp4");
    assert_eq!(engine.commands()[0][1], "source_cut_video.mp4");
    assert!(engine.files().is_empty());
}

// ── Validation and failures ────────────────────────────────────────

#[test]
fn invalid_request_runs_no_commands() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine, "input.mp4");

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let result = pipeline.run(&source, &ExtractionJob::ExtractFrame { timestamp: 12.0 });
    assert!(matches!(result, Err(FramecutError::InvalidTimestamp(_))));

    let result = pipeline.run(&source, &ExtractionJob::CutClip { start: 5.0, end: 5.0 });
    assert!(matches!(result, Err(FramecutError::InvalidSelection { .. })));

    assert!(engine.commands().is_empty());
    assert!(engine.files().is_empty());
}

#[test]
fn unloaded_engine_is_rejected() {
    let mut loader = loaded_engine(10.0);
    let source = load_source(&mut loader, "input.mp4");

    let mut engine = MemoryEngine::new();
    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let result = pipeline.run(&source, &ExtractionJob::CutClip { start: 1.0, end: 2.0 });
    assert!(matches!(result, Err(FramecutError::EngineNotReady)));
}

#[test]
fn failed_command_still_cleans_up() {
    let mut engine = loaded_engine(10.0).failing_execute_at(2);
    let source = load_source(&mut engine, "input.mp4");

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let result = pipeline.run(
        &source,
        &ExtractionJob::CutClipReversed { start: 2.0, end: 5.0 },
    );

    assert!(matches!(result, Err(FramecutError::EngineExec { .. })));
    assert_eq!(engine.commands().len(), 2);
    assert!(engine.files().is_empty(), "left behind: {:?}", engine.files());
}

#[test]
fn failed_read_still_cleans_up() {
    let mut engine = loaded_engine(10.0).failing_read_of("cut_video.mp4");
    let source = load_source(&mut engine, "input.mp4");

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let result = pipeline.run(&source, &ExtractionJob::CutClip { start: 2.0, end: 5.0 });

    assert!(matches!(result, Err(FramecutError::EngineIo { .. })));
    assert!(engine.files().is_empty());
}

#[test]
fn pre_cancelled_reversed_cut_stops_after_first_pass() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine, "input.mp4");

    let token = CancellationToken::new();
    token.cancel();
    let options = PipelineOptions::new().with_cancellation(token);
    let mut pipeline = ExtractionPipeline::new(&mut engine, options);
    let status = pipeline.submit(
        &source,
        &ExtractionJob::CutClipReversed { start: 2.0, end: 5.0 },
        &mut MemorySink::new(),
    );

    assert_eq!(
        status,
        JobStatus::Cancelled {
            message: "Cancelled reversed cut 2.00s-5.00s".to_string()
        }
    );
    assert_eq!(engine.commands().len(), 1);
    assert!(engine.files().is_empty());
}

// ── Status reporting ───────────────────────────────────────────────

#[test]
fn submit_reports_every_phase() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine, "input.mp4");

    let recorder = Arc::new(RecordingStatus::default());
    let options = PipelineOptions::new().with_status(recorder.clone());
    let mut pipeline = ExtractionPipeline::new(&mut engine, options);
    let mut sink = MemorySink::new();
    let status = pipeline.submit(
        &source,
        &ExtractionJob::CutClip { start: 2.0, end: 5.0 },
        &mut sink,
    );

    assert_eq!(
        status,
        JobStatus::Done {
            message: "Video cut complete!".to_string()
        }
    );
    assert_eq!(
        recorder.statuses(),
        vec![
            JobStatus::Queued {
                message: "Queued cut 2.00s-5.00s".to_string()
            },
            JobStatus::Running {
                message: "Cutting video...".to_string()
            },
            JobStatus::Done {
                message: "Video cut complete!".to_string()
            },
        ]
    );
    assert_eq!(sink.artifacts().len(), 1);
    assert_eq!(
        sink.last().map(|artifact| artifact.file_name.as_str()),
        Some("input_cut.mp4")
    );
}

#[test]
fn run_leaves_terminal_status_to_the_caller() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine, "input.mp4");

    let recorder = Arc::new(RecordingStatus::default());
    let options = PipelineOptions::new().with_status(recorder.clone());
    let mut pipeline = ExtractionPipeline::new(&mut engine, options);
    let _frame = pipeline
        .run(&source, &ExtractionJob::ExtractFrame { timestamp: 3.0 })
        .expect("Failed to extract frame");

    assert_eq!(
        recorder.statuses(),
        vec![JobStatus::Running {
            message: "Extracting frame at 3.00s...".to_string()
        }]
    );
}

#[test]
fn failure_status_carries_the_error() {
    let mut engine = loaded_engine(10.0).failing_execute_at(1);
    let source = load_source(&mut engine, "input.mp4");

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let status = pipeline.submit(
        &source,
        &ExtractionJob::CutClip { start: 2.0, end: 5.0 },
        &mut MemorySink::new(),
    );

    assert!(status.is_finished());
    match status {
        JobStatus::Failed { message } => {
            assert!(message.starts_with("Error cutting video: "), "{message}");
            assert!(message.contains("injected failure"), "{message}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(engine.files().is_empty());
}

#[test]
fn invalid_frame_request_fails_with_frame_prefix() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine, "input.mp4");

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let status = pipeline.submit(
        &source,
        &ExtractionJob::ExtractFrame { timestamp: 12.0 },
        &mut MemorySink::new(),
    );

    assert!(
        status.message().starts_with("Error extracting frame"),
        "{status}"
    );
    assert!(engine.commands().is_empty());
}

// ── Delivery ───────────────────────────────────────────────────────

#[test]
fn directory_sink_writes_and_refuses_to_overwrite() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine, "input.mp4");
    let job = ExtractionJob::CutClip { start: 2.0, end: 5.0 };

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let mut sink = DirectorySink::new(output.path());
    let status = pipeline.submit(&source, &job, &mut sink);
    assert!(matches!(status, JobStatus::Done { .. }), "{status}");

    let saved = output.path().join("input_cut.mp4");
    assert!(saved.is_file());
    assert_eq!(sink.written(), &[saved.clone()]);

    let status = pipeline.submit(&source, &job, &mut sink);
    assert!(matches!(status, JobStatus::Failed { .. }), "{status}");
    assert!(status.message().contains("already exists"), "{status}");
    assert!(engine.files().is_empty());
}

#[test]
fn directory_sink_overwrites_when_asked() {
    let output = tempfile::tempdir().expect("Failed to create temp dir");
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine, "input.mp4");
    let job = ExtractionJob::ExtractFrame { timestamp: 1.0 };

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let mut sink = DirectorySink::new(output.path()).with_overwrite(true);
    assert!(matches!(
        pipeline.submit(&source, &job, &mut sink),
        JobStatus::Done { .. }
    ));
    assert!(matches!(
        pipeline.submit(&source, &job, &mut sink),
        JobStatus::Done { .. }
    ));
    assert_eq!(sink.written().len(), 2);
}

/// Engine handle shared with a sink, so the sink can look at the virtual
/// filesystem while it is being handed an artifact.
#[derive(Clone)]
struct SharedEngine(Rc<RefCell<MemoryEngine>>);

impl MediaEngine for SharedEngine {
    fn load(&mut self) -> Result<(), FramecutError> {
        self.0.borrow_mut().load()
    }

    fn is_loaded(&self) -> bool {
        self.0.borrow().is_loaded()
    }

    fn stage(&mut self, name: &str, bytes: &[u8]) -> Result<(), FramecutError> {
        self.0.borrow_mut().stage(name, bytes)
    }

    fn execute(&mut self, args: &[String]) -> Result<(), FramecutError> {
        self.0.borrow_mut().execute(args)
    }

    fn read(&mut self, name: &str) -> Result<Vec<u8>, FramecutError> {
        self.0.borrow_mut().read(name)
    }

    fn remove(&mut self, name: &str) {
        self.0.borrow_mut().remove(name);
    }

    fn probe(&mut self, name: &str) -> Result<ProbeResult, FramecutError> {
        self.0.borrow_mut().probe(name)
    }

    fn files(&self) -> Vec<String> {
        self.0.borrow().files()
    }
}

struct SnoopingSink {
    engine: SharedEngine,
    files_at_delivery: Vec<Vec<String>>,
}

impl ArtifactSink for SnoopingSink {
    fn deliver(&mut self, _artifact: &Artifact) -> Result<(), FramecutError> {
        self.files_at_delivery.push(self.engine.files());
        Ok(())
    }
}

#[test]
fn source_is_removed_only_after_delivery() {
    let mut engine = SharedEngine(Rc::new(RefCell::new(MemoryEngine::new().with_duration(10.0))));
    engine.load().expect("memory engine always loads");
    let source = SourceMedia::load(&mut engine, "input.mp4", vec![0; 8]).expect("Failed to load");

    let mut sink = SnoopingSink {
        engine: engine.clone(),
        files_at_delivery: Vec::new(),
    };
    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let status = pipeline.submit(
        &source,
        &ExtractionJob::CutClipReversed { start: 1.0, end: 3.0 },
        &mut sink,
    );

    assert!(matches!(status, JobStatus::Done { .. }), "{status}");
    assert_eq!(sink.files_at_delivery, vec![vec!["input.mp4".to_string()]]);
    assert!(engine.files().is_empty());
}

// ── Output settings ────────────────────────────────────────────────

#[test]
fn output_settings_reach_the_argv() {
    let mut engine = loaded_engine(10.0);
    let source = load_source(&mut engine, "input.mp4");

    let options = PipelineOptions::new()
        .with_frame_format(framecut::FrameFormat::Png)
        .with_quality(5)
        .with_video_codec("libx265")
        .with_preset("slow");
    let mut pipeline = ExtractionPipeline::new(&mut engine, options);

    let frame = pipeline
        .run(&source, &ExtractionJob::ExtractFrame { timestamp: 4.0 })
        .expect("Failed to extract frame");
    assert_eq!(frame.file_name, "frame_4.00.png");
    assert_eq!(frame.mime_type(), "image/png");

    let _clip = pipeline
        .run(&source, &ExtractionJob::CutClip { start: 1.0, end: 2.0 })
        .expect("Failed to cut clip");

    let commands = engine.commands();
    assert!(commands[0].windows(2).any(|pair| pair == ["-q:v", "5"]));
    assert_eq!(commands[0].last().map(String::as_str), Some("extracted_frame.png"));
    assert!(commands[1].windows(2).any(|pair| pair == ["-c:v", "libx265"]));
    assert!(commands[1].windows(2).any(|pair| pair == ["-preset", "slow"]));
}

#[test]
fn unknown_duration_never_seeks_from_eof() {
    let mut engine = MemoryEngine::new();
    engine.load().expect("memory engine always loads");
    let source = load_source(&mut engine, "input.mp4");
    assert_eq!(source.duration(), None);

    let mut pipeline = ExtractionPipeline::new(&mut engine, PipelineOptions::new());
    let _frame = pipeline
        .run(&source, &ExtractionJob::ExtractFrame { timestamp: 42.0 })
        .expect("Failed to extract frame");

    assert_eq!(engine.commands()[0][0], "-ss");
}
