//! In-memory engine.
//!
//! [`MemoryEngine`] implements [`MediaEngine`] without running anything: the
//! virtual filesystem is a map of byte buffers, every command is recorded,
//! and each command "produces" its output file with placeholder bytes. It
//! backs the CLI's `--dry-run` mode and is the engine used throughout the
//! test suite. Failures can be injected at a chosen command to exercise the
//! pipeline's cleanup path.
//!
//! ```
//! use framecut::{MediaEngine, MemoryEngine};
//!
//! let mut engine = MemoryEngine::new().with_duration(10.0);
//! engine.load()?;
//! engine.stage("in.mp4", b"source")?;
//! engine.execute(&["-i".to_string(), "in.mp4".to_string(), "out.mp4".to_string()])?;
//! assert_eq!(engine.files(), vec!["in.mp4", "out.mp4"]);
//! assert_eq!(engine.commands().len(), 1);
//! # Ok::<(), framecut::FramecutError>(())
//! ```

use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::engine::{MediaEngine, ensure_virtual_name, input_names, output_name};
use crate::error::FramecutError;
use crate::metadata::ProbeResult;

/// A recording, in-memory [`MediaEngine`].
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    loaded: bool,
    files: BTreeMap<String, Vec<u8>>,
    commands: Vec<Vec<String>>,
    duration: Option<f64>,
    probe_document: Option<Value>,
    fail_execute_at: Option<usize>,
    fail_when_contains: Option<String>,
    fail_read_of: Option<String>,
    peak_file_count: usize,
}

impl MemoryEngine {
    /// Create an unloaded engine with no duration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration reported by [`probe`](MediaEngine::probe).
    #[must_use]
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Report this document from [`probe`](MediaEngine::probe) instead of
    /// the synthesized one.
    #[must_use]
    pub fn with_probe_document(mut self, document: Value) -> Self {
        self.probe_document = Some(document);
        self
    }

    /// Make the `nth` call to `execute` (1-based) fail.
    #[must_use]
    pub fn failing_execute_at(mut self, nth: usize) -> Self {
        self.fail_execute_at = Some(nth);
        self
    }

    /// Make every `execute` whose argv contains `token` fail.
    #[must_use]
    pub fn failing_when_argv_contains(mut self, token: impl Into<String>) -> Self {
        self.fail_when_contains = Some(token.into());
        self
    }

    /// Make reading `name` fail even when the file exists.
    #[must_use]
    pub fn failing_read_of(mut self, name: impl Into<String>) -> Self {
        self.fail_read_of = Some(name.into());
        self
    }

    /// Every command executed so far, in order.
    pub fn commands(&self) -> &[Vec<String>] {
        &self.commands
    }

    /// Forget recorded commands (files are kept).
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// The largest number of files that were resident at the same time.
    pub fn peak_file_count(&self) -> usize {
        self.peak_file_count
    }

    fn ensure_loaded(&self) -> Result<(), FramecutError> {
        if self.loaded {
            Ok(())
        } else {
            Err(FramecutError::EngineNotReady)
        }
    }

    fn insert(&mut self, name: &str, bytes: Vec<u8>) {
        self.files.insert(name.to_string(), bytes);
        self.peak_file_count = self.peak_file_count.max(self.files.len());
    }

    fn synthesized_probe(&self) -> Value {
        let mut format = json!({ "format_name": "mov,mp4,m4a,3gp,3g2,mj2" });
        if let Some(duration) = self.duration {
            format["duration"] = Value::String(format!("{duration:.6}"));
        }
        json!({
            "streams": [{
                "index": 0,
                "codec_type": "video",
                "codec_name": "h264",
                "width": 1280,
                "height": 720,
                "avg_frame_rate": "30/1"
            }],
            "format": format
        })
    }
}

impl MediaEngine for MemoryEngine {
    fn load(&mut self) -> Result<(), FramecutError> {
        self.loaded = true;
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn stage(&mut self, name: &str, bytes: &[u8]) -> Result<(), FramecutError> {
        self.ensure_loaded()?;
        ensure_virtual_name(name)?;
        self.insert(name, bytes.to_vec());
        Ok(())
    }

    fn execute(&mut self, args: &[String]) -> Result<(), FramecutError> {
        self.ensure_loaded()?;
        self.commands.push(args.to_vec());
        let call = self.commands.len();

        if self.fail_execute_at == Some(call) {
            return Err(FramecutError::engine_exec(format!(
                "injected failure on command {call}"
            )));
        }
        if let Some(token) = &self.fail_when_contains {
            if args.iter().any(|arg| arg == token) {
                return Err(FramecutError::engine_exec(format!(
                    "injected failure on argument {token}"
                )));
            }
        }

        if let Some(missing) = input_names(args).find(|name| !self.files.contains_key(*name)) {
            return Err(FramecutError::engine_exec(format!(
                "{missing}: No such file or directory"
            )));
        }

        let output = output_name(args)
            .ok_or_else(|| FramecutError::engine_exec("command has no output"))?
            .to_string();
        ensure_virtual_name(&output)?;
        self.insert(&output, args.join(" ").into_bytes());
        Ok(())
    }

    fn read(&mut self, name: &str) -> Result<Vec<u8>, FramecutError> {
        self.ensure_loaded()?;
        if self.fail_read_of.as_deref() == Some(name) {
            return Err(FramecutError::engine_io(name, "injected read failure"));
        }
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| FramecutError::engine_io(name, "No such file or directory"))
    }

    fn remove(&mut self, name: &str) {
        self.files.remove(name);
    }

    fn probe(&mut self, name: &str) -> Result<ProbeResult, FramecutError> {
        self.ensure_loaded()?;
        if !self.files.contains_key(name) {
            return Err(FramecutError::engine_io(name, "No such file or directory"));
        }
        let document = self
            .probe_document
            .clone()
            .unwrap_or_else(|| self.synthesized_probe());
        ProbeResult::from_json(document)
    }

    fn files(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }
}
