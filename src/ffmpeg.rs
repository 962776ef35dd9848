//! FFmpeg-backed engine.
//!
//! [`FfmpegEngine`] implements [`MediaEngine`] on top of the `ffmpeg` and
//! `ffprobe` binaries. Its virtual filesystem is a private scratch directory
//! created by [`load`](MediaEngine::load) and deleted when the engine is
//! dropped or [`dispose`](FfmpegEngine::dispose)d; every command runs with
//! that directory as its working directory, so the argv built by the
//! pipeline only ever names plain files.
//!
//! FFmpeg has its own console logging, separate from the Rust
//! [`log`](https://crates.io/crates/log) facade. [`FfmpegLogLevel`] controls
//! the `-loglevel` passed to every command.
//!
//! # Example
//!
//! ```no_run
//! use framecut::{EngineOptions, FfmpegEngine, FfmpegLogLevel, MediaEngine};
//!
//! let mut engine = FfmpegEngine::new(
//!     EngineOptions::new().with_log_level(FfmpegLogLevel::Error),
//! );
//! engine.load()?;
//! # Ok::<(), framecut::FramecutError>(())
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, warn};
use tempfile::TempDir;

use crate::engine::{MediaEngine, ensure_virtual_name, output_name};
use crate::error::FramecutError;
use crate::metadata::ProbeResult;
use crate::probe::{PROBE_ARGUMENTS, parse_probe_output};

/// Environment variable overriding the `ffmpeg` binary.
pub const FFMPEG_ENV: &str = "FRAMECUT_FFMPEG";
/// Environment variable overriding the `ffprobe` binary.
pub const FFPROBE_ENV: &str = "FRAMECUT_FFPROBE";

/// Number of trailing stderr lines kept in error messages.
const STDERR_TAIL_LINES: usize = 6;

/// FFmpeg console verbosity level.
///
/// # Ordering (most verbose → most quiet)
///
/// `Trace` > `Debug` > `Verbose` > `Info` > `Warning` > `Error` > `Fatal` > `Panic` > `Quiet`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FfmpegLogLevel {
    /// Print no output at all.
    Quiet,
    /// Only log conditions the process cannot recover from.
    Panic,
    /// Only log unrecoverable errors.
    Fatal,
    /// Log recoverable errors. This is the default: failures end up in
    /// [`FramecutError::EngineExec`] messages.
    #[default]
    Error,
    /// Log warnings.
    Warning,
    /// Log informational messages.
    Info,
    /// Log verbose informational messages.
    Verbose,
    /// Log debugging messages.
    Debug,
    /// Extremely verbose tracing output.
    Trace,
}

impl FfmpegLogLevel {
    /// The value passed to `-loglevel`.
    pub fn as_arg(self) -> &'static str {
        match self {
            FfmpegLogLevel::Quiet => "quiet",
            FfmpegLogLevel::Panic => "panic",
            FfmpegLogLevel::Fatal => "fatal",
            FfmpegLogLevel::Error => "error",
            FfmpegLogLevel::Warning => "warning",
            FfmpegLogLevel::Info => "info",
            FfmpegLogLevel::Verbose => "verbose",
            FfmpegLogLevel::Debug => "debug",
            FfmpegLogLevel::Trace => "trace",
        }
    }

    /// Parse a `-loglevel` style name (case-insensitive, `warn` accepted).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Some(FfmpegLogLevel::Quiet),
            "panic" => Some(FfmpegLogLevel::Panic),
            "fatal" => Some(FfmpegLogLevel::Fatal),
            "error" => Some(FfmpegLogLevel::Error),
            "warning" | "warn" => Some(FfmpegLogLevel::Warning),
            "info" => Some(FfmpegLogLevel::Info),
            "verbose" => Some(FfmpegLogLevel::Verbose),
            "debug" => Some(FfmpegLogLevel::Debug),
            "trace" => Some(FfmpegLogLevel::Trace),
            _ => None,
        }
    }
}

/// Settings for [`FfmpegEngine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Path or name of the `ffmpeg` binary.
    pub ffmpeg: PathBuf,
    /// Path or name of the `ffprobe` binary.
    pub ffprobe: PathBuf,
    /// Console verbosity passed as `-loglevel`.
    pub log_level: FfmpegLogLevel,
    /// Pass `-y` so commands may replace files left in the scratch
    /// directory. Defaults to `true`.
    pub overwrite: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineOptions {
    /// Defaults: binaries from `FRAMECUT_FFMPEG` / `FRAMECUT_FFPROBE` or the
    /// `PATH`, log level `error`, overwrite enabled.
    pub fn new() -> Self {
        Self {
            ffmpeg: std::env::var_os(FFMPEG_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("ffmpeg")),
            ffprobe: std::env::var_os(FFPROBE_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("ffprobe")),
            log_level: FfmpegLogLevel::default(),
            overwrite: true,
        }
    }

    #[must_use]
    pub fn with_ffmpeg<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.ffmpeg = path.into();
        self
    }

    #[must_use]
    pub fn with_ffprobe<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.ffprobe = path.into();
        self
    }

    #[must_use]
    pub fn with_log_level(mut self, level: FfmpegLogLevel) -> Self {
        self.log_level = level;
        self
    }

    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// [`MediaEngine`] backed by the `ffmpeg` / `ffprobe` binaries.
#[derive(Debug)]
pub struct FfmpegEngine {
    options: EngineOptions,
    scratch: Option<TempDir>,
}

impl FfmpegEngine {
    /// Create an unloaded engine. Nothing is spawned until
    /// [`load`](MediaEngine::load).
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            scratch: None,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Location of the scratch directory, once loaded.
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(TempDir::path)
    }

    /// Delete the scratch directory and return to the unloaded state.
    pub fn dispose(&mut self) {
        if let Some(scratch) = self.scratch.take() {
            let path = scratch.path().to_path_buf();
            if let Err(error) = scratch.close() {
                warn!("Failed to delete engine scratch {}: {error}", path.display());
            }
        }
    }

    fn dir(&self) -> Result<&Path, FramecutError> {
        self.scratch_dir().ok_or(FramecutError::EngineNotReady)
    }

    fn path_of(&self, name: &str) -> Result<PathBuf, FramecutError> {
        ensure_virtual_name(name)?;
        Ok(self.dir()?.join(name))
    }
}

impl Drop for FfmpegEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl MediaEngine for FfmpegEngine {
    fn load(&mut self) -> Result<(), FramecutError> {
        if self.scratch.is_some() {
            return Ok(());
        }

        let status = Command::new(&self.options.ffmpeg)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|error| {
                FramecutError::engine_exec(format!(
                    "cannot run {}: {error}",
                    self.options.ffmpeg.display()
                ))
            })?;
        if !status.success() {
            return Err(FramecutError::engine_exec(format!(
                "{} -version exited with {status}",
                self.options.ffmpeg.display()
            )));
        }

        let scratch = tempfile::Builder::new().prefix("framecut-").tempdir()?;
        debug!("Engine scratch directory: {}", scratch.path().display());
        self.scratch = Some(scratch);
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.scratch.is_some()
    }

    fn stage(&mut self, name: &str, bytes: &[u8]) -> Result<(), FramecutError> {
        let path = self.path_of(name)?;
        fs::write(&path, bytes).map_err(|error| FramecutError::engine_io(name, error))
    }

    fn execute(&mut self, args: &[String]) -> Result<(), FramecutError> {
        let dir = self.dir()?;
        debug!("ffmpeg {}", args.join(" "));

        let output = Command::new(&self.options.ffmpeg)
            .current_dir(dir)
            .arg("-hide_banner")
            .args(["-loglevel", self.options.log_level.as_arg()])
            .arg(if self.options.overwrite { "-y" } else { "-n" })
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|error| FramecutError::engine_exec(format!("cannot run ffmpeg: {error}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FramecutError::engine_exec(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr_tail(&stderr)
            )));
        }

        if let Some(out) = output_name(args) {
            let produced = dir.join(out);
            if !produced.is_file() {
                return Err(FramecutError::engine_exec(format!(
                    "command produced no output {out}"
                )));
            }
        }

        Ok(())
    }

    fn read(&mut self, name: &str) -> Result<Vec<u8>, FramecutError> {
        let path = self.path_of(name)?;
        fs::read(&path).map_err(|error| FramecutError::engine_io(name, error))
    }

    fn remove(&mut self, name: &str) {
        let Ok(path) = self.path_of(name) else {
            return;
        };
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => warn!("Failed to remove {name}: {error}"),
        }
    }

    fn probe(&mut self, name: &str) -> Result<ProbeResult, FramecutError> {
        let path = self.path_of(name)?;
        let dir = self.dir()?;
        if !path.is_file() {
            return Err(FramecutError::engine_io(name, "No such file or directory"));
        }

        let output = Command::new(&self.options.ffprobe)
            .current_dir(dir)
            .args(PROBE_ARGUMENTS)
            .arg(name)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|error| FramecutError::engine_exec(format!("cannot run ffprobe: {error}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FramecutError::engine_exec(format!(
                "ffprobe exited with {}: {}",
                output.status,
                stderr_tail(&stderr)
            )));
        }

        parse_probe_output(&output.stdout)
    }

    fn files(&self) -> Vec<String> {
        let Some(dir) = self.scratch_dir() else {
            return Vec::new();
        };
        let mut names: Vec<String> = match fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .filter_map(|entry| entry.file_name().into_string().ok())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|line| !line.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    let tail = lines[start..].join(" | ");
    if tail.is_empty() {
        "no error output".to_string()
    } else {
        tail
    }
}
