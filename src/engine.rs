//! The media engine boundary.
//!
//! [`MediaEngine`] is the contract the pipeline drives: a private virtual
//! filesystem plus an argv-style `execute` call, the same shape as the
//! `ffmpeg` command line. Two implementations ship with the crate:
//!
//! - [`FfmpegEngine`](crate::FfmpegEngine) runs the `ffmpeg` and `ffprobe`
//!   binaries inside a private scratch directory.
//! - [`MemoryEngine`](crate::MemoryEngine) keeps files in memory and records
//!   every command instead of running it, for dry runs and tests.
//!
//! The engine is a single shared resource with no isolation between jobs.
//! Methods take `&mut self`, so holding the engine mutably for the length of
//! a job is what guarantees that two commands never run at once.

use crate::error::FramecutError;
use crate::metadata::ProbeResult;

/// Argv-driven media engine with a private virtual filesystem.
///
/// Every operation other than [`load`](MediaEngine::load),
/// [`is_loaded`](MediaEngine::is_loaded), and [`remove`](MediaEngine::remove)
/// fails with [`FramecutError::EngineNotReady`] until the engine is loaded.
pub trait MediaEngine {
    /// Prepare the engine for use. Loading twice is a no-op.
    fn load(&mut self) -> Result<(), FramecutError>;

    /// Whether [`load`](MediaEngine::load) has completed.
    fn is_loaded(&self) -> bool;

    /// Write `bytes` into the virtual filesystem under `name`.
    fn stage(&mut self, name: &str, bytes: &[u8]) -> Result<(), FramecutError>;

    /// Run one engine command. File names in `args` refer to the virtual
    /// filesystem.
    ///
    /// # Errors
    ///
    /// [`FramecutError::EngineExec`] if the command fails or produces no
    /// output.
    fn execute(&mut self, args: &[String]) -> Result<(), FramecutError>;

    /// Read a produced file back.
    ///
    /// # Errors
    ///
    /// [`FramecutError::EngineIo`] if the file does not exist.
    fn read(&mut self, name: &str) -> Result<Vec<u8>, FramecutError>;

    /// Delete a virtual file. Removing a missing file is not an error, and
    /// failures are logged rather than returned.
    fn remove(&mut self, name: &str);

    /// Report container and stream metadata for a staged file.
    fn probe(&mut self, name: &str) -> Result<ProbeResult, FramecutError>;

    /// Names of every file currently in the virtual filesystem.
    fn files(&self) -> Vec<String>;
}

/// Check that `name` is a plain file name usable in the virtual filesystem.
pub(crate) fn ensure_virtual_name(name: &str) -> Result<(), FramecutError> {
    let is_plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.starts_with('-');
    if is_plain {
        Ok(())
    } else {
        Err(FramecutError::InvalidSourceName(name.to_string()))
    }
}

/// The file a command writes: by ffmpeg convention, its last argument.
pub(crate) fn output_name(args: &[String]) -> Option<&str> {
    args.last().map(String::as_str)
}

/// Every file a command reads: the argument after each `-i`.
pub(crate) fn input_names(args: &[String]) -> impl Iterator<Item = &str> {
    args.windows(2)
        .filter(|pair| pair[0] == "-i")
        .map(|pair| pair[1].as_str())
}
