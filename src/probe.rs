//! Probing a source file.
//!
//! The engine is asked for its container and stream metadata as JSON, the
//! same document `ffprobe -print_format json -show_format -show_streams`
//! prints. Only `format.duration` is used by the pipeline (to decide when a
//! frame sits close enough to the end of the stream that it must be seeked
//! from the end); the rest feeds validation and the metadata table.

use serde_json::Value;

use crate::error::FramecutError;
use crate::metadata::ProbeResult;

/// Options preceding the file name in a probe request.
pub const PROBE_ARGUMENTS: [&str; 6] = [
    "-v",
    "quiet",
    "-print_format",
    "json",
    "-show_format",
    "-show_streams",
];

/// The full probe argv for a staged file.
pub fn probe_command(name: &str) -> Vec<String> {
    PROBE_ARGUMENTS
        .iter()
        .map(|arg| arg.to_string())
        .chain(std::iter::once(name.to_string()))
        .collect()
}

/// Parse the engine's probe output.
///
/// # Errors
///
/// Returns [`FramecutError::EngineExec`] if the output is empty or is not a
/// JSON object.
pub fn parse_probe_output(bytes: &[u8]) -> Result<ProbeResult, FramecutError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(FramecutError::engine_exec("probe produced no output"));
    }
    let raw: Value = serde_json::from_slice(bytes)?;
    ProbeResult::from_json(raw)
}
