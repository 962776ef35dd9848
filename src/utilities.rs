//! Internal utility functions.
//!
//! Number and time formatting shared by the argv builders, artifact naming,
//! and the CLI.

/// Render seconds the way the engine argv expects them.
///
/// Values are rounded to whole microseconds and printed in their shortest
/// decimal form, so `5.0` becomes `"5"` and `2.5` stays `"2.5"`. Rounding
/// keeps float noise such as `0.30000000000000004` out of the command line.
pub fn format_seconds(seconds: f64) -> String {
    let rounded = (seconds * 1_000_000.0).round() / 1_000_000.0;
    // Avoid printing "-0".
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{rounded}")
}

/// Render seconds with exactly two decimals, as used in artifact names and
/// status messages (`9.95`, `2.00`).
pub fn timestamp_label(seconds: f64) -> String {
    format!("{seconds:.2}")
}

/// Render seconds as a `MM:SS` clock for timeline labels.
///
/// Minutes are not wrapped into hours, matching a scrub bar readout.
pub fn format_clock(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let minutes = (seconds / 60.0).floor() as u64;
    let rest = (seconds % 60.0).floor() as u64;
    format!("{minutes:02}:{rest:02}")
}

/// The part of a file name before its first dot, used as the base name of
/// delivered artifacts (`holiday.mp4` → `holiday_cut.mp4`).
pub fn artifact_stem(file_name: &str) -> &str {
    match file_name.split('.').next() {
        Some(stem) if !stem.is_empty() => stem,
        _ => "video",
    }
}

/// Number of digits needed to print every index below `count`, with a
/// minimum width of three.
pub fn index_width(count: usize) -> usize {
    let last = count.saturating_sub(1);
    last.to_string().len().max(3)
}
