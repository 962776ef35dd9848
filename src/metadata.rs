//! Media metadata types.
//!
//! [`ProbeResult`] is the engine-reported description of a source file:
//! container-level [`FormatInfo`] plus one [`StreamInfo`] per stream. It is
//! fetched once when a source is loaded and is read-only afterwards. The
//! pipeline only needs [`ProbeResult::duration`] (for end-of-stream frame
//! selection); the rest is kept for display and validation.

use serde_json::{Map, Value};

use crate::error::FramecutError;

/// Container and stream metadata for one source file.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ProbeResult {
    /// Container-level information.
    pub format: FormatInfo,
    /// Every stream in the container, in index order.
    pub streams: Vec<StreamInfo>,
    /// The full document as reported by the engine.
    pub raw: Value,
}

/// Container-level metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormatInfo {
    /// Short container name(s), e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`.
    pub format_name: Option<String>,
    /// Total duration in seconds, if the container reports one.
    pub duration: Option<f64>,
    /// Overall bit rate in bits per second.
    pub bit_rate: Option<u64>,
    /// Container size in bytes.
    pub size: Option<u64>,
}

/// What a stream carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    Data,
    Other,
}

/// Metadata for one stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    /// Stream index within the container.
    pub index: u64,
    /// What the stream carries.
    pub kind: StreamKind,
    /// Codec short name (e.g. `"h264"`, `"aac"`).
    pub codec: Option<String>,
    /// Frame width in pixels (video only).
    pub width: Option<u32>,
    /// Frame height in pixels (video only).
    pub height: Option<u32>,
    /// Average frame rate (video only).
    pub frames_per_second: Option<f64>,
    /// Stream duration in seconds, when reported separately from the container.
    pub duration: Option<f64>,
}

impl ProbeResult {
    /// Build a result from the engine's JSON document.
    ///
    /// `format.duration` may be a number or a numeric string; a missing
    /// `format` object or `streams` list yields empty values rather than an
    /// error, since only the duration is load-bearing.
    ///
    /// # Errors
    ///
    /// Returns [`FramecutError::EngineExec`] if the document is not a JSON
    /// object.
    pub fn from_json(raw: Value) -> Result<Self, FramecutError> {
        let root = raw
            .as_object()
            .ok_or_else(|| FramecutError::engine_exec("probe output is not a JSON object"))?;

        let format = root
            .get("format")
            .and_then(Value::as_object)
            .map(parse_format)
            .unwrap_or_default();

        let streams = root
            .get("streams")
            .and_then(Value::as_array)
            .map(|streams| {
                streams
                    .iter()
                    .filter_map(Value::as_object)
                    .enumerate()
                    .map(|(position, stream)| parse_stream(position, stream))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            format,
            streams,
            raw,
        })
    }

    /// Total duration in seconds, if known and positive.
    pub fn duration(&self) -> Option<f64> {
        self.format
            .duration
            .or_else(|| {
                self.streams
                    .iter()
                    .filter_map(|stream| stream.duration)
                    .reduce(f64::max)
            })
            .filter(|duration| duration.is_finite() && *duration > 0.0)
    }

    /// The first video stream, if any.
    pub fn video(&self) -> Option<&StreamInfo> {
        self.streams
            .iter()
            .find(|stream| stream.kind == StreamKind::Video)
    }

    /// Flatten the raw document into `(key, value)` rows for a metadata table.
    ///
    /// Nested objects contribute dotted keys (`format.duration`), arrays of
    /// objects contribute indexed keys (`streams[0].codec_name`), and arrays
    /// of scalars are skipped. Rows keep document order.
    pub fn flatten(&self) -> Vec<(String, Value)> {
        let mut rows = Vec::new();
        if let Some(root) = self.raw.as_object() {
            flatten_into(root, "", &mut rows);
        }
        rows
    }
}

fn flatten_into(object: &Map<String, Value>, parent: &str, rows: &mut Vec<(String, Value)>) {
    for (key, value) in object {
        let full_key = if parent.is_empty() {
            key.clone()
        } else {
            format!("{parent}.{key}")
        };

        match value {
            Value::Object(child) => flatten_into(child, &full_key, rows),
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if let Value::Object(child) = item {
                        flatten_into(child, &format!("{full_key}[{index}]"), rows);
                    }
                }
            }
            scalar => rows.push((full_key, scalar.clone())),
        }
    }
}

fn parse_format(format: &Map<String, Value>) -> FormatInfo {
    FormatInfo {
        format_name: format
            .get("format_name")
            .and_then(Value::as_str)
            .map(str::to_string),
        duration: format.get("duration").and_then(number_or_string),
        bit_rate: format
            .get("bit_rate")
            .and_then(number_or_string)
            .map(|rate| rate as u64),
        size: format
            .get("size")
            .and_then(number_or_string)
            .map(|size| size as u64),
    }
}

fn parse_stream(position: usize, stream: &Map<String, Value>) -> StreamInfo {
    let kind = match stream.get("codec_type").and_then(Value::as_str) {
        Some("video") => StreamKind::Video,
        Some("audio") => StreamKind::Audio,
        Some("subtitle") => StreamKind::Subtitle,
        Some("data") => StreamKind::Data,
        _ => StreamKind::Other,
    };

    StreamInfo {
        index: stream
            .get("index")
            .and_then(Value::as_u64)
            .unwrap_or(position as u64),
        kind,
        codec: stream
            .get("codec_name")
            .and_then(Value::as_str)
            .map(str::to_string),
        width: stream
            .get("width")
            .and_then(Value::as_u64)
            .map(|width| width as u32),
        height: stream
            .get("height")
            .and_then(Value::as_u64)
            .map(|height| height as u32),
        frames_per_second: stream
            .get("avg_frame_rate")
            .and_then(Value::as_str)
            .and_then(parse_rational),
        duration: stream.get("duration").and_then(number_or_string),
    }
}

/// Accept both `12.5` and `"12.5"`; ffprobe reports most numbers as strings.
fn number_or_string(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite())
}

/// Parse `"30000/1001"` style rates. `"0/0"` yields `None`.
fn parse_rational(text: &str) -> Option<f64> {
    let (numerator, denominator) = text.split_once('/')?;
    let numerator = numerator.trim().parse::<f64>().ok()?;
    let denominator = denominator.trim().parse::<f64>().ok()?;
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator)
}
