//! The loaded source file.

use std::fs;
use std::path::Path;

use log::debug;

use crate::engine::{MediaEngine, ensure_virtual_name};
use crate::error::FramecutError;
use crate::metadata::ProbeResult;
use crate::workspace::Workspace;

/// A source video held in memory together with its probed metadata.
///
/// Loading stages the bytes in the engine, probes them, and removes the
/// staged copy again; each job later stages its own copy. The probe result
/// is cached here, so metadata is fetched once per source.
#[derive(Debug, Clone)]
pub struct SourceMedia {
    name: String,
    bytes: Vec<u8>,
    probe: ProbeResult,
}

impl SourceMedia {
    /// Stage, probe, and unstage `bytes` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`FramecutError::InvalidSourceName`] if `name` is not a plain
    /// file name, or the engine's error if staging or probing fails. The
    /// staged copy is removed either way.
    pub fn load<E: MediaEngine + ?Sized>(
        engine: &mut E,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<Self, FramecutError> {
        ensure_virtual_name(name)?;
        let probe = {
            let mut workspace = Workspace::new(engine);
            workspace.stage(name, &bytes)?;
            workspace.probe(name)?
        };
        debug!(
            "Loaded {name} ({} bytes, duration {:?})",
            bytes.len(),
            probe.duration()
        );
        Ok(Self {
            name: name.to_string(),
            bytes,
            probe,
        })
    }

    /// Read `path` from disk and [`load`](SourceMedia::load) it under its
    /// file name.
    pub fn from_path<E: MediaEngine + ?Sized>(
        engine: &mut E,
        path: impl AsRef<Path>,
    ) -> Result<Self, FramecutError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| FramecutError::InvalidSourceName(path.display().to_string()))?
            .to_string();
        let bytes = fs::read(path)?;
        Self::load(engine, &name, bytes)
    }

    /// The name the source is staged under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn probe(&self) -> &ProbeResult {
        &self.probe
    }

    /// Duration in seconds, when the engine reported a usable one.
    pub fn duration(&self) -> Option<f64> {
        self.probe.duration()
    }
}
