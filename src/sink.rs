//! Where finished artifacts go.

use std::fs;
use std::io::{Error as IoError, ErrorKind};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::FramecutError;
use crate::job::Artifact;

/// Receives finished artifacts from the pipeline.
///
/// Delivery happens while the staged source is still present in the engine;
/// the pipeline removes it only after `deliver` returns.
pub trait ArtifactSink {
    /// Hand over one artifact.
    fn deliver(&mut self, artifact: &Artifact) -> Result<(), FramecutError>;
}

/// Writes artifacts into a directory under their suggested file names.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    directory: PathBuf,
    overwrite: bool,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    /// Save into `directory`, which is created on first delivery.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            overwrite: false,
            written: Vec::new(),
        }
    }

    /// Replace files that already exist instead of failing.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Paths written so far, in delivery order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ArtifactSink for DirectorySink {
    fn deliver(&mut self, artifact: &Artifact) -> Result<(), FramecutError> {
        fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(&artifact.file_name);
        if path.exists() {
            if !self.overwrite {
                return Err(FramecutError::IoError(IoError::new(
                    ErrorKind::AlreadyExists,
                    format!("output already exists: {}", path.display()),
                )));
            }
            warn!("Overwriting {}", path.display());
        }
        fs::write(&path, &artifact.bytes)?;
        debug!("Saved {} ({} bytes)", path.display(), artifact.len());
        self.written.push(path);
        Ok(())
    }
}

/// Keeps delivered artifacts in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    artifacts: Vec<Artifact>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// The most recently delivered artifact.
    pub fn last(&self) -> Option<&Artifact> {
        self.artifacts.last()
    }

    pub fn into_artifacts(self) -> Vec<Artifact> {
        self.artifacts
    }
}

impl ArtifactSink for MemorySink {
    fn deliver(&mut self, artifact: &Artifact) -> Result<(), FramecutError> {
        self.artifacts.push(artifact.clone());
        Ok(())
    }
}
