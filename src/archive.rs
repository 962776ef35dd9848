//! Zip packing for frame sequences.
//!
//! Entries are kept in insertion order and written uncompressed (the frames
//! are already compressed images), so the archive opens with any standard
//! unzip tool.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::FramecutError;

/// Collects named buffers and serializes them into one zip archive.
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    entries: Vec<(String, Vec<u8>)>,
    names: HashSet<String>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns [`FramecutError::ArchiveError`] if `name` is empty or already
    /// present.
    pub fn add(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<(), FramecutError> {
        let name = name.into();
        if name.is_empty() {
            return Err(FramecutError::ArchiveError(
                "entry name must not be empty".to_string(),
            ));
        }
        if !self.names.insert(name.clone()) {
            return Err(FramecutError::ArchiveError(format!(
                "duplicate entry {name}"
            )));
        }
        self.entries.push((name, bytes));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Serialize every entry into a zip buffer.
    pub fn finish(self) -> Result<Vec<u8>, FramecutError> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in self.entries {
            writer.start_file(name, options)?;
            writer.write_all(&bytes)?;
        }
        Ok(writer.finish()?.into_inner())
    }
}
