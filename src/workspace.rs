//! Scoped virtual files.
//!
//! A [`Workspace`] wraps the engine for the length of one job and remembers
//! every virtual file the job stages or produces. Whatever has not been
//! released by the time it is dropped is removed, so cleanup runs on every
//! exit path including early returns through `?`.

use log::debug;

use crate::engine::{MediaEngine, output_name};
use crate::error::FramecutError;
use crate::metadata::ProbeResult;

pub(crate) struct Workspace<'a, E: MediaEngine + ?Sized> {
    engine: &'a mut E,
    created: Vec<String>,
}

impl<'a, E: MediaEngine + ?Sized> Workspace<'a, E> {
    pub(crate) fn new(engine: &'a mut E) -> Self {
        Self {
            engine,
            created: Vec::new(),
        }
    }

    fn track(&mut self, name: &str) {
        if !self.created.iter().any(|known| known == name) {
            self.created.push(name.to_string());
        }
    }

    pub(crate) fn stage(&mut self, name: &str, bytes: &[u8]) -> Result<(), FramecutError> {
        debug!("Staging {name} ({} bytes)", bytes.len());
        self.engine.stage(name, bytes)?;
        self.track(name);
        Ok(())
    }

    /// Run a command. Its output is tracked before the engine runs, since a
    /// failed command can still leave a partial file behind.
    pub(crate) fn execute(&mut self, args: &[String]) -> Result<(), FramecutError> {
        if let Some(output) = output_name(args) {
            let output = output.to_string();
            self.track(&output);
        }
        debug!("Executing {}", args.join(" "));
        self.engine.execute(args)
    }

    pub(crate) fn read(&mut self, name: &str) -> Result<Vec<u8>, FramecutError> {
        let bytes = self.engine.read(name)?;
        debug!("Read {name} ({} bytes)", bytes.len());
        Ok(bytes)
    }

    /// Remove a file now instead of at drop.
    pub(crate) fn release(&mut self, name: &str) {
        self.engine.remove(name);
        self.created.retain(|known| known != name);
    }

    pub(crate) fn probe(&mut self, name: &str) -> Result<ProbeResult, FramecutError> {
        self.engine.probe(name)
    }
}

impl<E: MediaEngine + ?Sized> Drop for Workspace<'_, E> {
    fn drop(&mut self) {
        for name in self.created.drain(..).rev() {
            self.engine.remove(&name);
        }
    }
}
