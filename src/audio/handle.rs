use log::{debug, warn};
use std::path::PathBuf;
use crate::audio::{CompletionCallback, EngineHandle};
use crate::error::EngineError;

/// Exclusive owner of the engine handle for the current track.
///
/// Closing stops then releases the handle; `release` consumes it, so it
/// cannot run twice. Dropping an open handle closes it.
pub struct ActiveHandle {
    inner: Option<Box<dyn EngineHandle>>,
    file: PathBuf,
    generation: u64,
}

impl ActiveHandle {
    pub fn new(inner: Box<dyn EngineHandle>, file: PathBuf, generation: u64) -> Self {
        Self {
            inner: Some(inner),
            file,
            generation,
        }
    }

    /// Identifies which handle a completion signal came from
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    pub fn start(&mut self) -> Result<(), EngineError> {
        match self.inner.as_mut() {
            Some(handle) => handle.start(),
            None => Err(Self::closed("start")),
        }
    }

    pub fn pause(&mut self) -> Result<(), EngineError> {
        match self.inner.as_mut() {
            Some(handle) => handle.pause(),
            None => Err(Self::closed("pause")),
        }
    }

    pub fn seek(&mut self, position_ms: u64) -> Result<(), EngineError> {
        match self.inner.as_mut() {
            Some(handle) => handle.seek(position_ms),
            None => Err(Self::closed("seek")),
        }
    }

    pub fn current_position_ms(&self) -> u64 {
        self.inner.as_ref().map_or(0, |handle| handle.current_position_ms())
    }

    pub fn duration_ms(&self) -> u64 {
        self.inner.as_ref().map_or(0, |handle| handle.duration_ms())
    }

    pub fn on_completion(&mut self, callback: CompletionCallback) {
        if let Some(handle) = self.inner.as_mut() {
            handle.on_completion(callback);
        }
    }

    /// Stop then release. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(mut handle) = self.inner.take() {
            if let Err(e) = handle.stop() {
                warn!("Stopping '{}' failed before release: {}", self.file.display(), e);
            }
            handle.release();
            debug!("Released engine handle #{} for '{}'", self.generation, self.file.display());
        }
    }

    fn closed(operation: &str) -> EngineError {
        EngineError::transport(operation, "handle already released")
    }
}

impl Drop for ActiveHandle {
    fn drop(&mut self) {
        self.close();
    }
}
