pub mod handle;
pub mod position;

use std::path::Path;
use crate::error::EngineError;

pub use handle::ActiveHandle;
pub use position::PositionPoller;

/// Invoked by the engine, on any thread, when a loaded track plays to its end
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

/// Core trait for the audio engine collaborator.
///
/// Decoding and output live behind this seam; the coordinator only ever
/// asks for a handle to a file and drives it.
pub trait AudioEngine: Send {
    /// Prepare a file for playback without starting it
    fn load(&mut self, file: &Path) -> Result<Box<dyn EngineHandle>, EngineError>;
}

/// A loaded track inside the engine
pub trait EngineHandle: Send {
    /// Start or resume output
    fn start(&mut self) -> Result<(), EngineError>;

    /// Suspend output, keeping the position
    fn pause(&mut self) -> Result<(), EngineError>;

    /// Stop output. Must precede `release`.
    fn stop(&mut self) -> Result<(), EngineError>;

    /// Free the native resources behind the handle
    fn release(self: Box<Self>);

    /// Move the playhead
    fn seek(&mut self, position_ms: u64) -> Result<(), EngineError>;

    fn current_position_ms(&self) -> u64;

    fn duration_ms(&self) -> u64;

    /// Register the end-of-track callback, replacing any previous one
    fn on_completion(&mut self, callback: CompletionCallback);
}
