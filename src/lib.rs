pub mod audio;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod library;
pub mod logging;
pub mod models;
pub mod queue;
pub mod status;

#[cfg(test)]
mod testing;

pub use coordinator::{CoordinatorHandle, CoordinatorService, PlaybackCoordinator, TransportAction};
pub use error::*;
pub use models::*;
