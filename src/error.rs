use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use crate::models::{AlbumId, TrackId};

/// Main error type
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Action parse error: {0}")]
    Action(#[from] ActionParseError),
}

impl PlayerError {
    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            PlayerError::Coordinator(err) => err.user_message(),
            PlayerError::Engine(err) => err.user_message(),
            PlayerError::Config(err) => err.user_message(),
            PlayerError::Library(err) => err.user_message(),
            PlayerError::Action(err) => format!("Command error: {}", err),
        }
    }

    /// Check if this error allows the player to keep going
    pub fn is_recoverable(&self) -> bool {
        match self {
            PlayerError::Coordinator(err) => err.is_recoverable(),
            PlayerError::Engine(_) => true, // Another track can still be loaded
            PlayerError::Config(_) => true, // Defaults are always available
            PlayerError::Library(err) => err.is_recoverable(),
            PlayerError::Action(_) => false, // Requires a valid action name
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PlayerError::Coordinator(err) => err.severity(),
            PlayerError::Engine(EngineError::Load { .. }) => ErrorSeverity::Error,
            PlayerError::Engine(_) => ErrorSeverity::Warning,
            PlayerError::Config(_) => ErrorSeverity::Warning,
            PlayerError::Library(LibraryError::TaskFailed(_)) => ErrorSeverity::Critical,
            PlayerError::Library(_) => ErrorSeverity::Error,
            PlayerError::Action(_) => ErrorSeverity::Info,
        }
    }
}

/// Error severity levels for logging and user feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "INFO",
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        }
    }

    pub fn log_level(&self) -> log::Level {
        match self {
            ErrorSeverity::Info => log::Level::Info,
            ErrorSeverity::Warning => log::Level::Warn,
            ErrorSeverity::Error => log::Level::Error,
            ErrorSeverity::Critical => log::Level::Error,
        }
    }
}

/// Direction of a playlist step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Next => write!(f, "next"),
            Direction::Previous => write!(f, "previous"),
        }
    }
}

/// Conditions reported by the playback coordinator.
///
/// All of them are recoverable. They are returned to the caller of the
/// operation and broadcast to status observers.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoordinatorError {
    #[error("Track not found in playlist: {id}")]
    TrackNotFound { id: TrackId },

    #[error("Playlist is empty")]
    EmptyPlaylist,

    #[error("No {direction} track")]
    BoundaryReached { direction: Direction },

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Invalid seek position: {position_ms}ms exceeds track duration {duration_ms}ms")]
    InvalidSeekPosition { position_ms: u64, duration_ms: u64 },

    #[error("Coordinator is no longer running")]
    ServiceStopped,
}

impl CoordinatorError {
    pub fn user_message(&self) -> String {
        match self {
            CoordinatorError::TrackNotFound { id } => {
                format!("Selected track {} is not part of the playlist", id)
            }
            CoordinatorError::EmptyPlaylist => {
                "The playlist is empty - load some tracks first".to_string()
            }
            CoordinatorError::BoundaryReached { direction } => {
                format!("There is no {} track", direction)
            }
            CoordinatorError::Engine(err) => err.user_message(),
            CoordinatorError::InvalidSeekPosition { position_ms, duration_ms } => {
                format!(
                    "Cannot seek to {:.1}s - track is only {:.1}s long",
                    *position_ms as f64 / 1000.0,
                    *duration_ms as f64 / 1000.0
                )
            }
            CoordinatorError::ServiceStopped => "The player has been shut down".to_string(),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CoordinatorError::ServiceStopped)
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoordinatorError::TrackNotFound { .. } => ErrorSeverity::Warning,
            CoordinatorError::EmptyPlaylist => ErrorSeverity::Info,
            CoordinatorError::BoundaryReached { .. } => ErrorSeverity::Info,
            CoordinatorError::Engine(_) => ErrorSeverity::Error,
            CoordinatorError::InvalidSeekPosition { .. } => ErrorSeverity::Warning,
            CoordinatorError::ServiceStopped => ErrorSeverity::Critical,
        }
    }
}

/// Audio engine errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("Cannot load '{}': {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    #[error("Engine {operation} failed: {reason}")]
    Transport { operation: String, reason: String },
}

impl EngineError {
    pub fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        EngineError::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn transport(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::Transport {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            EngineError::Load { path, reason } => {
                format!("Audio file '{}' could not be opened: {}", path.display(), reason)
            }
            EngineError::Transport { operation, reason } => {
                format!("Audio playback could not {}: {}", operation, reason)
            }
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    ConfigDirNotFound,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] toml::de::Error),
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::ConfigDirNotFound => {
                "Cannot find or create configuration directory".to_string()
            }
            ConfigError::IoError(err) => {
                format!("Cannot access configuration file: {}", err)
            }
            ConfigError::SerializationError(_) => {
                "Failed to save configuration settings".to_string()
            }
            ConfigError::DeserializationError(_) => {
                "Configuration file is corrupted or has invalid format".to_string()
            }
        }
    }
}

/// Track source errors
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Album not found: {id}")]
    AlbumNotFound { id: AlbumId },

    #[error("Track source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Library task failed: {0}")]
    TaskFailed(String),
}

impl LibraryError {
    pub fn user_message(&self) -> String {
        match self {
            LibraryError::AlbumNotFound { id } => format!("Album {} does not exist", id),
            LibraryError::SourceUnavailable(msg) => {
                format!("The music library cannot be read right now: {}", msg)
            }
            LibraryError::TaskFailed(msg) => format!("Loading the library was interrupted: {}", msg),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            LibraryError::AlbumNotFound { .. } => false,
            LibraryError::SourceUnavailable(_) => true, // Can retry later
            LibraryError::TaskFailed(_) => true,
        }
    }
}

/// Errors from parsing transport action names
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionParseError {
    #[error("Empty action")]
    Empty,

    #[error("Unknown action: {action}")]
    UnknownAction { action: String },
}
