use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of a track inside the media source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub i64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of an album inside the media source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumId(pub i64);

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A playable track as delivered by a track source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub duration_ms: u64,
    pub file_path: PathBuf,
    pub album_id: AlbumId,
}

impl Track {
    pub fn new(
        id: TrackId,
        title: impl Into<String>,
        artist: impl Into<String>,
        duration_ms: u64,
        file_path: impl Into<PathBuf>,
        album_id: AlbumId,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            artist: artist.into(),
            duration_ms,
            file_path: file_path.into(),
            album_id,
        }
    }

    /// The file reference handed to the audio engine
    pub fn file_ref(&self) -> &Path {
        &self.file_path
    }

    /// Whether both tracks point at the same file
    pub fn same_file(&self, other: &Track) -> bool {
        self.file_path == other.file_path
    }

    /// Get the display name for this track (title or filename)
    pub fn display_name(&self) -> String {
        if !self.title.is_empty() {
            return self.title.clone();
        }
        self.file_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown")
            .to_string()
    }

    /// Get the artist name or "Unknown Artist"
    pub fn artist_name(&self) -> &str {
        if self.artist.is_empty() {
            "Unknown Artist"
        } else {
            &self.artist
        }
    }
}

/// An album as delivered by a track source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    pub artist: String,
    pub track_count: u32,
}

impl Album {
    pub fn new(id: AlbumId, title: impl Into<String>, artist: impl Into<String>, track_count: u32) -> Self {
        Self {
            id,
            title: title.into(),
            artist: artist.into(),
            track_count,
        }
    }
}

/// Playback state enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing loaded
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    /// Get a human-readable string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Stopped => "Stopped",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of the coordinator published to observers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub current_track: Option<Track>,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub is_loop: bool,
    pub is_shuffle: bool,
    pub index: Option<usize>,
    pub playlist_len: usize,
}

impl PlaybackStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing)
    }

    /// Check if currently paused
    pub fn is_paused(&self) -> bool {
        matches!(self.state, PlaybackState::Paused)
    }

    /// Check if stopped
    pub fn is_stopped(&self) -> bool {
        matches!(self.state, PlaybackState::Stopped)
    }

    /// Get progress as a fraction (0.0 to 1.0)
    pub fn progress(&self) -> f32 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        (self.position_ms as f32 / self.duration_ms as f32).min(1.0)
    }

    /// Format position as MM:SS
    pub fn position_formatted(&self) -> String {
        format_time(self.position_ms)
    }

    /// Format duration as MM:SS
    pub fn duration_formatted(&self) -> String {
        format_time(self.duration_ms)
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.current_track {
            Some(track) => write!(
                f,
                "{} | {} - {} | {}/{}",
                self.state,
                track.artist_name(),
                track.display_name(),
                self.position_formatted(),
                self.duration_formatted()
            )?,
            None => write!(f, "{} | No track loaded", self.state)?,
        }
        if self.is_loop {
            write!(f, " | loop")?;
        }
        if self.is_shuffle {
            write!(f, " | shuffle")?;
        }
        Ok(())
    }
}

/// Render milliseconds as zero-padded `mm:ss`
pub fn format_time(milliseconds: u64) -> String {
    let total_seconds = milliseconds / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
