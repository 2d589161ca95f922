use std::sync::Arc;
use log::debug;
use crate::error::LibraryError;
use crate::models::{Album, AlbumId, Track};

/// Read-only access to the device's music library.
///
/// Implementations may block (database or filesystem queries); use
/// [`load_scope`] to call them from async code.
pub trait TrackSource: Send + Sync {
    /// Every track, ordered by title
    fn tracks(&self) -> Result<Vec<Track>, LibraryError>;

    /// Tracks of one album, ordered by title
    fn tracks_by_album(&self, album: AlbumId) -> Result<Vec<Track>, LibraryError>;

    /// Every album, ordered by title
    fn albums(&self) -> Result<Vec<Album>, LibraryError>;
}

/// Which part of the library becomes the playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryScope {
    All,
    Album(AlbumId),
}

impl LibraryScope {
    fn fetch(self, source: &dyn TrackSource) -> Result<Vec<Track>, LibraryError> {
        match self {
            LibraryScope::All => source.tracks(),
            LibraryScope::Album(id) => source.tracks_by_album(id),
        }
    }
}

/// Query `source` on the blocking pool
pub async fn load_scope(
    source: Arc<dyn TrackSource>,
    scope: LibraryScope,
) -> Result<Vec<Track>, LibraryError> {
    let tracks = tokio::task::spawn_blocking(move || scope.fetch(source.as_ref()))
        .await
        .map_err(|e| LibraryError::TaskFailed(e.to_string()))??;

    debug!("Loaded {} tracks for {:?}", tracks.len(), scope);
    Ok(tracks)
}

pub async fn load_albums(source: Arc<dyn TrackSource>) -> Result<Vec<Album>, LibraryError> {
    tokio::task::spawn_blocking(move || source.albums())
        .await
        .map_err(|e| LibraryError::TaskFailed(e.to_string()))?
}

/// In-memory library, handy for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryLibrary {
    tracks: Vec<Track>,
    albums: Vec<Album>,
}

impl MemoryLibrary {
    pub fn new(tracks: Vec<Track>, albums: Vec<Album>) -> Self {
        Self { tracks, albums }
    }

    fn sorted(mut tracks: Vec<Track>) -> Vec<Track> {
        tracks.sort_by(|a, b| a.title.cmp(&b.title));
        tracks
    }
}

impl TrackSource for MemoryLibrary {
    fn tracks(&self) -> Result<Vec<Track>, LibraryError> {
        Ok(Self::sorted(self.tracks.clone()))
    }

    fn tracks_by_album(&self, album: AlbumId) -> Result<Vec<Track>, LibraryError> {
        if !self.albums.iter().any(|a| a.id == album) {
            return Err(LibraryError::AlbumNotFound { id: album });
        }
        let tracks = self
            .tracks
            .iter()
            .filter(|track| track.album_id == album)
            .cloned()
            .collect();
        Ok(Self::sorted(tracks))
    }

    fn albums(&self) -> Result<Vec<Album>, LibraryError> {
        let mut albums = self.albums.clone();
        albums.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(albums)
    }
}
