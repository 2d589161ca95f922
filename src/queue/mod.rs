use rand::seq::SliceRandom;
use rand::Rng;
use crate::error::{CoordinatorError, Direction};
use crate::models::{Track, TrackId};

/// Ordered track list with a cursor into it
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    tracks: Vec<Track>,
    cursor: Option<usize>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all tracks. The cursor goes to 0, or unset when empty.
    pub fn replace(&mut self, tracks: Vec<Track>) {
        self.cursor = if tracks.is_empty() { None } else { Some(0) };
        self.tracks = tracks;
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Point the cursor at `index`; out-of-range indices are ignored
    pub fn set_cursor(&mut self, index: usize) -> bool {
        if index < self.tracks.len() {
            self.cursor = Some(index);
            true
        } else {
            false
        }
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Track under the cursor
    pub fn current(&self) -> Option<&Track> {
        self.cursor.and_then(|index| self.tracks.get(index))
    }

    /// First index holding a track with this id
    pub fn position_of(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|track| track.id == id)
    }

    /// Index the next step would land on.
    ///
    /// An unset cursor counts as -1, so the first step forward lands on 0.
    pub fn next_index(&self, looping: bool) -> Result<usize, CoordinatorError> {
        let len = self.tracks.len();
        if len == 0 {
            return Err(CoordinatorError::EmptyPlaylist);
        }

        let candidate = self.cursor.map_or(0, |index| index + 1);
        if looping {
            Ok(candidate % len)
        } else if candidate >= len {
            Err(CoordinatorError::BoundaryReached { direction: Direction::Next })
        } else {
            Ok(candidate)
        }
    }

    /// Index the previous step would land on
    pub fn previous_index(&self, looping: bool) -> Result<usize, CoordinatorError> {
        let len = self.tracks.len();
        if len == 0 {
            return Err(CoordinatorError::EmptyPlaylist);
        }

        match self.cursor {
            Some(index) if index > 0 => Ok(index - 1),
            _ if looping => Ok(len - 1),
            _ => Err(CoordinatorError::BoundaryReached { direction: Direction::Previous }),
        }
    }

    /// Shuffle in place, or sort by title when `shuffle` is off, then move
    /// the cursor onto `anchor` (index 0 when it is absent).
    pub fn reorder<R: Rng + ?Sized>(&mut self, shuffle: bool, rng: &mut R, anchor: Option<TrackId>) {
        if shuffle {
            self.tracks.shuffle(rng);
        } else {
            // Stable, byte-wise (case-sensitive) ordering
            self.tracks.sort_by(|a, b| a.title.cmp(&b.title));
        }

        if self.tracks.is_empty() {
            self.cursor = None;
            return;
        }
        let index = anchor.and_then(|id| self.position_of(id)).unwrap_or(0);
        self.cursor = Some(index);
    }
}
