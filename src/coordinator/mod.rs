pub mod action;
pub mod service;

use std::sync::Arc;
use std::time::Duration;
use log::{debug, info, log};
use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::audio::{ActiveHandle, AudioEngine};
use crate::config::CoordinatorConfig;
use crate::error::CoordinatorError;
use crate::logging::{OperationTimer, PlaybackLogger};
use crate::models::{PlaybackState, PlaybackStatus, Track};
use crate::queue::Playlist;
use crate::status::StatusSink;

pub use action::TransportAction;
pub use service::{CoordinatorHandle, CoordinatorService};

/// Receives the generation of a handle whose track played to its end.
/// Called from whatever thread the engine signals on.
pub type CompletionRouter = Arc<dyn Fn(u64) + Send + Sync>;

/// Owns the playlist, the engine handle and the playback modes.
///
/// Every method runs to completion before the next one starts; callers
/// that share a coordinator go through [`CoordinatorService`].
pub struct PlaybackCoordinator {
    engine: Box<dyn AudioEngine>,
    sink: Arc<dyn StatusSink>,
    on_track_end: CompletionRouter,
    logger: PlaybackLogger,
    playlist: Playlist,
    current: Option<Track>,
    active: Option<ActiveHandle>,
    state: PlaybackState,
    is_loop: bool,
    is_shuffle: bool,
    position_ms: u64,
    duration_ms: u64,
    generation: u64,
    rng: StdRng,
    load_warn_threshold: Duration,
}

impl PlaybackCoordinator {
    pub fn new(
        engine: Box<dyn AudioEngine>,
        sink: Arc<dyn StatusSink>,
        on_track_end: CompletionRouter,
        config: &CoordinatorConfig,
        logger: PlaybackLogger,
    ) -> Self {
        let rng = config
            .shuffle_seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        let coordinator = Self {
            engine,
            sink,
            on_track_end,
            logger,
            playlist: Playlist::new(),
            current: None,
            active: None,
            state: PlaybackState::Stopped,
            is_loop: config.start_with_loop,
            is_shuffle: false,
            position_ms: 0,
            duration_ms: 0,
            generation: 0,
            rng,
            load_warn_threshold: config.load_warn_threshold(),
        };
        coordinator.publish();
        coordinator
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            state: self.state,
            current_track: self.current.clone(),
            position_ms: self.position_ms,
            duration_ms: self.duration_ms,
            is_loop: self.is_loop,
            is_shuffle: self.is_shuffle,
            index: self.playlist.cursor(),
            playlist_len: self.playlist.len(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn is_loop(&self) -> bool {
        self.is_loop
    }

    pub fn is_shuffle(&self) -> bool {
        self.is_shuffle
    }

    pub fn logger(&self) -> &PlaybackLogger {
        &self.logger
    }

    /// Replace the playlist.
    ///
    /// With a selection, the list is reordered for the active mode and the
    /// cursor follows the selected track. A selection missing from `tracks`
    /// is reported and leaves the cursor at 0. This never fails.
    pub fn set_playlist(&mut self, tracks: Vec<Track>, selected: Option<&Track>) {
        self.playlist.replace(tracks);

        if let Some(selected) = selected {
            let anchor = match self.playlist.position_of(selected.id) {
                Some(index) => {
                    self.playlist.set_cursor(index);
                    Some(selected.id)
                }
                None => {
                    self.report(&CoordinatorError::TrackNotFound { id: selected.id });
                    None
                }
            };
            self.playlist.reorder(self.is_shuffle, &mut self.rng, anchor);
        }

        self.logger.log_playlist_replaced(self.playlist.len(), self.playlist.cursor());
        self.publish();
    }

    /// Start `track` from the beginning.
    ///
    /// Playing the file that is already playing does nothing. When the track
    /// is part of the playlist the cursor moves onto it.
    pub fn play(&mut self, track: Track) -> Result<(), CoordinatorError> {
        if self.is_playing_file(&track) {
            debug!("'{}' is already playing", track.display_name());
            return Ok(());
        }
        let index = self.playlist.position_of(track.id);
        self.start_track(track, index)
    }

    pub fn pause(&mut self) -> Result<(), CoordinatorError> {
        if self.state != PlaybackState::Playing {
            return Ok(());
        }
        let Some(handle) = self.active.as_mut() else {
            return Ok(());
        };
        if let Err(e) = handle.pause() {
            return Err(self.fail(e.into()));
        }

        self.position_ms = handle.current_position_ms();
        self.state = PlaybackState::Paused;
        self.logger.log_paused(self.position_ms);
        self.publish();
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), CoordinatorError> {
        if self.state != PlaybackState::Paused {
            return Ok(());
        }
        let Some(handle) = self.active.as_mut() else {
            return Ok(());
        };
        if let Err(e) = handle.start() {
            return Err(self.fail(e.into()));
        }

        self.position_ms = handle.current_position_ms();
        self.state = PlaybackState::Playing;
        if let Some(track) = &self.current {
            self.logger.log_resumed(&track.display_name());
        }
        self.publish();
        Ok(())
    }

    /// Pause while playing, otherwise resume. With nothing loaded the track
    /// under the cursor starts.
    pub fn toggle_playback(&mut self) -> Result<(), CoordinatorError> {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused if self.active.is_some() => self.resume(),
            _ => match self.playlist.cursor() {
                Some(index) => self.play_at(index),
                None => Err(self.fail(CoordinatorError::EmptyPlaylist)),
            },
        }
    }

    /// Release the engine handle and clear the current track. The cursor
    /// keeps its place in the playlist.
    pub fn stop(&mut self) -> Result<(), CoordinatorError> {
        if let Some(mut handle) = self.active.take() {
            handle.close();
        }
        let had_track = self.current.take().is_some();
        self.state = PlaybackState::Stopped;
        self.position_ms = 0;
        self.duration_ms = 0;

        if had_track {
            self.logger.log_stopped("stop requested");
        }
        self.publish();
        Ok(())
    }

    /// Step forward. `is_complete` marks an advance caused by the current
    /// track ending rather than by the user.
    pub fn play_next(&mut self, is_complete: bool) -> Result<(), CoordinatorError> {
        debug!("Advancing to next track (natural completion: {})", is_complete);
        let index = match self.playlist.next_index(self.is_loop) {
            Ok(index) => index,
            Err(e) => return Err(self.fail_step(e)),
        };
        self.play_at(index)
    }

    pub fn play_prev(&mut self) -> Result<(), CoordinatorError> {
        let index = match self.playlist.previous_index(self.is_loop) {
            Ok(index) => index,
            Err(e) => return Err(self.fail_step(e)),
        };
        self.play_at(index)
    }

    pub fn set_loop(&mut self, on: bool) {
        self.is_loop = on;
        self.logger.log_mode_changed(self.is_loop, self.is_shuffle);
        self.publish();
    }

    pub fn toggle_loop(&mut self) {
        self.set_loop(!self.is_loop);
    }

    /// Switch shuffle. Loop always follows shuffle, and the playlist is
    /// reordered around the current track.
    pub fn set_shuffle(&mut self, on: bool) {
        self.is_shuffle = on;
        self.is_loop = on;

        let anchor = self.current.as_ref().map(|track| track.id);
        self.playlist.reorder(on, &mut self.rng, anchor);

        self.logger.log_mode_changed(self.is_loop, self.is_shuffle);
        self.publish();
    }

    pub fn toggle_shuffle(&mut self) {
        self.set_shuffle(!self.is_shuffle);
    }

    /// Move the playhead. Does nothing while no track is loaded.
    pub fn seek(&mut self, position_ms: u64) -> Result<(), CoordinatorError> {
        let Some(handle) = self.active.as_ref() else {
            return Ok(());
        };
        // Only the engine's own duration bounds the target
        let duration_ms = handle.duration_ms();
        if duration_ms > 0 && position_ms > duration_ms {
            return Err(self.fail(CoordinatorError::InvalidSeekPosition {
                position_ms,
                duration_ms,
            }));
        }

        if let Some(handle) = self.active.as_mut() {
            if let Err(e) = handle.seek(position_ms) {
                return Err(self.fail(e.into()));
            }
        }

        let from = self.position_ms;
        self.position_ms = position_ms;
        self.logger.log_seek(from, position_ms);
        self.publish();
        Ok(())
    }

    /// Position reported by the engine, 0 without a loaded track
    pub fn current_position(&self) -> u64 {
        self.active.as_ref().map_or(0, |handle| handle.current_position_ms())
    }

    pub fn duration(&self) -> u64 {
        self.active.as_ref().map_or(0, |handle| handle.duration_ms())
    }

    /// Pull the engine position into the published status while playing
    pub fn refresh_position(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let position = self.current_position();
        if position != self.position_ms {
            self.position_ms = position;
            self.publish();
        }
    }

    /// Handle the end of the track loaded as `generation`.
    ///
    /// Signals from handles that were already replaced are dropped. At the
    /// end of a non-looping playlist playback stays paused on the last track.
    pub fn handle_completion(&mut self, generation: u64) {
        match &self.active {
            Some(handle) if handle.generation() == generation => {}
            _ => {
                debug!("Ignoring completion from stale handle #{}", generation);
                return;
            }
        }

        if let Some(track) = &self.current {
            self.logger.log_track_completed(&track.display_name());
        }
        // The engine is done with the file; playing it again must reload
        self.state = PlaybackState::Paused;
        self.position_ms = self.duration_ms;

        if self.play_next(true).is_err() {
            // Still on the finished track, so listen for its next end
            let router = Arc::clone(&self.on_track_end);
            if let Some(handle) = self.active.as_mut() {
                handle.on_completion(Box::new(move || router(generation)));
            }
            self.publish();
        }
    }

    /// Release the engine handle. Safe to call more than once.
    pub fn teardown(&mut self) {
        if let Some(mut handle) = self.active.take() {
            handle.close();
            self.logger.log_stopped("coordinator shut down");
        }
        self.current = None;
        self.state = PlaybackState::Stopped;
        self.position_ms = 0;
        self.duration_ms = 0;
        self.publish();
    }

    fn is_playing_file(&self, track: &Track) -> bool {
        self.state == PlaybackState::Playing
            && self.current.as_ref().is_some_and(|current| current.same_file(track))
    }

    fn play_at(&mut self, index: usize) -> Result<(), CoordinatorError> {
        let track = self
            .playlist
            .get(index)
            .cloned()
            .ok_or(CoordinatorError::EmptyPlaylist)?;

        if self.is_playing_file(&track) {
            self.playlist.set_cursor(index);
            self.publish();
            return Ok(());
        }
        self.start_track(track, Some(index))
    }

    /// Load first, so a failed load leaves everything as it was
    fn start_track(&mut self, track: Track, index: Option<usize>) -> Result<(), CoordinatorError> {
        let file = track.file_path.display().to_string();
        let timer = OperationTimer::new(format!("Loading '{}'", file));
        let loaded = self.engine.load(track.file_ref());
        timer.finish_with_threshold(self.load_warn_threshold);

        let inner = match loaded {
            Ok(inner) => inner,
            Err(e) => {
                self.logger.log_load_failed(&file, &e.to_string());
                return Err(self.fail(e.into()));
            }
        };

        if let Some(mut previous) = self.active.take() {
            previous.close();
        }
        self.generation += 1;
        let generation = self.generation;
        let mut handle = ActiveHandle::new(inner, track.file_path.clone(), generation);
        let router = Arc::clone(&self.on_track_end);
        handle.on_completion(Box::new(move || router(generation)));

        if let Err(e) = handle.start() {
            handle.close();
            self.current = None;
            self.state = PlaybackState::Stopped;
            self.position_ms = 0;
            self.duration_ms = 0;
            self.logger.log_load_failed(&file, &e.to_string());
            let err = self.fail(e.into());
            self.publish();
            return Err(err);
        }

        if let Some(index) = index {
            self.playlist.set_cursor(index);
        }
        let reported = handle.duration_ms();
        self.duration_ms = if reported > 0 { reported } else { track.duration_ms };
        self.position_ms = 0;

        let title = track.display_name();
        let previous = self.current.replace(track);
        self.logger
            .log_track_started(previous.as_ref().map(|t| t.title.as_str()), &title);
        info!("Now playing: {}", title);

        self.active = Some(handle);
        self.state = PlaybackState::Playing;
        self.publish();
        Ok(())
    }

    fn fail_step(&self, err: CoordinatorError) -> CoordinatorError {
        if let CoordinatorError::BoundaryReached { .. } = err {
            self.logger.log_boundary(&err.to_string());
        }
        self.fail(err)
    }

    /// Log and report a condition, handing it back for the caller
    fn fail(&self, err: CoordinatorError) -> CoordinatorError {
        self.report(&err);
        err
    }

    fn report(&self, err: &CoordinatorError) {
        log!(err.severity().log_level(), "{}", err);
        self.sink.report(err);
    }

    fn publish(&self) {
        self.sink.publish(&self.status());
    }
}
