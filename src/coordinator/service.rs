use std::sync::Arc;
use std::time::Duration;
use log::{debug, info};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use crate::audio::{AudioEngine, PositionPoller};
use crate::config::CoordinatorConfig;
use crate::coordinator::{CompletionRouter, PlaybackCoordinator, TransportAction};
use crate::error::{CoordinatorError, PlayerError};
use crate::library::{self, LibraryScope, TrackSource};
use crate::logging::PlaybackLogger;
use crate::models::{PlaybackState, PlaybackStatus, Track};
use crate::status::ChannelSink;

/// Mutating requests, all answered with the coordinator's result
#[derive(Debug)]
enum Transport {
    SetPlaylist { tracks: Vec<Track>, selected: Option<Track> },
    Play(Track),
    Pause,
    Resume,
    TogglePlayback,
    Stop,
    Next,
    Previous,
    SetLoop(bool),
    SetShuffle(bool),
    ToggleLoop,
    ToggleShuffle,
    Seek(u64),
}

/// Messages processed by the coordinator task, one at a time
#[derive(Debug)]
enum Command {
    Transport {
        op: Transport,
        reply: oneshot::Sender<Result<(), CoordinatorError>>,
    },
    Position(oneshot::Sender<u64>),
    Duration(oneshot::Sender<u64>),
    Playlist(oneshot::Sender<Vec<Track>>),
    TrackCompleted { generation: u64 },
    PollPosition,
    Shutdown(oneshot::Sender<()>),
}

/// Task that owns a [`PlaybackCoordinator`] and serializes every request to
/// it: caller commands, engine completion signals and position ticks.
pub struct CoordinatorService {
    coordinator: PlaybackCoordinator,
    commands: mpsc::UnboundedReceiver<Command>,
    loopback: mpsc::WeakUnboundedSender<Command>,
    poller: PositionPoller,
    poll_interval: Duration,
}

impl CoordinatorService {
    /// Spawn the coordinator task on the current tokio runtime
    pub fn spawn(engine: Box<dyn AudioEngine>, config: CoordinatorConfig) -> CoordinatorHandle {
        let logger = PlaybackLogger::with_capacity(config.event_history_limit);
        Self::spawn_with_logger(engine, config, logger)
    }

    pub fn spawn_with_logger(
        engine: Box<dyn AudioEngine>,
        config: CoordinatorConfig,
        logger: PlaybackLogger,
    ) -> CoordinatorHandle {
        let (sender, commands) = mpsc::unbounded_channel();
        let sink = ChannelSink::new(config.notice_capacity);

        // Engine signals may arrive on any thread; they only hold a weak
        // sender so the task still ends once every handle is gone
        let completions = sender.downgrade();
        let on_track_end: CompletionRouter = Arc::new(move |generation| {
            if let Some(sender) = completions.upgrade() {
                let _ = sender.send(Command::TrackCompleted { generation });
            }
        });

        let coordinator = PlaybackCoordinator::new(
            engine,
            Arc::new(sink.clone()),
            on_track_end,
            &config,
            logger.clone(),
        );
        let service = Self {
            coordinator,
            commands,
            loopback: sender.downgrade(),
            poller: PositionPoller::new(),
            poll_interval: config.poll_interval(),
        };
        tokio::spawn(service.run());

        CoordinatorHandle { commands: sender, sink, logger }
    }

    async fn run(mut self) {
        info!("Playback coordinator started");

        while let Some(command) = self.commands.recv().await {
            if !self.handle_command(command) {
                break;
            }
            self.sync_poller();
        }

        self.poller.stop();
        self.coordinator.teardown();
        info!("Playback coordinator stopped");
    }

    /// Returns false once the task should end
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Transport { op, reply } => {
                let result = self.apply(op);
                let _ = reply.send(result);
            }
            Command::Position(reply) => {
                let _ = reply.send(self.coordinator.current_position());
            }
            Command::Duration(reply) => {
                let _ = reply.send(self.coordinator.duration());
            }
            Command::Playlist(reply) => {
                let _ = reply.send(self.coordinator.playlist().tracks().to_vec());
            }
            Command::TrackCompleted { generation } => {
                self.coordinator.handle_completion(generation);
            }
            Command::PollPosition => {
                self.coordinator.refresh_position();
            }
            Command::Shutdown(reply) => {
                self.poller.stop();
                self.coordinator.teardown();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    fn apply(&mut self, op: Transport) -> Result<(), CoordinatorError> {
        let coordinator = &mut self.coordinator;
        match op {
            Transport::SetPlaylist { tracks, selected } => {
                coordinator.set_playlist(tracks, selected.as_ref());
                Ok(())
            }
            Transport::Play(track) => coordinator.play(track),
            Transport::Pause => coordinator.pause(),
            Transport::Resume => coordinator.resume(),
            Transport::TogglePlayback => coordinator.toggle_playback(),
            Transport::Stop => coordinator.stop(),
            Transport::Next => coordinator.play_next(false),
            Transport::Previous => coordinator.play_prev(),
            Transport::SetLoop(on) => {
                coordinator.set_loop(on);
                Ok(())
            }
            Transport::SetShuffle(on) => {
                coordinator.set_shuffle(on);
                Ok(())
            }
            Transport::ToggleLoop => {
                coordinator.toggle_loop();
                Ok(())
            }
            Transport::ToggleShuffle => {
                coordinator.toggle_shuffle();
                Ok(())
            }
            Transport::Seek(position_ms) => coordinator.seek(position_ms),
        }
    }

    /// Position ticks run exactly while a track is playing
    fn sync_poller(&mut self) {
        let playing = self.coordinator.state() == PlaybackState::Playing;
        if playing && !self.poller.is_running() {
            debug!("Starting position updates every {:?}", self.poll_interval);
            let loopback = self.loopback.clone();
            self.poller.start(self.poll_interval, move || match loopback.upgrade() {
                Some(sender) => sender.send(Command::PollPosition).is_ok(),
                None => false,
            });
        } else if !playing && self.poller.is_running() {
            debug!("Stopping position updates");
            self.poller.stop();
        }
    }
}

/// Cloneable front end of a running [`CoordinatorService`].
///
/// Dropping the last handle shuts the coordinator down and releases the
/// engine handle.
#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::UnboundedSender<Command>,
    sink: ChannelSink,
    logger: PlaybackLogger,
}

impl CoordinatorHandle {
    /// Replace the playlist; see [`PlaybackCoordinator::set_playlist`]
    pub async fn set_playlist(
        &self,
        tracks: Vec<Track>,
        selected: Option<Track>,
    ) -> Result<(), CoordinatorError> {
        self.transport(Transport::SetPlaylist { tracks, selected }).await
    }

    pub async fn play(&self, track: Track) -> Result<(), CoordinatorError> {
        self.transport(Transport::Play(track)).await
    }

    pub async fn pause(&self) -> Result<(), CoordinatorError> {
        self.transport(Transport::Pause).await
    }

    pub async fn resume(&self) -> Result<(), CoordinatorError> {
        self.transport(Transport::Resume).await
    }

    /// Pause while playing, otherwise resume or start the track under the cursor
    pub async fn toggle_playback(&self) -> Result<(), CoordinatorError> {
        self.transport(Transport::TogglePlayback).await
    }

    pub async fn stop(&self) -> Result<(), CoordinatorError> {
        self.transport(Transport::Stop).await
    }

    pub async fn play_next(&self) -> Result<(), CoordinatorError> {
        self.transport(Transport::Next).await
    }

    pub async fn play_prev(&self) -> Result<(), CoordinatorError> {
        self.transport(Transport::Previous).await
    }

    pub async fn set_loop(&self, on: bool) -> Result<(), CoordinatorError> {
        self.transport(Transport::SetLoop(on)).await
    }

    pub async fn set_shuffle(&self, on: bool) -> Result<(), CoordinatorError> {
        self.transport(Transport::SetShuffle(on)).await
    }

    pub async fn toggle_loop(&self) -> Result<(), CoordinatorError> {
        self.transport(Transport::ToggleLoop).await
    }

    pub async fn toggle_shuffle(&self) -> Result<(), CoordinatorError> {
        self.transport(Transport::ToggleShuffle).await
    }

    pub async fn seek(&self, position_ms: u64) -> Result<(), CoordinatorError> {
        self.transport(Transport::Seek(position_ms)).await
    }

    /// Engine position in milliseconds, 0 without a loaded track
    pub async fn current_position(&self) -> Result<u64, CoordinatorError> {
        self.query(Command::Position).await
    }

    pub async fn duration(&self) -> Result<u64, CoordinatorError> {
        self.query(Command::Duration).await
    }

    /// Snapshot of the playlist in its current order
    pub async fn playlist(&self) -> Result<Vec<Track>, CoordinatorError> {
        self.query(Command::Playlist).await
    }

    /// Run a transport action received from an external control surface
    pub async fn dispatch(&self, action: TransportAction) -> Result<(), CoordinatorError> {
        debug!("Dispatching {}", action);
        match action {
            TransportAction::Play => self.resume().await,
            TransportAction::Pause => self.pause().await,
            TransportAction::Next => self.play_next().await,
            TransportAction::Prev => self.play_prev().await,
            TransportAction::Loop => self.toggle_loop().await,
            TransportAction::Shuffle => self.toggle_shuffle().await,
            TransportAction::Stop => self.stop().await,
        }
    }

    /// Query `source` off the coordinator task and install the result as the
    /// playlist. Returns the number of tracks loaded.
    pub async fn load_library(
        &self,
        source: Arc<dyn TrackSource>,
        scope: LibraryScope,
        selected: Option<Track>,
    ) -> Result<usize, PlayerError> {
        let tracks = library::load_scope(source, scope).await?;
        let count = tracks.len();
        self.set_playlist(tracks, selected).await?;
        Ok(count)
    }

    /// Latest published status
    pub fn status(&self) -> PlaybackStatus {
        self.sink.latest()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackStatus> {
        self.sink.subscribe()
    }

    /// Conditions reported by the coordinator, such as boundaries reached
    /// or files that failed to load
    pub fn notices(&self) -> broadcast::Receiver<CoordinatorError> {
        self.sink.notices()
    }

    pub fn logger(&self) -> &PlaybackLogger {
        &self.logger
    }

    /// Release the engine handle and end the coordinator task. Every handle
    /// sees `ServiceStopped` afterwards.
    pub async fn shutdown(&self) -> Result<(), CoordinatorError> {
        self.query(Command::Shutdown).await
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    async fn transport(&self, op: Transport) -> Result<(), CoordinatorError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Transport { op, reply })
            .map_err(|_| CoordinatorError::ServiceStopped)?;
        response.await.map_err(|_| CoordinatorError::ServiceStopped)?
    }

    async fn query<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, CoordinatorError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| CoordinatorError::ServiceStopped)?;
        response.await.map_err(|_| CoordinatorError::ServiceStopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;
    use tokio_test::{assert_err, assert_ok};
    use crate::error::Direction;
    use crate::testing::{track, tracks, EngineRecorder, MockEngine};

    fn spawn() -> (CoordinatorHandle, EngineRecorder) {
        let engine = MockEngine::new();
        let recorder = engine.recorder();
        let config = CoordinatorConfig {
            position_poll_interval_ms: 10,
            shuffle_seed: Some(11),
            ..CoordinatorConfig::default()
        };
        (CoordinatorService::spawn(Box::new(engine), config), recorder)
    }

    #[tokio::test]
    async fn test_commands_round_trip() {
        let (handle, recorder) = spawn();
        let list = tracks(&["a", "b"]);

        assert_ok!(handle.set_playlist(list.clone(), None).await);
        assert_ok!(handle.play(list[0].clone()).await);

        let status = handle.status();
        assert!(status.is_playing());
        assert_eq!(status.current_track.as_ref(), Some(&list[0]));
        assert_eq!(recorder.load_count(), 1);
        assert_eq!(handle.duration().await.unwrap(), 180_000);
    }

    #[tokio::test]
    async fn test_errors_are_returned_and_broadcast() {
        let (handle, _recorder) = spawn();
        let mut notices = handle.notices();

        let err = assert_err!(handle.play_next().await);
        assert_eq!(err, CoordinatorError::EmptyPlaylist);
        assert_eq!(notices.recv().await.unwrap(), CoordinatorError::EmptyPlaylist);
    }

    #[tokio::test]
    async fn test_completion_signal_advances() {
        let (handle, recorder) = spawn();
        let list = tracks(&["a", "b"]);
        handle.set_playlist(list.clone(), None).await.unwrap();
        handle.play(list[0].clone()).await.unwrap();

        assert!(recorder.complete("/music/1.flac"));
        // Anything queued behind the signal observes its effect
        handle.current_position().await.unwrap();

        assert_eq!(handle.status().current_track.as_ref(), Some(&list[1]));
    }

    #[tokio::test]
    async fn test_position_updates_while_playing() {
        let (handle, recorder) = spawn();
        handle.play(track(1, "a")).await.unwrap();

        recorder.set_position("/music/1.flac", 4_200);
        sleep(Duration::from_millis(80)).await;
        assert_eq!(handle.status().position_ms, 4_200);

        handle.pause().await.unwrap();
        recorder.set_position("/music/1.flac", 9_000);
        sleep(Duration::from_millis(50)).await;
        assert_eq!(handle.status().position_ms, 4_200);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let (handle, _recorder) = spawn();
        let mut updates = handle.subscribe();
        updates.borrow_and_update();

        handle.set_shuffle(true).await.unwrap();

        assert!(updates.has_changed().unwrap());
        let status = updates.borrow_and_update().clone();
        assert!(status.is_shuffle);
        assert!(status.is_loop);
    }

    #[tokio::test]
    async fn test_dispatch_actions() {
        let (handle, recorder) = spawn();
        let list = tracks(&["a", "b", "c"]);
        handle.set_playlist(list.clone(), None).await.unwrap();

        handle.dispatch(TransportAction::Next).await.unwrap();
        assert_eq!(handle.status().index, Some(1));

        handle.dispatch(TransportAction::Pause).await.unwrap();
        assert!(handle.status().is_paused());
        handle.dispatch(TransportAction::Play).await.unwrap();
        assert!(handle.status().is_playing());

        handle.dispatch(TransportAction::Prev).await.unwrap();
        assert_eq!(handle.status().index, Some(0));
        assert_eq!(
            handle.dispatch(TransportAction::Prev).await,
            Err(CoordinatorError::BoundaryReached { direction: Direction::Previous })
        );

        handle.dispatch(TransportAction::Loop).await.unwrap();
        assert!(handle.status().is_loop);
        handle.dispatch(TransportAction::Shuffle).await.unwrap();
        assert!(handle.status().is_shuffle);

        handle.dispatch(TransportAction::Stop).await.unwrap();
        assert!(handle.status().is_stopped());
        assert_eq!(recorder.release_count(), 2);
    }

    #[tokio::test]
    async fn test_toggle_playback_round_trip() {
        let (handle, recorder) = spawn();
        handle.set_playlist(tracks(&["a", "b"]), None).await.unwrap();

        assert_ok!(handle.toggle_playback().await);
        assert!(handle.status().is_playing());
        assert_ok!(handle.toggle_playback().await);
        assert!(handle.status().is_paused());
        assert_ok!(handle.toggle_playback().await);
        assert!(handle.status().is_playing());
        assert_eq!(recorder.load_count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_releases_engine() {
        let (handle, recorder) = spawn();
        let other = handle.clone();
        handle.play(track(1, "a")).await.unwrap();

        assert_ok!(handle.shutdown().await);

        assert_eq!(recorder.release_count(), 1);
        let status = handle.status();
        assert!(status.is_stopped());
        assert!(status.current_track.is_none());
        assert_eq!(other.pause().await, Err(CoordinatorError::ServiceStopped));
        assert_eq!(other.current_position().await, Err(CoordinatorError::ServiceStopped));
        assert!(!other.is_running());
    }

    #[tokio::test]
    async fn test_dropping_all_handles_releases_engine() {
        let (handle, recorder) = spawn();
        handle.play(track(1, "a")).await.unwrap();

        drop(handle);
        sleep(Duration::from_millis(30)).await;

        assert_eq!(recorder.release_count(), 1);
    }
}
