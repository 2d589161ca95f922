use log::{debug, info, trace, warn};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Playback event kept in the history and mirrored to the `log` facade
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: PlaybackEventType,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackEventType {
    TrackStarted,
    PlaybackPaused,
    PlaybackResumed,
    PlaybackStopped,
    TrackCompleted,
    PlaylistReplaced,
    ModeChanged,
    SeekOperation,
    BoundaryReached,
    LoadFailed,
}

impl PlaybackEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackEventType::TrackStarted => "TRACK_STARTED",
            PlaybackEventType::PlaybackPaused => "PLAYBACK_PAUSED",
            PlaybackEventType::PlaybackResumed => "PLAYBACK_RESUMED",
            PlaybackEventType::PlaybackStopped => "PLAYBACK_STOPPED",
            PlaybackEventType::TrackCompleted => "TRACK_COMPLETED",
            PlaybackEventType::PlaylistReplaced => "PLAYLIST_REPLACED",
            PlaybackEventType::ModeChanged => "MODE_CHANGED",
            PlaybackEventType::SeekOperation => "SEEK_OPERATION",
            PlaybackEventType::BoundaryReached => "BOUNDARY_REACHED",
            PlaybackEventType::LoadFailed => "LOAD_FAILED",
        }
    }
}

/// Logger for coordinator operations with a bounded event history
#[derive(Debug, Clone)]
pub struct PlaybackLogger {
    events: Arc<Mutex<VecDeque<PlaybackEvent>>>,
    max_events: usize,
}

impl PlaybackLogger {
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            max_events,
        }
    }

    /// Initialize the global logger. Level comes from `PLAYBACK_LOG_LEVEL`.
    pub fn init() -> Result<(), log::SetLoggerError> {
        let log_level = std::env::var("PLAYBACK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let mut builder = env_logger::Builder::new();

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] [{}:{}] {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        });

        builder.filter_level(Self::parse_level(&log_level));
        builder.try_init()?;

        info!("Playback logging initialized with level: {}", log_level);
        Ok(())
    }

    fn parse_level(level: &str) -> log::LevelFilter {
        match level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            "off" => log::LevelFilter::Off,
            _ => log::LevelFilter::Info,
        }
    }

    // A panic while holding the lock only loses history, never playback
    fn lock_events(&self) -> MutexGuard<'_, VecDeque<PlaybackEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record an event and forward it to the log facade
    pub fn log_event(&self, event_type: PlaybackEventType, details: String) {
        match event_type {
            PlaybackEventType::TrackStarted
            | PlaybackEventType::PlaybackStopped
            | PlaybackEventType::PlaylistReplaced => {
                info!("[{}] {}", event_type.as_str(), details);
            }
            PlaybackEventType::PlaybackPaused
            | PlaybackEventType::PlaybackResumed
            | PlaybackEventType::TrackCompleted
            | PlaybackEventType::ModeChanged
            | PlaybackEventType::SeekOperation
            | PlaybackEventType::BoundaryReached => {
                debug!("[{}] {}", event_type.as_str(), details);
            }
            PlaybackEventType::LoadFailed => {
                warn!("[{}] {}", event_type.as_str(), details);
            }
        }

        let mut events = self.lock_events();
        events.push_back(PlaybackEvent {
            timestamp: Utc::now(),
            event_type,
            details,
        });
        while events.len() > self.max_events {
            events.pop_front();
        }
    }

    pub fn log_track_started(&self, from_track: Option<&str>, to_track: &str) {
        let details = match from_track {
            Some(from) => format!("Track changed from '{}' to '{}'", from, to_track),
            None => format!("Track loaded: '{}'", to_track),
        };
        self.log_event(PlaybackEventType::TrackStarted, details);
    }

    pub fn log_paused(&self, position_ms: u64) {
        self.log_event(
            PlaybackEventType::PlaybackPaused,
            format!("Playback paused at {:.2}s", position_ms as f64 / 1000.0),
        );
    }

    pub fn log_resumed(&self, track: &str) {
        self.log_event(PlaybackEventType::PlaybackResumed, format!("Resumed '{}'", track));
    }

    pub fn log_stopped(&self, reason: &str) {
        self.log_event(PlaybackEventType::PlaybackStopped, format!("Playback stopped: {}", reason));
    }

    pub fn log_track_completed(&self, track: &str) {
        self.log_event(PlaybackEventType::TrackCompleted, format!("Finished '{}'", track));
    }

    pub fn log_playlist_replaced(&self, len: usize, cursor: Option<usize>) {
        self.log_event(
            PlaybackEventType::PlaylistReplaced,
            format!("Playlist replaced with {} tracks (cursor: {:?})", len, cursor),
        );
    }

    pub fn log_mode_changed(&self, is_loop: bool, is_shuffle: bool) {
        self.log_event(
            PlaybackEventType::ModeChanged,
            format!("Loop: {}, shuffle: {}", is_loop, is_shuffle),
        );
    }

    pub fn log_seek(&self, from_ms: u64, to_ms: u64) {
        self.log_event(
            PlaybackEventType::SeekOperation,
            format!("Seek from {:.2}s to {:.2}s", from_ms as f64 / 1000.0, to_ms as f64 / 1000.0),
        );
    }

    pub fn log_boundary(&self, message: &str) {
        self.log_event(PlaybackEventType::BoundaryReached, message.to_string());
    }

    pub fn log_load_failed(&self, file: &str, error: &str) {
        self.log_event(
            PlaybackEventType::LoadFailed,
            format!("Load failed for '{}': {}", file, error),
        );
    }

    /// Get the most recent events, oldest first
    pub fn recent_events(&self, count: usize) -> Vec<PlaybackEvent> {
        let events = self.lock_events();
        let skip = events.len().saturating_sub(count);
        events.iter().skip(skip).cloned().collect()
    }

    pub fn clear_events(&self) {
        self.lock_events().clear();
    }

    pub fn event_statistics(&self) -> EventStatistics {
        let events = self.lock_events();
        let mut stats = EventStatistics::default();

        for event in events.iter() {
            match event.event_type {
                PlaybackEventType::TrackStarted => stats.tracks_started += 1,
                PlaybackEventType::TrackCompleted => stats.tracks_completed += 1,
                PlaybackEventType::SeekOperation => stats.seek_operations += 1,
                PlaybackEventType::BoundaryReached => stats.boundaries_reached += 1,
                PlaybackEventType::LoadFailed => stats.load_failures += 1,
                _ => {}
            }
        }

        stats.total_events = events.len();
        stats
    }
}

impl Default for PlaybackLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about logged events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventStatistics {
    pub total_events: usize,
    pub tracks_started: usize,
    pub tracks_completed: usize,
    pub seek_operations: usize,
    pub boundaries_reached: usize,
    pub load_failures: usize,
}

/// Timer utility for measuring operation durations
pub struct OperationTimer {
    start_time: Instant,
    operation_name: String,
}

impl OperationTimer {
    pub fn new(operation_name: String) -> Self {
        trace!("Starting operation: {}", operation_name);
        Self {
            start_time: Instant::now(),
            operation_name,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn finish_with_threshold(self, threshold: Duration) -> Duration {
        let duration = self.elapsed();
        if duration > threshold {
            warn!(
                "Operation '{}' took {}ms (threshold: {}ms)",
                self.operation_name,
                duration.as_millis(),
                threshold.as_millis()
            );
        } else {
            debug!("Completed operation '{}' in {}ms", self.operation_name, duration.as_millis());
        }
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_logger_creation() {
        let logger = PlaybackLogger::new();
        assert!(logger.recent_events(10).is_empty());
        assert_eq!(logger.event_statistics(), EventStatistics::default());
    }

    #[test]
    fn test_log_event() {
        let logger = PlaybackLogger::new();
        logger.log_track_started(None, "Alpha");

        let events = logger.recent_events(1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, PlaybackEventType::TrackStarted);
        assert_eq!(events[0].details, "Track loaded: 'Alpha'");
    }

    #[test]
    fn test_events_serialize_with_timestamps() {
        let logger = PlaybackLogger::new();
        logger.log_boundary("No next track");

        let events = logger.recent_events(1);
        let json = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(json["event_type"], "BoundaryReached");
        assert_eq!(json["details"], "No next track");
        let timestamp = json["timestamp"].as_str().unwrap();
        assert!(timestamp.parse::<DateTime<Utc>>().is_ok());
    }

    #[test]
    fn test_event_history_limit() {
        let logger = PlaybackLogger::with_capacity(5);

        for i in 0..10 {
            logger.log_seek(i * 1000, (i + 1) * 1000);
        }

        let events = logger.recent_events(100);
        assert_eq!(events.len(), 5);
        // Oldest surviving entry is the sixth seek
        assert_eq!(events[0].details, "Seek from 5.00s to 6.00s");
    }

    #[test]
    fn test_recent_events_order() {
        let logger = PlaybackLogger::new();
        logger.log_paused(1000);
        logger.log_resumed("Alpha");
        logger.log_stopped("user request");

        let events = logger.recent_events(2);
        assert_eq!(events[0].event_type, PlaybackEventType::PlaybackResumed);
        assert_eq!(events[1].event_type, PlaybackEventType::PlaybackStopped);
    }

    #[test]
    fn test_event_statistics() {
        let logger = PlaybackLogger::new();
        logger.log_track_started(None, "A");
        logger.log_track_started(Some("A"), "B");
        logger.log_track_completed("B");
        logger.log_boundary("No next track");
        logger.log_load_failed("/x.flac", "corrupt");
        logger.log_mode_changed(true, true);

        let stats = logger.event_statistics();
        assert_eq!(stats.total_events, 6);
        assert_eq!(stats.tracks_started, 2);
        assert_eq!(stats.tracks_completed, 1);
        assert_eq!(stats.boundaries_reached, 1);
        assert_eq!(stats.load_failures, 1);
        assert_eq!(stats.seek_operations, 0);
    }

    #[test]
    fn test_clear_events() {
        let logger = PlaybackLogger::new();
        logger.log_playlist_replaced(3, Some(0));
        logger.clear_events();
        assert!(logger.recent_events(10).is_empty());
    }

    #[test]
    fn test_logger_shared_between_threads() {
        let logger = PlaybackLogger::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let logger = logger.clone();
                thread::spawn(move || logger.log_seek(0, i))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(logger.event_statistics().seek_operations, 4);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(PlaybackLogger::parse_level("TRACE"), log::LevelFilter::Trace);
        assert_eq!(PlaybackLogger::parse_level("warn"), log::LevelFilter::Warn);
        assert_eq!(PlaybackLogger::parse_level("bogus"), log::LevelFilter::Info);
    }

    #[test]
    fn test_operation_timer() {
        let timer = OperationTimer::new("test".to_string());
        thread::sleep(Duration::from_millis(5));
        let elapsed = timer.finish_with_threshold(Duration::from_secs(10));
        assert!(elapsed >= Duration::from_millis(5));
    }
}
