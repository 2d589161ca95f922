use log::{debug, log};
use tokio::sync::{broadcast, watch};
use crate::error::CoordinatorError;
use crate::models::PlaybackStatus;

/// Receiver side of the coordinator's published state.
///
/// The coordinator never depends on what sits behind it: a UI layer, a
/// notification renderer, or just the log.
pub trait StatusSink: Send + Sync {
    /// Publish a fresh snapshot
    fn publish(&self, status: &PlaybackStatus);

    /// A recoverable condition the observer may want to surface
    fn report(&self, _condition: &CoordinatorError) {}
}

/// Sink backed by tokio channels: a `watch` for the latest snapshot and a
/// `broadcast` for reported conditions.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    status: watch::Sender<PlaybackStatus>,
    notices: broadcast::Sender<CoordinatorError>,
}

impl ChannelSink {
    pub fn new(notice_capacity: usize) -> Self {
        let (status, _) = watch::channel(PlaybackStatus::default());
        let (notices, _) = broadcast::channel(notice_capacity.max(1));
        Self { status, notices }
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackStatus> {
        self.status.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<CoordinatorError> {
        self.notices.subscribe()
    }

    /// Latest published snapshot
    pub fn latest(&self) -> PlaybackStatus {
        self.status.borrow().clone()
    }
}

impl StatusSink for ChannelSink {
    fn publish(&self, status: &PlaybackStatus) {
        self.status.send_if_modified(|current| {
            if current == status {
                false
            } else {
                *current = status.clone();
                true
            }
        });
    }

    fn report(&self, condition: &CoordinatorError) {
        // No subscribers is fine
        let _ = self.notices.send(condition.clone());
    }
}

/// Sink that only writes to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl StatusSink for LogSink {
    fn publish(&self, status: &PlaybackStatus) {
        debug!("Status: {}", status);
    }

    fn report(&self, condition: &CoordinatorError) {
        log!(condition.severity().log_level(), "{}", condition.user_message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Direction;
    use crate::models::PlaybackState;

    #[test]
    fn test_channel_sink_publishes_latest() {
        let sink = ChannelSink::new(4);
        let receiver = sink.subscribe();

        let status = PlaybackStatus {
            state: PlaybackState::Playing,
            position_ms: 1500,
            ..PlaybackStatus::default()
        };
        sink.publish(&status);

        assert_eq!(*receiver.borrow(), status);
        assert_eq!(sink.latest(), status);
    }

    #[tokio::test]
    async fn test_identical_snapshot_does_not_wake_observers() {
        let sink = ChannelSink::new(4);
        let mut receiver = sink.subscribe();
        receiver.borrow_and_update();

        sink.publish(&PlaybackStatus::default());
        assert!(!receiver.has_changed().unwrap());

        sink.publish(&PlaybackStatus {
            is_loop: true,
            ..PlaybackStatus::default()
        });
        assert!(receiver.has_changed().unwrap());
        receiver.changed().await.unwrap();
        assert!(receiver.borrow_and_update().is_loop);
    }

    #[tokio::test]
    async fn test_channel_sink_broadcasts_reports() {
        let sink = ChannelSink::new(4);
        let mut first = sink.notices();
        let mut second = sink.notices();

        sink.report(&CoordinatorError::BoundaryReached { direction: Direction::Next });

        let expected = CoordinatorError::BoundaryReached { direction: Direction::Next };
        assert_eq!(first.recv().await.unwrap(), expected);
        assert_eq!(second.recv().await.unwrap(), expected);
    }

    #[test]
    fn test_report_without_subscribers() {
        let sink = ChannelSink::new(1);
        sink.report(&CoordinatorError::EmptyPlaylist);

        // Late subscribers only see new reports
        let mut late = sink.notices();
        assert!(late.try_recv().is_err());
    }

    #[test]
    fn test_log_sink_accepts_everything() {
        let sink = LogSink;
        sink.publish(&PlaybackStatus::default());
        sink.report(&CoordinatorError::EmptyPlaylist);
    }
}
