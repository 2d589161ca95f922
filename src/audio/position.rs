use std::time::Duration;
use log::trace;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Repeating background task that fires while playback is running.
///
/// The tick closure returns `false` to end the task. Stopping or dropping
/// the poller aborts the task, so no timer outlives its owner.
#[derive(Debug, Default)]
pub struct PositionPoller {
    task: Option<JoinHandle<()>>,
}

impl PositionPoller {
    pub fn new() -> Self {
        Self { task: None }
    }

    /// Start ticking every `period`. Restarts if already running.
    /// Must be called from within a tokio runtime.
    pub fn start<F>(&mut self, period: Duration, mut tick: F)
    where
        F: FnMut() -> bool + Send + 'static,
    {
        self.stop();

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if !tick() {
                    trace!("Position poller finished");
                    break;
                }
            }
        });
        self.task = Some(task);
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for PositionPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
