use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use crate::audio::{AudioEngine, CompletionCallback, EngineHandle};
use crate::error::{CoordinatorError, EngineError};
use crate::models::{AlbumId, PlaybackStatus, Track, TrackId};
use crate::status::StatusSink;

pub const DEFAULT_DURATION_MS: u64 = 180_000;

/// Build a track whose file reference is derived from its id
pub fn track(id: i64, title: &str) -> Track {
    Track::new(
        TrackId(id),
        title,
        "Test Artist",
        DEFAULT_DURATION_MS,
        format!("/music/{}.flac", id),
        AlbumId(1),
    )
}

pub fn tracks(titles: &[&str]) -> Vec<Track> {
    titles
        .iter()
        .enumerate()
        .map(|(i, title)| track(i as i64 + 1, title))
        .collect()
}

#[derive(Default)]
struct RecorderState {
    loads: Vec<PathBuf>,
    calls: Vec<(PathBuf, &'static str)>,
    callbacks: Vec<(PathBuf, CompletionCallback)>,
    failing: HashSet<PathBuf>,
    positions: HashMap<PathBuf, u64>,
    durations: HashMap<PathBuf, u64>,
}

/// Shared view into everything the mock engine was asked to do
#[derive(Clone, Default)]
pub struct EngineRecorder {
    state: Arc<Mutex<RecorderState>>,
}

impl EngineRecorder {
    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap()
    }

    pub fn load_count(&self) -> usize {
        self.lock().loads.len()
    }

    pub fn calls_for(&self, path: &str) -> Vec<&'static str> {
        let path = Path::new(path);
        self.lock()
            .calls
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, call)| *call)
            .collect()
    }

    pub fn release_count(&self) -> usize {
        self.lock().calls.iter().filter(|(_, call)| *call == "release").count()
    }

    /// Make every load of `path` fail
    pub fn fail_loads_of(&self, path: impl Into<PathBuf>) {
        self.lock().failing.insert(path.into());
    }

    pub fn set_position(&self, path: impl Into<PathBuf>, position_ms: u64) {
        self.lock().positions.insert(path.into(), position_ms);
    }

    pub fn set_duration(&self, path: impl Into<PathBuf>, duration_ms: u64) {
        self.lock().durations.insert(path.into(), duration_ms);
    }

    /// Fire the most recently registered completion callback, as the engine
    /// would from its own thread. Returns false when none is pending.
    pub fn complete_latest(&self) -> bool {
        let callback = self.lock().callbacks.pop().map(|(_, callback)| callback);
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Fire the completion callback registered for `path`
    pub fn complete(&self, path: &str) -> bool {
        let callback = {
            let mut state = self.lock();
            let index = state.callbacks.iter().rposition(|(p, _)| p == Path::new(path));
            index.map(|index| state.callbacks.remove(index).1)
        };
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

/// Scripted engine recording every call into an `EngineRecorder`
#[derive(Default)]
pub struct MockEngine {
    recorder: EngineRecorder,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorder(&self) -> EngineRecorder {
        self.recorder.clone()
    }
}

impl AudioEngine for MockEngine {
    fn load(&mut self, file: &Path) -> Result<Box<dyn EngineHandle>, EngineError> {
        let mut state = self.recorder.lock();
        state.loads.push(file.to_path_buf());
        if state.failing.contains(file) {
            return Err(EngineError::load(file, "unreadable resource"));
        }
        state.positions.insert(file.to_path_buf(), 0);
        drop(state);

        Ok(Box::new(MockHandle {
            path: file.to_path_buf(),
            recorder: self.recorder.clone(),
        }))
    }
}

struct MockHandle {
    path: PathBuf,
    recorder: EngineRecorder,
}

impl MockHandle {
    fn record(&self, call: &'static str) {
        self.recorder.lock().calls.push((self.path.clone(), call));
    }
}

impl EngineHandle for MockHandle {
    fn start(&mut self) -> Result<(), EngineError> {
        self.record("start");
        Ok(())
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        self.record("pause");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        self.record("stop");
        Ok(())
    }

    fn release(self: Box<Self>) {
        self.record("release");
        let mut state = self.recorder.lock();
        state.callbacks.retain(|(path, _)| path != &self.path);
    }

    fn seek(&mut self, position_ms: u64) -> Result<(), EngineError> {
        self.record("seek");
        self.recorder.lock().positions.insert(self.path.clone(), position_ms);
        Ok(())
    }

    fn current_position_ms(&self) -> u64 {
        self.recorder.lock().positions.get(&self.path).copied().unwrap_or(0)
    }

    fn duration_ms(&self) -> u64 {
        self.recorder
            .lock()
            .durations
            .get(&self.path)
            .copied()
            .unwrap_or(DEFAULT_DURATION_MS)
    }

    fn on_completion(&mut self, callback: CompletionCallback) {
        self.record("on_completion");
        self.recorder.lock().callbacks.push((self.path.clone(), callback));
    }
}

/// Sink that keeps every snapshot and report it receives
#[derive(Default)]
pub struct RecordingSink {
    statuses: Mutex<Vec<PlaybackStatus>>,
    reports: Mutex<Vec<CoordinatorError>>,
}

impl RecordingSink {
    pub fn last_status(&self) -> Option<PlaybackStatus> {
        self.statuses.lock().unwrap().last().cloned()
    }

    pub fn reports(&self) -> Vec<CoordinatorError> {
        self.reports.lock().unwrap().clone()
    }
}

impl StatusSink for RecordingSink {
    fn publish(&self, status: &PlaybackStatus) {
        self.statuses.lock().unwrap().push(status.clone());
    }

    fn report(&self, condition: &CoordinatorError) {
        self.reports.lock().unwrap().push(condition.clone());
    }
}
