//! Test doubles for the engine and dialog boundaries.

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use crate::{
    dialogs::Dialogs,
    downloader::Engine,
    error::EngineError,
    model::Notice,
    options::DownloadOptions,
    progress::ProgressEvent,
};

/// Replays fixed progress events, then succeeds or fails. Records every call.
pub struct ScriptedEngine {
    events: Vec<ProgressEvent>,
    failure: Option<String>,
    /// Block inside `download` until `shutdown` is called
    hold: bool,
    stopped: AtomicBool,
    calls: Mutex<Vec<(String, DownloadOptions)>>,
}

impl ScriptedEngine {
    fn scripted(events: Vec<ProgressEvent>, failure: Option<String>, hold: bool) -> Self {
        Self { events, failure, hold, stopped: AtomicBool::new(false), calls: Mutex::new(Vec::new()) }
    }

    pub fn succeeding(events: Vec<ProgressEvent>) -> Self {
        Self::scripted(events, None, false)
    }

    pub fn failing(events: Vec<ProgressEvent>, message: &str) -> Self {
        Self::scripted(events, Some(message.to_string()), false)
    }

    /// Runs until shut down, then reports cancellation.
    pub fn until_shutdown() -> Self {
        Self::scripted(vec![], None, true)
    }

    pub fn was_shut_down(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<DownloadOptions> {
        self.calls.lock().unwrap().iter().map(|(_, o)| o.clone()).collect()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
    }
}

impl Engine for ScriptedEngine {
    fn download(&self, url: &str, options: &DownloadOptions) -> Result<(), EngineError> {
        self.calls.lock().unwrap().push((url.to_string(), options.clone()));
        for event in &self.events {
            (options.progress_hook)(event);
        }
        if self.hold {
            while !self.was_shut_down() {
                std::thread::sleep(Duration::from_millis(5));
            }
        }
        if self.was_shut_down() {
            return Err(EngineError::Cancelled);
        }
        match &self.failure {
            Some(msg) => Err(EngineError::Failed(msg.clone())),
            None => Ok(()),
        }
    }

    fn shutdown(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

/// Records shown notices and answers folder picks from a preset value.
#[derive(Clone, Default)]
pub struct RecordingDialogs {
    pub shown: Arc<Mutex<Vec<Notice>>>,
    pub pick: Option<PathBuf>,
}

impl RecordingDialogs {
    pub fn picking(path: impl Into<PathBuf>) -> Self {
        Self { pick: Some(path.into()), ..Self::default() }
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.shown.lock().unwrap().clone()
    }
}

impl Dialogs for RecordingDialogs {
    fn show(&self, notice: &Notice) {
        self.shown.lock().unwrap().push(notice.clone());
    }

    fn pick_folder(&self, _start: &str) -> Option<PathBuf> {
        self.pick.clone()
    }
}
