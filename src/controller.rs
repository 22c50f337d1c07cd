use std::{path::PathBuf, sync::Arc, time::Duration};

use eframe::egui;
use tokio::{
    runtime::Handle,
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    task::{JoinError, JoinHandle},
};

use crate::{
    config::AppConfig,
    dialogs::Dialogs,
    downloader::Engine,
    model::{DownloadRequest, Notice, UiSender, UiState, UiUpdate},
    worker::{DownloadWorker, MergeProbe, WorkerState},
};

/// How long app exit waits for a stopped download to wind down.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Owns the window's state and turns button presses into download requests.
pub struct Controller {
    pub state: UiState,
    config: AppConfig,
    engine: Arc<dyn Engine>,
    merge_probe: MergeProbe,
    dialogs: Box<dyn Dialogs>,
    runtime: Handle,
    updates_tx: UnboundedSender<UiUpdate>,
    updates_rx: UnboundedReceiver<UiUpdate>,
    /// Used by workers to wake the UI after queuing an update
    repaint: Option<egui::Context>,
    /// Handle of the running download, kept until it finishes
    worker: Option<JoinHandle<WorkerState>>,
}

impl Controller {
    pub fn new(
        config: AppConfig,
        engine: Arc<dyn Engine>,
        merge_probe: MergeProbe,
        dialogs: Box<dyn Dialogs>,
        runtime: Handle,
    ) -> Self {
        let (updates_tx, updates_rx) = unbounded_channel();
        let state = UiState::new(&config.default_folder.display().to_string());
        Self {
            state,
            config,
            engine,
            merge_probe,
            dialogs,
            runtime,
            updates_tx,
            updates_rx,
            repaint: None,
            worker: None,
        }
    }

    pub fn attach_context(&mut self, ctx: egui::Context) {
        self.repaint = Some(ctx);
    }

    /// True while a download is still running.
    pub fn is_busy(&self) -> bool {
        self.worker.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn choose_folder(&mut self) {
        if let Some(folder) = self.dialogs.pick_folder(&self.state.folder) {
            self.state.folder = folder.display().to_string();
        }
    }

    /// Validates the inputs and spawns a worker. Returns whether one was started.
    pub fn start_download(&mut self) -> bool {
        let url = self.state.url.trim().to_string();
        if url.is_empty() {
            self.dialogs.show(&Notice::warning("Missing URL", "Please paste a Video URL."));
            return false;
        }
        if self.is_busy() {
            log::warn!("download already running, ignoring {url}");
            return false;
        }

        let request = DownloadRequest { url, destination: self.resolve_destination() };
        log::info!("starting {} -> {}", request.url, request.destination.display());
        self.state.reset_for_download();

        let worker = DownloadWorker::new(
            Arc::clone(&self.engine),
            Arc::clone(&self.merge_probe),
            UiSender::new(self.updates_tx.clone(), self.repaint.clone()),
        );
        self.worker = Some(self.runtime.spawn_blocking(move || worker.run(request)));
        true
    }

    /// Applies queued worker updates. Call once per frame on the UI thread.
    pub fn pump_updates(&mut self) {
        while let Ok(update) = self.updates_rx.try_recv() {
            match update {
                UiUpdate::Progress(p) => self.state.progress = p.clamp(0.0, 100.0),
                UiUpdate::Status(s) => self.state.status = s,
                UiUpdate::Notify(n) => self.dialogs.show(&n),
            }
        }
        if let Some(handle) = self.worker.take_if(|h| h.is_finished()) {
            log_outcome(self.runtime.block_on(handle));
        }
    }

    /// Stops a running download so no engine process outlives the window.
    pub fn shutdown(&mut self) {
        self.engine.shutdown();
        let Some(handle) = self.worker.take() else { return };
        match self.runtime.block_on(tokio::time::timeout(SHUTDOWN_GRACE, handle)) {
            Ok(outcome) => log_outcome(outcome),
            Err(_) => log::warn!("worker still running after {SHUTDOWN_GRACE:?}, exiting anyway"),
        }
    }

    fn resolve_destination(&self) -> PathBuf {
        let folder = self.state.folder.trim();
        if folder.is_empty() {
            self.config.default_folder.clone()
        } else {
            PathBuf::from(folder)
        }
    }

    /// Waits for the current worker and returns its terminal state.
    #[cfg(test)]
    pub fn join_worker(&mut self) -> Option<WorkerState> {
        let handle = self.worker.take()?;
        self.runtime.block_on(handle).ok()
    }
}

fn log_outcome(outcome: Result<WorkerState, JoinError>) {
    match outcome {
        Ok(WorkerState::Succeeded) => log::info!("download finished"),
        Ok(WorkerState::Failed(err)) => log::info!("download ended with error: {err}"),
        Ok(state) => log::warn!("worker stopped early in state {state:?}"),
        Err(err) => log::error!("worker panicked: {err}"),
    }
}
