use std::{fs, path::Path, sync::Arc};

use crate::{
    downloader::Engine,
    error::{DownloadError, FolderError},
    model::{DownloadRequest, Notice, UiSender},
    options::{build_options, ProgressHook},
    progress::{adapt, ProgressEvent},
};

/// Answers "can streams be merged on this host?" at download time.
pub type MergeProbe = Arc<dyn Fn() -> bool + Send + Sync>;

/// Lifecycle of one download request.
#[derive(Debug)]
pub enum WorkerState {
    Idle,
    Preparing,
    Running,
    Succeeded,
    Failed(DownloadError),
}

/// Runs a single request off the UI thread and reports back through `UiSender`.
pub struct DownloadWorker {
    engine: Arc<dyn Engine>,
    merge_probe: MergeProbe,
    ui: UiSender,
    state: WorkerState,
}

impl DownloadWorker {
    pub fn new(engine: Arc<dyn Engine>, merge_probe: MergeProbe, ui: UiSender) -> Self {
        Self { engine, merge_probe, ui, state: WorkerState::Idle }
    }

    /// Drives the request to a terminal state. Blocks for the whole download.
    pub fn run(mut self, request: DownloadRequest) -> WorkerState {
        self.transition(WorkerState::Preparing);
        if let Err(err) = prepare_folder(&request.destination) {
            return self.fail(err.into());
        }

        self.transition(WorkerState::Running);
        let has_merge_tool = (self.merge_probe)();
        let options = build_options(&request.destination, has_merge_tool, self.progress_hook());
        log::info!("downloading {} with format {}", request.url, options.format);

        match self.engine.download(&request.url, &options) {
            Ok(()) => {
                self.ui.progress(100.0);
                self.ui.status("Done!");
                self.ui.notify(Notice::info(
                    "Completed",
                    format!("Saved to:\n{}", request.destination.display()),
                ));
                self.transition(WorkerState::Succeeded);
                self.state
            }
            Err(err) => self.fail(err.into()),
        }
    }

    /// Every event is marshaled individually, in the order the engine produced it.
    fn progress_hook(&self) -> ProgressHook {
        let ui = self.ui.clone();
        Arc::new(move |event: &ProgressEvent| {
            let update = adapt(event);
            if let Some(percent) = update.percent {
                ui.progress(percent);
            }
            if let Some(status) = update.status {
                ui.status(status);
            }
        })
    }

    fn fail(mut self, err: DownloadError) -> WorkerState {
        log::warn!("download failed: {err}");
        let title = match err {
            DownloadError::Folder(_) => "Folder Error",
            DownloadError::Engine(_) => "Download Error",
        };
        let text = err.to_string();
        self.ui.status(format!("Error: {text}"));
        self.ui.notify(Notice::error(title, text));
        self.transition(WorkerState::Failed(err));
        self.state
    }

    fn transition(&mut self, next: WorkerState) {
        log::debug!("worker {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Creates the destination (and parents) if needed.
fn prepare_folder(path: &Path) -> Result<(), FolderError> {
    fs::create_dir_all(path).map_err(|source| FolderError { path: path.to_path_buf(), source })
}
