use std::path::PathBuf;

use eframe::egui;
use tokio::sync::mpsc::UnboundedSender;

/// One press of the Download button, after validation
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    /// Trimmed, non-empty URL
    pub url: String,
    /// Resolved destination folder
    pub destination: PathBuf,
}

/// Everything the main window shows. Only touched on the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    /// Contents of the URL field
    pub url: String,
    /// Contents of the "Save to" field
    pub folder: String,
    /// Status line under the progress bar
    pub status: String,
    /// Progress percentage (0.0 to 100.0)
    pub progress: f32,
}

impl UiState {
    pub fn new(default_folder: &str) -> Self {
        Self {
            url: String::new(),
            folder: default_folder.to_string(),
            status: "Idle".to_string(),
            progress: 0.0,
        }
    }

    /// Fresh state for a new request.
    pub fn reset_for_download(&mut self) {
        self.progress = 0.0;
        self.status = "Starting...".to_string();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A modal message box
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn info(title: &str, body: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, title: title.to_string(), body: body.into() }
    }

    pub fn warning(title: &str, body: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, title: title.to_string(), body: body.into() }
    }

    pub fn error(title: &str, body: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, title: title.to_string(), body: body.into() }
    }
}

/// A state change requested from a worker thread.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    Progress(f32),
    Status(String),
    Notify(Notice),
}

/// Worker-side handle for marshaling updates onto the UI thread.
///
/// Updates are queued and applied by the controller on its next frame; the
/// optional egui context is poked so that frame happens promptly.
#[derive(Clone)]
pub struct UiSender {
    tx: UnboundedSender<UiUpdate>,
    repaint: Option<egui::Context>,
}

impl UiSender {
    pub fn new(tx: UnboundedSender<UiUpdate>, repaint: Option<egui::Context>) -> Self {
        Self { tx, repaint }
    }

    pub fn post(&self, update: UiUpdate) {
        // A closed receiver means the window is gone; nothing left to update.
        if self.tx.send(update).is_ok() {
            if let Some(ctx) = &self.repaint {
                ctx.request_repaint();
            }
        }
    }

    pub fn progress(&self, percent: f32) {
        self.post(UiUpdate::Progress(percent));
    }

    pub fn status(&self, text: impl Into<String>) {
        self.post(UiUpdate::Status(text.into()));
    }

    pub fn notify(&self, notice: Notice) {
        self.post(UiUpdate::Notify(notice));
    }
}
