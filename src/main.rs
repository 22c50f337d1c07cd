//! Desktop front-end: paste a video URL, pick a folder, download with yt-dlp.

// Fixed application settings
mod config;
// PATH checks for yt-dlp and ffmpeg
mod capability;
// Window state, worker-to-UI updates
mod model;
// Format policy and yt-dlp arguments
mod options;
// Progress line parsing and percentage/status mapping
mod progress;
// The yt-dlp engine boundary
mod downloader;
// Background download state machine
mod worker;
// Input validation and worker dispatch
mod controller;
// Native message boxes and folder picker
mod dialogs;
// Folder and engine error types
mod error;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use config::AppConfig;
use controller::Controller;
use dialogs::{show_message, NativeDialogs};
use downloader::YtDlpEngine;
use model::Notice;

// eframe/egui for GUI application framework
use eframe::{egui, App, Frame};
// OnceCell for single-time runtime initialization
use once_cell::sync::OnceCell;
use tokio::runtime::Runtime;

// Global Tokio runtime stored in a OnceCell for lazy init
static RUNTIME: OnceCell<Arc<Runtime>> = OnceCell::new();

/// Program entry point: checks for yt-dlp, initializes runtime and launches GUI
fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::default();

    // Nothing works without the engine; say how to fix it and leave.
    if !capability::has_engine(&config.engine_program) {
        log::error!("{} not found on PATH", config.engine_program);
        show_message(&Notice::error(
            "Missing dependency",
            "yt-dlp is not installed.\n\nInstall it with:\npip install -U yt-dlp\n\n\
             and make sure it is on your PATH.",
        ));
        std::process::exit(1);
    }

    // Create a new Tokio runtime and store it globally
    let rt = RUNTIME.get_or_init(|| Arc::new(Runtime::new().expect("failed to start tokio runtime")));

    let engine = Arc::new(YtDlpEngine::new(config.engine_program.clone(), rt.handle().clone()));
    let merge_tool = config.merge_tool.clone();
    let controller = Controller::new(
        config.clone(),
        engine,
        Arc::new(move || capability::has_merge_tool(&merge_tool)),
        Box::new(NativeDialogs),
        rt.handle().clone(),
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_resizable(false),
        ..Default::default()
    };
    eframe::run_native(
        &config.window_title,
        options,
        Box::new(move |cc| {
            let mut app = DownloaderApp::new(controller);
            app.controller.attach_context(cc.egui_ctx.clone());
            Box::new(app)
        }),
    )
}

/// The main window
struct DownloaderApp {
    controller: Controller,
    /// URL field grabs focus on the first frame only
    focus_url: bool,
}

impl DownloaderApp {
    fn new(controller: Controller) -> Self {
        Self { controller, focus_url: true }
    }
}

impl App for DownloaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // Apply whatever the worker queued since last frame
        self.controller.pump_updates();

        let busy = self.controller.is_busy();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label("Videos URL");
            let url = ui.add(
                egui::TextEdit::singleline(&mut self.controller.state.url).desired_width(f32::INFINITY),
            );
            if self.focus_url {
                url.request_focus();
                self.focus_url = false;
            }

            ui.add_space(6.0);
            ui.label("Save to");
            ui.horizontal(|ui| {
                let field_width = ui.available_width() - 90.0;
                ui.add(egui::TextEdit::singleline(&mut self.controller.state.folder).desired_width(field_width));
                if ui.button("Choose...").clicked() {
                    self.controller.choose_folder();
                }
            });

            ui.add_space(8.0);
            ui.vertical_centered(|ui| {
                if ui.add_enabled(!busy, egui::Button::new("Download")).clicked() {
                    self.controller.start_download();
                }
            });

            ui.add_space(8.0);
            ui.add(egui::ProgressBar::new(self.controller.state.progress / 100.0));
            ui.label(&self.controller.state.status);
        });

        // Keep polling while a worker is alive in case a repaint request was missed
        if busy {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }

    /// Window is closing: the yt-dlp child must not outlive the process.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.controller.shutdown();
    }
}
