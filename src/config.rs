use std::path::{Path, PathBuf};

/// Fixed application settings. Built in code, never persisted.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Executable that performs the actual download
    pub engine_program: String,
    /// Executable used to merge separate video and audio streams
    pub merge_tool: String,
    /// Folder used when the "Save to" field is left blank
    pub default_folder: PathBuf,
    pub window_title: String,
    pub window_size: [f32; 2],
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine_program: if cfg!(target_os = "windows") { "yt-dlp.exe" } else { "yt-dlp" }.to_string(),
            merge_tool: if cfg!(target_os = "windows") { "ffmpeg.exe" } else { "ffmpeg" }.to_string(),
            default_folder: default_downloads_dir(),
            window_title: "AirFun Video Downloader".to_string(),
            window_size: [560.0, 230.0],
        }
    }
}

/// The user's Downloads folder, or `<home>/Downloads` when the platform doesn't name one.
pub fn default_downloads_dir() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| {
            dirs.download_dir()
                .map(Path::to_path_buf)
                .or_else(|| Some(dirs.home_dir().join("Downloads")))
        })
        .unwrap_or_else(|| PathBuf::from("Downloads"))
}
