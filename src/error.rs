use std::{io, path::PathBuf, process::ExitStatus};
use thiserror::Error;

/// The destination folder could not be created or used.
#[derive(Debug, Error)]
#[error("Cannot use folder:\n{}\n\n{source}", .path.display())]
pub struct FolderError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Failures reported by the download engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Engine ran and reported an error; the text is shown to the user as is.
    #[error("{0}")]
    Failed(String),
    /// Stopped because the app is shutting down.
    #[error("download cancelled")]
    Cancelled,
}

impl EngineError {
    /// Builds a failure from whatever the engine wrote to stderr.
    pub fn from_stderr(stderr: &[String], status: ExitStatus) -> Self {
        let reported = stderr
            .iter()
            .rev()
            .map(|l| l.trim())
            .find(|l| l.starts_with("ERROR:"))
            .map(str::to_string)
            .or_else(|| {
                stderr
                    .iter()
                    .rev()
                    .map(|l| l.trim())
                    .find(|l| !l.is_empty())
                    .map(str::to_string)
            });
        EngineError::Failed(reported.unwrap_or_else(|| format!("yt-dlp exited with {status}")))
    }
}

/// Terminal failure of one download request.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Folder(#[from] FolderError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}
