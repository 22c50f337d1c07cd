/// Prefix written by the engine's progress template (see `options::PROGRESS_TEMPLATE`).
pub const PROGRESS_PREFIX: &str = "[progress]";

/// Transfer state reported by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressStatus {
    Downloading,
    /// Download phase complete; merging or other post-processing may follow.
    Finished,
    /// Any status this program doesn't know about
    Other(String),
}

/// One progress report from the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    pub downloaded_bytes: Option<f64>,
    pub total_bytes: Option<f64>,
    pub total_bytes_estimate: Option<f64>,
}

#[cfg(test)]
impl ProgressEvent {
    pub fn downloading(downloaded: f64, total: Option<f64>) -> Self {
        Self {
            status: ProgressStatus::Downloading,
            downloaded_bytes: Some(downloaded),
            total_bytes: total,
            total_bytes_estimate: None,
        }
    }

    pub fn finished() -> Self {
        Self {
            status: ProgressStatus::Finished,
            downloaded_bytes: None,
            total_bytes: None,
            total_bytes_estimate: None,
        }
    }
}

/// What the UI should change in response to one event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressUpdate {
    /// New progress value in `0.0..=100.0`
    pub percent: Option<f32>,
    pub status: Option<String>,
}

/// Turns an engine event into a percentage and a status line.
pub fn adapt(event: &ProgressEvent) -> ProgressUpdate {
    match &event.status {
        ProgressStatus::Downloading => {
            let total = event
                .total_bytes
                .filter(|t| *t > 0.0)
                .or(event.total_bytes_estimate.filter(|t| *t > 0.0));
            let downloaded = event.downloaded_bytes.unwrap_or(0.0);
            let percent = match total {
                Some(total) => (downloaded / total * 100.0).clamp(0.0, 100.0) as f32,
                None => 0.0,
            };
            ProgressUpdate {
                percent: Some(percent),
                status: Some(format!("Downloading... {percent:.1}%")),
            }
        }
        ProgressStatus::Finished => ProgressUpdate {
            percent: None,
            status: Some("Processing...".to_string()),
        },
        ProgressStatus::Other(status) => {
            log::debug!("ignoring progress status {status}");
            ProgressUpdate::default()
        }
    }
}

/// Parses a `[progress] <status> <downloaded> <total> <estimate>` line.
/// Fields the engine doesn't know are printed as `NA`.
pub fn parse_progress_from_line(line: &str) -> Option<ProgressEvent> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let mut fields = rest.split_whitespace();
    let status = match fields.next()? {
        "downloading" => ProgressStatus::Downloading,
        "finished" => ProgressStatus::Finished,
        other => ProgressStatus::Other(other.to_string()),
    };
    let mut number = || fields.next().and_then(|f| f.parse::<f64>().ok());
    Some(ProgressEvent {
        status,
        downloaded_bytes: number(),
        total_bytes: number(),
        total_bytes_estimate: number(),
    })
}
