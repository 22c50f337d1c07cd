use std::{fmt, path::Path, sync::Arc};

use crate::progress::ProgressEvent;

/// Merge video+audio up to 1080p, else a pre-muxed mp4, else anything.
pub const FORMAT_WITH_MERGE: &str = "bv*[ext=mp4][height<=1080]+ba[ext=m4a]/b[ext=mp4]/b";
/// Single pre-muxed stream only; nothing to merge with.
pub const FORMAT_NO_MERGE: &str = "b[ext=mp4]/b";
pub const MERGE_OUTPUT_FORMAT: &str = "mp4";
pub const FRAGMENT_CONCURRENCY: u32 = 3;
/// Makes the engine print one machine-readable line per progress report.
pub const PROGRESS_TEMPLATE: &str = "download:[progress] %(progress.status)s %(progress.downloaded_bytes)s %(progress.total_bytes)s %(progress.total_bytes_estimate)s";

/// Callback invoked synchronously for every progress event.
pub type ProgressHook = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Everything the engine needs for one request. Immutable once built.
#[derive(Clone)]
pub struct DownloadOptions {
    pub output_template: String,
    pub no_playlist: bool,
    pub format: String,
    pub merge_output_format: Option<String>,
    pub concurrent_fragments: u32,
    pub progress_hook: ProgressHook,
}

impl fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("output_template", &self.output_template)
            .field("no_playlist", &self.no_playlist)
            .field("format", &self.format)
            .field("merge_output_format", &self.merge_output_format)
            .field("concurrent_fragments", &self.concurrent_fragments)
            .finish_non_exhaustive()
    }
}

/// Picks the format policy for this host.
pub fn build_options(destination: &Path, has_merge_tool: bool, on_progress: ProgressHook) -> DownloadOptions {
    let (format, merge_output_format) = if has_merge_tool {
        (FORMAT_WITH_MERGE, Some(MERGE_OUTPUT_FORMAT.to_string()))
    } else {
        (FORMAT_NO_MERGE, None)
    };

    DownloadOptions {
        output_template: destination.join("%(title)s.%(ext)s").to_string_lossy().into_owned(),
        no_playlist: true,
        format: format.to_string(),
        merge_output_format,
        concurrent_fragments: FRAGMENT_CONCURRENCY,
        progress_hook: on_progress,
    }
}

impl DownloadOptions {
    /// Command-line arguments for yt-dlp, URL last.
    pub fn to_args(&self, url: &str) -> Vec<String> {
        let mut args = vec!["-f".to_owned(), self.format.clone()];

        if let Some(merge) = &self.merge_output_format {
            args.push("--merge-output-format".to_owned());
            args.push(merge.clone());
        }
        if self.no_playlist {
            args.push("--no-playlist".to_owned());
        }

        args.push("--concurrent-fragments".to_owned());
        args.push(self.concurrent_fragments.to_string());

        args.push("--no-warnings".to_owned());
        args.push("--progress".to_owned());
        args.push("--progress-template".to_owned());
        args.push(PROGRESS_TEMPLATE.to_owned());
        args.push("--newline".to_owned());

        args.push("-o".to_owned());
        args.push(self.output_template.clone());
        // Keep a URL starting with '-' from being read as a flag.
        args.push("--".to_owned());
        args.push(url.to_owned());
        args
    }
}
