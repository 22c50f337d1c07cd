use std::process::Stdio;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::{Child, Command},
    runtime::Handle,
    sync::watch,
};

use crate::{error::EngineError, options::DownloadOptions, progress::parse_progress_from_line};

/// The external capability that retrieves and muxes media.
///
/// `download` blocks the calling thread until the URL is fully retrieved (and
/// merged) or fails. Progress is reported through `options.progress_hook`,
/// synchronously and in order, from inside the call.
pub trait Engine: Send + Sync {
    fn download(&self, url: &str, options: &DownloadOptions) -> Result<(), EngineError>;

    /// Stops any running download and refuses new ones. Called once, on app exit.
    fn shutdown(&self) {}
}

/// Runs the `yt-dlp` executable found on PATH.
pub struct YtDlpEngine {
    program: String,
    runtime: Handle,
    /// Flips to true once at shutdown
    stop: watch::Sender<bool>,
}

impl YtDlpEngine {
    pub fn new(program: impl Into<String>, runtime: Handle) -> Self {
        Self { program: program.into(), runtime, stop: watch::Sender::new(false) }
    }

    async fn run(&self, url: &str, options: &DownloadOptions) -> Result<(), EngineError> {
        let mut stop = self.stop.subscribe();
        if *stop.borrow_and_update() {
            return Err(EngineError::Cancelled);
        }

        let args = options.to_args(url);
        log::debug!("{} {:?}", self.program, args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn { program: self.program.clone(), source })?;

        let (Some(out), Some(err)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(EngineError::Failed("engine output could not be captured".to_string()));
        };

        // Drain stderr alongside stdout so neither pipe can fill up and stall the child.
        let stderr_task = tokio::spawn(async move {
            let mut collected = Vec::new();
            let mut lines = BufReader::new(err).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                log::debug!("yt-dlp stderr: {line}");
                collected.push(line);
            }
            collected
        });

        let mut lines = BufReader::new(out).lines();
        loop {
            let next = tokio::select! {
                _ = stop.changed() => None,
                line = lines.next_line() => Some(line?),
            };
            match next {
                None => return self.kill(&mut child).await,
                Some(None) => break,
                Some(Some(line)) => match parse_progress_from_line(&line) {
                    Some(event) => (options.progress_hook)(&event),
                    None => log::debug!("yt-dlp: {line}"),
                },
            }
        }

        // Merging can still be running after stdout closes.
        let status = tokio::select! {
            _ = stop.changed() => None,
            status = child.wait() => Some(status?),
        };
        let Some(status) = status else {
            return self.kill(&mut child).await;
        };

        let stderr = stderr_task.await.unwrap_or_default();
        if status.success() {
            Ok(())
        } else {
            Err(EngineError::from_stderr(&stderr, status))
        }
    }

    async fn kill(&self, child: &mut Child) -> Result<(), EngineError> {
        log::info!("stopping {} (pid {:?})", self.program, child.id());
        child.kill().await?;
        Err(EngineError::Cancelled)
    }
}

impl Engine for YtDlpEngine {
    fn download(&self, url: &str, options: &DownloadOptions) -> Result<(), EngineError> {
        self.runtime.block_on(self.run(url, options))
    }

    fn shutdown(&self) {
        self.stop.send_replace(true);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::{
        options::build_options,
        progress::{ProgressEvent, ProgressStatus},
    };
    use std::{
        io::Write,
        os::unix::fs::PermissionsExt,
        path::Path,
        sync::{Arc, Mutex},
    };
    use tokio::runtime::Runtime;

    /// Writes an executable shell script standing in for yt-dlp.
    fn fake_engine(dir: &Path, body: &str) -> String {
        let path = dir.join("fake-yt-dlp");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "#!/bin/sh\n{body}").unwrap();
        drop(f);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn run_blocking(engine: YtDlpEngine, rt: &Runtime, dest: &Path) -> (Result<(), String>, Vec<ProgressEvent>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let opts = build_options(dest, false, Arc::new(move |e: &ProgressEvent| {
            sink.lock().unwrap().push(e.clone());
        }));
        let engine = Arc::new(engine);
        let result = rt
            .block_on(rt.spawn_blocking(move || engine.download("https://example.com/v", &opts)))
            .unwrap()
            .map_err(|e| e.to_string());
        let events = seen.lock().unwrap().clone();
        (result, events)
    }

    #[test]
    fn progress_lines_reach_the_hook_in_order() {
        let rt = Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let program = fake_engine(
            dir.path(),
            "echo '[youtube] abc: Downloading webpage'\n\
             echo '[progress] downloading 50 200 NA'\n\
             echo '[progress] downloading 200 200 NA'\n\
             echo '[progress] finished 200 200 NA'\n\
             exit 0",
        );
        let engine = YtDlpEngine::new(program, rt.handle().clone());
        let (result, events) = run_blocking(engine, &rt, dir.path());

        assert_eq!(result, Ok(()));
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], ProgressEvent::downloading(50.0, Some(200.0)));
        assert_eq!(events[1], ProgressEvent::downloading(200.0, Some(200.0)));
        assert_eq!(events[2].status, ProgressStatus::Finished);
    }

    #[test]
    fn nonzero_exit_reports_engine_error_text() {
        let rt = Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let program = fake_engine(dir.path(), "echo 'ERROR: Unsupported URL: https://example.com/v' >&2\nexit 1");
        let engine = YtDlpEngine::new(program, rt.handle().clone());
        let (result, events) = run_blocking(engine, &rt, dir.path());

        assert_eq!(result, Err("ERROR: Unsupported URL: https://example.com/v".to_string()));
        assert!(events.is_empty());
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let rt = Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let engine = YtDlpEngine::new(dir.path().join("absent").to_string_lossy(), rt.handle().clone());
        let (result, _) = run_blocking(engine, &rt, dir.path());
        assert!(result.unwrap_err().starts_with("failed to start"));
    }

    #[test]
    fn shutdown_kills_a_running_download() {
        let rt = Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("still-running");
        let program = fake_engine(
            dir.path(),
            &format!(
                "echo '[progress] downloading 1 10 NA'\nsleep 1\ntouch '{}'\nexit 0",
                marker.display()
            ),
        );
        let engine = Arc::new(YtDlpEngine::new(program, rt.handle().clone()));

        let (started_tx, started_rx) = std::sync::mpsc::channel();
        let started_tx = Mutex::new(started_tx);
        let opts = build_options(dir.path(), false, Arc::new(move |_: &ProgressEvent| {
            let _ = started_tx.lock().unwrap().send(());
        }));
        let running = Arc::clone(&engine);
        let handle = rt.spawn_blocking(move || running.download("https://example.com/v", &opts));

        started_rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        engine.shutdown();
        let result = rt.block_on(handle).unwrap();
        assert!(matches!(result, Err(EngineError::Cancelled)));

        std::thread::sleep(std::time::Duration::from_millis(1500));
        assert!(!marker.exists());
    }

    #[test]
    fn no_download_starts_after_shutdown() {
        let rt = Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let program = fake_engine(dir.path(), &format!("touch '{}'", marker.display()));
        let engine = YtDlpEngine::new(program, rt.handle().clone());
        engine.shutdown();

        let (result, _) = run_blocking(engine, &rt, dir.path());
        assert_eq!(result, Err(EngineError::Cancelled.to_string()));
        assert!(!marker.exists());
    }
}
