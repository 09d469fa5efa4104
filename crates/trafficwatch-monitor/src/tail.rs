//! Polling file tailer.
//!
//! Reads the target file from the beginning, then follows appended data by
//! polling its length on a short interval. Only complete lines are
//! delivered; a trailing partial line waits in a buffer until its newline
//! arrives. A shrinking file is treated as truncation (log rotation in
//! place) and reading restarts from offset zero. A missing file is not an
//! error; the tailer keeps polling until it appears.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;
use trafficwatch_core::worker::PeriodicWorker;
use trafficwatch_core::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Follows a file and delivers each complete line to a handler, on a
/// dedicated background thread.
#[derive(Debug)]
pub struct LogTailer {
    worker: PeriodicWorker,
}

impl LogTailer {
    /// Start tailing `path`, invoking `handler` once per complete line
    /// (without its newline). Existing content is delivered first.
    pub fn spawn<F>(path: &Path, handler: F) -> Result<Self>
    where
        F: FnMut(&str) + Send + 'static,
    {
        let mut state = TailState::new(path.to_path_buf(), handler);
        let worker = PeriodicWorker::spawn("log-tailer", POLL_INTERVAL, move || state.poll())?;
        Ok(Self { worker })
    }

    /// Stop tailing. Data appended after the final poll is not delivered.
    pub fn stop(&mut self) {
        self.worker.stop();
    }
}

struct TailState<F> {
    path: PathBuf,
    offset: u64,
    partial: Vec<u8>,
    handler: F,
    missing_logged: bool,
}

impl<F: FnMut(&str)> TailState<F> {
    fn new(path: PathBuf, handler: F) -> Self {
        Self {
            path,
            offset: 0,
            partial: Vec::new(),
            handler,
            missing_logged: false,
        }
    }

    fn poll(&mut self) {
        if let Err(error) = self.poll_inner() {
            tracing::warn!(path = %self.path.display(), %error, "tail poll failed");
        }
    }

    fn poll_inner(&mut self) -> Result<()> {
        let length = match std::fs::metadata(&self.path) {
            Ok(metadata) => metadata.len(),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                if !self.missing_logged {
                    tracing::info!(path = %self.path.display(), "waiting for log file to appear");
                    self.missing_logged = true;
                }
                self.offset = 0;
                self.partial.clear();
                return Ok(());
            }
            Err(error) => return Err(Error::Io(error)),
        };
        self.missing_logged = false;

        if length < self.offset {
            tracing::info!(path = %self.path.display(), "log file truncated; restarting from the beginning");
            self.offset = 0;
            self.partial.clear();
        }
        if length == self.offset {
            return Ok(());
        }

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.offset))?;
        let mut fresh = Vec::new();
        file.read_to_end(&mut fresh)?;
        self.offset += fresh.len() as u64;
        self.partial.extend_from_slice(&fresh);
        self.drain_complete_lines();
        Ok(())
    }

    fn drain_complete_lines(&mut self) {
        while let Some(newline) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=newline).collect();
            let text = String::from_utf8_lossy(&line[..newline]);
            (self.handler)(text.trim_end_matches('\r'));
        }
    }
}
