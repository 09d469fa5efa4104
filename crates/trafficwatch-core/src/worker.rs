//! Named background workers for periodic tasks.
//!
//! Each worker is a plain thread running `tick` on a fixed interval. The
//! first tick runs immediately on spawn. Sleeps happen in small chunks so a
//! stop request is observed within ~1 second; stop drains the thread with a
//! finite timeout and logs (rather than escalates) if it fails to finish.

use crate::error::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// How long `stop` waits for the worker thread to finish before giving up.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest single sleep; bounds shutdown latency for large intervals.
const SLEEP_CHUNK: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub struct PeriodicWorker {
    name: String,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicWorker {
    /// Spawn a named worker that runs `tick` every `interval`, starting
    /// immediately.
    pub fn spawn<F>(name: &str, interval: Duration, mut tick: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let thread_name = name.to_string();
        let handle = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                tracing::debug!(worker = %thread_name, interval_ms = interval.as_millis() as u64, "worker started");
                while !flag.load(Ordering::Acquire) {
                    tick();
                    let mut remaining = interval;
                    while !remaining.is_zero() {
                        if flag.load(Ordering::Acquire) {
                            tracing::debug!(worker = %thread_name, "worker shutting down");
                            return;
                        }
                        let chunk = remaining.min(SLEEP_CHUNK);
                        std::thread::sleep(chunk);
                        remaining = remaining.saturating_sub(chunk);
                    }
                }
                tracing::debug!(worker = %thread_name, "worker shutting down");
            })
            .map_err(|source| Error::WorkerSpawn {
                name: name.to_string(),
                source,
            })?;
        Ok(Self {
            name: name.to_string(),
            shutdown,
            handle: Some(handle),
        })
    }

    /// Request shutdown and wait (bounded) for the in-flight tick to finish.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        let Some(handle) = self.handle.take() else {
            return;
        };
        let deadline = Instant::now() + DRAIN_TIMEOUT;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                tracing::warn!(worker = %self.name, "worker did not drain within timeout; detaching");
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        if handle.join().is_err() {
            tracing::error!(worker = %self.name, "worker thread panicked");
        }
    }
}

impl Drop for PeriodicWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn first_tick_runs_immediately() {
        let ticks = Arc::new(AtomicU64::new(0));
        let counted = Arc::clone(&ticks);
        let mut worker = PeriodicWorker::spawn("test-immediate", Duration::from_secs(60), move || {
            counted.fetch_add(1, Ordering::Relaxed);
        })
        .expect("spawn should succeed");

        let deadline = Instant::now() + Duration::from_secs(2);
        while ticks.load(Ordering::Relaxed) == 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(ticks.load(Ordering::Relaxed), 1);
        worker.stop();
    }

    #[test]
    fn ticks_repeat_on_the_interval() {
        let ticks = Arc::new(AtomicU64::new(0));
        let counted = Arc::clone(&ticks);
        let mut worker = PeriodicWorker::spawn("test-repeat", Duration::from_millis(20), move || {
            counted.fetch_add(1, Ordering::Relaxed);
        })
        .expect("spawn should succeed");

        std::thread::sleep(Duration::from_millis(300));
        worker.stop();
        assert!(ticks.load(Ordering::Relaxed) >= 3);
    }

    #[test]
    fn stop_is_idempotent_and_prompt() {
        let mut worker = PeriodicWorker::spawn("test-stop", Duration::from_secs(3600), || {})
            .expect("spawn should succeed");
        let start = Instant::now();
        worker.stop();
        worker.stop();
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
