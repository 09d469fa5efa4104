//! The interactive watch loop.
//!
//! Reports go to stdout as they render; alert transitions go to stderr so
//! they stand out (and survive stdout redirection). The loop polls the
//! monitor a few times a second and exits on `q` or stdin EOF.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;
use trafficwatch_core::{Config, Error, Result};
use trafficwatch_monitor::TrafficMonitor;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn run(config: Config) -> Result<()> {
    let monitor = TrafficMonitor::new(config)?;
    monitor.start()?;
    println!(
        "Watching {} (press q<Enter> to quit)",
        monitor.config().log_file.display()
    );

    let quit = spawn_stdin_reader()?;
    let mut last_report: Option<String> = None;
    let mut last_message: Option<String> = None;

    loop {
        match quit.recv_timeout(POLL_INTERVAL) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        let report = monitor.latest_report();
        if report.is_some() && report != last_report {
            if let Some(report) = &report {
                println!("{report}");
            }
            last_report = report;
        }

        let message = monitor.alert_message();
        if message.is_some() && message != last_message {
            if let Some(message) = &message {
                eprintln!("{message}");
            }
            last_message = message;
        }
    }

    monitor.stop();
    let metrics = monitor.metrics();
    tracing::info!(
        lines = metrics.ingest.lines_total,
        malformed = metrics.ingest.lines_malformed,
        accepted = metrics.ingest.records_accepted,
        dropped = metrics.ingest.records_dropped,
        alerts = metrics.alert.alerts_fired,
        "session summary"
    );
    Ok(())
}

/// Read stdin on its own thread; a `q` line sends a quit signal, EOF closes
/// the channel.
pub(crate) fn spawn_stdin_reader() -> Result<mpsc::Receiver<()>> {
    let (sender, receiver) = mpsc::channel();
    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let mut line = String::new();
            loop {
                line.clear();
                match std::io::stdin().read_line(&mut line) {
                    Ok(0) | Err(_) => return,
                    Ok(_) if line.trim().eq_ignore_ascii_case("q") => {
                        let _ = sender.send(());
                        return;
                    }
                    Ok(_) => {}
                }
            }
        })
        .map_err(|source| Error::WorkerSpawn {
            name: "stdin-reader".to_string(),
            source,
        })?;
    Ok(receiver)
}
