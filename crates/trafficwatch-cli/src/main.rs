//! trafficwatch - HTTP access-log traffic monitor
//!
//! Tails a Common Log Format access log, prints periodic traffic
//! statistics, and raises an alert when sustained traffic crosses a
//! configured threshold.

#![forbid(unsafe_code)]

mod generate;
mod watch;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use trafficwatch_core::Config;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "trafficwatch")]
#[command(
    version,
    about = "Watch an HTTP access log: live traffic statistics and high-traffic alerts",
    after_help = "Configuration comes from TRAFFICWATCH_* environment variables;\nsee `trafficwatch config` for the resolved values.\n\nPress q<Enter> (or close stdin) to quit the watch loop."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tail the access log and print statistics and alerts (default)
    Watch {
        /// Access log file to tail (overrides TRAFFICWATCH_LOG_FILE)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Sliding window length in seconds (overrides TRAFFICWATCH_WINDOW_SECS)
        #[arg(long)]
        window_secs: Option<u32>,

        /// Seconds between reports (overrides TRAFFICWATCH_REPORT_INTERVAL_SECS)
        #[arg(long)]
        report_interval_secs: Option<u32>,

        /// Entries per ranking (overrides TRAFFICWATCH_TOP_K)
        #[arg(long)]
        top_k: Option<usize>,

        /// Alert threshold in requests/second (overrides TRAFFICWATCH_ALERT_THRESHOLD_QPS)
        #[arg(long)]
        alert_threshold_qps: Option<u32>,
    },

    /// Write synthetic CLF traffic to a file, for demos and load tests
    Generate {
        /// File to append generated log lines to
        #[arg(long, default_value = "/tmp/access.log")]
        file: PathBuf,

        /// Log lines written per second
        #[arg(long, default_value_t = 100)]
        rate: u32,
    },

    /// Show the resolved configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::from_env();
    let result = match cli.command {
        None => watch::run(config),
        Some(Commands::Watch {
            file,
            window_secs,
            report_interval_secs,
            top_k,
            alert_threshold_qps,
        }) => {
            let mut config = config;
            if let Some(file) = file {
                config.log_file = file;
            }
            if let Some(window_secs) = window_secs {
                config.window_secs = window_secs;
            }
            if let Some(report_interval_secs) = report_interval_secs {
                config.report_interval_secs = report_interval_secs;
            }
            if let Some(top_k) = top_k {
                config.top_k = top_k;
            }
            if let Some(alert_threshold_qps) = alert_threshold_qps {
                config.alert_threshold_qps = alert_threshold_qps;
            }
            watch::run(config)
        }
        Some(Commands::Generate { file, rate }) => generate::run(&file, rate),
        Some(Commands::Config) => {
            print_config(&config);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_config(config: &Config) {
    println!("log file:             {}", config.log_file.display());
    println!("window:               {}s", config.window_secs);
    println!("report interval:      {}s", config.report_interval_secs);
    println!("top-k:                {}", config.top_k);
    println!("alert threshold:      {} req/s", config.alert_threshold_qps);
}
