//! CLI tool that trims a fixed number of bytes from every line of stdin.
//!
//! Usage:
//!   linecut -leadingbytes 4 < input.log
//!   linecut -outfile trimmed.log -leadingbytes 4 -trailingbytes 80 < input.log
//!
//! Output goes to stdout unless `-outfile` names a file. Diagnostics are
//! logged to stderr.

use linecut::cli::{Cli, LogFormat};
use linecut::{Controller, InterruptListener, OutputTarget, RunOutcome};
use std::io::{self, BufReader};
use std::process;
use tracing::level_filters::LevelFilter;
use tracing::{Level, error};
use tracing_subscriber::EnvFilter;

const INPUT_BUFFER_CAPACITY: usize = 64 * 1024;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_normalized();
    setup_logging(cli.log_level(), cli.log_format);

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let listener = match InterruptListener::install() {
        Ok(listener) => listener,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let target = match OutputTarget::open(config.output()) {
        Ok(target) => target,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let input = BufReader::with_capacity(INPUT_BUFFER_CAPACITY, io::stdin());
    let mut controller = Controller::new(config);
    match controller.run(input, target, listener).await {
        Ok(report) if report.outcome != RunOutcome::Completed => {
            // A stage thread may still be parked on stdin or stdout; don't wait for it.
            process::exit(report.outcome.exit_code());
        }
        Ok(_) => {}
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }
}

fn setup_logging(level: Level, format: LogFormat) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);

    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }
}
