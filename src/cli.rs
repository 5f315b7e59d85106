//! Command-line interface.
//!
//! Flags keep their historical single-dash spelling (`-outfile out.txt`,
//! `-leadingbytes=4`); [`normalize_args`] rewrites those into the
//! double-dash form before clap sees them.

use crate::config::{Configuration, DEFAULT_MAX_LINE_BYTES, InterruptPolicy};
use crate::error::CutError;
use crate::sink::OutputDestination;
use crate::trim::{ByteTrim, EndBoundary, OverflowPolicy};
use clap::{CommandFactory, Parser, ValueEnum};
use std::ffi::OsString;
use tracing::Level;

/// Trim a fixed number of bytes from every line of standard input.
#[derive(Parser, Debug)]
#[command(name = "linecut", version)]
pub struct Cli {
    /// Output destination; `-` writes to standard output
    #[arg(long, default_value = "-")]
    pub outfile: String,

    /// Write a profile capture (JSON) to this path; empty disables it
    #[arg(long, default_value = "")]
    pub cpuprofile: String,

    /// Number of bytes to strip from the start of each line
    #[arg(long, default_value_t = 0)]
    pub leadingbytes: usize,

    /// Byte offset where each line ends; 0 keeps the line to its end
    #[arg(long, default_value_t = 0)]
    pub trailingbytes: usize,

    /// Measure -trailingbytes from the line start or from after the leading trim
    #[arg(long, value_enum, default_value_t = EndBoundary::Line)]
    pub trailing_from: EndBoundary,

    /// What to do with lines too short for the offsets
    #[arg(long, value_enum, default_value_t = OverflowPolicy::Clamp)]
    pub on_overflow: OverflowPolicy,

    /// What to do on SIGINT/SIGTERM
    #[arg(long, value_enum, default_value_t = InterruptPolicy::Drain)]
    pub on_interrupt: InterruptPolicy,

    /// Longest accepted input line in bytes; a longer line ends the input
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_BYTES)]
    pub max_line_bytes: usize,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Cli {
    /// Parse the process arguments, accepting single-dash long flags.
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    pub fn into_config(self) -> Result<Configuration, CutError> {
        let trim = ByteTrim::new(self.leadingbytes, self.trailingbytes)
            .with_boundary(self.trailing_from)
            .with_policy(self.on_overflow);
        let output = OutputDestination::parse(&self.outfile)?;

        let mut config = Configuration::new(trim, output)
            .with_interrupt_policy(self.on_interrupt)
            .with_max_line_bytes(self.max_line_bytes)?;
        if !self.cpuprofile.is_empty() {
            config = config.with_cpu_profile(self.cpuprofile);
        }
        Ok(config)
    }

    pub fn log_level(&self) -> Level {
        if self.verbose {
            return Level::DEBUG;
        }
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "error" => Level::ERROR,
            _ => Level::WARN,
        }
    }
}

/// Rewrite `-name` / `-name=value` into `--name` / `--name=value` for every
/// long flag `Cli` knows. Short flags, values and everything after `--` are
/// left alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let command = Cli::command();
    let longs: Vec<&str> = command.get_arguments().filter_map(|a| a.get_long()).collect();

    let mut out = Vec::new();
    let mut passthrough = false;
    for (i, arg) in args.into_iter().enumerate() {
        let arg: OsString = arg.into();
        if i == 0 || passthrough {
            out.push(arg);
            continue;
        }
        let Some(s) = arg.to_str() else {
            out.push(arg);
            continue;
        };
        if s == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }

        let rewritten = s
            .strip_prefix('-')
            .filter(|rest| !rest.starts_with('-'))
            .filter(|rest| {
                let name = rest.split_once('=').map_or(*rest, |(name, _)| name);
                // `version` and `help` are generated by clap and not listed.
                longs.contains(&name) || name == "help" || name == "version"
            })
            .map(|rest| OsString::from(format!("--{rest}")));
        out.push(rewritten.unwrap_or(arg));
    }
    out
}
