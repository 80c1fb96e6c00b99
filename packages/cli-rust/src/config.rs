//! Runtime configuration for the `gen-restore` command.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Output format for log events written to stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "gen-restore", version, about = "Convert a JSON database dump into SQL INSERT statements")]
pub struct Args {
    /// Path to the JSON dump.
    #[arg(short, long, env = "DUMPSQL_INPUT")]
    pub input: PathBuf,

    /// Where to write the SQL script. Defaults to stdout.
    #[arg(short, long, env = "DUMPSQL_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Log event format. Levels are controlled with `RUST_LOG`.
    #[arg(long, value_enum, env = "DUMPSQL_LOG_FORMAT", default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Resolved configuration for one conversion run.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// JSON dump to read.
    pub input: PathBuf,
    /// Script destination. `None` writes to stdout.
    pub output: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl CliConfig {
    /// Configuration reading `input` and writing to stdout with text logs.
    #[must_use]
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
            log_format: LogFormat::default(),
        }
    }
}

impl From<Args> for CliConfig {
    fn from(args: Args) -> Self {
        Self {
            input: args.input,
            output: args.output,
            log_format: args.log_format,
        }
    }
}
