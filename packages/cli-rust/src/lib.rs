//! dumpsql command line: configuration, logging and the conversion run.

pub mod config;
pub mod logging;
pub mod run;

pub use config::{Args, CliConfig, LogFormat};
pub use logging::init_logging;
pub use run::{run, run_with_catalog};
