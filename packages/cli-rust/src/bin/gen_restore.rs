//! `gen-restore`: converts a JSON database dump into an SQL restore script.

use clap::Parser;
use dumpsql_cli::{init_logging, run, Args, CliConfig};

fn main() -> anyhow::Result<()> {
    let config = CliConfig::from(Args::parse());
    init_logging(config.log_format)?;
    run(&config)?;
    Ok(())
}
