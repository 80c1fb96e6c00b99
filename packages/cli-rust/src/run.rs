//! One conversion run: read the dump, convert, write the script.

use std::io;

use anyhow::Context;
use dumpsql_core::{
    convert, write_script, write_script_to_path, Catalog, ConvertReport, Dump, ValidationResult,
};
use tracing::info;

use crate::config::CliConfig;

/// Runs the conversion described by `config` against the built-in catalog.
///
/// # Errors
///
/// Any read, parse, conversion or write failure aborts the run.
pub fn run(config: &CliConfig) -> anyhow::Result<ConvertReport> {
    run_with_catalog(config, &Catalog::builtin())
}

/// Like [`run`], with an explicit catalog.
///
/// # Errors
///
/// An inconsistent catalog, or any read, parse, conversion or write
/// failure, aborts the run.
pub fn run_with_catalog(config: &CliConfig, catalog: &Catalog) -> anyhow::Result<ConvertReport> {
    if let ValidationResult::Invalid { errors } = catalog.validate() {
        anyhow::bail!("Invalid catalog: {}", errors.join("; "));
    }

    let dump = Dump::from_path(&config.input)
        .with_context(|| format!("Failed to load dump {}", config.input.display()))?;
    info!(input = %config.input.display(), tables = dump.tables.len(), "Dump loaded");

    let conversion = convert(&dump, catalog).context("Failed to convert dump")?;

    match &config.output {
        Some(path) => {
            write_script_to_path(&conversion.statements, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => {
            write_script(&conversion.statements, io::stdout().lock())
                .context("Failed to write script to stdout")?;
        }
    }

    let report = conversion.report;
    info!(
        statements = report.statements,
        tables = report.tables_converted.len(),
        skipped_tables = report.tables_skipped.len(),
        dropped_fields = report.total_fields_dropped(),
        empty_rows = report.rows_without_columns,
        skipped_line_items = report.line_items_skipped,
        "Restore script written"
    );
    Ok(report)
}
