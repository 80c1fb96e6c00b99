//! Script writer: one statement per line, nothing else.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::emit::Statement;
use crate::error::ConvertError;

/// Writes `statements` to `out`, each on its own `\n`-terminated line.
///
/// # Errors
///
/// Returns [`ConvertError::Write`] if the underlying writer fails.
pub fn write_script<W: Write>(statements: &[Statement], mut out: W) -> Result<(), ConvertError> {
    for statement in statements {
        writeln!(out, "{statement}").map_err(ConvertError::Write)?;
    }
    out.flush().map_err(ConvertError::Write)
}

/// Creates (or truncates) the file at `path` and writes the script to it.
///
/// # Errors
///
/// Returns [`ConvertError::Io`] if the file cannot be created, otherwise
/// the errors of [`write_script`].
pub fn write_script_to_path(statements: &[Statement], path: &Path) -> Result<(), ConvertError> {
    let file = File::create(path).map_err(|source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_script(statements, BufWriter::new(file))
}
