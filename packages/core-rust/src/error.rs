use std::io;
use std::path::PathBuf;

/// Errors that abort a conversion run.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed dump: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{entity} row {row} has `{field}` line items but no `{parent_key}`")]
    MissingParentKey {
        entity: &'static str,
        field: &'static str,
        parent_key: &'static str,
        row: usize,
    },
    #[error("failed to write script: {0}")]
    Write(#[source] io::Error),
}
