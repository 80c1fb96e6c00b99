//! Dump reader: loads the whole JSON export into memory.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use crate::error::ConvertError;
use crate::types::Row;

/// Root of a JSON database export.
///
/// Only `tables` is read; any other top-level field (export metadata and the
/// like) is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "RawDump")]
pub struct Dump {
    /// Exported tables as `(dump key, export)` pairs, in document order.
    pub tables: Vec<(String, TableExport)>,
}

/// Wire shape of a dump; `serde_json::Map` keeps the key order.
#[derive(Deserialize)]
struct RawDump {
    tables: serde_json::Map<String, serde_json::Value>,
}

impl TryFrom<RawDump> for Dump {
    type Error = serde_json::Error;

    fn try_from(raw: RawDump) -> Result<Self, Self::Error> {
        let mut tables = Vec::with_capacity(raw.tables.len());
        for (key, table) in raw.tables {
            tables.push((key, serde_json::from_value(table)?));
        }
        Ok(Self { tables })
    }
}

/// Rows exported for one table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableExport {
    #[serde(default)]
    data: Option<Vec<Row>>,
}

impl TableExport {
    /// Rows in export order. A missing or `null` `data` field reads as empty.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        self.data.as_deref().unwrap_or_default()
    }
}

impl Dump {
    /// Parses a dump from any reader.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Parse`] if the input is not JSON or lacks the
    /// `tables` mapping.
    pub fn from_reader(reader: impl Read) -> Result<Self, ConvertError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Parses a dump held in memory.
    ///
    /// # Errors
    ///
    /// Same as [`Dump::from_reader`].
    pub fn from_json(json: &str) -> Result<Self, ConvertError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Opens and parses the dump at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Io`] if the file cannot be opened, otherwise
    /// the errors of [`Dump::from_reader`].
    pub fn from_path(path: &Path) -> Result<Self, ConvertError> {
        let file = File::open(path).map_err(|source| ConvertError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    #[must_use]
    pub fn table(&self, dump_key: &str) -> Option<&TableExport> {
        self.tables
            .iter()
            .find(|(key, _)| key == dump_key)
            .map(|(_, table)| table)
    }

    /// Dump keys in document order.
    pub fn table_keys(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|(key, _)| key.as_str())
    }
}
