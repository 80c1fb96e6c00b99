//! dumpsql core: turns a JSON database export into a flat script of SQL
//! `INSERT` statements for a fixed relational catalog.
//!
//! The pipeline is a single forward pass: [`Dump`] → [`convert`] (schema
//! filter, value encoder and statement emitter fused per row) →
//! [`write_script`].

pub mod dump;
pub mod emit;
pub mod encode;
pub mod error;
pub mod schema;
pub mod types;
pub mod writer;

pub use dump::{Dump, TableExport};
pub use emit::{convert, Conversion, ConvertReport, Emitter, Statement};
pub use encode::encode_value;
pub use error::ConvertError;
pub use schema::{Catalog, EntitySchema, LineItemRelation, TableBinding, ValidationResult};
pub use types::{Row, Value};
pub use writer::{write_script, write_script_to_path};
