//! SQL literal encoding for dumped values.
//!
//! Quoting is limited to doubling single quotes. The input is a trusted,
//! self-produced export, so no further sanitising is done.

use crate::types::Value;

/// Literal for SQL `NULL`.
pub const NULL_LITERAL: &str = "NULL";

/// Literal for an empty `text[]`, used for empty or non-list array columns.
pub const EMPTY_TEXT_ARRAY: &str = "'{}'::text[]";

/// Encodes one value as a SQL literal.
///
/// `text_array` marks a column stored as `text[]`; it overrides the generic
/// number/array/object handling but never null or boolean.
#[must_use]
pub fn encode_value(value: &Value, text_array: bool) -> String {
    match value {
        Value::Null => NULL_LITERAL.to_string(),
        Value::Bool(b) => b.to_string(),
        _ if text_array => encode_text_array(value),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => encode_jsonb(value),
        Value::String(s) => quote_text(s),
    }
}

/// `ARRAY['a', 'b']`, or [`EMPTY_TEXT_ARRAY`] for anything but a non-empty list.
fn encode_text_array(value: &Value) -> String {
    match value {
        Value::Array(items) if !items.is_empty() => {
            let elements: Vec<String> = items
                .iter()
                .map(|item| format!("'{}'", double_quotes(&element_text(item))))
                .collect();
            format!("ARRAY[{}]", elements.join(", "))
        }
        _ => EMPTY_TEXT_ARRAY.to_string(),
    }
}

/// Plain-text form of one `text[]` element.
fn element_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => NULL_LITERAL.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => serde_json::Value::from(value).to_string(),
    }
}

fn encode_jsonb(value: &Value) -> String {
    let json = serde_json::Value::from(value).to_string();
    format!("'{}'::jsonb", double_quotes(&json))
}

/// Single-quoted string literal with LF and CR written as `\n` and `\r`.
fn quote_text(s: &str) -> String {
    let escaped = double_quotes(s).replace('\n', "\\n").replace('\r', "\\r");
    format!("'{escaped}'")
}

fn double_quotes(s: &str) -> String {
    s.replace('\'', "''")
}
