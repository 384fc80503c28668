//! JSON export of text elements.

use serde::Serialize;

use crate::error::Result;
use crate::model::TextElement;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize a value in the given format.
pub fn write_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value)?,
        JsonFormat::Compact => serde_json::to_string(value)?,
    };
    Ok(json)
}

/// Convert text elements to a JSON array.
pub fn to_json(elements: &[TextElement], format: JsonFormat) -> Result<String> {
    write_json(elements, format)
}
