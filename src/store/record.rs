//! Record parsing using serde_json
//!
//! Each non-blank line of a log file is one JSON object. Records keep the
//! key order of the source line and are shared between pages by reference.

use serde_json::{Map, Value};
use std::sync::Arc;

/// Error type for record parsing
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    /// Physical 1-based line in the source file, when known
    pub line: Option<usize>,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "malformed record at line {}: {}", line, self.message),
            None => write!(f, "malformed record: {}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// One parsed log line: an ordered mapping from field name to JSON value
///
/// Cloning is cheap; the underlying map is immutable and shared.
#[derive(Debug, Clone, PartialEq)]
pub struct Record(Arc<Map<String, Value>>);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(Arc::new(fields))
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn has(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    /// String form of a field, used for sorting and filtering.
    ///
    /// Strings yield their contents, everything else its compact JSON.
    pub fn field_text(&self, column: &str) -> Option<String> {
        self.0.get(column).map(value_text)
    }

    /// Field names in source order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Compact single-line JSON, keys in source order
    pub fn to_json_line(&self) -> String {
        // A Map of Values always serializes
        serde_json::to_string(&*self.0).unwrap_or_default()
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse one line into a record
///
/// Fails when the line is not valid JSON or is valid JSON but not an object.
pub fn parse_record(line: &str, line_number: Option<usize>) -> Result<Record, ParseError> {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(fields)) => Ok(Record::new(fields)),
        Ok(other) => Err(ParseError {
            message: format!("expected a JSON object, found {}", kind_name(&other)),
            line: line_number,
        }),
        Err(e) => Err(ParseError {
            message: e.to_string(),
            line: line_number,
        }),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Union of field names over `records`, in first-seen order
pub fn collect_columns<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for column in record.columns() {
            if !columns.iter().any(|c| c == column) {
                columns.push(column.to_string());
            }
        }
    }
    columns
}
