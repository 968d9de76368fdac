use crate::filter::{DecodeError, FilterNode};
use crate::record::FieldRecord;
use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Deepest array/object nesting accepted in an input file
pub const MAX_INPUT_NESTING: usize = 128;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse '{path}': {message}")]
    Parse { path: String, message: String },
    #[error("Invalid filter in '{path}': {source}")]
    Filter {
        path: String,
        #[source]
        source: DecodeError,
    },
    #[error("Invalid record in '{path}' (entry {index}): {message}")]
    Record {
        path: String,
        index: usize,
        message: String,
    },
}

fn read_text(path: &Path) -> Result<String, InputError> {
    fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Deepest array/object nesting in JSON or JSON5 text. Brackets inside
/// strings and comments are ignored.
fn nesting_depth(raw: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                while let Some(inner) = chars.next() {
                    match inner {
                        '\\' => {
                            chars.next();
                        }
                        inner if inner == c => break,
                        _ => {}
                    }
                }
            }
            '/' if chars.peek() == Some(&'/') => {
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                for inner in chars.by_ref() {
                    if prev == '*' && inner == '/' {
                        break;
                    }
                    prev = inner;
                }
            }
            '[' | '{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    deepest
}

/// Parse JSON, falling back to JSON5 for hand-edited files with comments
/// or trailing commas
fn parse_lenient(raw: &str, path: &Path) -> Result<Value, InputError> {
    let nesting = nesting_depth(raw);
    if nesting > MAX_INPUT_NESTING {
        return Err(InputError::Parse {
            path: path.display().to_string(),
            message: format!(
                "nesting depth {nesting} exceeds the limit of {MAX_INPUT_NESTING}"
            ),
        });
    }

    serde_json::from_str::<Value>(raw)
        .or_else(|_| json5::from_str::<Value>(raw))
        .map_err(|e| InputError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

fn to_record(value: Value, path: &Path, index: usize) -> Result<FieldRecord, InputError> {
    serde_json::from_value(value).map_err(|e| InputError::Record {
        path: path.display().to_string(),
        index,
        message: e.to_string(),
    })
}

/// Read and decode a stored filter tree, rejecting group nesting deeper
/// than `max_depth`
pub fn read_filter(path: &Path, max_depth: usize) -> Result<FilterNode, InputError> {
    let raw = parse_lenient(&read_text(path)?, path)?;
    FilterNode::decode_with_max_depth(&raw, max_depth).map_err(|source| InputError::Filter {
        path: path.display().to_string(),
        source,
    })
}

/// Read a single record object
pub fn read_record(path: &Path) -> Result<FieldRecord, InputError> {
    let raw = parse_lenient(&read_text(path)?, path)?;
    to_record(raw, path, 0)
}

/// Read candidate records from a JSON array or from JSON lines
pub fn read_records(path: &Path) -> Result<Vec<FieldRecord>, InputError> {
    let text = read_text(path)?;
    parse_records(&text, path)
}

/// A JSON or JSON5 array of records, otherwise one JSON record per line
pub fn parse_records(text: &str, path: &Path) -> Result<Vec<FieldRecord>, InputError> {
    match parse_lenient(text, path) {
        Ok(Value::Array(items)) => {
            return items
                .into_iter()
                .enumerate()
                .map(|(index, item)| to_record(item, path, index))
                .collect();
        }
        Ok(record @ Value::Object(_)) => return Ok(vec![to_record(record, path, 0)?]),
        Err(e) if text.trim_start().starts_with('[') => return Err(e),
        _ => {}
    }

    text.lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(index, line)| {
            let value: Value = serde_json::from_str(line).map_err(|e| InputError::Record {
                path: path.display().to_string(),
                index,
                message: e.to_string(),
            })?;
            to_record(value, path, index)
        })
        .collect()
}
