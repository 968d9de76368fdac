//! Loosely typed comparison of JSON values
//!
//! Stored filters were written against dynamically typed records, so `"30"`
//! must compare equal to `30` and `"10" < 9` must compare numerically. These
//! helpers implement that abstract equality / relational comparison on
//! `serde_json::Value`.

use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
enum Primitive<'a> {
    Null,
    Bool(bool),
    Number(f64),
    Text(Cow<'a, str>),
}

fn to_primitive(value: &Value) -> Primitive<'_> {
    match value {
        Value::Null => Primitive::Null,
        Value::Bool(b) => Primitive::Bool(*b),
        Value::Number(n) => Primitive::Number(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => Primitive::Text(Cow::Borrowed(s)),
        Value::Array(_) | Value::Object(_) => Primitive::Text(Cow::Owned(to_display_string(value))),
    }
}

fn text_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        // Rust accepts "inf"/"nan" spellings that are not numeric text
        Ok(n) if trimmed.bytes().any(|b| b.is_ascii_digit()) => n,
        _ => f64::NAN,
    }
}

fn primitive_to_number(p: &Primitive<'_>) -> f64 {
    match p {
        Primitive::Null => 0.0,
        Primitive::Bool(b) => f64::from(u8::from(*b)),
        Primitive::Number(n) => *n,
        Primitive::Text(s) => text_to_number(s),
    }
}

/// Numeric reading of a value; `NaN` when it has none
pub fn to_number(value: &Value) -> f64 {
    primitive_to_number(&to_primitive(value))
}

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let label = if n > 0.0 { "Infinity" } else { "-Infinity" };
        label.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

/// String form of a value, arrays joined with `,`
pub fn to_display_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_display_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Text operand for string operators; null reads as empty
pub fn to_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(to_display_string(other)),
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn primitives_eq(a: &Primitive<'_>, b: &Primitive<'_>) -> bool {
    match (a, b) {
        (Primitive::Null, Primitive::Null) => true,
        (Primitive::Null, _) | (_, Primitive::Null) => false,
        (Primitive::Text(x), Primitive::Text(y)) => x == y,
        (Primitive::Bool(x), Primitive::Bool(y)) => x == y,
        _ => primitive_to_number(a) == primitive_to_number(b),
    }
}

/// Abstract equality: numbers and numeric text compare by value, booleans
/// compare as 0/1, null only equals null. Arrays and objects compare
/// structurally with each other and by string form against scalars.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(_), Value::Array(_))
        | (Value::Object(_), Value::Object(_))
        | (Value::Array(_), Value::Object(_))
        | (Value::Object(_), Value::Array(_)) => a == b,
        _ => primitives_eq(&to_primitive(a), &to_primitive(b)),
    }
}

/// Relational comparison; `None` when the operands are unordered (NaN)
pub fn loose_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    let (pa, pb) = (to_primitive(a), to_primitive(b));
    if let (Primitive::Text(x), Primitive::Text(y)) = (&pa, &pb) {
        return Some(x.encode_utf16().cmp(y.encode_utf16()));
    }
    primitive_to_number(&pa).partial_cmp(&primitive_to_number(&pb))
}

pub fn loose_lt(a: &Value, b: &Value) -> bool {
    loose_cmp(a, b) == Some(Ordering::Less)
}

pub fn loose_le(a: &Value, b: &Value) -> bool {
    matches!(loose_cmp(a, b), Some(Ordering::Less | Ordering::Equal))
}

pub fn loose_gt(a: &Value, b: &Value) -> bool {
    loose_cmp(a, b) == Some(Ordering::Greater)
}

pub fn loose_ge(a: &Value, b: &Value) -> bool {
    matches!(loose_cmp(a, b), Some(Ordering::Greater | Ordering::Equal))
}

/// Identity used for array membership: same kind and same value
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Length in UTF-16 code units for text, element count for arrays
pub fn length_of(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        other => to_text(other).encode_utf16().count(),
    }
}
