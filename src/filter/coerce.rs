use super::error::EvalError;
use super::operator::Operator;
use crate::config::EvaluatorConfig;
use crate::record::FieldType;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

const DATE_TIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M",
    "%Y/%m/%dT%H:%M:%S",
];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Both sides of a leaf after coercion, ready for the operator
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    pub comparison: Value,
    pub field: Value,
}

/// Coerce the comparison value and the stored field value of one leaf
/// according to the field's type.
pub fn coerce(
    field_type: FieldType,
    operator: Operator,
    comparison: &Value,
    field: &Value,
    config: &EvaluatorConfig,
) -> Result<Coerced, EvalError> {
    if operator.is_list()
        && matches!(
            field_type,
            FieldType::Date | FieldType::Time | FieldType::Number
        )
    {
        return Err(EvalError::UnsupportedCombination {
            field_type,
            operator: operator.as_str(),
        });
    }

    Ok(Coerced {
        comparison: coerce_comparison(field_type, operator, comparison)?,
        field: coerce_field(field_type, field, config)?,
    })
}

/// Only Date fields transform the comparison side: every date string becomes
/// whole epoch seconds, element-wise for arrays.
pub fn coerce_comparison(
    field_type: FieldType,
    operator: Operator,
    comparison: &Value,
) -> Result<Value, EvalError> {
    if field_type != FieldType::Date || !operator.compares_values() {
        return Ok(comparison.clone());
    }

    match comparison {
        Value::Array(items) => items
            .iter()
            .map(date_operand)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        scalar => date_operand(scalar),
    }
}

fn date_operand(value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::String(s) if !s.trim().is_empty() => parse_date_seconds(s)
            .map(Value::from)
            .ok_or_else(|| EvalError::InvalidDate { value: s.clone() }),
        other => Ok(other.clone()),
    }
}

/// Parse a calendar date or date-time string into epoch seconds.
///
/// Strings without an explicit offset are read as UTC.
pub fn parse_date_seconds(input: &str) -> Option<i64> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.timestamp());
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt.and_utc().timestamp());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
        }
    }

    None
}

/// Coerce the value held by the record
pub fn coerce_field(
    field_type: FieldType,
    field: &Value,
    config: &EvaluatorConfig,
) -> Result<Value, EvalError> {
    match field_type {
        FieldType::Date => shift_local_epoch(field, config.local_offset_seconds),
        FieldType::Time => Ok(parse_leading_int(field).map_or(Value::Null, Value::from)),
        FieldType::Text
        | FieldType::TextArea
        | FieldType::CompositeText
        | FieldType::SelectList
        | FieldType::CheckList
        | FieldType::Number => Ok(field.clone()),
    }
}

/// Move a stored Date value onto the UTC basis. Values that are not numeric
/// pass through; shifted values must still fit in `i64` seconds.
fn shift_local_epoch(field: &Value, offset: i64) -> Result<Value, EvalError> {
    let seconds: Option<i128> = match field {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_f64().map(|f| f.trunc() as i128)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i128>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i128)
            })
        }
        _ => None,
    };

    let Some(seconds) = seconds else {
        return Ok(field.clone());
    };

    seconds
        .checked_add(i128::from(offset))
        .and_then(|shifted| i64::try_from(shifted).ok())
        .map(Value::from)
        .ok_or_else(|| EvalError::DateOutOfRange {
            value: field.to_string(),
        })
}

/// Leading-integer parse: optional sign followed by digits, the rest ignored
pub fn parse_leading_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim_start();
            let (sign, rest) = match s.as_bytes().first() {
                Some(&b'-') => (-1, &s[1..]),
                Some(&b'+') => (1, &s[1..]),
                _ => (1, s),
            };
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            digits.parse::<i64>().ok().map(|n| sign * n)
        }
        _ => None,
    }
}
