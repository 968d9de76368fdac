use super::coerce::{coerce, coerce_field};
use super::error::EvalError;
use super::loose::{
    is_truthy, length_of, loose_eq, loose_ge, loose_gt, loose_le, loose_lt, strict_eq, to_number,
    to_text,
};
use super::operator::{Operator, RegexClass};
use super::parser::Leaf;
use crate::config::EvaluatorConfig;
use crate::record::FieldRecord;
use log::trace;
use serde_json::Value;

/// Decides a single leaf against a record.
///
/// The evaluator calls this once per leaf it visits; replacing it lets
/// callers observe or override leaf verdicts without touching the tree walk.
pub trait LeafMatcher {
    fn matches(
        &self,
        leaf: &Leaf,
        record: &FieldRecord,
        config: &EvaluatorConfig,
    ) -> Result<bool, EvalError>;
}

/// Coerces both sides by field type, then applies the leaf's operator
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardMatcher;

impl LeafMatcher for StandardMatcher {
    fn matches(
        &self,
        leaf: &Leaf,
        record: &FieldRecord,
        config: &EvaluatorConfig,
    ) -> Result<bool, EvalError> {
        let entry = record
            .lookup(&leaf.field_key)
            .ok_or_else(|| EvalError::UnresolvedReference {
                key: leaf.field_key.clone(),
            })?;

        let coerced = coerce(
            entry.field_type,
            leaf.operator,
            &leaf.comparison,
            &entry.field_value,
            config,
        )?;
        trace!(
            "{} {}: field {} vs comparison {}",
            leaf.field_key, leaf.operator, coerced.field, coerced.comparison
        );

        let scope = MatchScope {
            field_key: &leaf.field_key,
            record,
            config,
        };
        match_operator(leaf.operator, &coerced.comparison, &coerced.field, &scope)
    }
}

/// What an operator may consult besides its two operands
#[derive(Debug, Clone, Copy)]
pub struct MatchScope<'a> {
    pub field_key: &'a str,
    pub record: &'a FieldRecord,
    pub config: &'a EvaluatorConfig,
}

/// Apply an operator to coerced operands.
///
/// An array comparison is a set of alternatives unless the operator reads it
/// as a single operand (`between`, `regex`, blank checks): positive operators
/// hold if any alternative matches, negated ones only if all do.
pub fn match_operator(
    operator: Operator,
    comparison: &Value,
    field: &Value,
    scope: &MatchScope<'_>,
) -> Result<bool, EvalError> {
    let alternatives = match comparison {
        Value::Array(items) if !operator.takes_whole_comparison() => items,
        _ => return match_single(operator, comparison, field, scope),
    };

    if operator.is_negated() {
        for item in alternatives {
            if !match_single(operator, item, field, scope)? {
                return Ok(false);
            }
        }
        Ok(true)
    } else {
        for item in alternatives {
            if match_single(operator, item, field, scope)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn match_single(
    operator: Operator,
    comparison: &Value,
    field: &Value,
    scope: &MatchScope<'_>,
) -> Result<bool, EvalError> {
    let matched = match operator {
        Operator::Eq => loose_eq(field, comparison),
        Operator::NotEq => !loose_eq(field, comparison),
        Operator::Lt => is_truthy(field) && loose_lt(field, comparison),
        Operator::Le => is_truthy(field) && loose_le(field, comparison),
        Operator::Gt => is_truthy(field) && loose_gt(field, comparison),
        Operator::Ge => is_truthy(field) && loose_ge(field, comparison),
        Operator::IsBlank => is_blank(field),
        Operator::IsNotBlank => !is_blank(field),
        Operator::Contains => contains(field, comparison),
        Operator::NotContains => !contains(field, comparison),
        Operator::StartsWith => to_text(field).starts_with(&*to_text(comparison)),
        Operator::EndsWith => to_text(field).ends_with(&*to_text(comparison)),
        Operator::Between => between(field, comparison)?,
        Operator::MinLength => {
            is_truthy(field) && length_of(field) as f64 >= to_number(comparison)
        }
        Operator::MaxLength => {
            is_truthy(field) && length_of(field) as f64 <= to_number(comparison)
        }
        Operator::Same => same_as(field, comparison, scope)?,
        Operator::NotSame => !same_as(field, comparison, scope)?,
        Operator::ListInclude => list_includes(field, comparison, scope.field_key)?,
        Operator::ListNotInclude => !list_includes(field, comparison, scope.field_key)?,
        Operator::Regex => {
            let id = to_text(comparison);
            let class: RegexClass = id.parse().map_err(|id| EvalError::UnknownRegexClass { id })?;
            class.is_match(&to_text(field))
        }
    };
    Ok(matched)
}

fn is_blank(field: &Value) -> bool {
    loose_eq(field, &Value::String(String::new()))
}

fn contains(field: &Value, needle: &Value) -> bool {
    match field {
        Value::Array(items) => items.iter().any(|item| strict_eq(item, needle)),
        other => to_text(other).contains(&*to_text(needle)),
    }
}

/// Bounds are `[upper, lower]`, in that order.
fn between(field: &Value, bounds: &Value) -> Result<bool, EvalError> {
    match bounds {
        Value::Array(pair) if pair.len() == 2 => {
            Ok(loose_le(field, &pair[0]) && loose_ge(field, &pair[1]))
        }
        _ => Err(EvalError::InvalidBetweenBounds),
    }
}

fn same_as(field: &Value, other_key: &Value, scope: &MatchScope<'_>) -> Result<bool, EvalError> {
    let key = to_text(other_key);
    let other = scope
        .record
        .lookup(&key)
        .ok_or_else(|| EvalError::UnresolvedReference {
            key: key.to_string(),
        })?;
    let other_value = coerce_field(other.field_type, &other.field_value, scope.config)?;
    Ok(loose_eq(field, &other_value))
}

fn list_includes(field: &Value, id: &Value, field_key: &str) -> Result<bool, EvalError> {
    match field {
        Value::Null => Ok(false),
        Value::Array(entries) => Ok(entries.iter().any(|entry| {
            entry.get("id").is_some_and(|entry_id| loose_eq(entry_id, id))
                && entry.get("checked").is_some_and(is_truthy)
        })),
        _ => Err(EvalError::ListExpected {
            key: field_key.to_string(),
        }),
    }
}
