use crate::record::FieldType;
use thiserror::Error;

/// Errors that can occur when decoding a stored filter tree
///
/// `path` points at the offending node using `$` for the root and `[n]` for
/// array positions, e.g. `$[2][1]`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("{path}: expected a leaf or group array, got {found}")]
    MalformedNode { path: String, found: String },

    #[error("{path}: nested group is empty")]
    EmptyGroup { path: String },

    #[error("{path}: connective '{token}' must sit between two nodes")]
    MisplacedConnective { path: String, token: String },

    #[error("{path}: expected 'and' or 'or', got {found}")]
    ExpectedConnective { path: String, found: String },

    #[error("{path}: group ends with connective '{token}'")]
    TrailingConnective { path: String, token: String },

    #[error("{path}: field key must be a non-empty string, got {found}")]
    InvalidFieldKey { path: String, found: String },

    #[error(
        "{path}: unknown operator '{operator}'. Valid operators are: =, <>, <, <=, >, >=, isblank, isnotblank, contains, notcontains, startswith, endswith, between, minlength, maxlength, same, notsame, listinclude, listnotinclude, regex"
    )]
    UnknownOperator { path: String, operator: String },

    #[error("{path}: unknown regex class {id}")]
    UnknownRegexClass { path: String, id: String },

    #[error("{path}: 'between' needs a two element [upper, lower] array, got {found}")]
    InvalidBetweenBounds { path: String, found: String },

    #[error("{path}: group nesting exceeds the maximum depth of {max}")]
    TooDeep { path: String, max: usize },
}

/// Errors that abort evaluation of a whole filter tree
///
/// None of these mean "the condition is false"; callers must treat them as
/// "the filter cannot be evaluated".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("field '{key}' is referenced by the filter but missing from the record")]
    UnresolvedReference { key: String },

    #[error("operator '{operator}' is not supported on {field_type} fields")]
    UnsupportedCombination {
        field_type: FieldType,
        operator: &'static str,
    },

    #[error("'{value}' is not a recognised date")]
    InvalidDate { value: String },

    #[error("stored date {value} is outside the representable range")]
    DateOutOfRange { value: String },

    #[error("unknown regex class {id}")]
    UnknownRegexClass { id: String },

    #[error("'between' needs a two element [upper, lower] array")]
    InvalidBetweenBounds,

    #[error("field '{key}' must hold a list of {{id, checked}} entries for list operators")]
    ListExpected { key: String },

    #[error("filter nesting exceeds the maximum depth of {max}")]
    DepthExceeded { max: usize },
}

impl EvalError {
    /// True for errors caused by how the filter was configured, as opposed
    /// to a record that lacks a referenced field.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, EvalError::UnresolvedReference { .. })
    }
}

/// Either stage failing in a decode-then-evaluate call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("Invalid filter: {0}")]
    Decode(#[from] DecodeError),

    #[error("Filter cannot be evaluated: {0}")]
    Eval(#[from] EvalError),
}
