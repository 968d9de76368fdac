use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Kind of a record field. Decides how both sides of a comparison are
/// coerced, never which operators are available.
///
/// Serialized as the integer codes stored alongside field definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FieldType {
    /// Free text (code 0)
    Text,
    /// Multi-line text (code 1)
    TextArea,
    /// Composite text built from several inputs (code 2)
    CompositeText,
    /// Single-select list (code 3)
    SelectList,
    /// Boolean-like list of `{id, checked}` entries (code 4)
    CheckList,
    /// Date stored as local-time epoch seconds (code 5)
    Date,
    /// Time of day or other numeric code, possibly serialized as a string (code 6)
    Time,
    /// Number (code 7)
    Number,
}

impl FieldType {
    pub fn code(self) -> u8 {
        match self {
            FieldType::Text => 0,
            FieldType::TextArea => 1,
            FieldType::CompositeText => 2,
            FieldType::SelectList => 3,
            FieldType::CheckList => 4,
            FieldType::Date => 5,
            FieldType::Time => 6,
            FieldType::Number => 7,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::TextArea => "textarea",
            FieldType::CompositeText => "composite-text",
            FieldType::SelectList => "select-list",
            FieldType::CheckList => "check-list",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::Number => "number",
        }
    }
}

impl TryFrom<u8> for FieldType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(FieldType::Text),
            1 => Ok(FieldType::TextArea),
            2 => Ok(FieldType::CompositeText),
            3 => Ok(FieldType::SelectList),
            4 => Ok(FieldType::CheckList),
            5 => Ok(FieldType::Date),
            6 => Ok(FieldType::Time),
            7 => Ok(FieldType::Number),
            other => Err(format!("unknown field type code {other}, expected 0..=7")),
        }
    }
}

impl From<FieldType> for u8 {
    fn from(field_type: FieldType) -> Self {
        field_type.code()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

/// A typed value held by the record under test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEntry {
    pub field_type: FieldType,
    #[serde(default)]
    pub field_value: Value,
}

impl FieldEntry {
    pub fn new(field_type: FieldType, field_value: impl Into<Value>) -> Self {
        Self {
            field_type,
            field_value: field_value.into(),
        }
    }
}

/// Field key to typed value mapping a filter tree is evaluated against.
///
/// Assembled by the caller from whichever tables the tree references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldRecord {
    fields: HashMap<String, FieldEntry>,
}

impl FieldRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, entry: FieldEntry) -> Self {
        self.insert(key, entry);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: FieldEntry) {
        self.fields.insert(key.into(), entry);
    }

    /// Look up a field by key. Dotted keys (`Table.column`) resolve by their
    /// final path segment.
    pub fn lookup(&self, key: &str) -> Option<&FieldEntry> {
        self.fields.get(lookup_key(key))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, FieldEntry)> for FieldRecord {
    fn from_iter<I: IntoIterator<Item = (K, FieldEntry)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Final segment of a possibly dotted field key
pub fn lookup_key(key: &str) -> &str {
    key.rsplit('.').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_type_codes_round_trip_through_u8() {
        for code in 0u8..=7 {
            let field_type = FieldType::try_from(code).unwrap();
            assert_eq!(field_type.code(), code);
        }
        assert!(FieldType::try_from(8).is_err());
    }

    #[test]
    fn test_record_deserializes_from_caller_json() {
        let record: FieldRecord = serde_json::from_value(json!({
            "age": {"fieldType": 7, "fieldValue": 25},
            "city": {"fieldType": 0, "fieldValue": "Tokyo"}
        }))
        .unwrap();

        assert_eq!(record.len(), 2);
        assert_eq!(record.lookup("age").unwrap().field_type, FieldType::Number);
        assert_eq!(record.lookup("city").unwrap().field_value, json!("Tokyo"));
    }

    #[test]
    fn test_unknown_field_type_code_is_rejected() {
        let result: Result<FieldRecord, _> =
            serde_json::from_value(json!({"x": {"fieldType": 12, "fieldValue": 1}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_dotted_key_resolves_by_last_segment() {
        let record = FieldRecord::new().with("name", FieldEntry::new(FieldType::Text, "a"));
        assert!(record.lookup("Customer.name").is_some());
        assert!(record.lookup("db.Customer.name").is_some());
        assert!(record.lookup("Customer.email").is_none());
        assert_eq!(lookup_key("plain"), "plain");
    }

    #[test]
    fn test_missing_field_value_defaults_to_null() {
        let record: FieldRecord =
            serde_json::from_value(json!({"memo": {"fieldType": 1}})).unwrap();
        assert_eq!(record.lookup("memo").unwrap().field_value, Value::Null);
    }
}
