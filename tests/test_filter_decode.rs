use record_filter::filter::{DecodeError, FilterNode, Operator};
use serde::Deserialize;
use serde_json::json;

/// A stored filter definition row, as a listing handler would load it
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterRow {
    filter_id: u64,
    condition: FilterNode,
}

#[test]
fn test_filter_deserializes_from_stored_row() {
    let row: FilterRow = serde_json::from_value(json!({
        "filterId": 12,
        "condition": [["Slot.capacity", ">", 0], "and", [["Slot.kind", "=", "A"], "or", ["Slot.kind", "=", "B"]]]
    }))
    .expect("row should deserialize");

    assert_eq!(row.filter_id, 12);
    assert_eq!(row.condition.leaf_count(), 3);
    assert_eq!(row.condition.depth(), 2);
    assert_eq!(
        row.condition.field_keys().into_iter().collect::<Vec<_>>(),
        vec!["capacity", "kind"]
    );
}

#[test]
fn test_malformed_stored_row_is_rejected_with_path() {
    let result: Result<FilterRow, _> = serde_json::from_value(json!({
        "filterId": 1,
        "condition": [["a", "=", 1], "and", [["b", "=", 2], "nor", ["c", "=", 3]]]
    }));
    let message = result.err().expect("should fail").to_string();
    assert!(message.contains("$[2][1]"), "unexpected message: {message}");
}

#[test]
fn test_leaf_with_connective_operator_is_not_a_leaf() {
    let err = FilterNode::decode(&json!(["a", "and", "b"])).unwrap_err();
    assert!(matches!(err, DecodeError::MalformedNode { ref path, .. } if path == "$[0]"));
}

#[test]
fn test_each_operator_decodes() {
    let cases = [
        (json!(["f", "=", 1]), Operator::Eq),
        (json!(["f", "<>", 1]), Operator::NotEq),
        (json!(["f", "<=", 1]), Operator::Le),
        (json!(["f", "isnotblank", ""]), Operator::IsNotBlank),
        (json!(["f", "endswith", "x"]), Operator::EndsWith),
        (json!(["f", "between", [2, 1]]), Operator::Between),
        (json!(["f", "maxlength", 10]), Operator::MaxLength),
        (json!(["f", "notsame", "g"]), Operator::NotSame),
        (json!(["f", "listnotinclude", 3]), Operator::ListNotInclude),
        (json!(["f", "regex", "email"]), Operator::Regex),
    ];
    for (raw, expected) in cases {
        match FilterNode::decode(&raw) {
            Ok(FilterNode::Leaf(leaf)) => assert_eq!(leaf.operator, expected),
            other => panic!("{raw} decoded to {other:?}"),
        }
    }
}

#[test]
fn test_error_messages_are_descriptive() {
    let err = FilterNode::decode(&json!([["a", "~", 1]])).unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("$[0][1]: unknown operator '~'"), "{message}");

    let err = FilterNode::decode(&json!([["a", "=", 1], "and", "b"])).unwrap_err();
    assert_eq!(
        err.to_string(),
        "$[2]: expected a leaf or group array, got string \"b\""
    );
}
