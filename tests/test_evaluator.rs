use record_filter::config::EvaluatorConfig;
use record_filter::filter::{
    EvalError, Evaluator, FilterError, FilterNode, Leaf, LeafMatcher, StandardMatcher,
};
use record_filter::{FieldEntry, FieldRecord, FieldType, evaluate};
use serde_json::{Value, json};
use std::cell::RefCell;

/// Records which leaves the evaluator asked about, then defers to the
/// standard matcher
#[derive(Default)]
struct RecordingMatcher {
    visited: RefCell<Vec<String>>,
}

impl LeafMatcher for RecordingMatcher {
    fn matches(
        &self,
        leaf: &Leaf,
        record: &FieldRecord,
        config: &EvaluatorConfig,
    ) -> Result<bool, EvalError> {
        self.visited.borrow_mut().push(leaf.field_key.clone());
        StandardMatcher.matches(leaf, record, config)
    }
}

fn person(age: i64) -> FieldRecord {
    FieldRecord::new()
        .with("age", FieldEntry::new(FieldType::Number, age))
        .with("city", FieldEntry::new(FieldType::Text, "Tokyo"))
}

fn decode(raw: Value) -> FilterNode {
    FilterNode::decode(&raw).expect("valid filter")
}

fn visited_for(raw: Value, record: &FieldRecord) -> (Result<bool, EvalError>, Vec<String>) {
    let evaluator = Evaluator::with_matcher(RecordingMatcher::default());
    let verdict = evaluator.evaluate(&decode(raw), record);
    let visited = evaluator.matcher().visited.borrow().clone();
    (verdict, visited)
}

#[test]
fn test_end_to_end_scenario() {
    let filter = json!([["age", "<", "30"], "and", ["city", "=", "Tokyo"]]);

    let (verdict, visited) = visited_for(filter.clone(), &person(25));
    assert_eq!(verdict, Ok(true));
    assert_eq!(visited, vec!["age", "city"]);

    let (verdict, visited) = visited_for(filter, &person(40));
    assert_eq!(verdict, Ok(false));
    assert_eq!(visited, vec!["age"], "city must not be evaluated after a false 'and'");
}

#[test]
fn test_and_chain_short_circuits_on_first_false() {
    let record = FieldRecord::new()
        .with("a", FieldEntry::new(FieldType::Number, 1))
        .with("b", FieldEntry::new(FieldType::Number, 2))
        .with("c", FieldEntry::new(FieldType::Number, 3));

    let (verdict, visited) = visited_for(
        json!([["a", "=", 9], "and", ["b", "=", 2], "and", ["c", "=", 3]]),
        &record,
    );
    assert_eq!(verdict, Ok(false));
    assert_eq!(visited, vec!["a"]);
}

#[test]
fn test_or_chain_short_circuits_on_first_true() {
    let record = FieldRecord::new()
        .with("a", FieldEntry::new(FieldType::Number, 1))
        .with("b", FieldEntry::new(FieldType::Number, 2))
        .with("c", FieldEntry::new(FieldType::Number, 3));

    let (verdict, visited) = visited_for(
        json!([["a", "=", 1], "or", ["b", "=", 0], "or", ["c", "=", 0]]),
        &record,
    );
    assert_eq!(verdict, Ok(true));
    assert_eq!(visited, vec!["a"]);
}

#[test]
fn test_short_circuit_skips_missing_fields() {
    // "missing" is never looked up, so no unresolved reference is raised
    let (verdict, visited) = visited_for(
        json!([["age", ">", 99], "and", ["missing", "=", 1]]),
        &person(25),
    );
    assert_eq!(verdict, Ok(false));
    assert_eq!(visited, vec!["age"]);
}

#[test]
fn test_nesting_matches_boolean_composition() {
    let leaves = [
        ("a", ["a", "=", "x"]),
        ("b", ["b", "=", "x"]),
        ("c", ["c", "=", "x"]),
    ];
    for mask in 0..8u8 {
        let bits = [mask & 1 != 0, mask & 2 != 0, mask & 4 != 0];
        let record: FieldRecord = leaves
            .iter()
            .zip(bits)
            .map(|((key, _), on)| {
                let value = if on { "x" } else { "y" };
                (*key, FieldEntry::new(FieldType::Text, value))
            })
            .collect();

        let filter = json!([leaves[0].1, "and", [leaves[1].1, "or", leaves[2].1]]);
        let expected = bits[0] && (bits[1] || bits[2]);
        assert_eq!(
            evaluate(&filter, &record),
            Ok(expected),
            "a={} b={} c={}",
            bits[0],
            bits[1],
            bits[2]
        );
    }
}

#[test]
fn test_equality_properties() {
    for value in [json!(0), json!("Tokyo"), json!(12.5), json!(true)] {
        let record = FieldRecord::new().with("f", FieldEntry::new(FieldType::Text, value.clone()));
        assert_eq!(evaluate(&json!(["f", "=", value.clone()]), &record), Ok(true));
        assert_eq!(evaluate(&json!(["f", "<>", value]), &record), Ok(false));
    }

    let record = FieldRecord::new().with("f", FieldEntry::new(FieldType::Text, "Tokyo"));
    assert_eq!(evaluate(&json!(["f", "<>", "Osaka"]), &record), Ok(true));
}

#[test]
fn test_date_field_matches_same_calendar_day() {
    // 2024-04-01T00:00:00Z minus nine hours, as stored in local civil time
    let stored = 1_711_929_600 - 32_400;
    let record = FieldRecord::new().with("visit", FieldEntry::new(FieldType::Date, stored));

    assert_eq!(
        evaluate(&json!(["Reservation.visit", "=", "2024-04-01"]), &record),
        Ok(true)
    );
    assert_eq!(
        evaluate(&json!(["visit", "between", ["2024/04/30", "2024/04/01"]]), &record),
        Ok(true)
    );
    assert_eq!(
        evaluate(&json!(["visit", ">", "2024-04-01 00:00:01"]), &record),
        Ok(false)
    );
}

#[test]
fn test_date_offset_is_configurable() {
    let record = FieldRecord::new().with("visit", FieldEntry::new(FieldType::Date, 1_711_929_600));
    let filter = decode(json!(["visit", "=", "2024-04-01"]));

    let utc = Evaluator::new().with_config(EvaluatorConfig {
        local_offset_seconds: 0,
        ..EvaluatorConfig::default()
    });
    assert_eq!(utc.evaluate(&filter, &record), Ok(true));
    assert_eq!(Evaluator::new().evaluate(&filter, &record), Ok(false));
}

#[test]
fn test_between_keeps_stored_bound_order() {
    let record = FieldRecord::new().with("n", FieldEntry::new(FieldType::Number, 5));
    assert_eq!(evaluate(&json!(["n", "between", [10, 1]]), &record), Ok(true));
    assert_eq!(evaluate(&json!(["n", "between", [1, 10]]), &record), Ok(false));
}

#[test]
fn test_list_include_and_not_include() {
    let record = FieldRecord::new().with(
        "options",
        FieldEntry::new(
            FieldType::CheckList,
            json!([{"id": 1, "checked": true}, {"id": 2, "checked": false}]),
        ),
    );
    assert_eq!(evaluate(&json!(["options", "listinclude", 1]), &record), Ok(true));
    assert_eq!(evaluate(&json!(["options", "listinclude", 2]), &record), Ok(false));
    assert_eq!(evaluate(&json!(["options", "listnotinclude", 2]), &record), Ok(true));
}

#[test]
fn test_time_field_compares_numerically() {
    let record = FieldRecord::new().with("start", FieldEntry::new(FieldType::Time, "0930"));
    assert_eq!(evaluate(&json!(["start", ">=", 900]), &record), Ok(true));
    assert_eq!(evaluate(&json!(["start", "<", "1000"]), &record), Ok(true));
}

#[test]
fn test_unknown_field_is_unresolvable_not_false() {
    let result = evaluate(&json!(["nickname", "=", "x"]), &person(25));
    assert_eq!(
        result,
        Err(FilterError::Eval(EvalError::UnresolvedReference {
            key: "nickname".to_string()
        }))
    );
}

#[test]
fn test_configuration_errors_are_distinct() {
    let record = FieldRecord::new().with("n", FieldEntry::new(FieldType::Number, 5));
    match evaluate(&json!(["n", "listinclude", 1]), &record) {
        Err(FilterError::Eval(e)) => assert!(e.is_configuration()),
        other => panic!("expected configuration error, got {other:?}"),
    }

    let record = FieldRecord::new().with("d", FieldEntry::new(FieldType::Date, 0));
    match evaluate(&json!(["d", ">", "tomorrow"]), &record) {
        Err(FilterError::Eval(e)) => {
            assert!(e.is_configuration());
            assert!(matches!(e, EvalError::InvalidDate { .. }));
        }
        other => panic!("expected invalid date, got {other:?}"),
    }
}

#[test]
fn test_date_value_beyond_epoch_range_is_an_error() {
    let huge = FieldRecord::new().with("d", FieldEntry::new(FieldType::Date, i64::MAX));
    let result = evaluate(&json!(["d", ">", "2024-01-01"]), &huge);
    assert!(
        matches!(
            result,
            Err(FilterError::Eval(EvalError::DateOutOfRange { .. }))
        ),
        "got {result:?}"
    );

    let exponent = FieldRecord::new().with("d", FieldEntry::new(FieldType::Date, "1e300"));
    let result = evaluate(&json!(["d", "isnotblank", null]), &exponent);
    assert!(
        matches!(
            result,
            Err(FilterError::Eval(EvalError::DateOutOfRange { .. }))
        ),
        "got {result:?}"
    );

    let record = FieldRecord::new()
        .with("start", FieldEntry::new(FieldType::Date, 0))
        .with("end", FieldEntry::new(FieldType::Date, i64::MAX));
    let result = evaluate(&json!(["start", "same", "end"]), &record);
    assert!(
        matches!(
            result,
            Err(FilterError::Eval(EvalError::DateOutOfRange { .. }))
        ),
        "got {result:?}"
    );
}

#[test]
fn test_evaluator_is_shareable_across_threads() {
    let evaluator = Evaluator::new();
    let filter = decode(json!([["age", "<", 30], "and", ["city", "=", "Tokyo"]]));

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let evaluator = &evaluator;
                let filter = &filter;
                scope.spawn(move || evaluator.evaluate(filter, &person(20 + i * 2)))
            })
            .collect();
        let verdicts: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .collect();
        assert_eq!(verdicts.iter().filter(|v| **v == Ok(true)).count(), 5);
    });
}
