use chrono::{TimeZone, Utc};
use serde_json::json;

use crate::engine::errors::StageError;
use crate::engine::expr::EvalContext;
use crate::engine::ops::AddFieldsSpec;
use crate::engine::types::{Document, Value};

fn add_fields(spec: serde_json::Value, input: serde_json::Value) -> serde_json::Value {
    let spec = AddFieldsSpec::parse(&Value::from(spec)).expect("spec parses");
    let docs: Vec<Document> = serde_json::from_value(input).unwrap();
    let ctx = EvalContext::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
    serde_json::to_value(spec.apply(&docs, &ctx).unwrap()).unwrap()
}

#[test]
fn appends_and_overwrites_fields() {
    let out = add_fields(
        json!({"double": {"$multiply": ["$v", 2]}, "v": 0}),
        json!([{"v": 3, "w": 1}]),
    );
    assert_eq!(out, json!([{"v": 0, "w": 1, "double": 6}]));
}

#[test]
fn expressions_see_the_input_document() {
    let out = add_fields(
        json!({"a": 10, "b": "$a"}),
        json!([{"a": 1}]),
    );
    assert_eq!(out, json!([{"a": 10, "b": 1}]));
}

#[test]
fn dotted_paths_create_nested_fields() {
    let out = add_fields(json!({"meta.seen_at": "$$NOW"}), json!([{"meta": {"x": 1}}]));
    assert_eq!(
        out,
        json!([{"meta": {"x": 1, "seen_at": {"$date": "2024-06-01T12:00:00.000Z"}}}])
    );
}

#[test]
fn missing_results_are_not_added() {
    let out = add_fields(json!({"copy": "$absent"}), json!([{"a": 1}]));
    assert_eq!(out, json!([{"a": 1}]));
}

#[test]
fn invalid_specs_are_rejected() {
    for bad in [json!({}), json!({"$x": 1}), json!({"a..b": 1}), json!([1])] {
        let err = AddFieldsSpec::parse(&Value::from(bad)).unwrap_err();
        assert!(matches!(err, StageError::InvalidStageDefinition { .. }));
    }
}

#[test]
fn dotted_paths_through_arrays_keep_the_elements() {
    let out = add_fields(json!({"a.d": 9}), json!([{"a": [{"b": 1}, {"b": 3}]}]));
    assert_eq!(out, json!([{"a": [{"b": 1, "d": 9}, {"b": 3, "d": 9}]}]));
}
