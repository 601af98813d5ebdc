use chrono::{TimeZone, Utc};
use serde_json::json;

use crate::doc;
use crate::engine::types::{Document, TypeClass, Value};

#[test]
fn converts_json_numbers_to_int_or_float() {
    assert_eq!(Value::from(json!(42)), Value::Int(42));
    assert_eq!(Value::from(json!(-7)), Value::Int(-7));
    assert_eq!(Value::from(json!(1.5)), Value::Float(1.5));
    assert_eq!(
        Value::from(json!(u64::MAX)),
        Value::Float(u64::MAX as f64)
    );
}

#[test]
fn decodes_extended_json_dates() {
    let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let from_string = Value::from(json!({"$date": "2024-05-01T12:00:00Z"}));
    let from_millis = Value::from(json!({"$date": expected.timestamp_millis()}));
    let from_long = Value::from(json!({"$date": {"$numberLong": expected.timestamp_millis().to_string()}}));

    assert_eq!(from_string, Value::Date(expected));
    assert_eq!(from_millis, Value::Date(expected));
    assert_eq!(from_long, Value::Date(expected));
}

#[test]
fn object_with_extra_keys_is_not_a_date() {
    let value = Value::from(json!({"$date": "2024-05-01T12:00:00Z", "other": 1}));
    assert_eq!(value.type_class(), TypeClass::Document);
}

#[test]
fn encodes_dates_as_extended_json() {
    let dt = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    assert_eq!(
        Value::Date(dt).to_json(),
        json!({"$date": "2024-05-01T12:00:00.000Z"})
    );
}

#[test]
fn serde_round_trip_keeps_nested_structure() {
    let original = json!({"a": [1, {"b": null}], "c": {"d": true}});
    let value: Value = serde_json::from_value(original.clone()).unwrap();
    assert_eq!(serde_json::to_value(&value).unwrap(), original);
}

#[test]
fn truthiness_matches_aggregation_rules() {
    assert!(!Value::Null.is_truthy());
    assert!(!Value::Int(0).is_truthy());
    assert!(!Value::Float(0.0).is_truthy());
    assert!(!Value::Bool(false).is_truthy());
    assert!(Value::String(String::new()).is_truthy());
    assert!(Value::Array(vec![]).is_truthy());
}

#[test]
fn canonical_key_unifies_numeric_representations() {
    assert_eq!(Value::Int(3).canonical_key(), Value::Float(3.0).canonical_key());
    assert_ne!(Value::Int(3).canonical_key(), Value::from("3").canonical_key());
    assert_ne!(
        Value::Document(doc! {"a" => 1}).canonical_key(),
        Value::Document(doc! {"a" => "1"}).canonical_key()
    );
}

#[test]
fn as_i64_accepts_integral_floats_only() {
    assert_eq!(Value::Float(2.0).as_i64(), Some(2));
    assert_eq!(Value::Float(2.5).as_i64(), None);
    assert_eq!(Value::from("2").as_i64(), None);
}

#[test]
fn vec_conversion_builds_arrays() {
    let value = Value::from(vec!["r1", "r2"]);
    assert_eq!(
        value,
        Value::Array(vec![Value::from("r1"), Value::from("r2")])
    );
    assert_eq!(Value::from(Document::new()).type_class(), TypeClass::Document);
}
