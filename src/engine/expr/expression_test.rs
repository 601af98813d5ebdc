use chrono::{TimeZone, Utc};
use serde_json::json;

use crate::doc;
use crate::engine::errors::StageError;
use crate::engine::expr::{CompareOp, EvalContext, Expr};
use crate::engine::types::{Document, Value};

fn ctx() -> EvalContext {
    EvalContext::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
}

fn parse(value: serde_json::Value) -> Result<Expr, StageError> {
    Expr::parse(&Value::from(value))
}

fn eval(expr: serde_json::Value, doc: &Document) -> Value {
    parse(expr)
        .expect("expression parses")
        .evaluate_value(doc, &ctx())
        .expect("expression evaluates")
}

#[test]
fn parses_field_paths_and_variables() {
    assert_eq!(parse(json!("$a.b")).unwrap(), Expr::Field("a.b".into()));
    assert_eq!(parse(json!("$$NOW")).unwrap(), Expr::Now);
    assert_eq!(parse(json!("$$ROOT")).unwrap(), Expr::Root);
    assert_eq!(parse(json!("plain")).unwrap(), Expr::Literal(Value::from("plain")));
}

#[test]
fn rejects_malformed_expressions() {
    assert!(parse(json!("$")).is_err());
    assert!(parse(json!("$a..b")).is_err());
    assert!(parse(json!("$$UNKNOWN")).is_err());
    assert!(parse(json!({"$eq": [1]})).is_err());
    assert!(parse(json!({"$gte": 1})).is_err());
    assert!(parse(json!({"$eq": [1, 1], "$ne": [1, 2]})).is_err());
    assert!(parse(json!({"$regexMatch": {}})).is_err());
    assert!(parse(json!({"$cond": {"if": true, "then": 1}})).is_err());
}

#[test]
fn comparison_operators_parse_to_compare_nodes() {
    let expr = parse(json!({"$lte": ["$x", 3]})).unwrap();
    assert_eq!(
        expr,
        Expr::Compare(
            CompareOp::Lte,
            Box::new(Expr::Field("x".into())),
            Box::new(Expr::Literal(Value::Int(3)))
        )
    );
}

#[test]
fn time_window_expression_filters_on_to_date() {
    let window = json!({"$and": [
        {"$gte": ["$time_received", {"$toDate": "2024-01-01T00:00:00.000Z"}]},
        {"$lte": ["$time_received", {"$toDate": "2024-02-01T00:00:00.000Z"}]}
    ]});
    let inside = Document::from_json(json!({"time_received": {"$date": "2024-01-15T10:00:00Z"}})).unwrap();
    let outside = Document::from_json(json!({"time_received": {"$date": "2024-03-01T00:00:00Z"}})).unwrap();
    let missing = doc! {"other" => 1};

    assert_eq!(eval(window.clone(), &inside), Value::Bool(true));
    assert_eq!(eval(window.clone(), &outside), Value::Bool(false));
    assert_eq!(eval(window, &missing), Value::Bool(false));
}

#[test]
fn to_date_accepts_strings_and_epoch_millis() {
    let doc = doc! {"ms" => 86_400_000i64, "s" => "1970-01-02"};
    let expected = Value::Date(Utc.with_ymd_and_hms(1970, 1, 2, 0, 0, 0).unwrap());
    assert_eq!(eval(json!({"$toDate": "$ms"}), &doc), expected);
    assert_eq!(eval(json!({"$toDate": "$s"}), &doc), expected);
    assert_eq!(eval(json!({"$toDate": "$missing"}), &doc), Value::Null);
}

#[test]
fn to_date_reports_unparseable_strings() {
    let expr = parse(json!({"$toDate": "not a date"})).unwrap();
    let err = expr.evaluate(&Document::new(), &ctx()).unwrap_err();
    assert!(matches!(err, StageError::Expression { ref operator, .. } if operator == "$toDate"));
}

#[test]
fn now_is_taken_from_context() {
    assert_eq!(eval(json!("$$NOW"), &Document::new()), Value::Date(ctx().now()));
}

#[test]
fn arithmetic_keeps_integers_until_needed() {
    let doc = doc! {"a" => 6, "b" => 4, "f" => 0.5};
    assert_eq!(eval(json!({"$add": ["$a", "$b", 1]}), &doc), Value::Int(11));
    assert_eq!(eval(json!({"$add": ["$a", "$f"]}), &doc), Value::Float(6.5));
    assert_eq!(eval(json!({"$subtract": ["$a", "$b"]}), &doc), Value::Int(2));
    assert_eq!(eval(json!({"$multiply": ["$a", "$b"]}), &doc), Value::Int(24));
    assert_eq!(eval(json!({"$divide": ["$a", "$b"]}), &doc), Value::Float(1.5));
    assert_eq!(eval(json!({"$add": ["$a", "$missing"]}), &doc), Value::Null);
}

#[test]
fn divide_by_zero_is_an_expression_error() {
    let expr = parse(json!({"$divide": [1, 0]})).unwrap();
    assert!(expr.evaluate(&Document::new(), &ctx()).is_err());
}

#[test]
fn date_arithmetic_shifts_by_milliseconds() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let doc = doc! {"t" => start};
    assert_eq!(
        eval(json!({"$add": ["$t", 1000]}), &doc),
        Value::Date(start + chrono::Duration::seconds(1))
    );
    assert_eq!(
        eval(json!({"$subtract": ["$$NOW", "$t"]}), &doc),
        Value::Int((ctx().now() - start).num_milliseconds())
    );
}

#[test]
fn cond_if_null_and_concat() {
    let doc = doc! {"name" => "arm", "load" => 12};
    assert_eq!(
        eval(json!({"$cond": [{"$gt": ["$load", 10]}, "high", "low"]}), &doc),
        Value::from("high")
    );
    assert_eq!(
        eval(json!({"$cond": {"if": false, "then": 1, "else": 2}}), &doc),
        Value::Int(2)
    );
    assert_eq!(eval(json!({"$ifNull": ["$nope", null, "fallback"]}), &doc), Value::from("fallback"));
    assert_eq!(
        eval(json!({"$concat": ["$name", "-", {"$toString": "$load"}]}), &doc),
        Value::from("arm-12")
    );
}

#[test]
fn object_expressions_omit_missing_fields() {
    let doc = doc! {"a" => 1};
    assert_eq!(
        eval(json!({"x": "$a", "y": "$missing", "z": {"$literal": "$a"}}), &doc),
        Value::Document(doc! {"x" => 1, "z" => "$a"})
    );
}

#[test]
fn in_and_size_work_on_arrays() {
    let doc = doc! {"tags" => vec!["imu", "gps"]};
    assert_eq!(eval(json!({"$in": ["gps", "$tags"]}), &doc), Value::Bool(true));
    assert_eq!(eval(json!({"$size": "$tags"}), &doc), Value::Int(2));
    let bad = parse(json!({"$in": ["gps", "$nope"]})).unwrap();
    assert!(bad.evaluate(&doc, &ctx()).is_err());
}

#[test]
fn cmp_and_logical_operators() {
    let doc = doc! {"a" => 2};
    assert_eq!(eval(json!({"$cmp": ["$a", 3]}), &doc), Value::Int(-1));
    assert_eq!(eval(json!({"$or": [false, "$a"]}), &doc), Value::Bool(true));
    assert_eq!(eval(json!({"$not": ["$a"]}), &doc), Value::Bool(false));
    assert_eq!(eval(json!({"$eq": ["$missing", null]}), &doc), Value::Bool(true));
}
