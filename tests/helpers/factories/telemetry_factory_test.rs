use crate::engine::types::Value;
use crate::test_helpers::factory::Factory;

#[test]
fn test_telemetry_factory() {
    let doc = Factory::telemetry()
        .with("robot_id", "robot-9")
        .with("data.readings.rpm", 1200)
        .without("component_name")
        .create();

    assert_eq!(doc.get("robot_id"), Some(&Value::from("robot-9")));
    assert_eq!(doc.get_path("data.readings.rpm"), Some(Value::Int(1200)));
    assert!(!doc.contains_key("component_name"));
}

#[test]
fn test_telemetry_factory_list_is_time_ordered() {
    let docs = Factory::telemetry().create_list(3);
    assert_eq!(docs.len(), 3);
    let times: Vec<_> = docs
        .iter()
        .map(|d| d.get("time_received").and_then(Value::as_date).unwrap())
        .collect();
    assert!(times.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(docs[2].get("index"), Some(&Value::Int(2)));
}

#[test]
fn test_telemetry_factory_list_is_reproducible() {
    let first = Factory::telemetry().create_list(4);
    let second = Factory::telemetry().create_list(4);
    assert_eq!(first, second);
    for doc in &first {
        let temp = doc.get_path("data.readings.temp").and_then(|v| v.as_f64()).unwrap();
        assert!((15.0..30.0).contains(&temp));
    }
}
