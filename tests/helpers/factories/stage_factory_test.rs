use serde_json::json;

use crate::engine::stage::{OperatorKind, StageOwner};
use crate::engine::types::Value;
use crate::test_helpers::factory::Factory;

#[test]
fn test_stage_factory() {
    let stage = Factory::stage()
        .operator("$sort")
        .definition(json!({"time_received": -1}))
        .create();
    assert_eq!(stage.kind(), Some(OperatorKind::Sort));
    assert_eq!(stage.owner, StageOwner::User);
    assert_eq!(stage.definition, Value::from(json!({"time_received": -1})));

    assert!(Factory::match_stage(json!({"a": 1})).system().create().is_system());
}
