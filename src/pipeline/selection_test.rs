use serde_json::json;

use crate::pipeline::{DateRange, MachineScope, SelectionContext};

#[test]
fn deserializes_from_json() {
    let ctx: SelectionContext = serde_json::from_value(json!({
        "organization_id": "org-1",
        "location_id": "loc-1",
        "machine_scope": {"kind": "machine_group", "ids": ["r1", "r2"]},
        "date_range": {"from": "2024-01-01T00:00:00Z"},
        "data_source": "arm"
    }))
    .unwrap();

    assert_eq!(
        ctx.machine_scope,
        Some(MachineScope::MachineGroup {
            ids: vec!["r1".into(), "r2".into()]
        })
    );
    let range = ctx.date_range.unwrap();
    assert!(range.from.is_some());
    assert!(range.to.is_none());
    assert_eq!(ctx.data_source.as_deref(), Some("arm"));
}

#[test]
fn optional_fields_default_to_absent() {
    let ctx: SelectionContext =
        serde_json::from_value(json!({"organization_id": "o", "location_id": "l"})).unwrap();
    assert_eq!(ctx, SelectionContext::new("o", "l"));
}

#[test]
fn builder_methods_set_scope() {
    let ctx = SelectionContext::new("o", "l")
        .with_machine("r1")
        .with_data_source("camera")
        .with_date_range(DateRange::default());
    assert_eq!(
        ctx.machine_scope,
        Some(MachineScope::SingleMachine { id: "r1".into() })
    );
    assert_eq!(ctx.date_range, Some(DateRange::default()));

    let group = SelectionContext::new("o", "l").with_machine_group(["a", "b"]);
    assert!(matches!(group.machine_scope, Some(MachineScope::MachineGroup { ref ids }) if ids.len() == 2));
}
