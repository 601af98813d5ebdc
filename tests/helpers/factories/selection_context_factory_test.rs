use crate::pipeline::MachineScope;
use crate::test_helpers::factory::Factory;

#[test]
fn test_selection_context_factory() {
    let ctx = Factory::selection_context()
        .organization("org-7")
        .machine_group(&["r1", "r2"])
        .data_source("arm")
        .create();
    assert_eq!(ctx.organization_id, "org-7");
    assert_eq!(ctx.location_id, "loc-1");
    assert_eq!(
        ctx.machine_scope,
        Some(MachineScope::MachineGroup {
            ids: vec!["r1".into(), "r2".into()]
        })
    );
    assert!(ctx.date_range.is_some());
}
