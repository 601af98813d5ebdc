pub use super::factories::{
    FetchFactory, SelectionContextFactory, StageFactory, TelemetryFactory,
};

pub struct Factory;

impl Factory {
    pub fn telemetry() -> TelemetryFactory {
        TelemetryFactory::new()
    }

    pub fn stage() -> StageFactory {
        StageFactory::new()
    }

    pub fn match_stage(definition: serde_json::Value) -> StageFactory {
        StageFactory::new().operator("$match").definition(definition)
    }

    pub fn selection_context() -> SelectionContextFactory {
        SelectionContextFactory::new()
    }

    pub fn fetch() -> FetchFactory {
        FetchFactory::new()
    }
}
