pub mod fetch_factory;
pub mod selection_context_factory;
pub mod stage_factory;
pub mod telemetry_factory;

pub use fetch_factory::{FetchFactory, ScriptedFetch};
pub use selection_context_factory::SelectionContextFactory;
pub use stage_factory::StageFactory;
pub use telemetry_factory::TelemetryFactory;

#[cfg(test)]
mod fetch_factory_test;
#[cfg(test)]
mod selection_context_factory_test;
#[cfg(test)]
mod stage_factory_test;
#[cfg(test)]
mod telemetry_factory_test;
