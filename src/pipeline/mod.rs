pub mod evaluator;
pub mod fetch;
pub mod initial_match;
pub mod model;
pub mod selection;

pub use evaluator::{EvaluationMode, EvaluationOutcome, PipelineController, StageResult};
pub use fetch::{InMemorySource, RemoteFetchAdapter};
pub use initial_match::{build_initial_match_stage, build_initial_match_stage_at};
pub use model::{EditRejection, LockMode, Pipeline, StageEdit};
pub use selection::{DateRange, MachineScope, SelectionContext};

#[cfg(test)]
mod selection_test;
