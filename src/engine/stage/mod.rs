mod model;
mod typed;

pub use model::{AggregationStage, OperatorKind, StageOwner};
pub use typed::Stage;
