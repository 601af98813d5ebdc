pub mod accumulator;
pub mod add_fields;
pub mod group;
pub mod limit;
pub mod project;
pub mod sort;

pub use accumulator::{AccumulatorOp, AccumulatorSpec};
pub use add_fields::AddFieldsSpec;
pub use group::GroupSpec;
pub use limit::{apply_limit, parse_limit};
pub use project::{IncludeNode, Projection};
pub use sort::{SortKey, SortSpec};

#[cfg(test)]
mod add_fields_test;
