mod condition;
mod match_filter;

pub use condition::FieldCondition;
pub use match_filter::{MatchFilter, Predicate};
