use crate::engine::errors::StageError;
use crate::engine::types::{Document, Value};

const LIMIT: &str = "$limit";

/// Parses a `$limit` argument. Integral floats are accepted, negatives are not.
pub fn parse_limit(definition: &Value) -> Result<usize, StageError> {
    match definition.as_i64() {
        Some(n) if n >= 0 => Ok(n as usize),
        Some(n) => Err(StageError::invalid(
            LIMIT,
            format!("the limit must be non-negative, got {n}"),
        )),
        None => Err(StageError::invalid(
            LIMIT,
            format!("the limit must be an integer, got {definition}"),
        )),
    }
}

pub fn apply_limit(documents: &[Document], limit: usize) -> Vec<Document> {
    documents.iter().take(limit).cloned().collect()
}
