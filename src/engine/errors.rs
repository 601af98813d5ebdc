use thiserror::Error;
use tracing::{debug, error};

/// Errors raised while interpreting or running a single aggregation stage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    #[error("Invalid {operator} definition: {reason}")]
    InvalidStageDefinition { operator: String, reason: String },

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("{operator} failed to evaluate: {reason}")]
    Expression { operator: String, reason: String },
}

impl StageError {
    pub fn invalid(operator: &str, reason: impl Into<String>) -> Self {
        StageError::InvalidStageDefinition {
            operator: operator.to_string(),
            reason: reason.into(),
        }
    }

    pub fn expression(operator: &str, reason: impl Into<String>) -> Self {
        StageError::Expression {
            operator: operator.to_string(),
            reason: reason.into(),
        }
    }

    /// Re-labels definition errors raised by shared parsers (expressions,
    /// predicates) with the stage operator that owns them.
    pub fn within(self, stage_operator: &str) -> Self {
        match self {
            StageError::InvalidStageDefinition { operator, reason } if operator != stage_operator => {
                StageError::InvalidStageDefinition {
                    operator: stage_operator.to_string(),
                    reason: format!("{operator}: {reason}"),
                }
            }
            other => other,
        }
    }
}

/// Failure reported by a remote fetch adapter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Not authorized for organization {0}")]
    Unauthorized(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Remote source returned no response")]
    NoResponse,
}

/// Error stored as a stage result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("Remote fetch failed: {0}")]
    RemoteFetch(#[from] FetchError),

    #[error("Stage failed: {0}")]
    Stage(#[from] StageError),
}

impl EvaluationError {
    pub fn log_error(&self, index: usize) {
        match self {
            EvaluationError::RemoteFetch(e) => {
                error!(target: "fleet_query::evaluator", stage = index, "Remote fetch failed: {}", e);
                debug!("Remote fetch error details: {:?}", e);
            }
            EvaluationError::Stage(StageError::UnsupportedOperator(name)) => {
                error!(target: "fleet_query::evaluator", stage = index, "Unsupported operator: {}", name);
            }
            EvaluationError::Stage(e) => {
                error!(target: "fleet_query::evaluator", stage = index, "Stage failed: {}", e);
                debug!("Stage error details: {:?}", e);
            }
        }
    }
}
