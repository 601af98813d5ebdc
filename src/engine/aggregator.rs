use tracing::debug;

use crate::engine::errors::StageError;
use crate::engine::expr::EvalContext;
use crate::engine::stage::{AggregationStage, Stage};
use crate::engine::types::Document;

/// In-memory evaluator for the supported operator subset.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    ctx: EvalContext,
}

impl Aggregator {
    pub fn new(ctx: EvalContext) -> Self {
        Self { ctx }
    }

    pub fn capture() -> Self {
        Self::new(EvalContext::capture())
    }

    pub fn context(&self) -> &EvalContext {
        &self.ctx
    }

    pub fn run(
        &self,
        stage: &AggregationStage,
        documents: &[Document],
    ) -> Result<Vec<Document>, StageError> {
        let parsed = stage.parse()?;
        self.apply(&parsed, documents)
    }

    /// Folds the stages left to right. Every stage is validated before any runs.
    pub fn run_pipeline(
        &self,
        stages: &[AggregationStage],
        documents: &[Document],
    ) -> Result<Vec<Document>, StageError> {
        let parsed = stages
            .iter()
            .map(AggregationStage::parse)
            .collect::<Result<Vec<_>, _>>()?;
        let mut current = documents.to_vec();
        for stage in &parsed {
            current = self.apply(stage, &current)?;
        }
        Ok(current)
    }

    fn apply(&self, stage: &Stage, documents: &[Document]) -> Result<Vec<Document>, StageError> {
        let out = stage.apply(documents, &self.ctx)?;
        debug!(
            target: "fleet_query::engine",
            operator = stage.kind().name(),
            input = documents.len(),
            output = out.len(),
            "Applied stage"
        );
        Ok(out)
    }
}

pub fn run(stage: &AggregationStage, documents: &[Document]) -> Result<Vec<Document>, StageError> {
    Aggregator::capture().run(stage, documents)
}

pub fn run_pipeline(
    stages: &[AggregationStage],
    documents: &[Document],
) -> Result<Vec<Document>, StageError> {
    Aggregator::capture().run_pipeline(stages, documents)
}
