use serde::{Deserialize, Serialize};

use crate::engine::stage::{AggregationStage, StageOwner};
use crate::engine::types::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockMode {
    /// Stage 0 is derived from a selection context and cannot be edited.
    Locked,
    /// Freestanding query builder; every stage is editable.
    Unlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditRejection {
    SystemOwned,
    OutOfRange,
    LastStage,
    /// The pipeline has no system stage to replace.
    Unlocked,
}

/// Outcome of a stage-list edit. Rejected edits leave the pipeline untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEdit {
    Applied,
    Rejected(EditRejection),
}

impl StageEdit {
    pub fn is_applied(&self) -> bool {
        matches!(self, StageEdit::Applied)
    }
}

/// Ordered, never empty list of stages. Stages are only appended, replaced or
/// removed by index, never reordered.
#[derive(Debug, Clone, PartialEq, Hash, Serialize)]
pub struct Pipeline {
    stages: Vec<AggregationStage>,
    lock: LockMode,
}

impl Pipeline {
    /// Locked pipeline seeded with a system-owned initial stage.
    pub fn locked(initial: AggregationStage) -> Self {
        let initial = AggregationStage {
            owner: StageOwner::System,
            ..initial
        };
        Self {
            stages: vec![initial],
            lock: LockMode::Locked,
        }
    }

    /// Unlocked pipeline. An empty list is seeded with a default `$match`.
    pub fn unlocked(stages: Vec<AggregationStage>) -> Self {
        let mut stages: Vec<AggregationStage> = stages
            .into_iter()
            .map(|stage| AggregationStage {
                owner: StageOwner::User,
                ..stage
            })
            .collect();
        if stages.is_empty() {
            stages.push(AggregationStage::default_match());
        }
        Self {
            stages,
            lock: LockMode::Unlocked,
        }
    }

    pub fn lock(&self) -> LockMode {
        self.lock
    }

    pub fn stages(&self) -> &[AggregationStage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AggregationStage> {
        self.stages.get(index)
    }

    pub fn initial(&self) -> &AggregationStage {
        &self.stages[0]
    }

    pub fn to_wire(&self) -> Vec<Document> {
        self.stages.iter().map(AggregationStage::to_wire).collect()
    }

    pub fn add_stage(&mut self) -> usize {
        self.stages.push(AggregationStage::default_match());
        self.stages.len() - 1
    }

    pub fn update_stage(&mut self, index: usize, stage: AggregationStage) -> StageEdit {
        if let Some(rejection) = self.check_editable(index) {
            return StageEdit::Rejected(rejection);
        }
        self.stages[index] = AggregationStage {
            owner: StageOwner::User,
            ..stage
        };
        StageEdit::Applied
    }

    pub fn remove_stage(&mut self, index: usize) -> StageEdit {
        if let Some(rejection) = self.check_editable(index) {
            return StageEdit::Rejected(rejection);
        }
        if self.stages.len() == 1 {
            return StageEdit::Rejected(EditRejection::LastStage);
        }
        self.stages.remove(index);
        StageEdit::Applied
    }

    /// Swaps in a freshly derived stage 0. Only meaningful for locked pipelines.
    pub fn replace_initial_stage(&mut self, stage: AggregationStage) -> StageEdit {
        if self.lock != LockMode::Locked {
            return StageEdit::Rejected(EditRejection::Unlocked);
        }
        self.stages[0] = AggregationStage {
            owner: StageOwner::System,
            ..stage
        };
        StageEdit::Applied
    }

    fn check_editable(&self, index: usize) -> Option<EditRejection> {
        match self.stages.get(index) {
            None => Some(EditRejection::OutOfRange),
            Some(stage) if stage.is_system() => Some(EditRejection::SystemOwned),
            Some(_) => None,
        }
    }
}
