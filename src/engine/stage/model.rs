use serde::{Deserialize, Serialize};

use crate::engine::errors::StageError;
use crate::engine::stage::Stage;
use crate::engine::types::{Document, Value};

/// Operators the local engine evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Match,
    Project,
    Group,
    Sort,
    Limit,
    AddFields,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 6] = [
        OperatorKind::Match,
        OperatorKind::Project,
        OperatorKind::Group,
        OperatorKind::Sort,
        OperatorKind::Limit,
        OperatorKind::AddFields,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OperatorKind::Match => "$match",
            OperatorKind::Project => "$project",
            OperatorKind::Group => "$group",
            OperatorKind::Sort => "$sort",
            OperatorKind::Limit => "$limit",
            OperatorKind::AddFields => "$addFields",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageOwner {
    /// Derived from the selection context; users cannot edit it.
    System,
    #[default]
    User,
}

/// One step of a pipeline as the user wrote it. The operator is kept verbatim
/// so unsupported names survive until evaluation reports them.
#[derive(Debug, Clone, PartialEq, Hash, Serialize, Deserialize)]
pub struct AggregationStage {
    pub operator: String,
    pub definition: Value,
    #[serde(default)]
    pub owner: StageOwner,
}

impl AggregationStage {
    pub fn new(operator: impl Into<String>, definition: impl Into<Value>) -> Self {
        Self {
            operator: operator.into(),
            definition: definition.into(),
            owner: StageOwner::User,
        }
    }

    pub fn system(operator: impl Into<String>, definition: impl Into<Value>) -> Self {
        Self {
            owner: StageOwner::System,
            ..Self::new(operator, definition)
        }
    }

    /// Builds a stage from the JSON text a user typed into the editor.
    pub fn from_text(operator: &str, text: &str) -> Result<Self, StageError> {
        let json: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| StageError::invalid(operator, format!("definition is not valid JSON: {e}")))?;
        Ok(Self::new(operator, Value::from(json)))
    }

    /// The stage `add_stage` appends: an empty `$match`.
    pub fn default_match() -> Self {
        Self::new(OperatorKind::Match.name(), Document::new())
    }

    pub fn limit(n: usize) -> Self {
        Self::new(OperatorKind::Limit.name(), Value::Int(n as i64))
    }

    pub fn kind(&self) -> Option<OperatorKind> {
        OperatorKind::from_name(&self.operator)
    }

    pub fn is_system(&self) -> bool {
        self.owner == StageOwner::System
    }

    /// Wire form `{<operator>: <definition>}`.
    pub fn to_wire(&self) -> Document {
        Document::new().with(self.operator.clone(), self.definition.clone())
    }

    pub fn from_wire(doc: &Document) -> Result<Self, StageError> {
        let mut entries = doc.iter();
        match (entries.next(), entries.next()) {
            (Some((operator, definition)), None) => Ok(Self::new(operator.clone(), definition.clone())),
            _ => Err(StageError::invalid(
                "pipeline",
                format!(
                    "a pipeline stage must have exactly one field, found {}",
                    doc.len()
                ),
            )),
        }
    }

    pub fn parse(&self) -> Result<Stage, StageError> {
        Stage::parse(&self.operator, &self.definition)
    }
}
