use crate::engine::errors::StageError;
use crate::engine::expr::EvalContext;
use crate::engine::filter::MatchFilter;
use crate::engine::ops::{AddFieldsSpec, GroupSpec, Projection, SortSpec, apply_limit, parse_limit};
use crate::engine::stage::OperatorKind;
use crate::engine::types::{Document, Value};

/// A stage after its definition has been validated for its operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(MatchFilter),
    Project(Projection),
    Group(GroupSpec),
    Sort(SortSpec),
    Limit(usize),
    AddFields(AddFieldsSpec),
}

impl Stage {
    pub fn parse(operator: &str, definition: &Value) -> Result<Self, StageError> {
        let kind = OperatorKind::from_name(operator)
            .ok_or_else(|| StageError::UnsupportedOperator(operator.to_string()))?;
        Ok(match kind {
            OperatorKind::Match => Stage::Match(MatchFilter::parse(definition)?),
            OperatorKind::Project => Stage::Project(Projection::parse(definition)?),
            OperatorKind::Group => Stage::Group(GroupSpec::parse(definition)?),
            OperatorKind::Sort => Stage::Sort(SortSpec::parse(definition)?),
            OperatorKind::Limit => Stage::Limit(parse_limit(definition)?),
            OperatorKind::AddFields => Stage::AddFields(AddFieldsSpec::parse(definition)?),
        })
    }

    pub fn kind(&self) -> OperatorKind {
        match self {
            Stage::Match(_) => OperatorKind::Match,
            Stage::Project(_) => OperatorKind::Project,
            Stage::Group(_) => OperatorKind::Group,
            Stage::Sort(_) => OperatorKind::Sort,
            Stage::Limit(_) => OperatorKind::Limit,
            Stage::AddFields(_) => OperatorKind::AddFields,
        }
    }

    pub fn apply(&self, documents: &[Document], ctx: &EvalContext) -> Result<Vec<Document>, StageError> {
        match self {
            Stage::Match(filter) => filter.apply(documents, ctx),
            Stage::Project(projection) => projection.apply(documents, ctx),
            Stage::Group(group) => group.apply(documents, ctx),
            Stage::Sort(sort) => Ok(sort.apply(documents)),
            Stage::Limit(n) => Ok(apply_limit(documents, *n)),
            Stage::AddFields(spec) => spec.apply(documents, ctx),
        }
    }
}
