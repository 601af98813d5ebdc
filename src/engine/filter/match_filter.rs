use crate::engine::errors::StageError;
use crate::engine::expr::{EvalContext, Expr};
use crate::engine::filter::FieldCondition;
use crate::engine::types::{Document, Value};

const MATCH: &str = "$match";

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Nor(Vec<Predicate>),
    Expr(Expr),
    Field {
        path: String,
        condition: FieldCondition,
    },
}

impl Predicate {
    pub fn matches(&self, doc: &Document, ctx: &EvalContext) -> Result<bool, StageError> {
        match self {
            Predicate::And(items) => {
                for item in items {
                    if !item.matches(doc, ctx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Or(items) => {
                for item in items {
                    if item.matches(doc, ctx)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Nor(items) => {
                for item in items {
                    if item.matches(doc, ctx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Expr(expr) => Ok(expr
                .evaluate_value(doc, ctx)
                .map_err(|e| e.within(MATCH))?
                .is_truthy()),
            Predicate::Field { path, condition } => {
                Ok(condition.matches(doc.get_path(path).as_ref()))
            }
        }
    }
}

/// Compiled `$match` query. An empty query matches every document.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchFilter {
    clauses: Vec<Predicate>,
}

impl MatchFilter {
    pub fn parse(definition: &Value) -> Result<Self, StageError> {
        let doc = definition
            .as_document()
            .ok_or_else(|| StageError::invalid(MATCH, "the query must be a document"))?;
        Ok(Self {
            clauses: parse_clauses(doc)?,
        })
    }

    pub fn matches(&self, doc: &Document, ctx: &EvalContext) -> Result<bool, StageError> {
        for clause in &self.clauses {
            if !clause.matches(doc, ctx)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn apply(&self, documents: &[Document], ctx: &EvalContext) -> Result<Vec<Document>, StageError> {
        let mut out = Vec::new();
        for doc in documents {
            if self.matches(doc, ctx)? {
                out.push(doc.clone());
            }
        }
        Ok(out)
    }
}

fn parse_clauses(doc: &Document) -> Result<Vec<Predicate>, StageError> {
    let mut clauses = Vec::with_capacity(doc.len());
    for (key, value) in doc {
        let clause = match key.as_str() {
            "$and" => Predicate::And(parse_branches(key, value)?),
            "$or" => Predicate::Or(parse_branches(key, value)?),
            "$nor" => Predicate::Nor(parse_branches(key, value)?),
            "$expr" => Predicate::Expr(Expr::parse(value).map_err(|e| e.within(MATCH))?),
            other if other.starts_with('$') => {
                return Err(StageError::invalid(
                    MATCH,
                    format!("unknown top level operator {other}"),
                ));
            }
            path => Predicate::Field {
                path: path.to_string(),
                condition: FieldCondition::parse(path, value)?,
            },
        };
        clauses.push(clause);
    }
    Ok(clauses)
}

fn parse_branches(operator: &str, value: &Value) -> Result<Vec<Predicate>, StageError> {
    let items = match value {
        Value::Array(items) if !items.is_empty() => items,
        _ => {
            return Err(StageError::invalid(
                MATCH,
                format!("{operator} must be a nonempty array"),
            ));
        }
    };
    items
        .iter()
        .map(|item| match item {
            Value::Document(branch) => Ok(Predicate::And(parse_clauses(branch)?)),
            _ => Err(StageError::invalid(
                MATCH,
                format!("{operator} entries must be documents"),
            )),
        })
        .collect()
}
