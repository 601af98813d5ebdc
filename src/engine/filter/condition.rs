use crate::engine::errors::StageError;
use crate::engine::expr::CompareOp;
use crate::engine::types::{Value, compare_same_bracket, values_equal};

const MATCH: &str = "$match";

/// Condition applied to the value found at a single field path.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCondition {
    Eq(Value),
    Ne(Value),
    Compare(CompareOp, Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Exists(bool),
    Not(Box<FieldCondition>),
    All(Vec<FieldCondition>),
}

impl FieldCondition {
    /// Parses the right-hand side of `{field: <value>}`.
    pub fn parse(path: &str, value: &Value) -> Result<Self, StageError> {
        let Value::Document(doc) = value else {
            return Ok(FieldCondition::Eq(value.clone()));
        };
        let operator_keys = doc.keys().filter(|k| k.starts_with('$')).count();
        if operator_keys == 0 {
            return Ok(FieldCondition::Eq(value.clone()));
        }
        if operator_keys != doc.len() {
            return Err(StageError::invalid(
                MATCH,
                format!("cannot mix operators and literal fields under '{path}'"),
            ));
        }

        let mut conditions = doc
            .iter()
            .map(|(op, arg)| Self::parse_operator(path, op, arg))
            .collect::<Result<Vec<_>, _>>()?;
        if conditions.len() == 1 {
            Ok(conditions.remove(0))
        } else {
            Ok(FieldCondition::All(conditions))
        }
    }

    fn parse_operator(path: &str, op: &str, arg: &Value) -> Result<Self, StageError> {
        if let Some(compare) = CompareOp::from_name(op) {
            return Ok(match compare {
                CompareOp::Eq => FieldCondition::Eq(arg.clone()),
                CompareOp::Ne => FieldCondition::Ne(arg.clone()),
                other => FieldCondition::Compare(other, arg.clone()),
            });
        }
        match op {
            "$in" | "$nin" => {
                let items = arg.as_array().ok_or_else(|| {
                    StageError::invalid(MATCH, format!("{op} needs an array under '{path}'"))
                })?;
                if op == "$in" {
                    Ok(FieldCondition::In(items.clone()))
                } else {
                    Ok(FieldCondition::Nin(items.clone()))
                }
            }
            "$exists" => Ok(FieldCondition::Exists(arg.is_truthy())),
            "$not" => match arg {
                Value::Document(inner) if !inner.is_empty() && inner.keys().all(|k| k.starts_with('$')) => {
                    Ok(FieldCondition::Not(Box::new(Self::parse(path, arg)?)))
                }
                _ => Err(StageError::invalid(
                    MATCH,
                    format!("$not needs an operator document under '{path}'"),
                )),
            },
            other => Err(StageError::invalid(
                MATCH,
                format!("unknown query operator {other}"),
            )),
        }
    }

    /// `value` is `None` when the field is missing.
    pub fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            FieldCondition::Eq(target) => eq_matches(value, target),
            FieldCondition::Ne(target) => !eq_matches(value, target),
            FieldCondition::Compare(op, target) => match value {
                None => false,
                Some(whole @ Value::Array(items)) => {
                    items.iter().any(|item| compare_matches(*op, item, target))
                        || compare_matches(*op, whole, target)
                }
                Some(v) => compare_matches(*op, v, target),
            },
            FieldCondition::In(targets) => targets.iter().any(|t| eq_matches(value, t)),
            FieldCondition::Nin(targets) => !targets.iter().any(|t| eq_matches(value, t)),
            FieldCondition::Exists(flag) => value.is_some() == *flag,
            FieldCondition::Not(inner) => !inner.matches(value),
            FieldCondition::All(conditions) => conditions.iter().all(|c| c.matches(value)),
        }
    }
}

/// Equality with array fields matching when any element (or the array itself) matches.
fn eq_matches(value: Option<&Value>, target: &Value) -> bool {
    match value {
        None => target.is_null(),
        Some(whole @ Value::Array(items)) => {
            values_equal(whole, target) || items.iter().any(|item| values_equal(item, target))
        }
        Some(v) => values_equal(v, target),
    }
}

fn compare_matches(op: CompareOp, value: &Value, target: &Value) -> bool {
    compare_same_bracket(value, target)
        .map(|ordering| op.test(ordering))
        .unwrap_or(false)
}
