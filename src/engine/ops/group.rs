use indexmap::IndexMap;
use tracing::debug;

use crate::engine::errors::StageError;
use crate::engine::expr::{EvalContext, Expr};
use crate::engine::ops::accumulator::{AccumulatorImpl, AccumulatorSpec};
use crate::engine::types::{Document, Value};

const GROUP: &str = "$group";

/// Parsed `$group` stage. Groups are emitted in the order their key was first seen.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpec {
    id: Expr,
    accumulators: Vec<AccumulatorSpec>,
}

impl GroupSpec {
    pub fn parse(definition: &Value) -> Result<Self, StageError> {
        let doc = definition
            .as_document()
            .ok_or_else(|| StageError::invalid(GROUP, "the group specification must be a document"))?;
        let id = doc
            .get("_id")
            .ok_or_else(|| StageError::invalid(GROUP, "a group specification must include an _id"))?;
        let id = Expr::parse(id).map_err(|e| e.within(GROUP))?;

        let mut accumulators = Vec::with_capacity(doc.len().saturating_sub(1));
        for (field, value) in doc.iter().filter(|(k, _)| k.as_str() != "_id") {
            if field.contains('.') {
                return Err(StageError::invalid(
                    GROUP,
                    format!("the field name '{field}' cannot contain '.'"),
                ));
            }
            accumulators.push(AccumulatorSpec::parse(field, value)?);
        }
        Ok(Self { id, accumulators })
    }

    pub fn apply(&self, documents: &[Document], ctx: &EvalContext) -> Result<Vec<Document>, StageError> {
        let mut buckets: IndexMap<String, (Value, Vec<AccumulatorImpl>)> = IndexMap::new();

        for doc in documents {
            let id = self
                .id
                .evaluate(doc, ctx)
                .map_err(|e| e.within(GROUP))?
                .unwrap_or(Value::Null);
            let (_, states) = buckets.entry(id.canonical_key()).or_insert_with(|| {
                let states = self.accumulators.iter().map(|a| a.new_state()).collect();
                (id, states)
            });
            for (spec, state) in self.accumulators.iter().zip(states.iter_mut()) {
                state.update(&spec.expr, doc, ctx)?;
            }
        }

        debug!(target: "fleet_query::engine", groups = buckets.len(), "Grouped documents");

        Ok(buckets
            .into_values()
            .map(|(id, states)| {
                let mut out = Document::with_capacity(states.len() + 1);
                out.insert("_id", id);
                for (spec, state) in self.accumulators.iter().zip(states) {
                    out.insert(spec.field.clone(), state.finalize());
                }
                out
            })
            .collect())
    }
}
