use crate::engine::errors::StageError;
use crate::engine::expr::{EvalContext, Expr};
use crate::engine::types::{Document, Value};

const ADD_FIELDS: &str = "$addFields";

/// Parsed `$addFields` stage. Every expression sees the input document, not
/// the fields added earlier in the same stage.
#[derive(Debug, Clone, PartialEq)]
pub struct AddFieldsSpec {
    fields: Vec<(String, Expr)>,
}

impl AddFieldsSpec {
    pub fn parse(definition: &Value) -> Result<Self, StageError> {
        let doc = definition
            .as_document()
            .ok_or_else(|| StageError::invalid(ADD_FIELDS, "the specification must be a document"))?;
        if doc.is_empty() {
            return Err(StageError::invalid(
                ADD_FIELDS,
                "the specification must have at least one field",
            ));
        }
        let fields = doc
            .iter()
            .map(|(path, value)| {
                if path.is_empty() || path.starts_with('$') || path.split('.').any(str::is_empty) {
                    return Err(StageError::invalid(
                        ADD_FIELDS,
                        format!("invalid field name '{path}'"),
                    ));
                }
                let expr = Expr::parse(value).map_err(|e| e.within(ADD_FIELDS))?;
                Ok((path.clone(), expr))
            })
            .collect::<Result<Vec<_>, StageError>>()?;
        Ok(Self { fields })
    }

    pub fn apply(&self, documents: &[Document], ctx: &EvalContext) -> Result<Vec<Document>, StageError> {
        documents
            .iter()
            .map(|doc| {
                let mut out = doc.clone();
                for (path, expr) in &self.fields {
                    if let Some(value) = expr.evaluate(doc, ctx).map_err(|e| e.within(ADD_FIELDS))? {
                        out.set_path(path, value);
                    }
                }
                Ok(out)
            })
            .collect()
    }
}
