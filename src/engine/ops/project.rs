use indexmap::IndexMap;

use crate::engine::errors::StageError;
use crate::engine::expr::{EvalContext, Expr};
use crate::engine::types::{Document, Value};

const PROJECT: &str = "$project";

#[derive(Debug, Clone, PartialEq)]
enum FieldRule {
    Include,
    Exclude,
    Computed(Expr),
}

/// Included paths folded by field name. `All` keeps the whole value.
#[derive(Debug, Clone, PartialEq)]
pub enum IncludeNode {
    All,
    Fields(IndexMap<String, IncludeNode>),
}

impl IncludeNode {
    fn insert(fields: &mut IndexMap<String, IncludeNode>, path: &str) {
        match path.split_once('.') {
            None => {
                fields.insert(path.to_string(), IncludeNode::All);
            }
            Some((head, rest)) => {
                let node = fields
                    .entry(head.to_string())
                    .or_insert_with(|| IncludeNode::Fields(IndexMap::new()));
                if let IncludeNode::Fields(nested) = node {
                    IncludeNode::insert(nested, rest);
                }
            }
        }
    }
}

/// Parsed `$project` stage.
///
/// Inclusion projections keep `_id` unless it is explicitly excluded and
/// emit included fields in their input order followed by computed fields.
/// Exclusion projections drop the named paths and keep everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Inclusion {
        keep_id: bool,
        include: IndexMap<String, IncludeNode>,
        computed: Vec<(String, Expr)>,
    },
    Exclusion {
        exclude: Vec<String>,
    },
}

impl Projection {
    pub fn parse(definition: &Value) -> Result<Self, StageError> {
        let doc = definition
            .as_document()
            .ok_or_else(|| StageError::invalid(PROJECT, "the projection must be a document"))?;
        if doc.is_empty() {
            return Err(StageError::invalid(
                PROJECT,
                "the projection must have at least one field",
            ));
        }

        let mut rules = Vec::new();
        flatten_rules("", doc, &mut rules)?;

        let mut id_rule = None;
        let mut include = IndexMap::new();
        let mut exclude = Vec::new();
        let mut computed = Vec::new();
        for (path, rule) in rules {
            if path == "_id" {
                id_rule = Some(rule);
                continue;
            }
            match rule {
                FieldRule::Include => IncludeNode::insert(&mut include, &path),
                FieldRule::Exclude => exclude.push(path),
                FieldRule::Computed(expr) => computed.push((path, expr)),
            }
        }

        let inclusive = !include.is_empty() || !computed.is_empty();
        if inclusive && !exclude.is_empty() {
            return Err(StageError::invalid(
                PROJECT,
                format!(
                    "cannot do exclusion on field {} in inclusion projection",
                    exclude[0]
                ),
            ));
        }

        match id_rule {
            Some(FieldRule::Exclude) if !inclusive => {
                exclude.insert(0, "_id".to_string());
                Ok(Projection::Exclusion { exclude })
            }
            Some(FieldRule::Exclude) => Ok(Projection::Inclusion {
                keep_id: false,
                include,
                computed,
            }),
            Some(FieldRule::Computed(_)) if !exclude.is_empty() => Err(StageError::invalid(
                PROJECT,
                "cannot use an expression for _id in an exclusion projection",
            )),
            Some(FieldRule::Computed(expr)) => {
                computed.insert(0, ("_id".to_string(), expr));
                Ok(Projection::Inclusion {
                    keep_id: false,
                    include,
                    computed,
                })
            }
            Some(FieldRule::Include) | None if !inclusive && !exclude.is_empty() => {
                Ok(Projection::Exclusion { exclude })
            }
            _ => Ok(Projection::Inclusion {
                keep_id: true,
                include,
                computed,
            }),
        }
    }

    pub fn apply(&self, documents: &[Document], ctx: &EvalContext) -> Result<Vec<Document>, StageError> {
        documents.iter().map(|doc| self.project(doc, ctx)).collect()
    }

    fn project(&self, doc: &Document, ctx: &EvalContext) -> Result<Document, StageError> {
        match self {
            Projection::Exclusion { exclude } => {
                let mut out = doc.clone();
                for path in exclude {
                    out.remove_path(path);
                }
                Ok(out)
            }
            Projection::Inclusion {
                keep_id,
                include,
                computed,
            } => {
                let mut out = Document::new();
                if *keep_id {
                    if let Some(id) = doc.get("_id") {
                        out.insert("_id", id.clone());
                    }
                }
                for (key, value) in project_fields(doc, include) {
                    out.insert(key, value);
                }
                for (path, expr) in computed {
                    if let Some(value) = expr.evaluate(doc, ctx).map_err(|e| e.within(PROJECT))? {
                        out.set_path(path, value);
                    }
                }
                Ok(out)
            }
        }
    }
}

/// Keeps the included fields of `doc` in input order.
fn project_fields(doc: &Document, include: &IndexMap<String, IncludeNode>) -> Document {
    let mut out = Document::new();
    for (key, value) in doc {
        match include.get(key) {
            Some(IncludeNode::All) => {
                out.insert(key.clone(), value.clone());
            }
            Some(IncludeNode::Fields(nested)) => {
                if let Some(projected) = project_value(value, nested) {
                    out.insert(key.clone(), projected);
                }
            }
            None => {}
        }
    }
    out
}

/// Sub-paths apply to every document inside an array; scalars drop out.
fn project_value(value: &Value, include: &IndexMap<String, IncludeNode>) -> Option<Value> {
    match value {
        Value::Document(inner) => Some(Value::Document(project_fields(inner, include))),
        Value::Array(items) => Some(Value::Array(
            items
                .iter()
                .filter_map(|item| project_value(item, include))
                .collect(),
        )),
        _ => None,
    }
}

/// Flattens nested projection documents (`{a: {b: 1}}`) into dotted rules.
fn flatten_rules(
    prefix: &str,
    doc: &Document,
    rules: &mut Vec<(String, FieldRule)>,
) -> Result<(), StageError> {
    for (key, value) in doc {
        if key.is_empty() || key.starts_with('$') {
            return Err(StageError::invalid(
                PROJECT,
                format!("invalid field name '{key}'"),
            ));
        }
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Bool(flag) => rules.push((path, include_or_exclude(*flag))),
            Value::Int(_) | Value::Float(_) => rules.push((path, include_or_exclude(value.is_truthy()))),
            Value::Document(nested)
                if !nested.is_empty() && !nested.keys().any(|k| k.starts_with('$')) =>
            {
                flatten_rules(&path, nested, rules)?
            }
            other => {
                let expr = Expr::parse(other).map_err(|e| e.within(PROJECT))?;
                rules.push((path, FieldRule::Computed(expr)));
            }
        }
    }
    Ok(())
}

fn include_or_exclude(flag: bool) -> FieldRule {
    if flag {
        FieldRule::Include
    } else {
        FieldRule::Exclude
    }
}
