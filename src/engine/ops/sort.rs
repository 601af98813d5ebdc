use std::cmp::Ordering;

use crate::engine::errors::StageError;
use crate::engine::types::{Document, Value, compare_values};

const SORT: &str = "$sort";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub path: String,
    pub ascending: bool,
}

/// Parsed `$sort` stage. The sort is stable, so documents with equal keys
/// keep their input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn parse(definition: &Value) -> Result<Self, StageError> {
        let doc = definition
            .as_document()
            .ok_or_else(|| StageError::invalid(SORT, "the sort key specification must be a document"))?;
        if doc.is_empty() {
            return Err(StageError::invalid(SORT, "the sort key specification must not be empty"));
        }
        let keys = doc
            .iter()
            .map(|(path, direction)| match direction.as_i64() {
                Some(1) => Ok(SortKey {
                    path: path.clone(),
                    ascending: true,
                }),
                Some(-1) => Ok(SortKey {
                    path: path.clone(),
                    ascending: false,
                }),
                _ => Err(StageError::invalid(
                    SORT,
                    format!("the sort order for '{path}' must be 1 or -1"),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { keys })
    }

    pub fn apply(&self, documents: &[Document]) -> Vec<Document> {
        // Missing fields sort as null.
        let mut keyed: Vec<(Vec<Value>, &Document)> = documents
            .iter()
            .map(|doc| {
                let values = self
                    .keys
                    .iter()
                    .map(|key| doc.get_path(&key.path).unwrap_or(Value::Null))
                    .collect();
                (values, doc)
            })
            .collect();
        keyed.sort_by(|(a, _), (b, _)| self.compare(a, b));
        keyed.into_iter().map(|(_, doc)| doc.clone()).collect()
    }

    fn compare(&self, a: &[Value], b: &[Value]) -> Ordering {
        for (key, (left, right)) in self.keys.iter().zip(a.iter().zip(b)) {
            let ordering = compare_values(left, right);
            let ordering = if key.ascending { ordering } else { ordering.reverse() };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}
