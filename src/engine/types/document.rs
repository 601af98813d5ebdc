use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use indexmap::map::{IntoIter, Iter, Keys};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

use super::value::Value;

/// Insertion-ordered telemetry record.
///
/// Key order is preserved so that repeated evaluations serialize identically.
/// Equality and hashing are both order-sensitive, as BSON equality is.
#[derive(Debug, Clone, Default)]
pub struct Document {
    fields: IndexMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Removes a key and keeps the relative order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.fields.iter()
    }

    pub fn keys(&self) -> Keys<'_, String, Value> {
        self.fields.keys()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Resolves a dotted path. Arrays of documents along the way fan out into an
    /// array of the addressed values.
    pub fn get_path(&self, path: &str) -> Option<Value> {
        let parts: Vec<&str> = path.split('.').collect();
        let first = self.fields.get(parts[0])?;
        resolve_parts(first, &parts[1..])
    }

    /// Sets a dotted path, creating intermediate documents. Arrays along the
    /// way receive the write on every element; scalars are replaced.
    pub fn set_path(&mut self, path: &str, value: Value) {
        match path.split_once('.') {
            None => {
                self.fields.insert(path.to_string(), value);
            }
            Some((head, rest)) => {
                let slot = self
                    .fields
                    .entry(head.to_string())
                    .or_insert_with(|| Value::Document(Document::new()));
                set_nested(slot, rest, value);
            }
        }
    }

    /// Removes a dotted path. Arrays along the way lose the key from every
    /// document element; the removed values come back as an array.
    pub fn remove_path(&mut self, path: &str) -> Option<Value> {
        match path.split_once('.') {
            None => self.remove(path),
            Some((head, rest)) => remove_nested(self.fields.get_mut(head)?, rest),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::with_capacity(self.fields.len());
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.to_json());
        }
        JsonValue::Object(map)
    }

    pub fn from_json_map(map: Map<String, JsonValue>) -> Self {
        map.into_iter()
            .map(|(key, value)| (key, Value::from(value)))
            .collect()
    }

    /// Converts a JSON value into a document; `None` unless it is an object.
    pub fn from_json(value: JsonValue) -> Option<Self> {
        match Value::from(value) {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }
}

fn resolve_parts(value: &Value, rest: &[&str]) -> Option<Value> {
    if rest.is_empty() {
        return Some(value.clone());
    }
    match value {
        Value::Document(doc) => doc
            .fields
            .get(rest[0])
            .and_then(|next| resolve_parts(next, &rest[1..])),
        Value::Array(items) => {
            let collected: Vec<Value> = items
                .iter()
                .filter(|item| matches!(item, Value::Document(_) | Value::Array(_)))
                .filter_map(|item| resolve_parts(item, rest))
                .collect();
            Some(Value::Array(collected))
        }
        _ => None,
    }
}

fn set_nested(slot: &mut Value, rest: &str, value: Value) {
    match slot {
        Value::Document(inner) => inner.set_path(rest, value),
        Value::Array(items) => {
            for item in items.iter_mut() {
                set_nested(item, rest, value.clone());
            }
        }
        other => {
            let mut inner = Document::new();
            inner.set_path(rest, value);
            *other = Value::Document(inner);
        }
    }
}

fn remove_nested(slot: &mut Value, rest: &str) -> Option<Value> {
    match slot {
        Value::Document(inner) => inner.remove_path(rest),
        Value::Array(items) => {
            let removed: Vec<Value> = items
                .iter_mut()
                .filter_map(|item| remove_nested(item, rest))
                .collect();
            (!removed.is_empty()).then_some(Value::Array(removed))
        }
        _ => None,
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len() && self.fields.iter().eq(other.fields.iter())
    }
}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fields.len().hash(state);
        for (key, value) in &self.fields {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let json = JsonValue::deserialize(deserializer)?;
        Document::from_json(json)
            .ok_or_else(|| serde::de::Error::custom("expected a JSON object for a document"))
    }
}

/// Builds a document from `key => value` pairs.
#[macro_export]
macro_rules! doc {
    () => {
        $crate::engine::types::Document::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut document = $crate::engine::types::Document::new();
        $(
            document.insert($key, $crate::engine::types::Value::from($value));
        )+
        document
    }};
}
