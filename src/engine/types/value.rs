use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value as JsonValue};

use super::document::Document;

/// Type bracket of a value, ordered the way MongoDB orders BSON types when
/// comparing values of different types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeClass {
    Null,
    Number,
    String,
    Document,
    Array,
    Boolean,
    Date,
}

impl TypeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeClass::Null => "null",
            TypeClass::Number => "number",
            TypeClass::String => "string",
            TypeClass::Document => "object",
            TypeClass::Array => "array",
            TypeClass::Boolean => "bool",
            TypeClass::Date => "date",
        }
    }
}

impl fmt::Display for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A telemetry value. Mirrors the BSON subset the tabular data endpoint returns.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(DateTime<Utc>),
    Array(Vec<Value>),
    Document(Document),
}

impl Value {
    pub fn type_class(&self) -> TypeClass {
        match self {
            Value::Null => TypeClass::Null,
            Value::Bool(_) => TypeClass::Boolean,
            Value::Int(_) | Value::Float(_) => TypeClass::Number,
            Value::String(_) => TypeClass::String,
            Value::Date(_) => TypeClass::Date,
            Value::Array(_) => TypeClass::Array,
            Value::Document(_) => TypeClass::Document,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view; floats qualify only when they carry no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Date(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Aggregation truthiness: null, false and numeric zero are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            _ => true,
        }
    }

    /// Canonical string form used as a bucket key. Numerically equal ints and
    /// floats produce the same key.
    pub fn canonical_key(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut String) {
        match self {
            Value::Null => out.push_str("n:"),
            Value::Bool(b) => {
                out.push_str("b:");
                out.push_str(if *b { "1" } else { "0" });
            }
            Value::Int(i) => {
                out.push_str("d:");
                out.push_str(&i.to_string());
            }
            Value::Float(f) => {
                out.push_str("d:");
                if f.fract() == 0.0 && f.abs() < 9.0e15 {
                    out.push_str(&(*f as i64).to_string());
                } else {
                    out.push_str(&f.to_string());
                }
            }
            Value::String(s) => {
                out.push_str("s:");
                out.push_str(&serde_json::to_string(s).unwrap_or_default());
            }
            Value::Date(dt) => {
                out.push_str("t:");
                out.push_str(&dt.timestamp_millis().to_string());
            }
            Value::Array(items) => {
                out.push('[');
                for item in items {
                    item.write_canonical(out);
                    out.push(',');
                }
                out.push(']');
            }
            Value::Document(doc) => {
                out.push('{');
                for (key, value) in doc.iter() {
                    out.push_str(&serde_json::to_string(key).unwrap_or_default());
                    out.push('=');
                    value.write_canonical(out);
                    out.push(',');
                }
                out.push('}');
            }
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::Number(Number::from(*i)),
            Value::Float(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Date(dt) => {
                let mut map = Map::new();
                map.insert(
                    "$date".to_string(),
                    JsonValue::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
                );
                JsonValue::Object(map)
            }
            Value::Array(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Document(doc) => doc.to_json(),
        }
    }

    /// Decodes an Extended JSON `{"$date": ...}` wrapper.
    fn date_from_extended_json(map: &Map<String, JsonValue>) -> Option<DateTime<Utc>> {
        if map.len() != 1 {
            return None;
        }
        match map.get("$date")? {
            JsonValue::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            JsonValue::Number(n) => n
                .as_i64()
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            JsonValue::Object(inner) => match inner.get("$numberLong")? {
                JsonValue::String(s) => s
                    .parse::<i64>()
                    .ok()
                    .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
                _ => None,
            },
            _ => None,
        }
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(num) => {
                if let Some(i) = num.as_i64() {
                    Value::Int(i)
                } else {
                    // u64 beyond i64::MAX and true floats
                    Value::Float(num.as_f64().unwrap_or(0.0))
                }
            }
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => match Value::date_from_extended_json(&map) {
                Some(dt) => Value::Date(dt),
                None => Value::Document(Document::from_json_map(map)),
            },
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::Date(dt) => dt.timestamp_millis().hash(state),
            Value::Array(items) => items.hash(state),
            Value::Document(doc) => doc.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let json = JsonValue::deserialize(deserializer)?;
        Ok(Value::from(json))
    }
}
