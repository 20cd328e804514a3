use serde_json::{Map, Value};
use std::fmt;

/// Identifier of a record, normalized to its string form so that `7` and `"7"` match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Ids may be written as JSON numbers or strings. Anything else is not an id.
    ///
    /// Integral floats are written without their fraction, so `42.0` and `42` are one id.
    pub fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(match n.as_f64() {
                Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => (f as i64).to_string(),
                _ => n.to_string(),
            })),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

/// Identity of one record. Two record references are the same record iff their keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub type_name: String,
    pub id: RecordId,
}

impl RecordKey {
    pub fn new(type_name: impl Into<String>, id: impl Into<RecordId>) -> Self {
        Self {
            type_name: type_name.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.type_name, self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: RecordKey,
    /// Insertion ordered (serde_json `preserve_order`).
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(key: RecordKey, fields: Map<String, Value>) -> Self {
        Self { key, fields }
    }

    pub fn type_name(&self) -> &str {
        &self.key.type_name
    }

    pub fn id(&self) -> &RecordId {
        &self.key.id
    }

    /// Field lookup. `id` and `type` are always answerable even if the fields map lacks them.
    pub fn get(&self, field: &str) -> Value {
        if let Some(v) = self.fields.get(field) {
            return v.clone();
        }
        match field {
            "id" => Value::String(self.key.id.to_string()),
            "type" => Value::String(self.key.type_name.clone()),
            _ => Value::Null,
        }
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }
}

/// Human display of a field value: strings unquoted, `null` empty, containers as compact JSON.
pub fn display_value(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
