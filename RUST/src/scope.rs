use crate::record::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    #[default]
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    #[serde(default)]
    pub op: Op,
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Op::Eq, value)
    }

    pub fn matches(&self, record: &Record) -> bool {
        let actual = record.get(&self.field);
        match self.op {
            Op::Eq => values_equal(&actual, &self.value),
            Op::Ne => !values_equal(&actual, &self.value),
            Op::Gt => compare(&actual, &self.value) == Some(Ordering::Greater),
            Op::Gte => matches!(compare(&actual, &self.value), Some(Ordering::Greater | Ordering::Equal)),
            Op::Lt => compare(&actual, &self.value) == Some(Ordering::Less),
            Op::Lte => matches!(compare(&actual, &self.value), Some(Ordering::Less | Ordering::Equal)),
            Op::In => match &self.value {
                Value::Array(items) => items.iter().any(|v| values_equal(&actual, v)),
                other => values_equal(&actual, other),
            },
        }
    }
}

/// A restriction on which records are fetchable: an AND of conditions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope {
    pub conditions: Vec<Condition>,
}

impl Scope {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }
}

/// Apply scopes in order. Each scope narrows the result of the previous one.
pub fn apply_scopes<'a, I>(records: I, scopes: &[&Scope]) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .filter(|r| scopes.iter().all(|s| s.matches(r)))
        .collect()
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        // Ids and foreign keys show up as both numbers and strings.
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => n.to_string() == *s,
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
