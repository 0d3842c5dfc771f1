use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::Deref;

/// A request or workflow document as delivered by the request manager.
///
/// The layout is heterogeneous: top-level request fields mixed with one
/// object per chained task (`Task1`, `Task2`, ... or `Step1`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawDocument(pub Map<String, Value>);

impl RawDocument {
    pub fn new(fields: Map<String, Value>) -> Self {
        RawDocument(fields)
    }
}

impl Deref for RawDocument {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Map<String, Value>> for RawDocument {
    fn from(fields: Map<String, Value>) -> Self {
        RawDocument(fields)
    }
}

impl TryFrom<Value> for RawDocument {
    type Error = crate::error::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Ok(RawDocument(serde_json::from_value(value)?))
    }
}

/// Typed reads over loosely typed request fields.
///
/// Request documents are produced by several generations of tooling, so the
/// same field shows up as a scalar or a list, and booleans or numbers
/// sometimes arrive as strings.
pub trait FieldAccess {
    fn field(&self, key: &str) -> Option<&Value>;

    fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    fn object_field(&self, key: &str) -> Option<&Map<String, Value>> {
        self.field(key).and_then(Value::as_object)
    }

    /// Always a list: a scalar becomes a singleton, empty strings are dropped.
    fn string_list(&self, key: &str) -> Vec<String> {
        match self.field(key) {
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).filter(|s| !s.is_empty()).map(str::to_string).collect(),
            _ => Vec::new(),
        }
    }

    /// `true` for a JSON `true` or the strings "True"/"true".
    fn flag(&self, key: &str) -> bool {
        match self.field(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "True" || s == "true",
            _ => false,
        }
    }

    fn f64_field(&self, key: &str) -> Option<f64> {
        self.field(key).and_then(value_as_f64)
    }

    fn u64_field(&self, key: &str) -> Option<u64> {
        match self.field(key)? {
            Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FieldAccess for Map<String, Value> {
    fn field(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

impl FieldAccess for RawDocument {
    fn field(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
