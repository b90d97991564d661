use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

pub type JsonObject = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    Primitive,
    Object,
    Array,
}

impl JsonKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                JsonKind::Primitive
            }
            Value::Object(_) => JsonKind::Object,
            Value::Array(_) => JsonKind::Array,
        }
    }
}

pub fn is_primitive(value: &Value) -> bool {
    JsonKind::of(value) == JsonKind::Primitive
}

pub fn is_object(value: &Value) -> bool {
    JsonKind::of(value) == JsonKind::Object
}

pub fn is_array(value: &Value) -> bool {
    JsonKind::of(value) == JsonKind::Array
}

/// A JSON scalar. Numbers are held as doubles so that `1` and `1.0`
/// compare equal, which `serde_json::Number` does not do on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Primitive {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Primitive::Null),
            Value::Bool(b) => Some(Primitive::Bool(*b)),
            Value::Number(n) => n.as_f64().map(Primitive::Number),
            Value::String(s) => Some(Primitive::String(s.clone())),
            Value::Object(_) | Value::Array(_) => None,
        }
    }

    /// Strict equality against a JSON value: same type and same value.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Primitive::Null, Value::Null) => true,
            (Primitive::Bool(a), Value::Bool(b)) => a == b,
            (Primitive::Number(a), Value::Number(b)) => b.as_f64() == Some(*a),
            (Primitive::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Primitive::Null => Value::Null,
            Primitive::Bool(b) => Value::Bool(*b),
            Primitive::Number(n) => number_value(*n),
            Primitive::String(s) => Value::String(s.clone()),
        }
    }
}

/// Integral doubles become JSON integers (`30`, not `30.0`).
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}
