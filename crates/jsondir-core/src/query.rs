use crate::errors::ParseError;
use crate::value::{number_value, JsonObject, Primitive};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberOp {
    Lt,
    Gt,
    Lte,
    Gte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveOp {
    Eq,
    Neq,
}

/// Operator as written in a filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Number(NumberOp),
    Sub,
    Primitive(PrimitiveOp),
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Number(NumberOp::Lt) => "lt",
            Operator::Number(NumberOp::Gt) => "gt",
            Operator::Number(NumberOp::Lte) => "lte",
            Operator::Number(NumberOp::Gte) => "gte",
            Operator::Sub => "sub",
            Operator::Primitive(PrimitiveOp::Eq) => "eq",
            Operator::Primitive(PrimitiveOp::Neq) => "neq",
        }
    }
}

impl FromStr for Operator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "lt" => Operator::Number(NumberOp::Lt),
            "gt" => Operator::Number(NumberOp::Gt),
            "lte" => Operator::Number(NumberOp::Lte),
            "gte" => Operator::Number(NumberOp::Gte),
            "sub" => Operator::Sub,
            "eq" => Operator::Primitive(PrimitiveOp::Eq),
            "neq" => Operator::Primitive(PrimitiveOp::Neq),
            other => return Err(ParseError::InvalidFilterOperator(other.to_string())),
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator together with an operand of the type its family requires.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Number(NumberOp, f64),
    Sub(String),
    Primitive(PrimitiveOp, Primitive),
}

impl Condition {
    pub fn operator(&self) -> Operator {
        match self {
            Condition::Number(op, _) => Operator::Number(*op),
            Condition::Sub(_) => Operator::Sub,
            Condition::Primitive(op, _) => Operator::Primitive(*op),
        }
    }

    pub fn operand(&self) -> Value {
        match self {
            Condition::Number(_, n) => number_value(*n),
            Condition::Sub(s) => Value::String(s.clone()),
            Condition::Primitive(_, p) => p.to_value(),
        }
    }
}

/// A single `path:operator:value` filter condition.
///
/// Serialized as the triple `[["a","b"], "eq", value]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "RawClause", try_from = "RawClause")]
pub struct Clause {
    pub path: Vec<String>,
    pub condition: Condition,
}

impl Clause {
    pub fn new<P, S>(path: P, condition: Condition) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            condition,
        }
    }

    pub fn number(path: &str, op: NumberOp, value: f64) -> Self {
        Self::new(path.split('.'), Condition::Number(op, value))
    }

    pub fn sub(path: &str, value: &str) -> Self {
        Self::new(path.split('.'), Condition::Sub(value.to_string()))
    }

    pub fn primitive(path: &str, op: PrimitiveOp, value: Primitive) -> Self {
        Self::new(path.split('.'), Condition::Primitive(op, value))
    }

    /// Evaluates the clause against one item. Unresolvable paths, type
    /// mismatches and non-primitive values are all plain `false`.
    pub fn matches(&self, item: &JsonObject) -> bool {
        let Some(value) = value_at_path(item, &self.path) else {
            return false;
        };
        match (&self.condition, value) {
            (_, Value::Object(_) | Value::Array(_)) => false,
            (Condition::Number(op, rhs), Value::Number(n)) => {
                let Some(lhs) = n.as_f64() else {
                    return false;
                };
                match op {
                    NumberOp::Lt => lhs < *rhs,
                    NumberOp::Gt => lhs > *rhs,
                    NumberOp::Lte => lhs <= *rhs,
                    NumberOp::Gte => lhs >= *rhs,
                }
            }
            (Condition::Number(..), _) => false,
            (Condition::Sub(needle), Value::String(s)) => s.contains(needle.as_str()),
            (Condition::Sub(_), _) => false,
            (Condition::Primitive(PrimitiveOp::Eq, p), v) => p.matches(v),
            (Condition::Primitive(PrimitiveOp::Neq, p), v) => !p.matches(v),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawClause(Vec<String>, String, Value);

impl From<Clause> for RawClause {
    fn from(c: Clause) -> Self {
        RawClause(c.path, c.condition.operator().to_string(), c.condition.operand())
    }
}

impl TryFrom<RawClause> for Clause {
    type Error = ParseError;

    fn try_from(RawClause(path, op, value): RawClause) -> Result<Self, Self::Error> {
        let condition = match op.parse::<Operator>()? {
            Operator::Number(op) => value
                .as_f64()
                .map(|n| Condition::Number(op, n))
                .ok_or_else(|| ParseError::InvalidFilterValue(value.to_string()))?,
            Operator::Sub => match value {
                Value::String(s) => Condition::Sub(s),
                other => return Err(ParseError::InvalidFilterValue(other.to_string())),
            },
            Operator::Primitive(op) => Primitive::from_value(&value)
                .map(|p| Condition::Primitive(op, p))
                .ok_or_else(|| ParseError::InvalidFilterValue(value.to_string()))?,
        };
        Ok(Clause { path, condition })
    }
}

/// A conjunction of clauses.
pub type Filter = Vec<Clause>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Vec<String>>,
    /// Disjunction of filter groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

/// Walks nested objects along `path`. Traversal stops at anything that is
/// not an object.
pub fn value_at_path<'a>(item: &'a JsonObject, path: &[String]) -> Option<&'a Value> {
    let (first, rest) = match path.split_first() {
        Some(split) => split,
        None => return None,
    };
    let mut current = item.get(first)?;
    for key in rest {
        current = match current {
            Value::Object(map) => map.get(key)?,
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Array(_) => {
                return None
            }
        };
    }
    Some(current)
}

pub fn matches_filter(item: &JsonObject, filter: &[Clause]) -> bool {
    filter.iter().all(|clause| clause.matches(item))
}

pub fn matches_filters(item: &JsonObject, filters: &[Filter]) -> bool {
    filters.is_empty() || filters.iter().any(|f| matches_filter(item, f))
}

/// Keeps only the selected keys. Keys missing on the item are left out.
pub fn project(item: &JsonObject, select: &[String]) -> JsonObject {
    select
        .iter()
        .filter_map(|key| item.get(key).map(|v| (key.clone(), v.clone())))
        .collect()
}

/// Runs filter, select, offset and limit, always in that order.
pub fn exec_query(items: &[JsonObject], query: &Query) -> Vec<JsonObject> {
    let filters = query.filters.as_deref().unwrap_or_default();
    items
        .iter()
        .filter(|item| matches_filters(item, filters))
        .map(|item| match &query.select {
            Some(select) => project(item, select),
            None => item.clone(),
        })
        .skip(query.offset.unwrap_or(0))
        .take(query.limit.unwrap_or(usize::MAX))
        .collect()
}
