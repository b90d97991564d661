use crate::value::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

pub type ItemId = u64;

/// A collection element: a JSON object expected to carry a numeric `id`.
pub type CollectionItem = JsonObject;

/// One collection found by directory discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEntry {
    pub path: PathBuf,
    pub url_path: String,
}

/// The item's `id` when it is a non-negative integer (`3` or `3.0`).
pub fn item_id(item: &CollectionItem) -> Option<ItemId> {
    match item.get("id")? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(integral_id)),
        _ => None,
    }
}

/// Lenient id used when deriving the last assigned id: numeric strings
/// count as well.
pub fn numeric_id(item: &CollectionItem) -> Option<ItemId> {
    match item.get("id")? {
        Value::String(s) => crate::util::parse_number(s).and_then(integral_id),
        _ => item_id(item),
    }
}

fn integral_id(n: f64) -> Option<ItemId> {
    (n >= 0.0 && n.fract() == 0.0 && n < u64::MAX as f64).then_some(n as ItemId)
}
