use crate::model::ItemId;
use thiserror::Error;

/// Rejected query string. `code()` is the stable identifier reported to
/// clients; the `Display` text is the human-readable message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Limit must be a number")]
    InvalidLimit,
    #[error("Offset must be a number")]
    InvalidOffset,
    #[error("Clause {0} is not a valid filter clause")]
    InvalidFilterClause(String),
    #[error("Operator {0} is not a valid operator")]
    InvalidFilterOperator(String),
    #[error("Value {0} is not a valid number")]
    InvalidFilterValue(String),
}

impl ParseError {
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::InvalidLimit => "invalid-limit",
            ParseError::InvalidOffset => "invalid-offset",
            ParseError::InvalidFilterClause(_) => "invalid-filter-clause",
            ParseError::InvalidFilterOperator(_) => "invalid-filter-operator",
            ParseError::InvalidFilterValue(_) => "invalid-filter-value",
        }
    }
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("collection file is not an array of objects")]
    InvalidType,
    #[error("collection file is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("collection not found")]
    NotFound,
    #[error("collection could not be read: {0}")]
    Unknown(#[source] std::io::Error),
}

impl LoadError {
    pub fn code(&self) -> &'static str {
        match self {
            LoadError::InvalidType => "invalid-type",
            LoadError::InvalidJson(_) => "invalid-json",
            LoadError::NotFound => "not-found",
            LoadError::Unknown(_) => "unknown",
        }
    }
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("item must not carry an id, ids are assigned on insert")]
    ExtraId,
    #[error("collection already holds the maximum of {0} items")]
    MaxItems(usize),
    #[error("no id left to assign after {}", u64::MAX)]
    IdExhausted,
    #[error("item with id {0} not found")]
    NotFound(ItemId),
    #[error(transparent)]
    InvalidPatch(#[from] json_patch::PatchError),
    #[error("patch would turn item {0} into a non-object")]
    PatchNotObject(ItemId),
    #[error("collection could not be stored: {0}")]
    Store(#[source] std::io::Error),
}

impl WriteError {
    pub fn code(&self) -> &'static str {
        match self {
            WriteError::ExtraId => "extra-id",
            WriteError::MaxItems(_) => "max-items",
            WriteError::IdExhausted => "id-exhausted",
            WriteError::NotFound(_) => "not-found",
            WriteError::InvalidPatch(_) | WriteError::PatchNotObject(_) => "invalid-patch",
            WriteError::Store(_) => "store-error",
        }
    }
}
