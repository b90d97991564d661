use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jsondir_core::{LoadError, ParseError, WriteError};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize)]
pub struct ResponseError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Success envelope: `{"data": ...}`.
pub fn data<T: Serialize>(status: StatusCode, value: T) -> Response {
    (status, Json(json!({ "data": value }))).into_response()
}

/// Failure envelope: `{"errors": [{"code", "message", "meta"?}]}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: ResponseError,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            error: ResponseError {
                code: code.to_string(),
                message: message.into(),
                meta: None,
            },
        }
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.error.meta = Some(meta);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not-found", message)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "method-not-allowed",
            "Method not allowed on this path",
        )
    }

    pub fn invalid_body(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid-body", message)
    }

    pub fn collection(url_path: &str, err: LoadError) -> Self {
        match err {
            LoadError::NotFound => {
                Self::not_found(format!("Collection with path {url_path} not found"))
            }
            other => {
                tracing::error!(url_path, error = %other, "collection failed to load");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.code(), other.to_string())
            }
        }
    }

    pub fn write(url_path: &str, err: WriteError) -> Self {
        let status = match &err {
            WriteError::ExtraId => StatusCode::BAD_REQUEST,
            WriteError::MaxItems(_) | WriteError::IdExhausted => StatusCode::CONFLICT,
            WriteError::NotFound(id) => {
                return Self::not_found(format!(
                    "Item with id {id} not found in collection {url_path}"
                ))
            }
            WriteError::InvalidPatch(e) => {
                let operation = e.operation;
                return Self::new(StatusCode::UNPROCESSABLE_ENTITY, err.code(), err.to_string())
                    .with_meta(json!({ "operation": operation }));
            }
            WriteError::PatchNotObject(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WriteError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.code(), err.to_string())
    }
}

impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err.code(), err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_body(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "errors": [self.error] }))).into_response()
    }
}
