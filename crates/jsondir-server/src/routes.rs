use crate::metrics;
use crate::payload::{data, ApiError};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jsondir_core::{parse_search_params, ItemId};
use serde_json::{json, Value};

/// What an `/api/...` path addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Collection(String),
    Item(String, ItemId),
}

fn is_segment(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some('a'..='z'))
        && chars.all(|c| matches!(c, 'a'..='z' | '_' | '-'))
}

/// Parses the part after `/api/`: one or more `[a-z][a-z_-]*` segments,
/// optionally followed by a numeric id.
pub fn parse_target(path: &str) -> Option<Target> {
    let segments: Vec<&str> = path.split('/').collect();
    let (last, init) = segments.split_last()?;
    if !init.iter().all(|s| is_segment(s)) {
        return None;
    }
    if is_segment(last) {
        return Some(Target::Collection(format!("/api/{path}")));
    }
    if init.is_empty() || last.is_empty() || !last.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let id = last.parse::<ItemId>().ok()?;
    Some(Target::Item(format!("/api/{}", init.join("/")), id))
}

fn target(path: &str) -> Result<Target, ApiError> {
    parse_target(path).ok_or_else(|| ApiError::not_found(format!("No resource at /api/{path}")))
}

fn finish(op: &'static str, result: Result<Response, ApiError>) -> Response {
    metrics::record(op, result.is_ok());
    result.unwrap_or_else(IntoResponse::into_response)
}

fn object_body(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<jsondir_core::JsonObject, ApiError> {
    match body?.0 {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::invalid_body("Request body must be a JSON object")),
    }
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics_text() -> impl IntoResponse {
    (StatusCode::OK, metrics::render())
}

pub async fn list_collections(State(app): State<AppState>) -> Response {
    let _timer = metrics::OP_DURATION.with_label_values(&["discover"]).start_timer();
    let collections = app.collections.clone();
    let result = tokio::task::spawn_blocking(move || collections.discover())
        .await
        .map(|entries| data(StatusCode::OK, entries))
        .map_err(|e| {
            tracing::error!(error = %e, "discovery task failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "unknown", "Discovery failed")
        });
    finish("discover", result)
}

pub async fn get_resource(
    State(app): State<AppState>,
    Path(path): Path<String>,
    RawQuery(raw): RawQuery,
) -> Response {
    match target(&path) {
        Ok(Target::Collection(url_path)) => {
            let _timer = metrics::OP_DURATION.with_label_values(&["query"]).start_timer();
            finish("query", query_collection(&app, &url_path, raw.as_deref()).await)
        }
        Ok(Target::Item(url_path, id)) => {
            let _timer = metrics::OP_DURATION.with_label_values(&["get"]).start_timer();
            finish("get", get_item(&app, &url_path, id).await)
        }
        Err(e) => e.into_response(),
    }
}

async fn query_collection(
    app: &AppState,
    url_path: &str,
    raw: Option<&str>,
) -> Result<Response, ApiError> {
    let params = url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes());
    let query = parse_search_params(params)?;
    let collection = app
        .collections
        .load(url_path)
        .await
        .map_err(|e| ApiError::collection(url_path, e))?;
    Ok(data(StatusCode::OK, collection.query(&query)))
}

async fn get_item(app: &AppState, url_path: &str, id: ItemId) -> Result<Response, ApiError> {
    let collection = app
        .collections
        .load(url_path)
        .await
        .map_err(|e| ApiError::collection(url_path, e))?;
    match collection.find(id) {
        Some(item) => Ok(data(StatusCode::OK, item)),
        None => Err(ApiError::not_found(format!(
            "Item with id {id} not found in collection {url_path}"
        ))),
    }
}

pub async fn insert_item(
    State(app): State<AppState>,
    Path(path): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let _timer = metrics::OP_DURATION.with_label_values(&["insert"]).start_timer();
    finish("insert", insert(&app, &path, body).await)
}

async fn insert(
    app: &AppState,
    path: &str,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Target::Collection(url_path) = target(path)? else {
        return Err(ApiError::method_not_allowed());
    };
    let item = object_body(body)?;
    let mut collection = app
        .collections
        .load_for_write(&url_path)
        .await
        .map_err(|e| ApiError::collection(&url_path, e))?;
    let inserted = collection
        .insert(item)
        .await
        .map_err(|e| ApiError::write(&url_path, e))?;
    Ok(data(StatusCode::CREATED, json!({ "insertedId": inserted["id"] })))
}

pub async fn update_item(
    State(app): State<AppState>,
    Path(path): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let _timer = metrics::OP_DURATION.with_label_values(&["update"]).start_timer();
    finish("update", update(&app, &path, body).await)
}

async fn update(
    app: &AppState,
    path: &str,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Target::Item(url_path, id) = target(path)? else {
        return Err(ApiError::method_not_allowed());
    };
    let item = object_body(body)?;
    let mut collection = app
        .collections
        .load_for_write(&url_path)
        .await
        .map_err(|e| ApiError::collection(&url_path, e))?;
    let stored = collection
        .update(id, item)
        .await
        .map_err(|e| ApiError::write(&url_path, e))?;
    Ok(data(StatusCode::OK, stored))
}

pub async fn patch_item(
    State(app): State<AppState>,
    Path(path): Path<String>,
    body: Result<Json<json_patch::Patch>, JsonRejection>,
) -> Response {
    let _timer = metrics::OP_DURATION.with_label_values(&["patch"]).start_timer();
    finish("patch", patch(&app, &path, body).await)
}

async fn patch(
    app: &AppState,
    path: &str,
    body: Result<Json<json_patch::Patch>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Target::Item(url_path, id) = target(path)? else {
        return Err(ApiError::method_not_allowed());
    };
    let Json(ops) = body?;
    let mut collection = app
        .collections
        .load_for_write(&url_path)
        .await
        .map_err(|e| ApiError::collection(&url_path, e))?;
    let patched = collection
        .patch(id, &ops)
        .await
        .map_err(|e| ApiError::write(&url_path, e))?;
    Ok(data(StatusCode::OK, patched))
}

pub async fn delete_item(State(app): State<AppState>, Path(path): Path<String>) -> Response {
    let _timer = metrics::OP_DURATION.with_label_values(&["delete"]).start_timer();
    finish("delete", delete(&app, &path).await)
}

async fn delete(app: &AppState, path: &str) -> Result<Response, ApiError> {
    let Target::Item(url_path, id) = target(path)? else {
        return Err(ApiError::method_not_allowed());
    };
    let mut collection = app
        .collections
        .load_for_write(&url_path)
        .await
        .map_err(|e| ApiError::collection(&url_path, e))?;
    collection
        .delete(id)
        .await
        .map_err(|e| ApiError::write(&url_path, e))?;
    Ok(data(StatusCode::OK, json!({ "deletedId": id })))
}
