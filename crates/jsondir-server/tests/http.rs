use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use jsondir_server::{app, AppState};
use jsondir_storage::{CollectionOptions, Collections, PersistentStorage};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn fixture(max_items: usize) -> (TempDir, Router) {
    let dir = tempfile::tempdir().expect("temp dir");
    let api = dir.path().join("api");
    std::fs::create_dir_all(api.join("customers")).unwrap();
    std::fs::create_dir_all(dir.path().join("assets")).unwrap();
    std::fs::write(
        api.join("products.json"),
        "[\n  {\n    \"id\": 0,\n    \"name\": \"Apples\"\n  },\n  {\n    \"id\": 1,\n    \"name\": \"Oranges\"\n  }\n]\n",
    )
    .unwrap();
    std::fs::write(
        api.join("customers").join("items.json"),
        json!([{"id": 0, "name": "John Doe"}, {"id": 1, "name": "Will Smith"}]).to_string(),
    )
    .unwrap();
    std::fs::write(
        api.join("people.json"),
        json!([
            {"id": 1, "name": "John", "age": 25},
            {"id": 2, "name": "Jane", "age": 30},
            {"id": 3, "name": "Bob", "age": 35},
            {"id": 4, "name": "Alice", "age": 40},
        ])
        .to_string(),
    )
    .unwrap();
    std::fs::write(api.join("broken.json"), "{ not json").unwrap();
    std::fs::write(dir.path().join("assets").join("logo.txt"), "logo").unwrap();

    let options = CollectionOptions::new(dir.path(), Arc::new(PersistentStorage::new()))
        .with_max_items(max_items);
    let router = app(AppState::new(Collections::new(options)));
    (dir, router)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).expect("valid request"))
        .await
        .expect("request must be served");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    if bytes.is_empty() {
        return (status, Value::Null);
    }
    let json = serde_json::from_slice::<Value>(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn read_file(path: &Path) -> String {
    std::fs::read_to_string(path).expect("read backing file")
}

#[tokio::test]
async fn get_file_and_directory_collections() {
    let (_dir, app) = fixture(1000);
    let (status, body) = send(&app, Method::GET, "/api/products", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"data": [{"id": 0, "name": "Apples"}, {"id": 1, "name": "Oranges"}]})
    );

    let (status, body) = send(&app, Method::GET, "/api/customers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][1], json!({"id": 1, "name": "Will Smith"}));
}

#[tokio::test]
async fn missing_collection_and_item_are_404() {
    let (_dir, app) = fixture(1000);
    let (status, body) = send(&app, Method::GET, "/api/non-existing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"errors": [{
            "code": "not-found",
            "message": "Collection with path /api/non-existing not found",
        }]})
    );

    let (status, body) = send(&app, Method::GET, "/api/products/2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["errors"][0]["message"],
        json!("Item with id 2 not found in collection /api/products")
    );

    let (status, _) = send(&app, Method::GET, "/api/Products", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_single_item() {
    let (_dir, app) = fixture(1000);
    let (status, body) = send(&app, Method::GET, "/api/products/0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": {"id": 0, "name": "Apples"}}));
}

#[tokio::test]
async fn query_parameters_drive_the_engine() {
    let (_dir, app) = fixture(1000);
    let uri = "/api/people?limit=1&select=name,age&offset=1&filter=age:gt:30";
    let (status, body) = send(&app, Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": [{"name": "Alice", "age": 40}]}));

    let uri = "/api/people?filter=name:eq:John&filter=age:gt:35&select=id";
    let (_, body) = send(&app, Method::GET, uri, None).await;
    assert_eq!(body, json!({"data": [{"id": 1}, {"id": 4}]}));

    let uri = "/api/people?filter=name:sub:o,age:gte:30";
    let (_, body) = send(&app, Method::GET, uri, None).await;
    assert_eq!(body["data"], json!([{"id": 3, "name": "Bob", "age": 35}]));
}

#[tokio::test]
async fn bad_query_parameters_are_400() {
    let (_dir, app) = fixture(1000);
    let (status, body) = send(&app, Method::GET, "/api/people?limit=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"errors": [{"code": "invalid-limit", "message": "Limit must be a number"}]})
    );
    let (status, body) = send(&app, Method::GET, "/api/people?filter=name:John", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["code"], json!("invalid-filter-clause"));
}

#[tokio::test]
async fn corrupt_collection_is_500() {
    let (_dir, app) = fixture(1000);
    let (status, body) = send(&app, Method::GET, "/api/broken", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["errors"][0]["code"], json!("invalid-json"));
}

#[tokio::test]
async fn insert_reports_new_id_and_persists() {
    let (dir, app) = fixture(1000);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({"name": "Bananas"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"data": {"insertedId": 2}}));

    let (_, body) = send(&app, Method::GET, "/api/products/2", None).await;
    assert_eq!(body["data"], json!({"id": 2, "name": "Bananas"}));
    let text = read_file(&dir.path().join("api").join("products.json"));
    assert!(text.ends_with("  {\n    \"id\": 2,\n    \"name\": \"Bananas\"\n  }\n]\n"));
}

#[tokio::test]
async fn insert_validation() {
    let (dir, app) = fixture(2);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({"id": 5, "name": "Kiwi"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["code"], json!("extra-id"));

    let (status, body) = send(&app, Method::POST, "/api/products", Some(json!([1, 2]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["code"], json!("invalid-body"));

    let before = read_file(&dir.path().join("api").join("products.json"));
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({"name": "Kiwi"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["errors"][0]["code"], json!("max-items"));
    assert_eq!(read_file(&dir.path().join("api").join("products.json")), before);

    let (status, body) = send(&app, Method::POST, "/api/products/1", Some(json!({}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["errors"][0]["code"], json!("method-not-allowed"));
}

#[tokio::test]
async fn update_replaces_item() {
    let (dir, app) = fixture(1000);
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/customers/1",
        Some(json!({"name": "Will Smith Jr.", "id": 40})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"name": "Will Smith Jr.", "id": 1}));

    let before = read_file(&dir.path().join("api").join("customers").join("items.json"));
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/customers/9",
        Some(json!({"name": "Nobody"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errors"][0]["code"], json!("not-found"));
    assert_eq!(
        read_file(&dir.path().join("api").join("customers").join("items.json")),
        before
    );
}

#[tokio::test]
async fn patch_applies_json_patch() {
    let (_dir, app) = fixture(1000);
    let ops = json!([
        {"op": "test", "path": "/name", "value": "Apples"},
        {"op": "add", "path": "/colour", "value": "red"},
    ]);
    let (status, body) = send(&app, Method::PATCH, "/api/products/0", Some(ops)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"id": 0, "name": "Apples", "colour": "red"}));

    let ops = json!([
        {"op": "add", "path": "/stock", "value": 1},
        {"op": "test", "path": "/name", "value": "Pears"},
    ]);
    let (status, body) = send(&app, Method::PATCH, "/api/products/0", Some(ops)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["code"], json!("invalid-patch"));
    assert_eq!(body["errors"][0]["meta"], json!({"operation": 1}));

    let (_, body) = send(&app, Method::GET, "/api/products/0", None).await;
    assert_eq!(body["data"], json!({"id": 0, "name": "Apples", "colour": "red"}));

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/products/0",
        Some(json!({"name": "not a patch"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["code"], json!("invalid-body"));
}

#[tokio::test]
async fn delete_removes_item() {
    let (_dir, app) = fixture(1000);
    let (status, body) = send(&app, Method::DELETE, "/api/products/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": {"deletedId": 1}}));
    let (status, _) = send(&app, Method::DELETE, "/api/products/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = send(&app, Method::GET, "/api/products", None).await;
    assert_eq!(body["data"], json!([{"id": 0, "name": "Apples"}]));
    let (status, _) = send(&app, Method::DELETE, "/api/products", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn listing_discovers_collections() {
    let (_dir, app) = fixture(1000);
    let (status, body) = send(&app, Method::GET, "/api", None).await;
    assert_eq!(status, StatusCode::OK);
    let urls: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["urlPath"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        urls,
        vec!["/api/broken", "/api/customers", "/api/people", "/api/products"]
    );
}

#[tokio::test]
async fn cors_assets_health_and_metrics() {
    let (_dir, app) = fixture(1000);
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/products")
                .header(header::ORIGIN, "https://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/assets/logo.txt").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"logo");

    let (status, _) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);

    send(&app, Method::GET, "/api/products", None).await;
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let text = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(text.to_vec()).unwrap();
    assert!(text.contains("jsondir_ops_total"));
}
