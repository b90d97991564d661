pub mod config;
pub mod metrics;
pub mod payload;
pub mod routes;

use axum::routing::get;
use axum::Router;
use jsondir_storage::Collections;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub collections: Collections,
}

impl AppState {
    pub fn new(collections: Collections) -> Self {
        Self { collections }
    }
}

pub fn app(state: AppState) -> Router {
    let assets = ServeDir::new(state.collections.options().base_dir.join("assets"));
    Router::new()
        .route("/health", get(routes::health))
        .route("/metrics", get(routes::metrics_text))
        .route("/api", get(routes::list_collections))
        .route(
            "/api/*path",
            get(routes::get_resource)
                .post(routes::insert_item)
                .put(routes::update_item)
                .patch(routes::patch_item)
                .delete(routes::delete_item),
        )
        .nest_service("/assets", assets)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
