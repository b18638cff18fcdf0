use super::handlers;
use super::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/media", get(handlers::api::list_media))
        .route(
            "/api/v1/media/bulk-delete",
            post(handlers::api::bulk_delete),
        )
        .route(
            "/api/v1/media/:id",
            get(handlers::api::get_media)
                .patch(handlers::api::update_media)
                .delete(handlers::api::delete_media),
        )
        .route(
            "/api/v1/media/:id/download",
            get(handlers::api::download),
        )
        .route("/api/v1/media/:id/share", get(handlers::api::share_link))
        .route("/api/v1/buckets", get(handlers::api::list_buckets))
        .route("/api/v1/resolve", get(handlers::api::resolve_reference))
}

pub fn storage_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/storage/v1/object/sign/:bucket/*path",
        get(handlers::storage::serve_signed_object),
    )
}
