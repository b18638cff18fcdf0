mod error;
pub mod extractors;
mod handlers;
mod routes;
pub mod security;
mod state;

pub use error::{AppError, AppResult};
pub use state::AppState;

use crate::services::storage::StorageHandle;
use crate::{Config, Database};
use anyhow::Result;
use axum::middleware;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs.max(1));

    Router::new()
        .merge(routes::api_routes())
        .merge(routes::storage_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(middleware::from_fn(security::apply_security_headers)),
        )
        .with_state(state)
}

pub async fn serve(config: Config, db: Database, storage: StorageHandle, addr: &str) -> Result<()> {
    let state = Arc::new(AppState::new(config, db, storage));
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
