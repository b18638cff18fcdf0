use crate::services::mime;
use crate::services::storage::{StorageError, StorageProvider};
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct SignedParams {
    pub token: String,
    pub expires: i64,
}

/// GET /storage/v1/object/sign/:bucket/*path
///
/// Serves objects of the local provider behind the links it signs.
pub async fn serve_signed_object(
    State(state): State<Arc<AppState>>,
    Path((bucket, path)): Path<(String, String)>,
    Query(params): Query<SignedParams>,
) -> Response {
    let Some(local) = state.storage.local.as_ref() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let path = path.trim_start_matches('/');

    if let Err(e) = local.verify_signed(&bucket, path, &params.token, params.expires) {
        tracing::debug!("Rejected signed URL for {}/{}: {}", bucket, path, e);
        return (StatusCode::FORBIDDEN, "Invalid or expired link").into_response();
    }

    match local.download(&bucket, path).await {
        Ok(data) => (
            [
                (header::CONTENT_TYPE, mime::content_type_for(path).to_string()),
                (header::CACHE_CONTROL, "private, max-age=300".to_string()),
            ],
            data,
        )
            .into_response(),
        Err(StorageError::NotFound { .. }) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!("Failed to read {}/{}: {}", bucket, path, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
