use crate::models::{MediaFile, StorageRef, UpdateMedia};
use crate::services::media::{self, DeleteMode, MediaError};
use crate::services::selection::Selection;
use crate::services::signing::{self, SignedUrlTtl};
use crate::services::{loader, mime};
use crate::web::error::AppResult;
use crate::web::extractors::AccessScope;
use crate::web::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn json_single<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "data": data,
    }))
}

#[derive(Serialize)]
struct SignedLink {
    url: Option<String>,
    expires_in: u64,
}

/// GET /api/v1/media
pub async fn list_media(
    State(state): State<Arc<AppState>>,
    AccessScope(scope): AccessScope,
) -> AppResult<Response> {
    let files = loader::load_library(
        &state.db,
        state.provider(),
        &state.catalog,
        &scope,
        &state.loader,
    )
    .await?;

    let total = files.len();
    let unsigned = files.iter().filter(|f| !f.is_previewable()).count();
    Ok(Json(serde_json::json!({
        "data": files,
        "meta": {
            "total": total,
            "unsigned": unsigned,
        }
    }))
    .into_response())
}

/// GET /api/v1/media/:id
pub async fn get_media(
    State(state): State<Arc<AppState>>,
    AccessScope(scope): AccessScope,
    Path(id): Path<String>,
) -> Result<Response, MediaError> {
    let record = media::get_media(&state.db, &scope, &id)?;

    let resolver = state.catalog.resolver().await;
    let location = media::locate(&record, &resolver);
    let mut file = MediaFile::from(record);
    file.signed_url = signing::materialize(
        state.provider(),
        &location.bucket_name,
        &location.file_path,
        SignedUrlTtl::Preview.seconds(&state.config.signing),
    )
    .await;
    file.bucket_name = Some(location.bucket_name);
    file.file_path = Some(location.file_path);

    Ok(json_single(file).into_response())
}

/// PATCH /api/v1/media/:id
pub async fn update_media(
    State(state): State<Arc<AppState>>,
    AccessScope(scope): AccessScope,
    Path(id): Path<String>,
    Json(update): Json<UpdateMedia>,
) -> Result<Response, MediaError> {
    let record = media::update_metadata(&state.db, &scope, &id, &update)?;
    Ok(json_single(record).into_response())
}

#[derive(Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub hard: bool,
}

impl DeleteParams {
    fn mode(&self) -> DeleteMode {
        if self.hard {
            DeleteMode::Hard
        } else {
            DeleteMode::Soft
        }
    }
}

/// DELETE /api/v1/media/:id
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    AccessScope(scope): AccessScope,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<Response, MediaError> {
    let resolver = state.catalog.resolver().await;
    media::delete_media(
        &state.db,
        state.provider(),
        &resolver,
        &scope,
        &id,
        params.mode(),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Selection,
    #[serde(default)]
    pub hard: bool,
}

/// POST /api/v1/media/bulk-delete
pub async fn bulk_delete(
    State(state): State<Arc<AppState>>,
    AccessScope(scope): AccessScope,
    Json(request): Json<BulkDeleteRequest>,
) -> Response {
    let mode = DeleteParams { hard: request.hard }.mode();
    let mut selection = request.ids;
    let resolver = state.catalog.resolver().await;
    let report = media::bulk_delete(
        &state.db,
        state.provider(),
        &resolver,
        &scope,
        &mut selection,
        mode,
    )
    .await;

    let status = if report.failed.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    (
        status,
        Json(serde_json::json!({
            "data": report,
            "remaining": selection,
        })),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct DownloadParams {
    #[serde(default)]
    pub force: bool,
}

/// GET /api/v1/media/:id/download
pub async fn download(
    State(state): State<Arc<AppState>>,
    AccessScope(scope): AccessScope,
    Path(id): Path<String>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, MediaError> {
    let resolver = state.catalog.resolver().await;

    if params.force {
        let (record, data) =
            media::fetch_blob(&state.db, state.provider(), &resolver, &scope, &id).await?;
        let content_type = if record.content_type.is_empty() {
            mime::content_type_for(&record.filename).to_string()
        } else {
            record.content_type.clone()
        };
        let disposition = format!(
            "attachment; filename=\"{}\"",
            record.filename.replace(['"', '\\', '\r', '\n'], "_")
        );
        return Ok((
            [
                (header::CONTENT_TYPE, content_type),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            data,
        )
            .into_response());
    }

    let ttl = SignedUrlTtl::Download.seconds(&state.config.signing);
    let url = media::signed_link(&state.db, state.provider(), &resolver, &scope, &id, ttl).await?;
    Ok(json_single(SignedLink {
        url,
        expires_in: ttl,
    })
    .into_response())
}

/// GET /api/v1/media/:id/share
pub async fn share_link(
    State(state): State<Arc<AppState>>,
    AccessScope(scope): AccessScope,
    Path(id): Path<String>,
) -> Result<Response, MediaError> {
    let resolver = state.catalog.resolver().await;
    let ttl = SignedUrlTtl::Preview.seconds(&state.config.signing);
    let url = media::signed_link(&state.db, state.provider(), &resolver, &scope, &id, ttl).await?;
    Ok(json_single(SignedLink {
        url,
        expires_in: ttl,
    })
    .into_response())
}

/// GET /api/v1/buckets
pub async fn list_buckets(
    State(state): State<Arc<AppState>>,
    AccessScope(_scope): AccessScope,
) -> Result<Response, MediaError> {
    let buckets = state.catalog.buckets().await?;
    Ok(json_single(buckets).into_response())
}

#[derive(Deserialize)]
pub struct ResolveParams {
    pub reference: String,
}

/// GET /api/v1/resolve
pub async fn resolve_reference(
    State(state): State<Arc<AppState>>,
    AccessScope(_scope): AccessScope,
    Query(params): Query<ResolveParams>,
) -> Json<serde_json::Value> {
    let resolver = state.catalog.resolver().await;
    let location: StorageRef = resolver.resolve(&params.reference);
    json_single(location)
}
