use crate::models::{MediaRecord, Scope, StorageRef, UpdateMedia};
use crate::services::resolver::PathResolver;
use crate::services::selection::Selection;
use crate::services::signing;
use crate::services::storage::{StorageError, StorageProvider};
use crate::Database;
use anyhow::{bail, Result};
use serde::Serialize;
use thiserror::Error;

const RECORD_COLUMNS: &str = "id, filename, file_url, content_type, file_size, alt_text, category, uploaded_at, user_id, deleted_at, bucket_name, file_path";

/// Why a media action failed, decided where the cause is known.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum MediaError {
    #[error("session expired")]
    AuthExpired,
    #[error("permission denied")]
    PermissionDenied,
    #[error("file not found")]
    NotFound,
    #[error("{0}")]
    Unknown(String),
}

impl MediaError {
    /// Text for the toast shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AuthExpired => "Your session has expired. Please sign in again.",
            Self::PermissionDenied => "You do not have permission to modify this file.",
            Self::NotFound => "This file was already deleted.",
            Self::Unknown(_) => "Something went wrong. Please try again.",
        }
    }
}

impl From<StorageError> for MediaError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unauthorized(_) => Self::AuthExpired,
            StorageError::Forbidden(_) => Self::PermissionDenied,
            StorageError::NotFound { .. } => Self::NotFound,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for MediaError {
    fn from(err: anyhow::Error) -> Self {
        Self::Unknown(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// Mark `deleted_at`; the object stays in storage.
    #[default]
    Soft,
    /// Remove the object, then the row.
    Hard,
}

/// Metadata half of an upload.
#[derive(Debug, Clone, Default)]
pub struct NewMediaRecord {
    pub id: Option<String>,
    pub filename: String,
    pub file_url: String,
    pub content_type: String,
    pub file_size: i64,
    pub alt_text: Option<String>,
    pub category: Option<String>,
    pub user_id: Option<String>,
    pub location: Option<StorageRef>,
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<MediaRecord> {
    Ok(MediaRecord {
        id: row.get(0)?,
        filename: row.get(1)?,
        file_url: row.get(2)?,
        content_type: row.get(3)?,
        file_size: row.get(4)?,
        alt_text: row.get(5)?,
        category: row.get(6)?,
        uploaded_at: row.get(7)?,
        user_id: row.get(8)?,
        deleted_at: row.get(9)?,
        bucket_name: row.get(10)?,
        file_path: row.get(11)?,
    })
}

pub fn insert_record(db: &Database, new: &NewMediaRecord) -> Result<MediaRecord> {
    if new.filename.trim().is_empty() {
        bail!("filename must not be empty");
    }
    if new.file_url.trim().is_empty() {
        bail!("file_url must not be empty");
    }

    let id = new
        .id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let (bucket_name, file_path) = match &new.location {
        Some(loc) => (Some(loc.bucket_name.as_str()), Some(loc.file_path.as_str())),
        None => (None, None),
    };

    let conn = db.get()?;
    conn.execute(
        "INSERT INTO media_files (id, filename, file_url, content_type, file_size, alt_text, category, user_id, bucket_name, file_path)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        rusqlite::params![
            id,
            new.filename,
            new.file_url,
            new.content_type,
            new.file_size,
            new.alt_text,
            new.category,
            new.user_id,
            bucket_name,
            file_path,
        ],
    )?;

    get_record(db, &id)?.ok_or_else(|| anyhow::anyhow!("inserted media row {} vanished", id))
}

/// Live rows visible to `scope`, newest first.
pub fn list_records(db: &Database, scope: &Scope) -> Result<Vec<MediaRecord>> {
    let conn = db.get()?;
    let records = match scope.user_id() {
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM media_files WHERE deleted_at IS NULL ORDER BY uploaded_at DESC, rowid DESC",
                RECORD_COLUMNS
            ))?;
            let rows = stmt
                .query_map([], row_to_record)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
        Some(user_id) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM media_files WHERE deleted_at IS NULL AND user_id = ? ORDER BY uploaded_at DESC, rowid DESC",
                RECORD_COLUMNS
            ))?;
            let rows = stmt
                .query_map([user_id], row_to_record)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
    };
    Ok(records)
}

/// Any row with this id, including soft-deleted ones.
pub fn get_record(db: &Database, id: &str) -> Result<Option<MediaRecord>> {
    let conn = db.get()?;
    let record = conn
        .query_row(
            &format!("SELECT {} FROM media_files WHERE id = ?", RECORD_COLUMNS),
            [id],
            row_to_record,
        )
        .ok();
    Ok(record)
}

fn get_live_record(db: &Database, id: &str) -> Result<MediaRecord, MediaError> {
    match get_record(db, id)? {
        Some(record) if record.deleted_at.is_none() => Ok(record),
        _ => Err(MediaError::NotFound),
    }
}

fn check_owner(record: &MediaRecord, scope: &Scope) -> Result<(), MediaError> {
    match scope.user_id() {
        None => Ok(()),
        Some(user_id) if record.user_id.as_deref() == Some(user_id) => Ok(()),
        Some(_) => Err(MediaError::PermissionDenied),
    }
}

/// A live row `scope` may act on.
pub fn get_media(db: &Database, scope: &Scope, id: &str) -> Result<MediaRecord, MediaError> {
    let record = get_live_record(db, id)?;
    check_owner(&record, scope)?;
    Ok(record)
}

pub fn update_metadata(
    db: &Database,
    scope: &Scope,
    id: &str,
    update: &UpdateMedia,
) -> Result<MediaRecord, MediaError> {
    let record = get_media(db, scope, id)?;

    if update.is_empty() {
        return Ok(record);
    }
    if let Some(name) = &update.filename {
        if name.trim().is_empty() {
            return Err(MediaError::Unknown("filename must not be empty".to_string()));
        }
    }

    let conn = db.get()?;
    conn.execute(
        "UPDATE media_files SET filename = COALESCE(?1, filename), alt_text = COALESCE(?2, alt_text), category = COALESCE(?3, category) WHERE id = ?4",
        rusqlite::params![
            update.filename.as_deref().map(str::trim),
            update.alt_text,
            update.category,
            id
        ],
    )
    .map_err(|e| MediaError::Unknown(e.to_string()))?;

    get_live_record(db, id)
}

/// Where the row's object lives: persisted columns first, then the resolver.
pub fn locate(record: &MediaRecord, resolver: &PathResolver) -> StorageRef {
    record
        .persisted_ref()
        .unwrap_or_else(|| resolver.resolve(&record.file_url))
}

pub async fn delete_media(
    db: &Database,
    provider: &dyn StorageProvider,
    resolver: &PathResolver,
    scope: &Scope,
    id: &str,
    mode: DeleteMode,
) -> Result<(), MediaError> {
    // A hard delete also purges rows that were soft-deleted earlier.
    let record = match mode {
        DeleteMode::Soft => get_live_record(db, id)?,
        DeleteMode::Hard => get_record(db, id)?.ok_or(MediaError::NotFound)?,
    };
    check_owner(&record, scope)?;

    match mode {
        DeleteMode::Soft => {
            let conn = db.get()?;
            let changed = conn
                .execute(
                    "UPDATE media_files SET deleted_at = CURRENT_TIMESTAMP WHERE id = ? AND deleted_at IS NULL",
                    [id],
                )
                .map_err(|e| MediaError::Unknown(e.to_string()))?;
            if changed == 0 {
                return Err(MediaError::NotFound);
            }
        }
        DeleteMode::Hard => {
            let location = locate(&record, resolver);
            match provider
                .remove_objects(&location.bucket_name, &[location.file_path.clone()])
                .await
            {
                Ok(()) => {}
                Err(StorageError::NotFound { .. }) => {
                    tracing::warn!("Object {} already gone; removing row {}", location, id);
                }
                Err(e) => {
                    tracing::error!("Failed to remove {} from storage: {}", location, e);
                    return Err(e.into());
                }
            }
            let conn = db.get()?;
            conn.execute("DELETE FROM media_files WHERE id = ?", [id])
                .map_err(|e| MediaError::Unknown(e.to_string()))?;
        }
    }

    tracing::info!("Deleted media {} ({:?})", id, mode);
    Ok(())
}

#[derive(Debug, Default, Serialize)]
pub struct BulkDeleteReport {
    pub deleted: Vec<String>,
    pub failed: Vec<BulkDeleteFailure>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteFailure {
    pub id: String,
    pub error: MediaError,
    pub message: &'static str,
}

/// Delete every selected id. One failure does not stop the rest; deleted ids
/// leave the selection.
pub async fn bulk_delete(
    db: &Database,
    provider: &dyn StorageProvider,
    resolver: &PathResolver,
    scope: &Scope,
    selection: &mut Selection,
    mode: DeleteMode,
) -> BulkDeleteReport {
    let mut report = BulkDeleteReport::default();
    for id in selection.ids() {
        match delete_media(db, provider, resolver, scope, &id, mode).await {
            Ok(()) => report.deleted.push(id),
            Err(error) => {
                tracing::warn!("Bulk delete of {} failed: {}", id, error);
                report.failed.push(BulkDeleteFailure {
                    id,
                    message: error.user_message(),
                    error,
                });
            }
        }
    }
    for id in &report.deleted {
        selection.deselect(id);
    }
    report
}

/// Signed link for one file, `None` when signing failed.
pub async fn signed_link(
    db: &Database,
    provider: &dyn StorageProvider,
    resolver: &PathResolver,
    scope: &Scope,
    id: &str,
    ttl_secs: u64,
) -> Result<Option<String>, MediaError> {
    let record = get_media(db, scope, id)?;
    let location = locate(&record, resolver);
    Ok(signing::materialize(provider, &location.bucket_name, &location.file_path, ttl_secs).await)
}

/// File bytes for a forced download.
pub async fn fetch_blob(
    db: &Database,
    provider: &dyn StorageProvider,
    resolver: &PathResolver,
    scope: &Scope,
    id: &str,
) -> Result<(MediaRecord, Vec<u8>), MediaError> {
    let record = get_media(db, scope, id)?;
    let location = locate(&record, resolver);
    let data = provider
        .download(&location.bucket_name, &location.file_path)
        .await?;
    Ok((record, data))
}

/// Write resolved locations into rows that only have `file_url`.
/// Returns the rows updated, or that would be with `dry_run`.
pub fn backfill_locations(
    db: &Database,
    resolver: &PathResolver,
    dry_run: bool,
) -> Result<Vec<(String, StorageRef)>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM media_files WHERE bucket_name IS NULL OR file_path IS NULL OR bucket_name = '' OR file_path = ''",
        RECORD_COLUMNS
    ))?;
    let pending = stmt
        .query_map([], row_to_record)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut updated = Vec::with_capacity(pending.len());
    for record in pending {
        let location = resolver.resolve(&record.file_url);
        if !dry_run {
            conn.execute(
                "UPDATE media_files SET bucket_name = ?1, file_path = ?2 WHERE id = ?3",
                rusqlite::params![location.bucket_name, location.file_path, record.id],
            )?;
        }
        updated.push((record.id, location));
    }

    if !dry_run {
        tracing::info!("Backfilled {} media location(s)", updated.len());
    }
    Ok(updated)
}
