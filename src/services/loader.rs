//! Builds the media library listing.
//!
//! Database rows are located and signed ten at a time. When an admin view
//! finds no rows at all, every bucket's object table is listed instead and
//! signed five at a time with a short pause between batches. Batches run one
//! after another; files inside a batch are signed concurrently.

use crate::config::Config;
use crate::models::{MediaFile, MediaRecord, MediaSource, Scope, StorageBucket, StorageObject};
use crate::services::buckets::BucketCatalog;
use crate::services::media;
use crate::services::mime;
use crate::services::resolver::PathResolver;
use crate::services::signing;
use crate::services::storage::StorageProvider;
use crate::Database;
use anyhow::Result;
use futures::future::join_all;
use std::collections::HashSet;
use std::time::Duration;

/// Supabase keeps one of these in every otherwise empty folder.
const FOLDER_PLACEHOLDER: &str = ".emptyFolderPlaceholder";

#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub db_batch_size: usize,
    pub scan_batch_size: usize,
    pub scan_batch_delay: Duration,
    pub scan_page_size: usize,
    pub storage_scan_fallback: bool,
    pub preview_ttl_secs: u64,
    pub default_bucket: String,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            db_batch_size: 10,
            scan_batch_size: 5,
            scan_batch_delay: Duration::from_millis(100),
            scan_page_size: 1000,
            storage_scan_fallback: true,
            preview_ttl_secs: 604_800,
            default_bucket: crate::services::resolver::DEFAULT_BUCKET.to_string(),
        }
    }
}

impl From<&Config> for LoaderOptions {
    fn from(config: &Config) -> Self {
        Self {
            db_batch_size: config.loader.db_batch_size,
            scan_batch_size: config.loader.scan_batch_size,
            scan_batch_delay: Duration::from_millis(config.loader.scan_batch_delay_ms),
            scan_page_size: config.loader.scan_page_size,
            storage_scan_fallback: config.loader.storage_scan_fallback,
            preview_ttl_secs: config.signing.preview_ttl_secs,
            default_bucket: config.storage.default_bucket.clone(),
        }
    }
}

/// Locate and sign database rows, preserving their order.
pub async fn load(
    provider: &dyn StorageProvider,
    records: Vec<MediaRecord>,
    buckets: &[StorageBucket],
    options: &LoaderOptions,
) -> Vec<MediaFile> {
    let resolver = PathResolver::new(
        buckets.iter().map(|b| b.name.clone()).collect(),
        options.default_bucket.clone(),
    );

    let files = records
        .into_iter()
        .map(|record| {
            let location = media::locate(&record, &resolver);
            let mut file = MediaFile::from(record);
            file.bucket_name = Some(location.bucket_name);
            file.file_path = Some(location.file_path);
            file
        })
        .collect();

    sign_in_batches(
        provider,
        files,
        options.db_batch_size,
        None,
        options.preview_ttl_secs,
    )
    .await
}

/// List every object in every bucket and sign them. A bucket that cannot be
/// listed is skipped.
pub async fn scan_storage(
    provider: &dyn StorageProvider,
    buckets: &[StorageBucket],
    options: &LoaderOptions,
) -> Vec<MediaFile> {
    let mut files = Vec::new();

    for bucket in buckets {
        match list_bucket(provider, &bucket.name, options.scan_page_size).await {
            Ok(objects) => {
                tracing::debug!("Bucket {}: {} object(s)", bucket.name, objects.len());
                files.extend(
                    objects
                        .into_iter()
                        .filter(|o| !is_placeholder(o))
                        .map(object_to_file),
                );
            }
            Err(e) => {
                tracing::warn!("Skipping bucket {}: listing failed: {}", bucket.name, e);
            }
        }
    }

    sign_in_batches(
        provider,
        files,
        options.scan_batch_size,
        Some(options.scan_batch_delay),
        options.preview_ttl_secs,
    )
    .await
}

async fn list_bucket(
    provider: &dyn StorageProvider,
    bucket: &str,
    page_size: usize,
) -> Result<Vec<StorageObject>, crate::services::storage::StorageError> {
    let page_size = page_size.max(1);
    let mut objects = Vec::new();
    let mut offset = 0;
    loop {
        // The backend may cap a page below `page_size`; only an empty page ends the listing.
        let page = provider.list_objects(bucket, offset, page_size).await?;
        if page.is_empty() {
            break;
        }
        offset += page.len();
        objects.extend(page);
    }
    Ok(objects)
}

fn is_placeholder(object: &StorageObject) -> bool {
    object.name.ends_with('/') || object.file_name() == FOLDER_PLACEHOLDER
}

fn object_to_file(object: StorageObject) -> MediaFile {
    let content_type = object
        .mimetype()
        .map(str::to_string)
        .unwrap_or_else(|| mime::content_type_for(&object.name).to_string());
    let file_url = format!("{}/{}", object.bucket_id, object.name);

    MediaFile {
        id: object.id.clone().unwrap_or_else(|| file_url.clone()),
        filename: object.file_name().to_string(),
        content_type,
        file_size: object.size().unwrap_or(0),
        uploaded_at: object.created_at.clone().unwrap_or_default(),
        alt_text: None,
        category: None,
        user_id: None,
        bucket_name: Some(object.bucket_id.clone()),
        file_path: Some(object.name.clone()),
        signed_url: None,
        source: MediaSource::Storage,
        file_url,
    }
}

async fn sign_in_batches(
    provider: &dyn StorageProvider,
    files: Vec<MediaFile>,
    batch_size: usize,
    delay: Option<Duration>,
    ttl_secs: u64,
) -> Vec<MediaFile> {
    let batch_size = batch_size.max(1);
    let total = files.len();
    let mut signed = Vec::with_capacity(total);
    let mut pending = files.into_iter().peekable();

    while pending.peek().is_some() {
        let batch: Vec<MediaFile> = pending.by_ref().take(batch_size).collect();
        let results = join_all(batch.into_iter().map(|mut file| async move {
            if let Some(location) = file.storage_ref() {
                file.signed_url = signing::materialize(
                    provider,
                    &location.bucket_name,
                    &location.file_path,
                    ttl_secs,
                )
                .await;
            }
            file
        }))
        .await;
        signed.extend(results);

        if let Some(delay) = delay {
            if pending.peek().is_some() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    let failures = signed.iter().filter(|f| f.signed_url.is_none()).count();
    if failures > 0 {
        tracing::warn!("{} of {} file(s) have no signed URL", failures, total);
    }
    signed
}

/// Database entries in order, then storage-only entries whose raw reference
/// has not been seen. Database entries win.
pub fn merge(db_files: Vec<MediaFile>, storage_files: Vec<MediaFile>) -> Vec<MediaFile> {
    let mut seen: HashSet<String> = db_files.iter().map(|f| f.file_url.clone()).collect();
    let mut merged = db_files;
    for file in storage_files {
        if seen.insert(file.file_url.clone()) {
            merged.push(file);
        }
    }
    merged
}

/// The full listing for `scope`.
pub async fn load_library(
    db: &Database,
    provider: &dyn StorageProvider,
    catalog: &BucketCatalog,
    scope: &Scope,
    options: &LoaderOptions,
) -> Result<Vec<MediaFile>> {
    let records = media::list_records(db, scope)?;
    let buckets = catalog.buckets_or_empty().await;
    let record_count = records.len();

    let db_files = load(provider, records, &buckets, options).await;

    let files = if record_count == 0 && scope.is_admin() && options.storage_scan_fallback {
        tracing::info!("No media rows found; scanning {} bucket(s) directly", buckets.len());
        let scanned = scan_storage(provider, &buckets, options).await;
        merge(db_files, scanned)
    } else {
        db_files
    };

    tracing::info!(
        "Loaded {} media file(s) ({} from database)",
        files.len(),
        record_count
    );
    Ok(files)
}
