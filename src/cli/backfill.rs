use crate::services::buckets::BucketCatalog;
use crate::services::media;
use crate::services::storage;
use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: &Path, dry_run: bool) -> Result<()> {
    let (config, db) = super::open(config_path)?;
    let storage = storage::build_provider(&config, &db)?;
    let catalog = BucketCatalog::new(storage.provider, config.storage.default_bucket.clone());
    let resolver = catalog.resolver().await;

    if resolver.known_buckets().is_empty() {
        tracing::warn!("No buckets known; every row will resolve to {}", resolver.default_bucket());
    }

    let updated = media::backfill_locations(&db, &resolver, dry_run)?;
    for (id, location) in &updated {
        println!("  {:<38} {}", id, location);
    }
    if dry_run {
        println!("\n  {} row(s) would be updated.", updated.len());
    } else {
        println!("\n  {} row(s) updated.", updated.len());
    }

    Ok(())
}
