use crate::services::buckets::BucketCatalog;
use crate::services::storage;
use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<()> {
    let (config, db) = super::open(config_path)?;
    let storage = storage::build_provider(&config, &db)?;
    let catalog = BucketCatalog::new(storage.provider, config.storage.default_bucket.clone());

    let buckets = catalog.buckets().await?;
    if buckets.is_empty() {
        println!("No buckets.");
        return Ok(());
    }

    println!("  {:<24} {:<8} {:<12} Allowed types", "Name", "Public", "Size limit");
    for bucket in buckets {
        let limit = bucket
            .file_size_limit
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".to_string());
        let types = bucket
            .allowed_mime_types
            .as_ref()
            .map(|t| t.join(", "))
            .unwrap_or_else(|| "any".to_string());
        println!(
            "  {:<24} {:<8} {:<12} {}",
            bucket.name,
            if bucket.public { "yes" } else { "no" },
            limit,
            types
        );
    }

    Ok(())
}
