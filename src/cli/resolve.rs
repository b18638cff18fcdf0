use crate::services::buckets::BucketCatalog;
use crate::services::resolver::PathResolver;
use crate::services::storage;
use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: &Path, reference: &str, buckets: Vec<String>) -> Result<()> {
    let (config, db) = super::open(config_path)?;

    let resolver = if buckets.is_empty() {
        let storage = storage::build_provider(&config, &db)?;
        BucketCatalog::new(storage.provider, config.storage.default_bucket.clone())
            .resolver()
            .await
    } else {
        PathResolver::new(buckets, config.storage.default_bucket.clone())
    };

    let location = resolver.resolve(reference);
    println!("bucket: {}", location.bucket_name);
    println!("path:   {}", location.file_path);

    Ok(())
}
