use crate::services::buckets::BucketCatalog;
use crate::services::signing::{self, SignedUrlTtl};
use crate::services::storage;
use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: &Path, reference: &str, download: bool) -> Result<()> {
    let (config, db) = super::open(config_path)?;
    let storage = storage::build_provider(&config, &db)?;
    let catalog = BucketCatalog::new(storage.provider.clone(), config.storage.default_bucket.clone());

    let location = catalog.resolver().await.resolve(reference);
    let ttl = if download {
        SignedUrlTtl::Download
    } else {
        SignedUrlTtl::Preview
    };
    let ttl_secs = ttl.seconds(&config.signing);

    match signing::materialize(
        storage.provider.as_ref(),
        &location.bucket_name,
        &location.file_path,
        ttl_secs,
    )
    .await
    {
        Some(url) => {
            println!("{}", url);
            Ok(())
        }
        None => anyhow::bail!("Could not sign {} (see log for details)", location),
    }
}
