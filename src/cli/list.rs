use crate::models::Scope;
use crate::services::buckets::BucketCatalog;
use crate::services::loader::{self, LoaderOptions};
use crate::services::storage;
use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: &Path, user: Option<String>, admin: bool, json: bool) -> Result<()> {
    let (config, db) = super::open(config_path)?;
    let storage = storage::build_provider(&config, &db)?;
    let catalog = BucketCatalog::new(storage.provider.clone(), config.storage.default_bucket.clone());
    let options = LoaderOptions::from(&config);

    let scope = match (admin, user) {
        (true, _) => Scope::Admin,
        (false, Some(user)) => Scope::User(user),
        (false, None) => anyhow::bail!("Pass --user <id> or --admin"),
    };

    let files = loader::load_library(&db, storage.provider.as_ref(), &catalog, &scope, &options).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    println!("  {:<30} {:<24} {:>10} {:<9} Preview", "File", "Location", "Bytes", "Source");
    println!("  {}", "-".repeat(90));
    for file in &files {
        let location = file
            .storage_ref()
            .map(|r| r.to_string())
            .unwrap_or_default();
        println!(
            "  {:<30} {:<24} {:>10} {:<9} {}",
            file.filename,
            location,
            file.file_size,
            file.source,
            if file.is_previewable() { "yes" } else { "no" }
        );
    }
    println!("\n  {} file(s)", files.len());

    Ok(())
}
