use crate::services::storage;
use crate::web;
use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: &Path, host: Option<String>, port: Option<u16>) -> Result<()> {
    let (config, db) = super::open(config_path)?;
    let storage = storage::build_provider(&config, &db)?;
    tracing::info!("Storage provider: {}", storage.provider.provider_name());

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", host, port);

    web::serve(config, db, storage, &addr).await?;

    Ok(())
}
