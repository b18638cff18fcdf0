use crate::models::StorageBucket;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub signing: SigningConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageProviderKind {
    #[default]
    Local,
    Supabase,
}

impl std::fmt::Display for StorageProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Supabase => write!(f, "supabase"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub provider: StorageProviderKind,
    /// Project URL of the hosted backend, or the public base URL the local
    /// provider writes into signed links.
    #[serde(default = "default_storage_url")]
    pub url: String,
    /// Service key for the hosted backend. Falls back to `BMEDIA_SERVICE_KEY`.
    #[serde(default)]
    pub service_key: Option<String>,
    #[serde(default = "default_bucket")]
    pub default_bucket: String,
    #[serde(default = "default_local_root")]
    pub local_root: String,
    /// HMAC secret for local signed URLs. A random one is generated per process when unset.
    #[serde(default)]
    pub signing_secret: Option<String>,
    #[serde(default = "default_storage_timeout")]
    pub request_timeout_secs: u64,
    /// Bucket definitions for the local provider.
    #[serde(default = "default_buckets")]
    pub buckets: Vec<StorageBucket>,
}

impl StorageConfig {
    pub fn service_key(&self) -> Option<String> {
        self.service_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("BMEDIA_SERVICE_KEY").ok())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SigningConfig {
    /// Lifetime of one-shot download links.
    #[serde(default = "default_download_ttl")]
    pub download_ttl_secs: u64,
    /// Lifetime of list previews and shareable links.
    #[serde(default = "default_preview_ttl")]
    pub preview_ttl_secs: u64,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            download_ttl_secs: default_download_ttl(),
            preview_ttl_secs: default_preview_ttl(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoaderConfig {
    #[serde(default = "default_db_batch_size")]
    pub db_batch_size: usize,
    #[serde(default = "default_scan_batch_size")]
    pub scan_batch_size: usize,
    #[serde(default = "default_scan_batch_delay")]
    pub scan_batch_delay_ms: u64,
    #[serde(default = "default_scan_page_size")]
    pub scan_page_size: usize,
    /// List storage objects directly when an admin view finds no rows.
    #[serde(default = "default_true")]
    pub storage_scan_fallback: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            db_batch_size: default_db_batch_size(),
            scan_batch_size: default_scan_batch_size(),
            scan_batch_delay_ms: default_scan_batch_delay(),
            scan_page_size: default_scan_page_size(),
            storage_scan_fallback: true,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3100
}

fn default_request_timeout() -> u64 {
    60
}

fn default_pool_size() -> u32 {
    10
}

fn default_storage_url() -> String {
    "http://127.0.0.1:3100".to_string()
}

fn default_bucket() -> String {
    "user_uploads".to_string()
}

fn default_local_root() -> String {
    "data/storage".to_string()
}

fn default_storage_timeout() -> u64 {
    30
}

fn default_buckets() -> Vec<StorageBucket> {
    vec![StorageBucket::named("user_uploads")]
}

fn default_download_ttl() -> u64 {
    3600
}

fn default_preview_ttl() -> u64 {
    604_800
}

fn default_db_batch_size() -> usize {
    10
}

fn default_scan_batch_size() -> usize {
    5
}

fn default_scan_batch_delay() -> u64 {
    100
}

fn default_scan_page_size() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Could not read config file '{}': {}. Pass --config or create bmedia.toml.",
                path.display(),
                e
            )
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.default_bucket.trim().is_empty() {
            anyhow::bail!("storage.default_bucket must not be empty");
        }
        if self.storage.default_bucket.contains('/') {
            anyhow::bail!("storage.default_bucket must not contain '/'");
        }
        if self.storage.provider == StorageProviderKind::Supabase {
            url::Url::parse(&self.storage.url)
                .map_err(|e| anyhow::anyhow!("storage.url is not a valid URL: {}", e))?;
        }
        if self.storage.buckets.iter().any(|b| b.name.trim().is_empty()) {
            anyhow::bail!("storage.buckets entries must have a name");
        }
        if self.signing.download_ttl_secs == 0 || self.signing.preview_ttl_secs == 0 {
            anyhow::bail!("signing TTLs must be greater than 0");
        }
        if self.loader.db_batch_size == 0 || self.loader.scan_batch_size == 0 {
            anyhow::bail!("loader batch sizes must be greater than 0");
        }
        if self.loader.scan_page_size == 0 {
            anyhow::bail!("loader.scan_page_size must be greater than 0");
        }
        Ok(())
    }
}
