pub mod local;
#[cfg(feature = "supabase")]
pub mod supabase;

use crate::config::{Config, StorageProviderKind};
use crate::models::{StorageBucket, StorageObject};
use crate::Database;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage session rejected: {0}")]
    Unauthorized(String),
    #[error("Storage access denied: {0}")]
    Forbidden(String),
    #[error("Object not found: {bucket}/{path}")]
    NotFound { bucket: String, path: String },
    #[error("Storage returned {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Storage request failed: {0}")]
    Transport(String),
    #[error("Invalid object path: {0}")]
    InvalidPath(String),
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

impl StorageError {
    pub fn not_found(bucket: &str, path: &str) -> Self {
        Self::NotFound {
            bucket: bucket.to_string(),
            path: path.to_string(),
        }
    }

    /// Classify by HTTP status once the provider has read it off the response.
    pub fn from_status(status: u16, message: String, bucket: &str, path: &str) -> Self {
        match status {
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::not_found(bucket, path),
            _ => Self::Http { status, message },
        }
    }
}

/// Object storage service as seen by the media library.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    async fn list_buckets(&self) -> Result<Vec<StorageBucket>, StorageError>;

    /// Time-limited read URL for one object.
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: u64,
    ) -> Result<String, StorageError>;

    /// One page of the object table for `bucket`, ordered by name.
    async fn list_objects(
        &self,
        bucket: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<StorageObject>, StorageError>;

    async fn remove_objects(&self, bucket: &str, paths: &[String]) -> Result<(), StorageError>;

    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, StorageError>;

    fn provider_name(&self) -> &str;
}

/// Handle to the configured provider. `local` is set when the provider is the
/// local backend so the web layer can serve its signed links.
#[derive(Clone)]
pub struct StorageHandle {
    pub provider: Arc<dyn StorageProvider>,
    pub local: Option<Arc<local::LocalStorage>>,
}

pub fn build_provider(config: &Config, db: &Database) -> anyhow::Result<StorageHandle> {
    match config.storage.provider {
        StorageProviderKind::Local => {
            let local = Arc::new(local::LocalStorage::from_config(&config.storage, db.clone())?);
            Ok(StorageHandle {
                provider: local.clone(),
                local: Some(local),
            })
        }
        #[cfg(feature = "supabase")]
        StorageProviderKind::Supabase => {
            let key = config.storage.service_key().ok_or_else(|| {
                anyhow::anyhow!("storage.service_key or BMEDIA_SERVICE_KEY is required for supabase")
            })?;
            let remote = supabase::SupabaseStorage::new(
                &config.storage.url,
                &key,
                config.storage.request_timeout_secs,
            )?;
            Ok(StorageHandle {
                provider: Arc::new(remote),
                local: None,
            })
        }
        #[cfg(not(feature = "supabase"))]
        StorageProviderKind::Supabase => {
            anyhow::bail!("built without the `supabase` feature")
        }
    }
}

/// Rejects empty, absolute and parent-relative object paths.
pub fn validate_object_path(path: &str) -> Result<(), StorageError> {
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    if path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_auth_codes() {
        assert!(matches!(
            StorageError::from_status(401, "jwt expired".into(), "b", "p"),
            StorageError::Unauthorized(_)
        ));
        assert!(matches!(
            StorageError::from_status(403, "policy".into(), "b", "p"),
            StorageError::Forbidden(_)
        ));
        assert!(matches!(
            StorageError::from_status(404, "".into(), "b", "p"),
            StorageError::NotFound { .. }
        ));
        assert!(matches!(
            StorageError::from_status(500, "boom".into(), "b", "p"),
            StorageError::Http { status: 500, .. }
        ));
    }

    #[test]
    fn test_validate_object_path() {
        assert!(validate_object_path("abc/photo.png").is_ok());
        assert!(validate_object_path("photo.png").is_ok());
        assert!(validate_object_path("").is_err());
        assert!(validate_object_path("/etc/passwd").is_err());
        assert!(validate_object_path("a/../b").is_err());
        assert!(validate_object_path("a//b").is_err());
        assert!(validate_object_path("a\\b").is_err());
    }
}
