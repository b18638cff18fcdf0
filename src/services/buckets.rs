use crate::models::StorageBucket;
use crate::services::resolver::PathResolver;
use crate::services::storage::{StorageError, StorageProvider};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Bucket list for the session, fetched on first use.
///
/// A failed fetch is not cached; the next caller tries again.
pub struct BucketCatalog {
    provider: Arc<dyn StorageProvider>,
    default_bucket: String,
    buckets: OnceCell<Vec<StorageBucket>>,
}

impl BucketCatalog {
    pub fn new(provider: Arc<dyn StorageProvider>, default_bucket: impl Into<String>) -> Self {
        Self {
            provider,
            default_bucket: default_bucket.into(),
            buckets: OnceCell::new(),
        }
    }

    pub async fn buckets(&self) -> Result<&[StorageBucket], StorageError> {
        let buckets = self
            .buckets
            .get_or_try_init(|| async {
                let list = self.provider.list_buckets().await?;
                tracing::info!(
                    "Loaded {} bucket(s) from {}",
                    list.len(),
                    self.provider.provider_name()
                );
                Ok::<_, StorageError>(list)
            })
            .await?;
        Ok(buckets.as_slice())
    }

    /// Bucket list, or empty with a warning when the provider cannot list them.
    pub async fn buckets_or_empty(&self) -> Vec<StorageBucket> {
        match self.buckets().await {
            Ok(list) => list.to_vec(),
            Err(e) => {
                tracing::warn!("Failed to list storage buckets: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn names(&self) -> Vec<String> {
        self.buckets_or_empty()
            .await
            .into_iter()
            .map(|b| b.name)
            .collect()
    }

    pub async fn resolver(&self) -> PathResolver {
        PathResolver::new(self.names().await, self.default_bucket.clone())
    }

    pub fn is_loaded(&self) -> bool {
        self.buckets.initialized()
    }
}
