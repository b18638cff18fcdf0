use crate::config::SigningConfig;
use crate::services::storage::StorageProvider;

/// Which lifetime a signed link gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedUrlTtl {
    /// One-shot downloads.
    Download,
    /// Grid/table previews and copied share links.
    Preview,
}

impl SignedUrlTtl {
    pub fn seconds(self, config: &SigningConfig) -> u64 {
        match self {
            Self::Download => config.download_ttl_secs,
            Self::Preview => config.preview_ttl_secs,
        }
    }
}

/// Ask the provider for a signed read URL. Failures are logged and give `None`;
/// the file stays listed without a preview.
pub async fn materialize(
    provider: &dyn StorageProvider,
    bucket: &str,
    path: &str,
    ttl_secs: u64,
) -> Option<String> {
    if bucket.is_empty() || path.is_empty() {
        tracing::warn!("Skipping signed URL for empty reference '{}/{}'", bucket, path);
        return None;
    }

    match provider.create_signed_url(bucket, path, ttl_secs).await {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!("Signed URL generation failed for {}/{}: {}", bucket, path, e);
            None
        }
    }
}
