use super::{StorageError, StorageProvider};
use crate::models::{StorageBucket, StorageObject};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const OBJECT_COLUMNS: &str = "id,bucket_id,name,metadata,created_at";

/// Hosted backend: storage REST API plus the `storage.objects` table through PostgREST.
pub struct SupabaseStorage {
    client: reqwest::Client,
    base: Url,
    service_key: String,
}

#[derive(Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl SupabaseStorage {
    pub fn new(url: &str, service_key: &str, timeout_secs: u64) -> Result<Self, StorageError> {
        let base = Url::parse(url).map_err(|e| StorageError::Other(format!("Invalid storage url: {}", e)))?;
        if base.cannot_be_a_base() {
            return Err(StorageError::Other(format!("storage url '{}' cannot carry a path", url)));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .user_agent(concat!("bmedia/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base,
            service_key: service_key.to_string(),
        })
    }

    /// `fixed` segments followed by the object path. Escapes already present
    /// in the object path are sent as written; other reserved characters are encoded.
    fn endpoint(&self, fixed: &[&str], object_path: Option<&str>) -> Result<Url, StorageError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::Other("storage url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(fixed);
        if let Some(path) = object_path {
            let full = format!("{}/{}", url.path(), path);
            url.set_path(&full);
        }
        Ok(url)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn send(&self, request: RequestBuilder, bucket: &str, path: &str) -> Result<Response, StorageError> {
        let response = self
            .authed(request)
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let (status, message) = parse_error_body(status, &body);
        Err(StorageError::from_status(status, message, bucket, path))
    }
}

/// The storage API answers some failures with HTTP 400 and the real status
/// in a `statusCode` field of the body.
fn parse_error_body(http_status: u16, body: &str) -> (u16, String) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return (http_status, body.trim().to_string());
    };

    let embedded = value.get("statusCode").and_then(|v| match v {
        serde_json::Value::String(s) => s.parse::<u16>().ok(),
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        _ => None,
    });
    let message = value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(|v| v.as_str())
        .unwrap_or(body)
        .to_string();

    (embedded.unwrap_or(http_status), message)
}

#[async_trait]
impl StorageProvider for SupabaseStorage {
    async fn list_buckets(&self) -> Result<Vec<StorageBucket>, StorageError> {
        let url = self.endpoint(&["storage", "v1", "bucket"], None)?;
        let response = self.send(self.client.get(url), "", "").await?;
        response
            .json::<Vec<StorageBucket>>()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: u64,
    ) -> Result<String, StorageError> {
        let url = self.endpoint(&["storage", "v1", "object", "sign", bucket], Some(path))?;
        let request = self
            .client
            .post(url)
            .json(&serde_json::json!({ "expiresIn": expires_in }));
        let response = self.send(request, bucket, path).await?;
        let signed: SignedUrlResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        Ok(format!(
            "{}/storage/v1{}",
            self.base.as_str().trim_end_matches('/'),
            signed.signed_url
        ))
    }

    async fn list_objects(
        &self,
        bucket: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<StorageObject>, StorageError> {
        let url = self.endpoint(&["rest", "v1", "objects"], None)?;
        let request = self
            .client
            .get(url)
            .header("Accept-Profile", "storage")
            .query(&[
                ("select", OBJECT_COLUMNS.to_string()),
                ("bucket_id", format!("eq.{}", bucket)),
                ("order", "name.asc".to_string()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ]);
        let response = self.send(request, bucket, "").await?;
        response
            .json::<Vec<StorageObject>>()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))
    }

    async fn remove_objects(&self, bucket: &str, paths: &[String]) -> Result<(), StorageError> {
        let url = self.endpoint(&["storage", "v1", "object", bucket], None)?;
        let request = self
            .client
            .delete(url)
            .json(&serde_json::json!({ "prefixes": paths }));
        let joined = paths.join(",");
        let response = self.send(request, bucket, &joined).await?;

        // Answers with the rows it removed; nothing removed means nothing was there.
        let removed: Vec<serde_json::Value> = response.json().await.unwrap_or_default();
        if removed.is_empty() && !paths.is_empty() {
            return Err(StorageError::not_found(bucket, &joined));
        }
        tracing::info!("Removed {} object(s) from bucket {}", removed.len(), bucket);
        Ok(())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, StorageError> {
        let url = self.endpoint(&["storage", "v1", "object", "authenticated", bucket], Some(path))?;
        let response = self.send(self.client.get(url), bucket, path).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn provider_name(&self) -> &str {
        "supabase"
    }
}
