use super::{validate_object_path, StorageError, StorageProvider};
use crate::config::StorageConfig;
use crate::models::{ObjectMetadata, StorageBucket, StorageObject};
use crate::Database;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use std::path::PathBuf;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// Filesystem-backed storage. Objects live at `{root}/{bucket}/{path}` and are
/// indexed in the `storage_objects` table.
pub struct LocalStorage {
    root: PathBuf,
    public_url: Url,
    secret: Vec<u8>,
    buckets: Vec<StorageBucket>,
    db: Database,
}

impl LocalStorage {
    pub fn new(
        root: impl Into<PathBuf>,
        public_url: &str,
        secret: Option<&str>,
        buckets: Vec<StorageBucket>,
        db: Database,
    ) -> anyhow::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;

        let public_url = Url::parse(public_url)
            .map_err(|e| anyhow::anyhow!("Invalid storage url '{}': {}", public_url, e))?;
        if public_url.cannot_be_a_base() {
            anyhow::bail!("storage url '{}' cannot carry a path", public_url);
        }

        let secret = match secret.filter(|s| !s.is_empty()) {
            Some(s) => s.as_bytes().to_vec(),
            None => {
                tracing::warn!("No storage.signing_secret set; signed links will not survive a restart");
                rand::thread_rng().gen::<[u8; 32]>().to_vec()
            }
        };

        Ok(Self {
            root,
            public_url,
            secret,
            buckets,
            db,
        })
    }

    pub fn from_config(config: &StorageConfig, db: Database) -> anyhow::Result<Self> {
        Self::new(
            &config.local_root,
            &config.url,
            config.signing_secret.as_deref(),
            config.buckets.clone(),
            db,
        )
    }

    fn ensure_bucket(&self, bucket: &str) -> Result<&StorageBucket, StorageError> {
        self.buckets
            .iter()
            .find(|b| b.name == bucket)
            .ok_or_else(|| StorageError::not_found(bucket, ""))
    }

    fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf, StorageError> {
        self.ensure_bucket(bucket)?;
        validate_object_path(path)?;
        Ok(self.root.join(bucket).join(path))
    }

    fn sign(&self, bucket: &str, path: &str, expires: i64) -> String {
        let mut mac = self.mac();
        mac.update(format!("{}/{}:{}", bucket, path, expires).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC key length")
    }

    /// Store an object and index it. Used to seed the local backend.
    pub async fn put_object(
        &self,
        bucket: &str,
        path: &str,
        data: &[u8],
        mimetype: Option<&str>,
    ) -> Result<StorageObject, StorageError> {
        let bucket_def = self.ensure_bucket(bucket)?;
        if let Some(limit) = bucket_def.file_size_limit {
            if data.len() as i64 > limit {
                return Err(StorageError::Http {
                    status: 413,
                    message: format!("{} bytes exceeds the {} byte limit of {}", data.len(), limit, bucket),
                });
            }
        }
        if let (Some(allowed), Some(mime)) = (&bucket_def.allowed_mime_types, mimetype) {
            if !allowed.iter().any(|a| a == mime) {
                return Err(StorageError::Http {
                    status: 415,
                    message: format!("{} is not allowed in {}", mime, bucket),
                });
            }
        }

        let file_path = self.object_path(bucket, path)?;
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&file_path, data).await?;

        let id = uuid::Uuid::new_v4().to_string();
        let conn = self.db.get().map_err(|e| StorageError::Other(e.to_string()))?;
        conn.execute(
            "INSERT INTO storage_objects (id, bucket_id, name, size, mimetype) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(bucket_id, name) DO UPDATE SET size = excluded.size, mimetype = excluded.mimetype",
            rusqlite::params![id, bucket, path, data.len() as i64, mimetype],
        )
        .map_err(|e| StorageError::Other(e.to_string()))?;

        let object = conn
            .query_row(
                "SELECT id, bucket_id, name, size, mimetype, created_at FROM storage_objects WHERE bucket_id = ?1 AND name = ?2",
                rusqlite::params![bucket, path],
                row_to_object,
            )
            .map_err(|e| StorageError::Other(e.to_string()))?;

        tracing::debug!("Stored {}/{} ({} bytes)", bucket, path, data.len());
        Ok(object)
    }

    /// Check a token produced by `create_signed_url`.
    pub fn verify_signed(
        &self,
        bucket: &str,
        path: &str,
        token: &str,
        expires: i64,
    ) -> Result<(), StorageError> {
        if expires < chrono::Utc::now().timestamp() {
            return Err(StorageError::Forbidden("signed URL expired".to_string()));
        }
        let provided = hex::decode(token)
            .map_err(|_| StorageError::Forbidden("malformed signature".to_string()))?;
        let mut mac = self.mac();
        mac.update(format!("{}/{}:{}", bucket, path, expires).as_bytes());
        mac.verify_slice(&provided)
            .map_err(|_| StorageError::Forbidden("invalid signature".to_string()))
    }
}

fn row_to_object(row: &rusqlite::Row) -> rusqlite::Result<StorageObject> {
    Ok(StorageObject {
        id: row.get(0)?,
        bucket_id: row.get(1)?,
        name: row.get(2)?,
        metadata: Some(ObjectMetadata {
            size: row.get(3)?,
            mimetype: row.get(4)?,
        }),
        created_at: row.get(5)?,
    })
}

#[async_trait]
impl StorageProvider for LocalStorage {
    async fn list_buckets(&self) -> Result<Vec<StorageBucket>, StorageError> {
        Ok(self.buckets.clone())
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in: u64,
    ) -> Result<String, StorageError> {
        let file_path = self.object_path(bucket, path)?;
        if !tokio::fs::try_exists(&file_path).await? {
            return Err(StorageError::not_found(bucket, path));
        }

        let expires = i64::try_from(expires_in)
            .ok()
            .and_then(|ttl| chrono::Utc::now().timestamp().checked_add(ttl))
            .ok_or_else(|| StorageError::Other(format!("signed URL lifetime {}s is out of range", expires_in)))?;
        let token = self.sign(bucket, path, expires);

        let mut url = self.public_url.clone();
        url.path_segments_mut()
            .map_err(|_| StorageError::Other("storage url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["storage", "v1", "object", "sign", bucket])
            .extend(path.split('/'));
        url.query_pairs_mut()
            .append_pair("token", &token)
            .append_pair("expires", &expires.to_string());

        Ok(url.to_string())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<StorageObject>, StorageError> {
        self.ensure_bucket(bucket)?;
        let conn = self.db.get().map_err(|e| StorageError::Other(e.to_string()))?;
        let mut stmt = conn
            .prepare(
                "SELECT id, bucket_id, name, size, mimetype, created_at FROM storage_objects
                 WHERE bucket_id = ?1 ORDER BY name LIMIT ?2 OFFSET ?3",
            )
            .map_err(|e| StorageError::Other(e.to_string()))?;
        let objects = stmt
            .query_map(
                rusqlite::params![bucket, limit as i64, offset as i64],
                row_to_object,
            )
            .map_err(|e| StorageError::Other(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::Other(e.to_string()))?;
        Ok(objects)
    }

    async fn remove_objects(&self, bucket: &str, paths: &[String]) -> Result<(), StorageError> {
        let mut removed = 0;
        for path in paths {
            let file_path = self.object_path(bucket, path)?;
            match tokio::fs::remove_file(&file_path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            let conn = self.db.get().map_err(|e| StorageError::Other(e.to_string()))?;
            conn.execute(
                "DELETE FROM storage_objects WHERE bucket_id = ?1 AND name = ?2",
                rusqlite::params![bucket, path],
            )
            .map_err(|e| StorageError::Other(e.to_string()))?;
        }

        if removed == 0 && !paths.is_empty() {
            return Err(StorageError::not_found(bucket, &paths.join(",")));
        }
        tracing::info!("Removed {} object(s) from bucket {}", removed, bucket);
        Ok(())
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, StorageError> {
        let file_path = self.object_path(bucket, path)?;
        match tokio::fs::read(&file_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::not_found(bucket, path))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn provider_name(&self) -> &str {
        "local"
    }
}
