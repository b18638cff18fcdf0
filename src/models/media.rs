use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Where a listed file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaSource {
    #[default]
    Database,
    Storage,
}

impl FromStr for MediaSource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "database" => Ok(Self::Database),
            "storage" => Ok(Self::Storage),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Database => write!(f, "database"),
            Self::Storage => write!(f, "storage"),
        }
    }
}

/// A row of the `media_files` table.
#[derive(Debug, Clone, Serialize)]
pub struct MediaRecord {
    pub id: String,
    pub filename: String,
    pub file_url: String,
    pub content_type: String,
    pub file_size: i64,
    pub alt_text: Option<String>,
    pub category: Option<String>,
    pub uploaded_at: String,
    pub user_id: Option<String>,
    pub deleted_at: Option<String>,
    /// Explicit location written at upload time. Older rows only carry `file_url`.
    pub bucket_name: Option<String>,
    pub file_path: Option<String>,
}

impl MediaRecord {
    /// The persisted `{bucket, path}` pair, when both halves were recorded.
    pub fn persisted_ref(&self) -> Option<StorageRef> {
        match (&self.bucket_name, &self.file_path) {
            (Some(bucket), Some(path)) if !bucket.is_empty() && !path.is_empty() => {
                Some(StorageRef::new(bucket.clone(), path.clone()))
            }
            _ => None,
        }
    }
}

/// A file as presented to the media library.
#[derive(Debug, Clone, Serialize)]
pub struct MediaFile {
    pub id: String,
    pub filename: String,
    pub file_url: String,
    pub content_type: String,
    pub file_size: i64,
    pub uploaded_at: String,
    pub alt_text: Option<String>,
    pub category: Option<String>,
    pub user_id: Option<String>,
    pub bucket_name: Option<String>,
    pub file_path: Option<String>,
    /// Ephemeral. `None` means listed but not previewable.
    pub signed_url: Option<String>,
    pub source: MediaSource,
}

impl MediaFile {
    pub fn storage_ref(&self) -> Option<StorageRef> {
        match (&self.bucket_name, &self.file_path) {
            (Some(bucket), Some(path)) => Some(StorageRef::new(bucket.clone(), path.clone())),
            _ => None,
        }
    }

    pub fn is_previewable(&self) -> bool {
        self.signed_url.is_some()
    }
}

impl From<MediaRecord> for MediaFile {
    fn from(record: MediaRecord) -> Self {
        Self {
            id: record.id,
            filename: record.filename,
            file_url: record.file_url,
            content_type: record.content_type,
            file_size: record.file_size,
            uploaded_at: record.uploaded_at,
            alt_text: record.alt_text,
            category: record.category,
            user_id: record.user_id,
            bucket_name: record.bucket_name,
            file_path: record.file_path,
            signed_url: None,
            source: MediaSource::Database,
        }
    }
}

/// Fields a user may change after upload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMedia {
    pub filename: Option<String>,
    pub alt_text: Option<String>,
    pub category: Option<String>,
}

impl UpdateMedia {
    pub fn is_empty(&self) -> bool {
        self.filename.is_none() && self.alt_text.is_none() && self.category.is_none()
    }
}

/// A bucket plus a path inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageRef {
    pub bucket_name: String,
    pub file_path: String,
}

impl StorageRef {
    pub fn new(bucket_name: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            file_path: file_path.into(),
        }
    }
}

impl std::fmt::Display for StorageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket_name, self.file_path)
    }
}
