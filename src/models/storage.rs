use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageBucket {
    pub name: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub file_size_limit: Option<i64>,
    #[serde(default)]
    pub allowed_mime_types: Option<Vec<String>>,
}

impl StorageBucket {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public: false,
            file_size_limit: None,
            allowed_mime_types: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub mimetype: Option<String>,
}

/// One row of the storage provider's object table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageObject {
    pub id: Option<String>,
    pub bucket_id: String,
    pub name: String,
    #[serde(default)]
    pub metadata: Option<ObjectMetadata>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl StorageObject {
    pub fn size(&self) -> Option<i64> {
        self.metadata.as_ref().and_then(|m| m.size)
    }

    pub fn mimetype(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.mimetype.as_deref())
            .filter(|m| !m.is_empty())
    }

    /// Last path segment of the object name.
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}
