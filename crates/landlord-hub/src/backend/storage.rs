use serde::Serialize;

/// Binary blob storage with public download links.
pub trait ObjectStorage: Send + Sync {
    fn upload(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;
    fn download_url(&self, key: &str) -> Result<String, StorageError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub key: String,
    pub size: usize,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("object {0} not found")]
    NotFound(String),
    #[error("upload rejected: {0}")]
    Rejected(String),
    #[error("object storage unavailable: {0}")]
    Unavailable(String),
}
