use bytes::Bytes;

use crate::domain::MediaPath;

/// Shared object storage for synthesized speech and uploaded answer audio.
#[async_trait::async_trait]
pub trait MediaStore: Send + Sync {
    async fn put(&self, path: &MediaPath, data: Bytes) -> Result<(), MediaStoreError>;

    async fn fetch(&self, path: &MediaPath) -> Result<Bytes, MediaStoreError>;

    async fn exists(&self, path: &MediaPath) -> Result<bool, MediaStoreError>;

    async fn delete(&self, path: &MediaPath) -> Result<(), MediaStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaStoreError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
