use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};

use crate::application::ports::{MediaStore, MediaStoreError};
use crate::domain::MediaPath;

/// Media store backed by any `object_store` implementation.
pub struct ObjectMediaStore {
    inner: Arc<dyn ObjectStore>,
}

impl ObjectMediaStore {
    pub fn local(base_path: PathBuf) -> Result<Self, MediaStoreError> {
        std::fs::create_dir_all(&base_path)?;
        let fs = LocalFileSystem::new_with_prefix(base_path)
            .map_err(|e| MediaStoreError::UploadFailed(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(fs),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(InMemory::new()),
        }
    }

    /// Local directory when configured, memory otherwise.
    pub fn from_settings(media_dir: Option<&str>) -> Result<Self, MediaStoreError> {
        match media_dir {
            Some(dir) => Self::local(PathBuf::from(dir)),
            None => {
                tracing::warn!("No media directory configured, keeping media in memory");
                Ok(Self::in_memory())
            }
        }
    }
}

#[async_trait::async_trait]
impl MediaStore for ObjectMediaStore {
    #[tracing::instrument(skip(self, data), fields(path = %path, bytes = data.len()))]
    async fn put(&self, path: &MediaPath, data: Bytes) -> Result<(), MediaStoreError> {
        let store_path = StorePath::from(path.as_str());
        self.inner
            .put(&store_path, PutPayload::from(data))
            .await
            .map_err(|e| MediaStoreError::UploadFailed(e.to_string()))?;
        Ok(())
    }

    async fn fetch(&self, path: &MediaPath) -> Result<Bytes, MediaStoreError> {
        let store_path = StorePath::from(path.as_str());
        let result = self.inner.get(&store_path).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => MediaStoreError::NotFound(path.to_string()),
            other => MediaStoreError::DownloadFailed(other.to_string()),
        })?;

        result
            .bytes()
            .await
            .map_err(|e| MediaStoreError::DownloadFailed(e.to_string()))
    }

    async fn exists(&self, path: &MediaPath) -> Result<bool, MediaStoreError> {
        let store_path = StorePath::from(path.as_str());
        match self.inner.head(&store_path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(MediaStoreError::DownloadFailed(e.to_string())),
        }
    }

    async fn delete(&self, path: &MediaPath) -> Result<(), MediaStoreError> {
        let store_path = StorePath::from(path.as_str());
        self.inner
            .delete(&store_path)
            .await
            .map_err(|e| MediaStoreError::DeleteFailed(e.to_string()))
    }
}
