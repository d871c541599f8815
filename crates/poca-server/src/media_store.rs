//! Filesystem-backed image hosting.
//!
//! Uploaded files are stored under a flat directory keyed by UUID, with the
//! declared content type kept in a sidecar file so fetches can reproduce it.
//! Uploads that succeed but whose card metadata is never written stay here
//! unreferenced; nothing reclaims them.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ServerError;

#[derive(Debug, Clone)]
pub struct MediaStore {
    base_path: PathBuf,
    max_size: usize,
}

impl MediaStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self, ServerError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ServerError::MediaStorage(format!(
                "Failed to create media directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Media store initialized");

        Ok(Self { base_path, max_size })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Store an uploaded image and return its assigned ID.
    pub async fn store(&self, data: &[u8], content_type: &str) -> Result<Uuid, ServerError> {
        if data.is_empty() {
            return Err(ServerError::MediaStorage("Empty upload".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ServerError::UploadTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let id = Uuid::new_v4();

        fs::write(self.data_path(&id), data).await.map_err(|e| {
            ServerError::MediaStorage(format!("Failed to write media {}: {}", id, e))
        })?;
        fs::write(self.mime_path(&id), content_type.as_bytes())
            .await
            .map_err(|e| {
                ServerError::MediaStorage(format!("Failed to write media {} mime: {}", id, e))
            })?;

        debug!(id = %id, size = data.len(), content_type, "Stored media");
        Ok(id)
    }

    /// Retrieve stored bytes and their content type.
    pub async fn get(&self, id: Uuid) -> Result<(Vec<u8>, String), ServerError> {
        let path = self.data_path(&id);

        if !path.exists() {
            return Err(ServerError::MediaNotFound(id));
        }

        let data = fs::read(&path).await.map_err(|e| {
            ServerError::MediaStorage(format!("Failed to read media {}: {}", id, e))
        })?;

        let content_type = match fs::read_to_string(self.mime_path(&id)).await {
            Ok(mime) if !mime.trim().is_empty() => mime.trim().to_string(),
            _ => "application/octet-stream".to_string(),
        };

        debug!(id = %id, size = data.len(), "Retrieved media");
        Ok((data, content_type))
    }

    // Paths are built from a UUID plus fixed suffixes, so no user-supplied
    // component ever reaches the filesystem.
    fn data_path(&self, id: &Uuid) -> PathBuf {
        self.base_path.join(id.to_string())
    }

    fn mime_path(&self, id: &Uuid) -> PathBuf {
        self.base_path.join(format!("{id}.mime"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (MediaStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = MediaStore::new(dir.path().to_path_buf(), 1024 * 1024)
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn store_and_get_round_trip() {
        let (store, _dir) = test_store().await;
        let data = b"jpeg-bytes";

        let id = store.store(data, "image/jpeg").await.unwrap();
        let (retrieved, content_type) = store.get(id).await.unwrap();
        assert_eq!(retrieved, data);
        assert_eq!(content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn missing_media_is_not_found() {
        let (store, _dir) = test_store().await;
        let missing = Uuid::new_v4();
        assert!(matches!(
            store.get(missing).await,
            Err(ServerError::MediaNotFound(_))
        ));
    }

    #[tokio::test]
    async fn empty_upload_rejected() {
        let (store, _dir) = test_store().await;
        assert!(store.store(b"", "image/png").await.is_err());
    }

    #[tokio::test]
    async fn oversized_upload_rejected() {
        let dir = TempDir::new().unwrap();
        let store = MediaStore::new(dir.path().to_path_buf(), 8).await.unwrap();

        match store.store(b"way too many bytes", "image/png").await {
            Err(ServerError::UploadTooLarge { size, max }) => {
                assert_eq!(size, 18);
                assert_eq!(max, 8);
            }
            other => panic!("expected UploadTooLarge, got {other:?}"),
        }
    }
}
