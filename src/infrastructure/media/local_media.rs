use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::application::ports::{MediaStore, MediaStoreError};

/// Writes uploads to a directory on local disk and returns the relative
/// path as the public URL. Stands in for object storage in single-node
/// deployments and integration tests.
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    #[instrument(skip(self, bytes), fields(folder, size = bytes.len()))]
    async fn upload(&self, bytes: &[u8], folder: &str) -> Result<String, MediaStoreError> {
        let file_name = format!("{}.jpg", Uuid::new_v4());
        let dir = self.root.join(folder);

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| MediaStoreError::UploadFailed(e.to_string()))?;
        tokio::fs::write(dir.join(&file_name), bytes)
            .await
            .map_err(|e| MediaStoreError::UploadFailed(e.to_string()))?;

        debug!(%file_name, "media stored");
        Ok(format!("{}/{}", folder, file_name))
    }
}

/// Records uploads without touching disk; can be flipped to fail so
/// upload-before-transaction ordering is observable in tests.
#[derive(Default)]
pub struct MockMediaStore {
    uploads: std::sync::Mutex<Vec<String>>,
    failing: bool,
}

impl MockMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            uploads: std::sync::Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn uploaded_folders(&self) -> Vec<String> {
        self.uploads
            .lock()
            .map(|u| u.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MediaStore for MockMediaStore {
    async fn upload(&self, _bytes: &[u8], folder: &str) -> Result<String, MediaStoreError> {
        if self.failing {
            return Err(MediaStoreError::UploadFailed("mock failure".to_string()));
        }
        if let Ok(mut uploads) = self.uploads.lock() {
            uploads.push(folder.to_string());
        }
        Ok(format!("{}/{}.jpg", folder, Uuid::new_v4()))
    }
}
