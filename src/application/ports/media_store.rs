use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum MediaStoreError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
}

/// Binary object upload collaborator (CDN / object storage). Checkpoint
/// flows call this before opening their database transaction so a failed
/// upload never leaves a half-committed status transition.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, bytes: &[u8], folder: &str) -> Result<String, MediaStoreError>;
}
