use async_trait::async_trait;

#[derive(Debug)]
pub enum ObjectStorageError {
    Configuration(String),
    UploadFailed(String),
    NetworkError(String),
}

impl std::fmt::Display for ObjectStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectStorageError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ObjectStorageError::UploadFailed(msg) => write!(f, "Upload failed: {}", msg),
            ObjectStorageError::NetworkError(msg) => write!(f, "Network error: {}", msg),
        }
    }
}

impl std::error::Error for ObjectStorageError {}

/// Durable object storage used to stage document bytes behind a URL that a
/// remote OCR service can fetch.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload raw bytes, returning the object key.
    async fn upload_file(
        &self,
        data: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> Result<String, ObjectStorageError>;

    /// Produce a time-limited, pre-signed GET URL for an object key.
    async fn presigned_url(
        &self,
        key: &str,
        ttl_secs: u64,
    ) -> Result<String, ObjectStorageError>;
}
