use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::DocumentChunk;

#[derive(Debug)]
pub enum ChunkRepositoryError {
    DatabaseError(String),
    ValidationError(String),
}

impl std::fmt::Display for ChunkRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ChunkRepositoryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ChunkRepositoryError {}

/// Read access to persisted chunks. Chunk mutation happens exclusively
/// through the document repository's transactional operations.
#[async_trait]
pub trait ChunkRepository: Send + Sync {
    async fn find_by_document(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<DocumentChunk>, ChunkRepositoryError>;

    async fn count_for_document(&self, document_id: Uuid) -> Result<i64, ChunkRepositoryError>;
}
