use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{Document, DocumentChunk, ProcessingCounters};

#[derive(Debug)]
pub enum DocumentRepositoryError {
    NotFound(Uuid),
    DatabaseError(String),
    ValidationError(String),
}

impl std::fmt::Display for DocumentRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentRepositoryError::NotFound(id) => write!(f, "Document not found: {}", id),
            DocumentRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            DocumentRepositoryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for DocumentRepositoryError {}

/// Listing filters; soft-deleted documents are always excluded.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilters {
    pub processing_status: Option<String>,
    pub enabled: Option<bool>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone)]
pub struct DocumentPage {
    pub documents: Vec<Document>,
    pub total: i64,
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create_batch(
        &self,
        documents: &[Document],
    ) -> Result<Vec<Document>, DocumentRepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>, DocumentRepositoryError>;

    async fn find_for_knowledge_base(
        &self,
        knowledge_base_id: Uuid,
        filters: DocumentFilters,
    ) -> Result<DocumentPage, DocumentRepositoryError>;

    /// Persist mutable document fields (filename, enabled, tags, soft-delete
    /// marker). Processing state is written through the lifecycle methods
    /// below, never through this path.
    async fn update(&self, document: &Document) -> Result<(), DocumentRepositoryError>;

    /// Write the processing-state columns of an already-transitioned entity
    /// (status, timestamps, error).
    async fn save_processing_state(
        &self,
        document: &Document,
    ) -> Result<(), DocumentRepositoryError>;

    /// Single transaction: delete any prior chunks for the document, insert
    /// the new generation, and mark the document completed with its summary
    /// counters. The only mutation point of a successful processing run.
    async fn finalize_processing(
        &self,
        document_id: Uuid,
        chunks: &[DocumentChunk],
        counters: ProcessingCounters,
    ) -> Result<(), DocumentRepositoryError>;

    /// Out-of-band failure marking: status failed, completion timestamp, and
    /// the captured error message.
    async fn mark_failed(
        &self,
        document_id: Uuid,
        error_message: &str,
    ) -> Result<(), DocumentRepositoryError>;

    /// Single transaction: delete all chunks and reset the row to pending
    /// with zeroed counters and cleared timestamps.
    async fn reset_for_retry(&self, document_id: Uuid) -> Result<(), DocumentRepositoryError>;

    async fn bulk_set_enabled(
        &self,
        knowledge_base_id: Uuid,
        document_ids: &[Uuid],
        enabled: bool,
    ) -> Result<usize, DocumentRepositoryError>;

    async fn bulk_soft_delete(
        &self,
        knowledge_base_id: Uuid,
        document_ids: &[Uuid],
    ) -> Result<usize, DocumentRepositoryError>;
}
