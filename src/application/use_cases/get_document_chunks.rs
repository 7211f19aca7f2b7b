use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::DocumentChunk;
use crate::domain::repositories::{ChunkRepository, DocumentRepository};

#[derive(Debug)]
pub enum GetDocumentChunksError {
    DocumentNotFound(Uuid),
    RepositoryError(String),
}

impl std::fmt::Display for GetDocumentChunksError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GetDocumentChunksError::DocumentNotFound(id) => {
                write!(f, "Document not found: {}", id)
            }
            GetDocumentChunksError::RepositoryError(msg) => {
                write!(f, "Repository error: {}", msg)
            }
        }
    }
}

impl std::error::Error for GetDocumentChunksError {}

pub struct GetDocumentChunksUseCase {
    document_repository: Arc<dyn DocumentRepository>,
    chunk_repository: Arc<dyn ChunkRepository>,
}

impl GetDocumentChunksUseCase {
    pub fn new(
        document_repository: Arc<dyn DocumentRepository>,
        chunk_repository: Arc<dyn ChunkRepository>,
    ) -> Self {
        Self {
            document_repository,
            chunk_repository,
        }
    }

    pub async fn execute(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<DocumentChunk>, GetDocumentChunksError> {
        let document = self
            .document_repository
            .find_by_id(document_id)
            .await
            .map_err(|e| GetDocumentChunksError::RepositoryError(e.to_string()))?;

        if document.map(|d| d.is_deleted()).unwrap_or(true) {
            return Err(GetDocumentChunksError::DocumentNotFound(document_id));
        }

        self.chunk_repository
            .find_by_document(document_id)
            .await
            .map_err(|e| GetDocumentChunksError::RepositoryError(e.to_string()))
    }
}
