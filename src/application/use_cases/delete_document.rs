use std::sync::Arc;
use uuid::Uuid;

use crate::domain::repositories::DocumentRepository;

#[derive(Debug)]
pub enum DeleteDocumentError {
    NotFound(Uuid),
    RepositoryError(String),
}

impl std::fmt::Display for DeleteDocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeleteDocumentError::NotFound(id) => write!(f, "Document not found: {}", id),
            DeleteDocumentError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for DeleteDocumentError {}

/// Soft-deletes a document: the row stays, the pipeline and listings skip it.
pub struct DeleteDocumentUseCase {
    document_repository: Arc<dyn DocumentRepository>,
}

impl DeleteDocumentUseCase {
    pub fn new(document_repository: Arc<dyn DocumentRepository>) -> Self {
        Self {
            document_repository,
        }
    }

    pub async fn execute(&self, document_id: Uuid) -> Result<(), DeleteDocumentError> {
        let mut document = self
            .document_repository
            .find_by_id(document_id)
            .await
            .map_err(|e| DeleteDocumentError::RepositoryError(e.to_string()))?
            .filter(|document| !document.is_deleted())
            .ok_or(DeleteDocumentError::NotFound(document_id))?;

        document.soft_delete();

        self.document_repository
            .update(&document)
            .await
            .map_err(|e| DeleteDocumentError::RepositoryError(e.to_string()))
    }
}
