use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::Document;
use crate::domain::repositories::DocumentRepository;
use crate::domain::value_objects::TagSlots;

#[derive(Debug)]
pub enum UpdateDocumentError {
    NotFound(Uuid),
    ValidationError(String),
    RepositoryError(String),
}

impl std::fmt::Display for UpdateDocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateDocumentError::NotFound(id) => write!(f, "Document not found: {}", id),
            UpdateDocumentError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            UpdateDocumentError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for UpdateDocumentError {}

#[derive(Debug, Clone, Default)]
pub struct UpdateDocumentRequest {
    pub filename: Option<String>,
    pub enabled: Option<bool>,
    pub tags: Option<serde_json::Value>,
}

/// Direct mutation path bypassing the pipeline. Processing state is never
/// writable here.
pub struct UpdateDocumentUseCase {
    document_repository: Arc<dyn DocumentRepository>,
}

impl UpdateDocumentUseCase {
    pub fn new(document_repository: Arc<dyn DocumentRepository>) -> Self {
        Self {
            document_repository,
        }
    }

    pub async fn execute(
        &self,
        document_id: Uuid,
        request: UpdateDocumentRequest,
    ) -> Result<Document, UpdateDocumentError> {
        let mut document = self
            .document_repository
            .find_by_id(document_id)
            .await
            .map_err(|e| UpdateDocumentError::RepositoryError(e.to_string()))?
            .filter(|document| !document.is_deleted())
            .ok_or(UpdateDocumentError::NotFound(document_id))?;

        if let Some(filename) = request.filename {
            if filename.trim().is_empty() {
                return Err(UpdateDocumentError::ValidationError(
                    "Filename cannot be empty".to_string(),
                ));
            }
            document.set_filename(filename);
        }

        if let Some(enabled) = request.enabled {
            document.set_enabled(enabled);
        }

        if let Some(tags) = request.tags {
            let slots = TagSlots::from_value(&tags)
                .map_err(UpdateDocumentError::ValidationError)?;
            document.set_tags(slots);
        }

        self.document_repository
            .update(&document)
            .await
            .map_err(|e| UpdateDocumentError::RepositoryError(e.to_string()))?;

        Ok(document)
    }
}
