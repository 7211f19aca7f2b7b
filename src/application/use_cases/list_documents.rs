use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::Document;
use crate::domain::repositories::{
    DocumentFilters, DocumentRepository, DocumentRepositoryError,
};

#[derive(Debug)]
pub enum ListDocumentsError {
    ValidationError(String),
    RepositoryError(String),
}

impl std::fmt::Display for ListDocumentsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListDocumentsError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ListDocumentsError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for ListDocumentsError {}

#[derive(Debug, Clone, Default)]
pub struct ListDocumentsRequest {
    pub processing_status: Option<String>,
    pub enabled: Option<bool>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug)]
pub struct ListDocumentsResponse {
    pub documents: Vec<Document>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

pub struct ListDocumentsUseCase {
    document_repository: Arc<dyn DocumentRepository>,
}

impl ListDocumentsUseCase {
    pub fn new(document_repository: Arc<dyn DocumentRepository>) -> Self {
        Self {
            document_repository,
        }
    }

    pub async fn execute(
        &self,
        knowledge_base_id: Uuid,
        request: ListDocumentsRequest,
    ) -> Result<ListDocumentsResponse, ListDocumentsError> {
        if let Some(status) = &request.processing_status {
            if !matches!(
                status.as_str(),
                "pending" | "processing" | "completed" | "failed"
            ) {
                return Err(ListDocumentsError::ValidationError(format!(
                    "Unknown processing status filter: {}",
                    status
                )));
            }
        }

        let filters = DocumentFilters {
            processing_status: request.processing_status,
            enabled: request.enabled,
            search: request.search,
            limit: request.limit,
            offset: request.offset,
        };

        let page = self
            .document_repository
            .find_for_knowledge_base(knowledge_base_id, filters)
            .await
            .map_err(|e| ListDocumentsError::RepositoryError(e.to_string()))?;

        Ok(ListDocumentsResponse {
            documents: page.documents,
            total: page.total,
            limit: request.limit,
            offset: request.offset,
        })
    }
}

impl From<DocumentRepositoryError> for ListDocumentsError {
    fn from(error: DocumentRepositoryError) -> Self {
        ListDocumentsError::RepositoryError(error.to_string())
    }
}
