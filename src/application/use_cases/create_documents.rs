use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::Document;
use crate::domain::repositories::{DocumentRepository, DocumentRepositoryError};
use crate::domain::value_objects::TagSlots;

#[derive(Debug)]
pub enum CreateDocumentsError {
    ValidationError(String),
    RepositoryError(String),
}

impl std::fmt::Display for CreateDocumentsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateDocumentsError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            CreateDocumentsError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for CreateDocumentsError {}

impl From<DocumentRepositoryError> for CreateDocumentsError {
    fn from(error: DocumentRepositoryError) -> Self {
        CreateDocumentsError::RepositoryError(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub filename: String,
    pub file_url: String,
    pub file_size: i64,
    pub mime_type: String,
    /// Raw tag payload; malformed values degrade to empty slots.
    pub tags: Option<serde_json::Value>,
}

/// Bulk-inserts pending document rows, resolving tag payloads, before any
/// processing is scheduled.
pub struct CreateDocumentsUseCase {
    document_repository: Arc<dyn DocumentRepository>,
}

impl CreateDocumentsUseCase {
    pub fn new(document_repository: Arc<dyn DocumentRepository>) -> Self {
        Self {
            document_repository,
        }
    }

    pub async fn execute(
        &self,
        knowledge_base_id: Uuid,
        uploads: Vec<DocumentUpload>,
    ) -> Result<Vec<Document>, CreateDocumentsError> {
        if uploads.is_empty() {
            return Err(CreateDocumentsError::ValidationError(
                "No documents supplied".to_string(),
            ));
        }

        let mut documents = Vec::with_capacity(uploads.len());

        for upload in uploads {
            if upload.filename.trim().is_empty() {
                return Err(CreateDocumentsError::ValidationError(
                    "Document filename cannot be empty".to_string(),
                ));
            }

            let is_inline = upload.file_url.starts_with("data:");
            if !is_inline && url::Url::parse(&upload.file_url).is_err() {
                return Err(CreateDocumentsError::ValidationError(format!(
                    "Invalid source URL for {}",
                    upload.filename
                )));
            }

            let tags = TagSlots::parse_or_empty(upload.tags.as_ref());

            documents.push(Document::new(
                knowledge_base_id,
                upload.filename,
                upload.file_url,
                upload.file_size,
                upload.mime_type,
                tags,
            ));
        }

        let created = self.document_repository.create_batch(&documents).await?;

        tracing::info!(
            knowledge_base_id = %knowledge_base_id,
            count = created.len(),
            "Created pending documents"
        );

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::document_processor::test_support::InMemoryDocumentRepository;
    use crate::domain::value_objects::ProcessingStatus;
    use serde_json::json;

    fn upload(filename: &str) -> DocumentUpload {
        DocumentUpload {
            filename: filename.to_string(),
            file_url: "https://files.example.com/doc.pdf".to_string(),
            file_size: 1024,
            mime_type: "application/pdf".to_string(),
            tags: None,
        }
    }

    #[tokio::test]
    async fn test_creates_pending_documents() {
        let repository = InMemoryDocumentRepository::new();
        let use_case = CreateDocumentsUseCase::new(repository.clone());

        let created = use_case
            .execute(Uuid::new_v4(), vec![upload("a.pdf"), upload("b.pdf")])
            .await
            .unwrap();

        assert_eq!(created.len(), 2);
        for document in &created {
            assert_eq!(document.processing_status(), &ProcessingStatus::Pending);
            assert_eq!(document.counters().chunk_count, 0);
        }
    }

    #[tokio::test]
    async fn test_malformed_tags_degrade_to_empty() {
        let repository = InMemoryDocumentRepository::new();
        let use_case = CreateDocumentsUseCase::new(repository.clone());

        let mut with_bad_tags = upload("tagged.pdf");
        with_bad_tags.tags = Some(json!("not an object"));

        let created = use_case
            .execute(Uuid::new_v4(), vec![with_bad_tags])
            .await
            .unwrap();

        assert!(created[0].tags().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let repository = InMemoryDocumentRepository::new();
        let use_case = CreateDocumentsUseCase::new(repository.clone());

        let mut bad = upload("bad.pdf");
        bad.file_url = "not a url".to_string();

        let result = use_case.execute(Uuid::new_v4(), vec![bad]).await;
        assert!(matches!(
            result,
            Err(CreateDocumentsError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_data_uri_accepted() {
        let repository = InMemoryDocumentRepository::new();
        let use_case = CreateDocumentsUseCase::new(repository.clone());

        let mut inline = upload("inline.txt");
        inline.file_url = "data:text/plain;base64,aGVsbG8=".to_string();

        assert!(use_case.execute(Uuid::new_v4(), vec![inline]).await.is_ok());
    }
}
