use std::sync::Arc;
use uuid::Uuid;

use crate::application::services::{DocumentProcessorService, ProcessingOptions};
use crate::domain::repositories::DocumentRepository;

#[derive(Debug)]
pub enum RetryDocumentError {
    NotFound(Uuid),
    InvalidState(String),
    RepositoryError(String),
}

impl std::fmt::Display for RetryDocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryDocumentError::NotFound(id) => write!(f, "Document not found: {}", id),
            RetryDocumentError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            RetryDocumentError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for RetryDocumentError {}

/// Resets a document in one transaction (chunks deleted, counters zeroed,
/// status back to pending) and re-runs processing asynchronously with
/// default parameters.
pub struct RetryDocumentUseCase {
    document_repository: Arc<dyn DocumentRepository>,
    processor: Arc<DocumentProcessorService>,
}

impl RetryDocumentUseCase {
    pub fn new(
        document_repository: Arc<dyn DocumentRepository>,
        processor: Arc<DocumentProcessorService>,
    ) -> Self {
        Self {
            document_repository,
            processor,
        }
    }

    pub async fn execute(
        &self,
        knowledge_base_id: Uuid,
        document_id: Uuid,
    ) -> Result<(), RetryDocumentError> {
        let document = self
            .document_repository
            .find_by_id(document_id)
            .await
            .map_err(|e| RetryDocumentError::RepositoryError(e.to_string()))?
            .filter(|document| !document.is_deleted())
            .ok_or(RetryDocumentError::NotFound(document_id))?;

        if document.knowledge_base_id() != knowledge_base_id {
            return Err(RetryDocumentError::InvalidState(format!(
                "Document {} does not belong to knowledge base {}",
                document_id, knowledge_base_id
            )));
        }

        if document.processing_status().is_processing() {
            return Err(RetryDocumentError::InvalidState(format!(
                "Document {} is still processing and cannot be retried",
                document_id
            )));
        }

        self.document_repository
            .reset_for_retry(document_id)
            .await
            .map_err(|e| RetryDocumentError::RepositoryError(e.to_string()))?;

        tracing::info!(document_id = %document_id, "Document reset for retry");

        let processor = self.processor.clone();
        tokio::spawn(async move {
            if let Err(error) = processor
                .process_document(document_id, knowledge_base_id, ProcessingOptions::default())
                .await
            {
                tracing::warn!(
                    document_id = %document_id,
                    error = %error,
                    "Retry processing failed"
                );
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::document_processor::test_support::{
        InMemoryDocumentRepository, StaticEmbeddings, StaticExtractor, pending_document,
    };
    use crate::domain::value_objects::ProcessingStatus;
    use std::time::Duration;

    fn processor(
        repository: Arc<InMemoryDocumentRepository>,
    ) -> Arc<DocumentProcessorService> {
        Arc::new(DocumentProcessorService::new(
            Arc::new(StaticExtractor {
                text: Ok("retry content ".repeat(50)),
                delay: None,
            }),
            Arc::new(StaticEmbeddings { dimension: 4 }),
            repository,
        ))
    }

    #[tokio::test]
    async fn test_retry_of_failed_document_reprocesses() {
        let repository = InMemoryDocumentRepository::new();
        let knowledge_base_id = Uuid::new_v4();

        let mut document = pending_document(knowledge_base_id);
        document.begin_processing().unwrap();
        document.fail_processing("first attempt broke".to_string()).unwrap();
        let document_id = document.id();
        repository.insert(document).await;

        let use_case = RetryDocumentUseCase::new(repository.clone(), processor(repository.clone()));
        use_case.execute(knowledge_base_id, document_id).await.unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;

        let stored = repository.get(document_id).await;
        assert_eq!(stored.processing_status(), &ProcessingStatus::Completed);
        assert!(stored.counters().chunk_count > 0);
        assert!(stored.processing_error().is_none());
    }

    #[tokio::test]
    async fn test_retry_rejected_while_processing() {
        let repository = InMemoryDocumentRepository::new();
        let knowledge_base_id = Uuid::new_v4();

        let mut document = pending_document(knowledge_base_id);
        document.begin_processing().unwrap();
        let document_id = document.id();
        repository.insert(document).await;

        let use_case = RetryDocumentUseCase::new(repository.clone(), processor(repository.clone()));
        let result = use_case.execute(knowledge_base_id, document_id).await;

        assert!(matches!(result, Err(RetryDocumentError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_retry_rejected_for_wrong_knowledge_base() {
        let repository = InMemoryDocumentRepository::new();
        let knowledge_base_id = Uuid::new_v4();

        let document = pending_document(knowledge_base_id);
        let document_id = document.id();
        repository.insert(document).await;

        let use_case = RetryDocumentUseCase::new(repository.clone(), processor(repository.clone()));
        let result = use_case.execute(Uuid::new_v4(), document_id).await;

        assert!(matches!(result, Err(RetryDocumentError::InvalidState(_))));
    }
}
