use chrono::Utc;
use std::env;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::repositories::DocumentRepository;

const DEFAULT_MIN_AGE_SECS: i64 = 600;

#[derive(Debug)]
pub enum MarkDocumentDeadError {
    NotFound(Uuid),
    InvalidState(String),
    TooRecent { elapsed_secs: i64, min_secs: i64 },
    RepositoryError(String),
}

impl std::fmt::Display for MarkDocumentDeadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkDocumentDeadError::NotFound(id) => write!(f, "Document not found: {}", id),
            MarkDocumentDeadError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            MarkDocumentDeadError::TooRecent {
                elapsed_secs,
                min_secs,
            } => write!(
                f,
                "Document has only been processing for {}s (minimum {}s before it can be marked dead)",
                elapsed_secs, min_secs
            ),
            MarkDocumentDeadError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for MarkDocumentDeadError {}

/// Dead-process detection: a document stuck in `processing` past a wall-clock
/// threshold is presumed orphaned by a crashed worker and transitioned to
/// `failed`. Below the threshold the request is rejected without mutation,
/// protecting genuinely in-flight work.
pub struct MarkDocumentDeadUseCase {
    document_repository: Arc<dyn DocumentRepository>,
    min_age_secs: i64,
}

impl MarkDocumentDeadUseCase {
    pub fn new(document_repository: Arc<dyn DocumentRepository>) -> Self {
        let min_age_secs = env::var("DEAD_PROCESS_MIN_AGE_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_MIN_AGE_SECS);

        Self {
            document_repository,
            min_age_secs,
        }
    }

    pub fn with_min_age_secs(mut self, min_age_secs: i64) -> Self {
        self.min_age_secs = min_age_secs;
        self
    }

    pub async fn execute(&self, document_id: Uuid) -> Result<(), MarkDocumentDeadError> {
        let document = self
            .document_repository
            .find_by_id(document_id)
            .await
            .map_err(|e| MarkDocumentDeadError::RepositoryError(e.to_string()))?
            .ok_or(MarkDocumentDeadError::NotFound(document_id))?;

        if !document.processing_status().is_processing() {
            return Err(MarkDocumentDeadError::InvalidState(format!(
                "Document {} is '{}', not processing",
                document_id,
                document.processing_status()
            )));
        }

        let started_at = document.processing_started_at().ok_or_else(|| {
            MarkDocumentDeadError::InvalidState(format!(
                "Document {} is processing but has no start timestamp",
                document_id
            ))
        })?;

        let elapsed_secs = (Utc::now() - started_at).num_seconds();
        if elapsed_secs < self.min_age_secs {
            return Err(MarkDocumentDeadError::TooRecent {
                elapsed_secs,
                min_secs: self.min_age_secs,
            });
        }

        let message = format!(
            "Processing timed out after {}s; worker presumed dead",
            elapsed_secs
        );

        self.document_repository
            .mark_failed(document_id, &message)
            .await
            .map_err(|e| MarkDocumentDeadError::RepositoryError(e.to_string()))?;

        tracing::warn!(
            document_id = %document_id,
            elapsed_secs,
            "Document marked dead after processing timeout"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::document_processor::test_support::{
        InMemoryDocumentRepository, pending_document,
    };
    use crate::domain::entities::{Document, ProcessingCounters};
    use crate::domain::value_objects::{ProcessingStatus, TagSlots};
    use chrono::Duration;

    fn processing_document_started_at(
        knowledge_base_id: Uuid,
        started_secs_ago: i64,
    ) -> Document {
        Document::from_database(
            Uuid::new_v4(),
            knowledge_base_id,
            "stuck.pdf".to_string(),
            "https://files.example.com/stuck.pdf".to_string(),
            1024,
            "application/pdf".to_string(),
            ProcessingCounters::default(),
            ProcessingStatus::Processing,
            Some(Utc::now() - Duration::seconds(started_secs_ago)),
            None,
            true,
            TagSlots::default(),
            Utc::now() - Duration::seconds(started_secs_ago + 60),
            None,
        )
    }

    #[tokio::test]
    async fn test_young_processing_document_rejected() {
        let repository = InMemoryDocumentRepository::new();
        let knowledge_base_id = Uuid::new_v4();
        let document = processing_document_started_at(knowledge_base_id, 30);
        let document_id = document.id();
        repository.insert(document).await;

        let use_case =
            MarkDocumentDeadUseCase::new(repository.clone()).with_min_age_secs(600);

        let result = use_case.execute(document_id).await;
        assert!(matches!(
            result,
            Err(MarkDocumentDeadError::TooRecent { .. })
        ));

        // No mutation happened.
        let stored = repository.get(document_id).await;
        assert_eq!(stored.processing_status(), &ProcessingStatus::Processing);
    }

    #[tokio::test]
    async fn test_stale_processing_document_marked_failed() {
        let repository = InMemoryDocumentRepository::new();
        let knowledge_base_id = Uuid::new_v4();
        let document = processing_document_started_at(knowledge_base_id, 1_200);
        let document_id = document.id();
        repository.insert(document).await;

        let use_case =
            MarkDocumentDeadUseCase::new(repository.clone()).with_min_age_secs(600);

        use_case.execute(document_id).await.unwrap();

        let stored = repository.get(document_id).await;
        assert!(stored.processing_status().is_failed());
        assert!(
            stored
                .processing_error()
                .unwrap()
                .contains("worker presumed dead")
        );
    }

    #[tokio::test]
    async fn test_non_processing_document_rejected() {
        let repository = InMemoryDocumentRepository::new();
        let knowledge_base_id = Uuid::new_v4();
        let document = pending_document(knowledge_base_id);
        let document_id = document.id();
        repository.insert(document).await;

        let use_case =
            MarkDocumentDeadUseCase::new(repository.clone()).with_min_age_secs(600);

        let result = use_case.execute(document_id).await;
        assert!(matches!(
            result,
            Err(MarkDocumentDeadError::InvalidState(_))
        ));
    }
}
