use std::sync::Arc;
use uuid::Uuid;

use crate::application::services::{ProcessingOptions, ProcessingOrchestrator};
use crate::domain::entities::Document;

/// Entry point into batch processing. Fire-and-forget: scheduling happens in
/// the background and completion is observed through document status, never
/// through a returned error.
pub struct ProcessDocumentsUseCase {
    orchestrator: Arc<ProcessingOrchestrator>,
}

impl ProcessDocumentsUseCase {
    pub fn new(orchestrator: Arc<ProcessingOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Schedules every processable document in the batch; returns how many
    /// were accepted.
    pub async fn execute(
        &self,
        knowledge_base_id: Uuid,
        documents: Vec<Document>,
        options: ProcessingOptions,
    ) -> usize {
        let processable: Vec<Document> = documents
            .into_iter()
            .filter(|document| {
                let eligible = document.knowledge_base_id() == knowledge_base_id
                    && document.is_processable();
                if !eligible {
                    tracing::debug!(
                        document_id = %document.id(),
                        status = %document.processing_status(),
                        "Skipping non-processable document"
                    );
                }
                eligible
            })
            .collect();

        let accepted = processable.len();
        if accepted == 0 {
            return 0;
        }

        let orchestrator = self.orchestrator.clone();
        tokio::spawn(async move {
            orchestrator
                .process_batch(processable, knowledge_base_id, options)
                .await;
        });

        accepted
    }
}
