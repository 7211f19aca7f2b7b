use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::application::ports::job_queue::{JobHandler, JobQueue, JobQueueError};
use crate::application::ports::task_dispatcher::{DispatchTask, TaskDispatchError, TaskDispatcher};
use crate::application::services::document_processor::{
    DocumentProcessorService, ProcessingOptions,
};
use crate::domain::entities::{Document, QueuedJob};
use crate::domain::repositories::DocumentRepository;

pub const DOCUMENT_PROCESS_JOB: &str = "document-process";

/// Fan-out knobs for the in-process scheduler tier.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub max_concurrency: usize,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub stagger_delay_ms: u64,
    pub job_max_attempts: u32,
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        let read = |name: &str, default: u64| {
            env::var(name)
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(default)
        };

        Self {
            max_concurrency: read("PROCESS_MAX_CONCURRENCY", 4) as usize,
            batch_size: read("PROCESS_BATCH_SIZE", 10) as usize,
            batch_delay_ms: read("PROCESS_BATCH_DELAY_MS", 1_000),
            stagger_delay_ms: read("PROCESS_STAGGER_DELAY_MS", 150),
            job_max_attempts: read("PROCESS_JOB_MAX_ATTEMPTS", 3) as u32,
        }
    }

    /// Reduced sizing used when no distributed backend shields the process
    /// from a bulk upload.
    pub fn halved(&self) -> Self {
        Self {
            max_concurrency: (self.max_concurrency / 2).max(1),
            batch_size: (self.batch_size / 2).max(1),
            batch_delay_ms: self.batch_delay_ms,
            stagger_delay_ms: self.stagger_delay_ms,
            job_max_attempts: self.job_max_attempts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentJobPayload {
    pub document_id: Uuid,
    pub knowledge_base_id: Uuid,
    pub options: ProcessingOptions,
}

/// Queue handler binding jobs to the document processor.
pub struct DocumentJobHandler {
    processor: Arc<DocumentProcessorService>,
}

impl DocumentJobHandler {
    pub fn new(processor: Arc<DocumentProcessorService>) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl JobHandler for DocumentJobHandler {
    async fn handle(&self, job: &QueuedJob) -> Result<(), String> {
        let payload: DocumentJobPayload = serde_json::from_value(job.payload.clone())
            .map_err(|e| format!("Malformed job payload: {}", e))?;

        self.processor
            .process_document(
                payload.document_id,
                payload.knowledge_base_id,
                payload.options,
            )
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Fans a batch of documents out across the best available execution
/// substrate: external task dispatcher, distributed queue, or the
/// in-process semaphore-limited scheduler. The only entry point the rest of
/// the application calls; completion is observed through document status.
pub struct ProcessingOrchestrator {
    task_dispatcher: Option<Arc<dyn TaskDispatcher>>,
    job_queue: Arc<dyn JobQueue>,
    processor: Arc<DocumentProcessorService>,
    document_repository: Arc<dyn DocumentRepository>,
    config: SchedulerConfig,
}

impl ProcessingOrchestrator {
    pub fn new(
        task_dispatcher: Option<Arc<dyn TaskDispatcher>>,
        job_queue: Arc<dyn JobQueue>,
        processor: Arc<DocumentProcessorService>,
        document_repository: Arc<dyn DocumentRepository>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            task_dispatcher,
            job_queue,
            processor,
            document_repository,
            config,
        }
    }

    pub async fn process_batch(
        &self,
        documents: Vec<Document>,
        knowledge_base_id: Uuid,
        options: ProcessingOptions,
    ) {
        if documents.is_empty() {
            return;
        }

        if let Some(dispatcher) = &self.task_dispatcher {
            match self
                .dispatch_via_tasks(dispatcher.as_ref(), &documents, knowledge_base_id, options)
                .await
            {
                Ok(()) => {
                    tracing::info!(
                        count = documents.len(),
                        "Batch submitted to external task dispatcher"
                    );
                    return;
                }
                Err(error) => {
                    tracing::warn!(
                        error = %error,
                        "External task dispatcher unavailable, falling back to queue"
                    );
                }
            }
        }

        if self.job_queue.backend_available() {
            match self
                .dispatch_via_queue(&documents, knowledge_base_id, options)
                .await
            {
                Ok(()) => {
                    tracing::info!(count = documents.len(), "Batch enqueued on distributed queue");
                    return;
                }
                Err(error) => {
                    tracing::warn!(
                        error = %error,
                        "Distributed queue unavailable, falling back to in-process scheduler"
                    );
                }
            }
        }

        self.schedule_in_process(documents, knowledge_base_id, options);
    }

    /// Tier 1. A failure before any task is confirmed falls through to the
    /// next tier; once tasks are in flight, a per-document failure marks
    /// only that document.
    async fn dispatch_via_tasks(
        &self,
        dispatcher: &dyn TaskDispatcher,
        documents: &[Document],
        knowledge_base_id: Uuid,
        options: ProcessingOptions,
    ) -> Result<(), TaskDispatchError> {
        for (index, document) in documents.iter().enumerate() {
            let payload = job_payload(document.id(), knowledge_base_id, options)
                .map_err(TaskDispatchError::Configuration)?;
            let task = DispatchTask {
                task_type: DOCUMENT_PROCESS_JOB.to_string(),
                payload,
            };

            match dispatcher.submit(task).await {
                Ok(()) => {}
                Err(error) if index == 0 => return Err(error),
                Err(error) => {
                    tracing::warn!(
                        document_id = %document.id(),
                        error = %error,
                        "Task submission failed mid-batch"
                    );
                    if let Err(mark_error) = self
                        .document_repository
                        .mark_failed(document.id(), &format!("Task dispatch failed: {}", error))
                        .await
                    {
                        tracing::error!(
                            document_id = %document.id(),
                            error = %mark_error,
                            "Failed to mark document after dispatch failure"
                        );
                    }
                }
            }
        }

        Ok(())
    }

    /// Tier 2: one job per document, then consumers bound to the processor.
    async fn dispatch_via_queue(
        &self,
        documents: &[Document],
        knowledge_base_id: Uuid,
        options: ProcessingOptions,
    ) -> Result<(), JobQueueError> {
        for (index, document) in documents.iter().enumerate() {
            let payload = job_payload(document.id(), knowledge_base_id, options)
                .map_err(JobQueueError::SerializationError)?;

            match self
                .job_queue
                .add_job(DOCUMENT_PROCESS_JOB, payload, self.config.job_max_attempts)
                .await
            {
                Ok(_) => {}
                Err(error) if index == 0 => return Err(error),
                Err(error) => {
                    tracing::warn!(
                        document_id = %document.id(),
                        error = %error,
                        "Enqueue failed mid-batch"
                    );
                    if let Err(mark_error) = self
                        .document_repository
                        .mark_failed(document.id(), &format!("Enqueue failed: {}", error))
                        .await
                    {
                        tracing::error!(
                            document_id = %document.id(),
                            error = %mark_error,
                            "Failed to mark document after enqueue failure"
                        );
                    }
                }
            }
        }

        let handler = Arc::new(DocumentJobHandler::new(self.processor.clone()));
        self.job_queue.process_jobs(handler).await
    }

    /// Tier 3: sequential batches, staggered starts, admission through a
    /// counting semaphore. Per-document failures are already converted to
    /// failed status by the processor and never abort siblings.
    fn schedule_in_process(
        &self,
        documents: Vec<Document>,
        knowledge_base_id: Uuid,
        options: ProcessingOptions,
    ) {
        let config = if self.job_queue.backend_available() {
            self.config.clone()
        } else {
            self.config.halved()
        };

        tracing::info!(
            count = documents.len(),
            concurrency = config.max_concurrency,
            batch_size = config.batch_size,
            "Scheduling batch on in-process scheduler"
        );

        let processor = self.processor.clone();

        tokio::spawn(async move {
            let semaphore = Arc::new(Semaphore::new(config.max_concurrency));

            for (batch_index, batch) in documents.chunks(config.batch_size).enumerate() {
                if batch_index > 0 {
                    tokio::time::sleep(Duration::from_millis(config.batch_delay_ms)).await;
                }

                let mut handles = Vec::with_capacity(batch.len());

                for (index, document) in batch.iter().cloned().enumerate() {
                    let semaphore = semaphore.clone();
                    let processor = processor.clone();
                    let stagger = Duration::from_millis(config.stagger_delay_ms * index as u64);

                    handles.push(tokio::spawn(async move {
                        tokio::time::sleep(stagger).await;

                        let Ok(_permit) = semaphore.acquire().await else {
                            return;
                        };

                        if let Err(error) = processor
                            .process_document(document.id(), knowledge_base_id, options)
                            .await
                        {
                            // The processor already recorded the failure.
                            tracing::warn!(
                                document_id = %document.id(),
                                error = %error,
                                "Document processing failed"
                            );
                        }
                    }));
                }

                futures::future::join_all(handles).await;
            }

            tracing::info!("In-process batch scheduling complete");
        });
    }
}

fn job_payload(
    document_id: Uuid,
    knowledge_base_id: Uuid,
    options: ProcessingOptions,
) -> Result<serde_json::Value, String> {
    serde_json::to_value(DocumentJobPayload {
        document_id,
        knowledge_base_id,
        options,
    })
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::document_processor::test_support::{
        InMemoryDocumentRepository, StaticEmbeddings, StaticExtractor, pending_document,
    };
    use crate::domain::value_objects::ProcessingStatus;
    use crate::infrastructure::messaging::dispatch_queue::{DispatchQueue, QueueConfig};

    fn scheduler_config() -> SchedulerConfig {
        SchedulerConfig {
            max_concurrency: 4,
            batch_size: 2,
            batch_delay_ms: 10,
            stagger_delay_ms: 5,
            job_max_attempts: 3,
        }
    }

    fn queue_config() -> QueueConfig {
        QueueConfig {
            max_concurrency: 2,
            poll_timeout_secs: 1,
            poll_interval_ms: 10,
            retry_delay_ms: 10,
            backend_failure_threshold: 3,
            list_key: "test:jobs".to_string(),
        }
    }

    #[test]
    fn test_halved_config_floors_at_one() {
        let config = SchedulerConfig {
            max_concurrency: 1,
            batch_size: 1,
            batch_delay_ms: 100,
            stagger_delay_ms: 10,
            job_max_attempts: 3,
        };
        let halved = config.halved();

        assert_eq!(halved.max_concurrency, 1);
        assert_eq!(halved.batch_size, 1);
    }

    #[test]
    fn test_job_payload_round_trip() {
        let document_id = Uuid::new_v4();
        let knowledge_base_id = Uuid::new_v4();
        let options = ProcessingOptions {
            chunk_size: 1024,
            min_characters_per_chunk: 100,
            chunk_overlap: 200,
        };

        let payload = job_payload(document_id, knowledge_base_id, options).unwrap();
        let parsed: DocumentJobPayload = serde_json::from_value(payload).unwrap();

        assert_eq!(parsed.document_id, document_id);
        assert_eq!(parsed.knowledge_base_id, knowledge_base_id);
        assert_eq!(parsed.options, options);
    }

    #[tokio::test]
    async fn test_in_process_tier_processes_all_documents() {
        let repository = InMemoryDocumentRepository::new();
        let knowledge_base_id = Uuid::new_v4();

        let mut documents = Vec::new();
        for _ in 0..5 {
            let document = pending_document(knowledge_base_id);
            repository.insert(document.clone()).await;
            documents.push(document);
        }

        let processor = Arc::new(DocumentProcessorService::new(
            Arc::new(StaticExtractor {
                text: Ok("content ".repeat(100)),
                delay: None,
            }),
            Arc::new(StaticEmbeddings { dimension: 4 }),
            repository.clone(),
        ));

        // No dispatcher and no Redis backend: tier 3 must handle the batch.
        let orchestrator = ProcessingOrchestrator::new(
            None,
            Arc::new(DispatchQueue::new(None, queue_config())),
            processor,
            repository.clone(),
            scheduler_config(),
        );

        orchestrator
            .process_batch(documents.clone(), knowledge_base_id, ProcessingOptions::default())
            .await;

        tokio::time::sleep(Duration::from_millis(800)).await;

        for document in &documents {
            let stored = repository.get(document.id()).await;
            assert_eq!(
                stored.processing_status(),
                &ProcessingStatus::Completed,
                "document {} should have completed",
                document.id()
            );
            assert!(stored.counters().chunk_count > 0);
        }
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_siblings() {
        let repository = InMemoryDocumentRepository::new();
        let knowledge_base_id = Uuid::new_v4();

        // One document with an unfetchable source among healthy siblings.
        let healthy_a = pending_document(knowledge_base_id);
        let mut poisoned = pending_document(knowledge_base_id);
        poisoned.begin_processing().unwrap(); // wrong state; processing will be rejected
        let healthy_b = pending_document(knowledge_base_id);

        for document in [&healthy_a, &poisoned, &healthy_b] {
            repository.insert(document.clone()).await;
        }

        let processor = Arc::new(DocumentProcessorService::new(
            Arc::new(StaticExtractor {
                text: Ok("content ".repeat(50)),
                delay: None,
            }),
            Arc::new(StaticEmbeddings { dimension: 4 }),
            repository.clone(),
        ));

        let orchestrator = ProcessingOrchestrator::new(
            None,
            Arc::new(DispatchQueue::new(None, queue_config())),
            processor,
            repository.clone(),
            scheduler_config(),
        );

        orchestrator
            .process_batch(
                vec![healthy_a.clone(), poisoned.clone(), healthy_b.clone()],
                knowledge_base_id,
                ProcessingOptions::default(),
            )
            .await;

        tokio::time::sleep(Duration::from_millis(800)).await;

        assert_eq!(
            repository.get(healthy_a.id()).await.processing_status(),
            &ProcessingStatus::Completed
        );
        assert_eq!(
            repository.get(healthy_b.id()).await.processing_status(),
            &ProcessingStatus::Completed
        );
        // The poisoned document stays in its prior state; its failure never
        // propagated to the batch.
        assert_eq!(
            repository.get(poisoned.id()).await.processing_status(),
            &ProcessingStatus::Processing
        );
    }
}
