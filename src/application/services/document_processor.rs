use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::application::ports::content_extractor::{
    ContentExtractor, DocumentSource, ExtractionMethod,
};
use crate::application::ports::embedding_provider::{BatchEmbeddingRequest, EmbeddingProvider};
use crate::domain::entities::{Document, DocumentChunk, ProcessingCounters};
use crate::domain::repositories::DocumentRepository;
use crate::infrastructure::external_services::text_chunker::{TextChunk, TextChunker};

const DEFAULT_PROCESSING_TIMEOUT_SECS: u64 = 300;
const EMBEDDING_BATCH_SIZE: usize = 10;

#[derive(Debug)]
pub enum DocumentProcessingError {
    NotFound(Uuid),
    InvalidState(String),
    ExtractionError(String),
    EmbeddingError(String),
    RepositoryError(String),
    Timeout(u64),
}

impl std::fmt::Display for DocumentProcessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentProcessingError::NotFound(id) => write!(f, "Document not found: {}", id),
            DocumentProcessingError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            DocumentProcessingError::ExtractionError(msg) => {
                write!(f, "Extraction error: {}", msg)
            }
            DocumentProcessingError::EmbeddingError(msg) => write!(f, "Embedding error: {}", msg),
            DocumentProcessingError::RepositoryError(msg) => {
                write!(f, "Repository error: {}", msg)
            }
            DocumentProcessingError::Timeout(secs) => {
                write!(f, "Processing exceeded {}s timeout", secs)
            }
        }
    }
}

impl std::error::Error for DocumentProcessingError {}

/// Caller-supplied chunking parameters for one processing run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessingOptions {
    pub chunk_size: usize,
    pub min_characters_per_chunk: usize,
    pub chunk_overlap: usize,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            min_characters_per_chunk: 100,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessingOutcome {
    pub chunk_count: usize,
    pub token_count: i32,
    pub character_count: i32,
    pub extraction_method: ExtractionMethod,
}

/// One unit of work per document: extract, chunk, embed, copy tags, and
/// persist the chunk generation plus summary counters in a single
/// transaction. Any failure marks the document failed out-of-band; no
/// partial chunk rows can exist.
pub struct DocumentProcessorService {
    content_extractor: Arc<dyn ContentExtractor>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    document_repository: Arc<dyn DocumentRepository>,
    processing_timeout: Duration,
}

impl DocumentProcessorService {
    pub fn new(
        content_extractor: Arc<dyn ContentExtractor>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        document_repository: Arc<dyn DocumentRepository>,
    ) -> Self {
        let timeout_secs = env::var("PROCESSING_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_PROCESSING_TIMEOUT_SECS);

        Self {
            content_extractor,
            embedding_provider,
            document_repository,
            processing_timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.processing_timeout = timeout;
        self
    }

    pub async fn process_document(
        &self,
        document_id: Uuid,
        knowledge_base_id: Uuid,
        options: ProcessingOptions,
    ) -> Result<ProcessingOutcome, DocumentProcessingError> {
        // Always read fresh state; status is never cached across awaits.
        let mut document = self
            .document_repository
            .find_by_id(document_id)
            .await
            .map_err(|e| DocumentProcessingError::RepositoryError(e.to_string()))?
            .ok_or(DocumentProcessingError::NotFound(document_id))?;

        if document.knowledge_base_id() != knowledge_base_id {
            return Err(DocumentProcessingError::InvalidState(format!(
                "Document {} does not belong to knowledge base {}",
                document_id, knowledge_base_id
            )));
        }

        document
            .begin_processing()
            .map_err(DocumentProcessingError::InvalidState)?;
        self.document_repository
            .save_processing_state(&document)
            .await
            .map_err(|e| DocumentProcessingError::RepositoryError(e.to_string()))?;

        tracing::info!(
            document_id = %document_id,
            filename = %document.filename(),
            "Processing document"
        );

        let started = std::time::Instant::now();
        let pipeline = self.run_pipeline(&document, options);

        match tokio::time::timeout(self.processing_timeout, pipeline).await {
            Ok(Ok(outcome)) => {
                tracing::info!(
                    document_id = %document_id,
                    chunks = outcome.chunk_count,
                    tokens = outcome.token_count,
                    method = %outcome.extraction_method,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Document processed"
                );
                Ok(outcome)
            }
            Ok(Err(error)) => {
                self.record_failure(document_id, &error.to_string()).await;
                Err(error)
            }
            Err(_) => {
                let error = DocumentProcessingError::Timeout(self.processing_timeout.as_secs());
                self.record_failure(document_id, &error.to_string()).await;
                Err(error)
            }
        }
    }

    async fn run_pipeline(
        &self,
        document: &Document,
        options: ProcessingOptions,
    ) -> Result<ProcessingOutcome, DocumentProcessingError> {
        let source = DocumentSource {
            file_url: document.file_url().to_string(),
            filename: document.filename().to_string(),
            mime_type: document.mime_type().to_string(),
        };

        let extracted = self
            .content_extractor
            .extract(&source)
            .await
            .map_err(|e| DocumentProcessingError::ExtractionError(e.to_string()))?;

        let chunker = TextChunker::new(
            options.chunk_size,
            options.min_characters_per_chunk,
            options.chunk_overlap,
        );
        let text_chunks = chunker.chunk(&extracted.text);

        let embeddings = self.generate_embeddings(&text_chunks).await?;

        // Tag slots are re-read fresh so edits made while the pipeline ran
        // still land on the new chunk generation.
        let fresh = self
            .document_repository
            .find_by_id(document.id())
            .await
            .map_err(|e| DocumentProcessingError::RepositoryError(e.to_string()))?
            .ok_or(DocumentProcessingError::NotFound(document.id()))?;
        let tags = fresh.tags().clone();

        let model_name = self.embedding_provider.model_name();
        let chunks: Vec<DocumentChunk> = text_chunks
            .iter()
            .zip(embeddings.into_iter())
            .enumerate()
            .map(|(index, (text_chunk, embedding))| {
                DocumentChunk::new(
                    document.id(),
                    document.knowledge_base_id(),
                    index as i32,
                    text_chunk.content.clone(),
                    text_chunk.token_count,
                    text_chunk.start_offset as i32,
                    text_chunk.end_offset as i32,
                    tags.clone(),
                )
                .with_embedding(embedding, model_name.clone())
            })
            .collect();

        let counters = ProcessingCounters {
            chunk_count: chunks.len() as i32,
            token_count: chunks.iter().map(|chunk| chunk.token_count()).sum(),
            character_count: extracted.text.chars().count() as i32,
        };

        self.document_repository
            .finalize_processing(document.id(), &chunks, counters)
            .await
            .map_err(|e| DocumentProcessingError::RepositoryError(e.to_string()))?;

        Ok(ProcessingOutcome {
            chunk_count: chunks.len(),
            token_count: counters.token_count,
            character_count: counters.character_count,
            extraction_method: extracted.method,
        })
    }

    async fn generate_embeddings(
        &self,
        chunks: &[TextChunk],
    ) -> Result<Vec<pgvector::Vector>, DocumentProcessingError> {
        let mut embeddings = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(EMBEDDING_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.content.clone()).collect();

            let response = self
                .embedding_provider
                .generate_embeddings(BatchEmbeddingRequest { texts })
                .await
                .map_err(|e| DocumentProcessingError::EmbeddingError(e.to_string()))?;

            embeddings.extend(response.embeddings);
        }

        if embeddings.len() != chunks.len() {
            return Err(DocumentProcessingError::EmbeddingError(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        Ok(embeddings)
    }

    /// Out-of-band failure marking. If even this fails, the error is logged
    /// for operational visibility and not retried inline.
    async fn record_failure(&self, document_id: Uuid, message: &str) {
        if let Err(error) = self
            .document_repository
            .mark_failed(document_id, message)
            .await
        {
            tracing::error!(
                document_id = %document_id,
                error = %error,
                "Failed to record document failure"
            );
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use pgvector::Vector;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use crate::application::ports::content_extractor::{
        ContentExtractionError, ContentExtractor, DocumentSource, ExtractedDocument,
        ExtractionMethod,
    };
    use crate::application::ports::embedding_provider::{
        BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingProvider, EmbeddingProviderError,
    };
    use crate::domain::entities::{Document, DocumentChunk, ProcessingCounters};
    use crate::domain::repositories::document_repository::{
        DocumentFilters, DocumentPage, DocumentRepository, DocumentRepositoryError,
    };
    use crate::domain::value_objects::ProcessingStatus;

    pub struct StaticExtractor {
        pub text: Result<String, String>,
        pub delay: Option<std::time::Duration>,
    }

    #[async_trait]
    impl ContentExtractor for StaticExtractor {
        async fn extract(
            &self,
            _source: &DocumentSource,
        ) -> Result<ExtractedDocument, ContentExtractionError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            match &self.text {
                Ok(text) => Ok(ExtractedDocument {
                    text: text.clone(),
                    method: ExtractionMethod::FileParser("txt".to_string()),
                }),
                Err(message) => Err(ContentExtractionError::ParseFailed(message.clone())),
            }
        }
    }

    pub struct StaticEmbeddings {
        pub dimension: usize,
    }

    #[async_trait]
    impl EmbeddingProvider for StaticEmbeddings {
        async fn generate_embeddings(
            &self,
            request: BatchEmbeddingRequest,
        ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
            let embeddings = request
                .texts
                .iter()
                .map(|_| Vector::from(vec![0.0; self.dimension]))
                .collect();

            Ok(BatchEmbeddingResponse {
                embeddings,
                model_name: "test-model".to_string(),
            })
        }

        fn model_name(&self) -> String {
            "test-model".to_string()
        }

        fn embedding_dimension(&self) -> usize {
            self.dimension
        }
    }

    #[derive(Default)]
    pub struct InMemoryDocumentRepository {
        pub documents: Mutex<HashMap<Uuid, Document>>,
        pub chunks: Mutex<HashMap<Uuid, Vec<DocumentChunk>>>,
    }

    impl InMemoryDocumentRepository {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub async fn insert(&self, document: Document) {
            self.documents
                .lock()
                .await
                .insert(document.id(), document);
        }

        pub async fn get(&self, id: Uuid) -> Document {
            self.documents
                .lock()
                .await
                .get(&id)
                .cloned()
                .expect("document exists")
        }

        pub async fn chunk_count(&self, id: Uuid) -> usize {
            self.chunks
                .lock()
                .await
                .get(&id)
                .map(|chunks| chunks.len())
                .unwrap_or(0)
        }
    }

    #[async_trait]
    impl DocumentRepository for InMemoryDocumentRepository {
        async fn create_batch(
            &self,
            docs: &[Document],
        ) -> Result<Vec<Document>, DocumentRepositoryError> {
            let mut documents = self.documents.lock().await;
            for document in docs {
                documents.insert(document.id(), document.clone());
            }
            Ok(docs.to_vec())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>, DocumentRepositoryError> {
            Ok(self.documents.lock().await.get(&id).cloned())
        }

        async fn find_for_knowledge_base(
            &self,
            knowledge_base_id: Uuid,
            _filters: DocumentFilters,
        ) -> Result<DocumentPage, DocumentRepositoryError> {
            let documents: Vec<Document> = self
                .documents
                .lock()
                .await
                .values()
                .filter(|doc| doc.knowledge_base_id() == knowledge_base_id && !doc.is_deleted())
                .cloned()
                .collect();
            let total = documents.len() as i64;

            Ok(DocumentPage { documents, total })
        }

        async fn update(&self, document: &Document) -> Result<(), DocumentRepositoryError> {
            self.documents
                .lock()
                .await
                .insert(document.id(), document.clone());
            Ok(())
        }

        async fn save_processing_state(
            &self,
            document: &Document,
        ) -> Result<(), DocumentRepositoryError> {
            self.documents
                .lock()
                .await
                .insert(document.id(), document.clone());
            Ok(())
        }

        async fn finalize_processing(
            &self,
            document_id: Uuid,
            chunks: &[DocumentChunk],
            counters: ProcessingCounters,
        ) -> Result<(), DocumentRepositoryError> {
            let mut documents = self.documents.lock().await;
            let document = documents
                .get_mut(&document_id)
                .ok_or(DocumentRepositoryError::NotFound(document_id))?;
            document
                .complete_processing(counters)
                .map_err(DocumentRepositoryError::ValidationError)?;

            self.chunks
                .lock()
                .await
                .insert(document_id, chunks.to_vec());
            Ok(())
        }

        async fn mark_failed(
            &self,
            document_id: Uuid,
            error_message: &str,
        ) -> Result<(), DocumentRepositoryError> {
            let mut documents = self.documents.lock().await;
            let document = documents
                .get_mut(&document_id)
                .ok_or(DocumentRepositoryError::NotFound(document_id))?;
            document
                .fail_processing(error_message.to_string())
                .map_err(DocumentRepositoryError::ValidationError)?;
            Ok(())
        }

        async fn reset_for_retry(&self, document_id: Uuid) -> Result<(), DocumentRepositoryError> {
            let mut documents = self.documents.lock().await;
            let document = documents
                .get_mut(&document_id)
                .ok_or(DocumentRepositoryError::NotFound(document_id))?;
            document
                .reset_for_retry()
                .map_err(DocumentRepositoryError::ValidationError)?;

            self.chunks.lock().await.remove(&document_id);
            Ok(())
        }

        async fn bulk_set_enabled(
            &self,
            knowledge_base_id: Uuid,
            document_ids: &[Uuid],
            enabled: bool,
        ) -> Result<usize, DocumentRepositoryError> {
            let mut documents = self.documents.lock().await;
            let mut updated = 0;
            for id in document_ids {
                if let Some(document) = documents.get_mut(id) {
                    if document.knowledge_base_id() == knowledge_base_id {
                        document.set_enabled(enabled);
                        updated += 1;
                    }
                }
            }
            Ok(updated)
        }

        async fn bulk_soft_delete(
            &self,
            knowledge_base_id: Uuid,
            document_ids: &[Uuid],
        ) -> Result<usize, DocumentRepositoryError> {
            let mut documents = self.documents.lock().await;
            let mut updated = 0;
            for id in document_ids {
                if let Some(document) = documents.get_mut(id) {
                    if document.knowledge_base_id() == knowledge_base_id {
                        document.soft_delete();
                        updated += 1;
                    }
                }
            }
            Ok(updated)
        }
    }

    pub fn pending_document(knowledge_base_id: Uuid) -> Document {
        Document::new(
            knowledge_base_id,
            "report.txt".to_string(),
            "https://files.example.com/report.txt".to_string(),
            512,
            "text/plain".to_string(),
            crate::domain::value_objects::TagSlots::default(),
        )
    }

    pub fn assert_failed(document: &Document) {
        assert!(matches!(
            document.processing_status(),
            ProcessingStatus::Failed(_)
        ));
    }
}
