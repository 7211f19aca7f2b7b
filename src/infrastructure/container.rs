use std::sync::Arc;

use crate::{
    application::{
        ports::{ContentExtractor, EmbeddingProvider, JobQueue, ObjectStorage, TaskDispatcher},
        services::{DocumentProcessorService, ProcessingOrchestrator, SchedulerConfig},
        use_cases::{
            BulkDocumentOperationUseCase, CreateDocumentsUseCase, DeleteDocumentUseCase,
            GetDocumentChunksUseCase, GetDocumentUseCase, ListDocumentsUseCase,
            MarkDocumentDeadUseCase, ProcessDocumentsUseCase, RetryDocumentUseCase,
            UpdateDocumentUseCase,
        },
    },
    domain::repositories::{ChunkRepository, DocumentRepository},
    infrastructure::{
        database::{
            create_connection_pool, get_database_connection,
            repositories::{PostgresChunkRepository, PostgresDocumentRepository},
            run_migrations,
        },
        external_services::{
            FallbackContentExtractor, InferenceEmbeddingProvider, S3ObjectStorage,
        },
        messaging::{DispatchQueue, HttpTaskDispatcher},
    },
    presentation::http::handlers::DocumentHandler,
};

pub struct AppContainer {
    // Repositories
    pub document_repository: Arc<dyn DocumentRepository>,
    pub chunk_repository: Arc<dyn ChunkRepository>,

    // External services
    pub embedding_provider: Arc<dyn EmbeddingProvider>,
    pub object_storage: Option<Arc<dyn ObjectStorage>>,
    pub content_extractor: Arc<dyn ContentExtractor>,

    // Execution substrates
    pub job_queue: Arc<dyn JobQueue>,
    pub task_dispatcher: Option<Arc<dyn TaskDispatcher>>,

    // Services
    pub document_processor: Arc<DocumentProcessorService>,
    pub orchestrator: Arc<ProcessingOrchestrator>,

    // Use cases
    pub create_documents_use_case: Arc<CreateDocumentsUseCase>,
    pub process_documents_use_case: Arc<ProcessDocumentsUseCase>,
    pub list_documents_use_case: Arc<ListDocumentsUseCase>,
    pub get_document_use_case: Arc<GetDocumentUseCase>,
    pub get_document_chunks_use_case: Arc<GetDocumentChunksUseCase>,
    pub update_document_use_case: Arc<UpdateDocumentUseCase>,
    pub delete_document_use_case: Arc<DeleteDocumentUseCase>,
    pub bulk_operation_use_case: Arc<BulkDocumentOperationUseCase>,
    pub retry_document_use_case: Arc<RetryDocumentUseCase>,
    pub mark_document_dead_use_case: Arc<MarkDocumentDeadUseCase>,

    // HTTP handlers
    pub document_handler: Arc<DocumentHandler>,
}

impl AppContainer {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Database pool and embedded migrations
        let db_pool = create_connection_pool()?;
        let mut conn = get_database_connection()?;
        run_migrations(&mut conn)?;

        // Repositories
        let document_repository: Arc<dyn DocumentRepository> =
            Arc::new(PostgresDocumentRepository::new(db_pool.clone()));
        let chunk_repository: Arc<dyn ChunkRepository> =
            Arc::new(PostgresChunkRepository::new(db_pool));

        // External services
        let embedding_provider: Arc<dyn EmbeddingProvider> =
            Arc::new(InferenceEmbeddingProvider::from_env()?);

        let object_storage: Option<Arc<dyn ObjectStorage>> = match S3ObjectStorage::from_env() {
            Some(Ok(storage)) => Some(Arc::new(storage)),
            Some(Err(error)) => return Err(Box::new(error)),
            None => {
                tracing::info!(
                    "No object storage configured; OCR of non-URL sources is unavailable"
                );
                None
            }
        };

        let content_extractor: Arc<dyn ContentExtractor> = Arc::new(
            FallbackContentExtractor::from_env(object_storage.clone())?,
        );

        // Execution substrates
        let job_queue: Arc<dyn JobQueue> = Arc::new(DispatchQueue::from_env());

        let task_dispatcher: Option<Arc<dyn TaskDispatcher>> = match HttpTaskDispatcher::from_env()
        {
            Some(Ok(dispatcher)) => {
                tracing::info!("External task dispatcher configured");
                Some(Arc::new(dispatcher))
            }
            Some(Err(error)) => return Err(Box::new(error)),
            None => None,
        };

        // Services
        let document_processor = Arc::new(DocumentProcessorService::new(
            content_extractor.clone(),
            embedding_provider.clone(),
            document_repository.clone(),
        ));

        let orchestrator = Arc::new(ProcessingOrchestrator::new(
            task_dispatcher.clone(),
            job_queue.clone(),
            document_processor.clone(),
            document_repository.clone(),
            SchedulerConfig::from_env(),
        ));

        // Use cases
        let create_documents_use_case =
            Arc::new(CreateDocumentsUseCase::new(document_repository.clone()));
        let process_documents_use_case =
            Arc::new(ProcessDocumentsUseCase::new(orchestrator.clone()));
        let list_documents_use_case =
            Arc::new(ListDocumentsUseCase::new(document_repository.clone()));
        let get_document_use_case = Arc::new(GetDocumentUseCase::new(document_repository.clone()));
        let get_document_chunks_use_case = Arc::new(GetDocumentChunksUseCase::new(
            document_repository.clone(),
            chunk_repository.clone(),
        ));
        let update_document_use_case =
            Arc::new(UpdateDocumentUseCase::new(document_repository.clone()));
        let delete_document_use_case =
            Arc::new(DeleteDocumentUseCase::new(document_repository.clone()));
        let bulk_operation_use_case = Arc::new(BulkDocumentOperationUseCase::new(
            document_repository.clone(),
        ));
        let retry_document_use_case = Arc::new(RetryDocumentUseCase::new(
            document_repository.clone(),
            document_processor.clone(),
        ));
        let mark_document_dead_use_case =
            Arc::new(MarkDocumentDeadUseCase::new(document_repository.clone()));

        // HTTP handlers
        let document_handler = Arc::new(DocumentHandler::new(
            create_documents_use_case.clone(),
            process_documents_use_case.clone(),
            list_documents_use_case.clone(),
            get_document_use_case.clone(),
            get_document_chunks_use_case.clone(),
            update_document_use_case.clone(),
            delete_document_use_case.clone(),
            bulk_operation_use_case.clone(),
            retry_document_use_case.clone(),
            mark_document_dead_use_case.clone(),
        ));

        Ok(Self {
            document_repository,
            chunk_repository,
            embedding_provider,
            object_storage,
            content_extractor,
            job_queue,
            task_dispatcher,
            document_processor,
            orchestrator,
            create_documents_use_case,
            process_documents_use_case,
            list_documents_use_case,
            get_document_use_case,
            get_document_chunks_use_case,
            update_document_use_case,
            delete_document_use_case,
            bulk_operation_use_case,
            retry_document_use_case,
            mark_document_dead_use_case,
            document_handler,
        })
    }
}
