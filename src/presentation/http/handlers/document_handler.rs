use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::use_cases::{
    BulkDocumentOperationUseCase, CreateDocumentsUseCase, DeleteDocumentUseCase,
    GetDocumentChunksUseCase, GetDocumentUseCase, ListDocumentsUseCase, MarkDocumentDeadUseCase,
    ProcessDocumentsUseCase, RetryDocumentUseCase, UpdateDocumentUseCase,
    bulk_document_operation::{BulkOperation, BulkOperationError},
    create_documents::CreateDocumentsError,
    delete_document::DeleteDocumentError,
    get_document::GetDocumentError,
    get_document_chunks::GetDocumentChunksError,
    list_documents::{ListDocumentsError, ListDocumentsRequest},
    mark_document_dead::MarkDocumentDeadError,
    retry_document::RetryDocumentError,
    update_document::{UpdateDocumentError, UpdateDocumentRequest},
};
use crate::presentation::http::dto::ApiResponse;
use crate::presentation::http::dto::document_dto::{
    BulkOperationRequestDto, BulkOperationResponseDto, ChunkResponseDto,
    CreateDocumentsRequestDto, CreateDocumentsResponseDto, DocumentListResponseDto,
    DocumentResponseDto, ListDocumentsQueryDto, MessageResponseDto, PaginationMetaDto,
    UpdateDocumentRequestDto,
};

pub struct DocumentHandler {
    create_documents_use_case: Arc<CreateDocumentsUseCase>,
    process_documents_use_case: Arc<ProcessDocumentsUseCase>,
    list_documents_use_case: Arc<ListDocumentsUseCase>,
    get_document_use_case: Arc<GetDocumentUseCase>,
    get_document_chunks_use_case: Arc<GetDocumentChunksUseCase>,
    update_document_use_case: Arc<UpdateDocumentUseCase>,
    delete_document_use_case: Arc<DeleteDocumentUseCase>,
    bulk_operation_use_case: Arc<BulkDocumentOperationUseCase>,
    retry_document_use_case: Arc<RetryDocumentUseCase>,
    mark_document_dead_use_case: Arc<MarkDocumentDeadUseCase>,
}

impl DocumentHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        create_documents_use_case: Arc<CreateDocumentsUseCase>,
        process_documents_use_case: Arc<ProcessDocumentsUseCase>,
        list_documents_use_case: Arc<ListDocumentsUseCase>,
        get_document_use_case: Arc<GetDocumentUseCase>,
        get_document_chunks_use_case: Arc<GetDocumentChunksUseCase>,
        update_document_use_case: Arc<UpdateDocumentUseCase>,
        delete_document_use_case: Arc<DeleteDocumentUseCase>,
        bulk_operation_use_case: Arc<BulkDocumentOperationUseCase>,
        retry_document_use_case: Arc<RetryDocumentUseCase>,
        mark_document_dead_use_case: Arc<MarkDocumentDeadUseCase>,
    ) -> Self {
        Self {
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
        }
    }

    fn error_response(status: StatusCode, code: &str, message: String) -> Response {
        (status, Json(ApiResponse::<()>::error(code, message))).into_response()
    }

    /// POST /knowledge-bases/{knowledge_base_id}/documents
    ///
    /// Creates pending documents and schedules processing; the response
    /// returns immediately, completion is observed via document status.
    pub async fn create_documents(
        State(handler): State<Arc<DocumentHandler>>,
        Path(knowledge_base_id): Path<Uuid>,
        Json(request): Json<CreateDocumentsRequestDto>,
    ) -> Response {
        let uploads = request.documents.into_iter().map(Into::into).collect();

        let created = match handler
            .create_documents_use_case
            .execute(knowledge_base_id, uploads)
            .await
        {
            Ok(created) => created,
            Err(CreateDocumentsError::ValidationError(message)) => {
                return Self::error_response(StatusCode::BAD_REQUEST, "VALIDATION", message);
            }
            Err(error) => {
                return Self::error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REPOSITORY",
                    error.to_string(),
                );
            }
        };

        let options = request.processing.unwrap_or_default();
        let accepted = handler
            .process_documents_use_case
            .execute(knowledge_base_id, created.clone(), options)
            .await;

        let dto = CreateDocumentsResponseDto {
            documents_created: created.len(),
            processing_accepted: accepted,
            documents: created.iter().map(DocumentResponseDto::from).collect(),
        };

        (StatusCode::CREATED, Json(ApiResponse::success(dto))).into_response()
    }

    /// GET /knowledge-bases/{knowledge_base_id}/documents
    pub async fn list_documents(
        State(handler): State<Arc<DocumentHandler>>,
        Path(knowledge_base_id): Path<Uuid>,
        Query(query): Query<ListDocumentsQueryDto>,
    ) -> Response {
        let request = ListDocumentsRequest {
            processing_status: query.status,
            enabled: query.enabled,
            search: query.search,
            limit: query.limit.unwrap_or(50),
            offset: query.offset.unwrap_or(0),
        };

        match handler
            .list_documents_use_case
            .execute(knowledge_base_id, request)
            .await
        {
            Ok(response) => {
                let dto = DocumentListResponseDto {
                    documents: response
                        .documents
                        .iter()
                        .map(DocumentResponseDto::from)
                        .collect(),
                    pagination: PaginationMetaDto {
                        total: response.total,
                        limit: response.limit,
                        offset: response.offset,
                    },
                };
                (StatusCode::OK, Json(ApiResponse::success(dto))).into_response()
            }
            Err(ListDocumentsError::ValidationError(message)) => {
                Self::error_response(StatusCode::BAD_REQUEST, "VALIDATION", message)
            }
            Err(error) => Self::error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "REPOSITORY",
                error.to_string(),
            ),
        }
    }

    /// GET /documents/{document_id}
    pub async fn get_document(
        State(handler): State<Arc<DocumentHandler>>,
        Path(document_id): Path<Uuid>,
    ) -> Response {
        match handler.get_document_use_case.execute(document_id).await {
            Ok(document) => (
                StatusCode::OK,
                Json(ApiResponse::success(DocumentResponseDto::from(&document))),
            )
                .into_response(),
            Err(GetDocumentError::NotFound(_)) => Self::error_response(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Document not found: {}", document_id),
            ),
            Err(error) => Self::error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "REPOSITORY",
                error.to_string(),
            ),
        }
    }

    /// GET /documents/{document_id}/chunks
    pub async fn get_document_chunks(
        State(handler): State<Arc<DocumentHandler>>,
        Path(document_id): Path<Uuid>,
    ) -> Response {
        match handler
            .get_document_chunks_use_case
            .execute(document_id)
            .await
        {
            Ok(chunks) => {
                let dtos: Vec<ChunkResponseDto> =
                    chunks.iter().map(ChunkResponseDto::from).collect();
                (StatusCode::OK, Json(ApiResponse::success(dtos))).into_response()
            }
            Err(GetDocumentChunksError::DocumentNotFound(_)) => Self::error_response(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Document not found: {}", document_id),
            ),
            Err(error) => Self::error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "REPOSITORY",
                error.to_string(),
            ),
        }
    }

    /// PATCH /documents/{document_id}
    pub async fn update_document(
        State(handler): State<Arc<DocumentHandler>>,
        Path(document_id): Path<Uuid>,
        Json(request): Json<UpdateDocumentRequestDto>,
    ) -> Response {
        let update = UpdateDocumentRequest {
            filename: request.filename,
            enabled: request.enabled,
            tags: request.tags,
        };

        match handler
            .update_document_use_case
            .execute(document_id, update)
            .await
        {
            Ok(document) => (
                StatusCode::OK,
                Json(ApiResponse::success(DocumentResponseDto::from(&document))),
            )
                .into_response(),
            Err(UpdateDocumentError::NotFound(_)) => Self::error_response(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Document not found: {}", document_id),
            ),
            Err(UpdateDocumentError::ValidationError(message)) => {
                Self::error_response(StatusCode::BAD_REQUEST, "VALIDATION", message)
            }
            Err(error) => Self::error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "REPOSITORY",
                error.to_string(),
            ),
        }
    }

    /// DELETE /documents/{document_id}
    pub async fn delete_document(
        State(handler): State<Arc<DocumentHandler>>,
        Path(document_id): Path<Uuid>,
    ) -> Response {
        match handler.delete_document_use_case.execute(document_id).await {
            Ok(()) => (
                StatusCode::OK,
                Json(ApiResponse::success(MessageResponseDto {
                    message: "Document deleted".to_string(),
                })),
            )
                .into_response(),
            Err(DeleteDocumentError::NotFound(_)) => Self::error_response(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Document not found: {}", document_id),
            ),
            Err(error) => Self::error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "REPOSITORY",
                error.to_string(),
            ),
        }
    }

    /// POST /knowledge-bases/{knowledge_base_id}/documents/bulk
    pub async fn bulk_operation(
        State(handler): State<Arc<DocumentHandler>>,
        Path(knowledge_base_id): Path<Uuid>,
        Json(request): Json<BulkOperationRequestDto>,
    ) -> Response {
        let operation = match BulkOperation::parse(&request.operation) {
            Ok(operation) => operation,
            Err(BulkOperationError::ValidationError(message)) => {
                return Self::error_response(StatusCode::BAD_REQUEST, "VALIDATION", message);
            }
            Err(error) => {
                return Self::error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REPOSITORY",
                    error.to_string(),
                );
            }
        };

        match handler
            .bulk_operation_use_case
            .execute(knowledge_base_id, operation, request.document_ids)
            .await
        {
            Ok(affected) => (
                StatusCode::OK,
                Json(ApiResponse::success(BulkOperationResponseDto { affected })),
            )
                .into_response(),
            Err(BulkOperationError::ValidationError(message)) => {
                Self::error_response(StatusCode::BAD_REQUEST, "VALIDATION", message)
            }
            Err(error) => Self::error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "REPOSITORY",
                error.to_string(),
            ),
        }
    }

    /// POST /knowledge-bases/{knowledge_base_id}/documents/{document_id}/retry
    pub async fn retry_document(
        State(handler): State<Arc<DocumentHandler>>,
        Path((knowledge_base_id, document_id)): Path<(Uuid, Uuid)>,
    ) -> Response {
        match handler
            .retry_document_use_case
            .execute(knowledge_base_id, document_id)
            .await
        {
            Ok(()) => (
                StatusCode::ACCEPTED,
                Json(ApiResponse::success(MessageResponseDto {
                    message: "Document queued for retry".to_string(),
                })),
            )
                .into_response(),
            Err(RetryDocumentError::NotFound(_)) => Self::error_response(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Document not found: {}", document_id),
            ),
            Err(RetryDocumentError::InvalidState(message)) => {
                Self::error_response(StatusCode::CONFLICT, "INVALID_STATE", message)
            }
            Err(error) => Self::error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "REPOSITORY",
                error.to_string(),
            ),
        }
    }

    /// POST /documents/{document_id}/mark-dead
    pub async fn mark_document_dead(
        State(handler): State<Arc<DocumentHandler>>,
        Path(document_id): Path<Uuid>,
    ) -> Response {
        match handler
            .mark_document_dead_use_case
            .execute(document_id)
            .await
        {
            Ok(()) => (
                StatusCode::OK,
                Json(ApiResponse::success(MessageResponseDto {
                    message: "Document marked as failed after processing timeout".to_string(),
                })),
            )
                .into_response(),
            Err(MarkDocumentDeadError::NotFound(_)) => Self::error_response(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Document not found: {}", document_id),
            ),
            Err(error @ MarkDocumentDeadError::TooRecent { .. }) => {
                Self::error_response(StatusCode::CONFLICT, "TOO_RECENT", error.to_string())
            }
            Err(MarkDocumentDeadError::InvalidState(message)) => {
                Self::error_response(StatusCode::CONFLICT, "INVALID_STATE", message)
            }
            Err(error) => Self::error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "REPOSITORY",
                error.to_string(),
            ),
        }
    }
}
