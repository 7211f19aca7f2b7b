use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::services::ProcessingOptions;
use crate::application::use_cases::create_documents::DocumentUpload;
use crate::domain::entities::{Document, DocumentChunk};
use crate::domain::value_objects::TagSlots;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUploadDto {
    pub filename: String,
    pub file_url: String,
    #[serde(default)]
    pub file_size: i64,
    pub mime_type: String,
    #[serde(default)]
    pub tags: Option<serde_json::Value>,
}

impl From<DocumentUploadDto> for DocumentUpload {
    fn from(dto: DocumentUploadDto) -> Self {
        Self {
            filename: dto.filename,
            file_url: dto.file_url,
            file_size: dto.file_size,
            mime_type: dto.mime_type,
            tags: dto.tags,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentsRequestDto {
    pub documents: Vec<DocumentUploadDto>,
    #[serde(default)]
    pub processing: Option<ProcessingOptions>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponseDto {
    pub id: Uuid,
    pub knowledge_base_id: Uuid,
    pub filename: String,
    pub file_url: String,
    pub file_size: i64,
    pub mime_type: String,
    pub chunk_count: i32,
    pub token_count: i32,
    pub character_count: i32,
    pub processing_status: String,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub processing_completed_at: Option<DateTime<Utc>>,
    pub processing_error: Option<String>,
    pub enabled: bool,
    pub tags: TagSlots,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&Document> for DocumentResponseDto {
    fn from(document: &Document) -> Self {
        let counters = document.counters();

        Self {
            id: document.id(),
            knowledge_base_id: document.knowledge_base_id(),
            filename: document.filename().to_string(),
            file_url: document.file_url().to_string(),
            file_size: document.file_size(),
            mime_type: document.mime_type().to_string(),
            chunk_count: counters.chunk_count,
            token_count: counters.token_count,
            character_count: counters.character_count,
            processing_status: document.processing_status().as_str().to_string(),
            processing_started_at: document.processing_started_at(),
            processing_completed_at: document.processing_completed_at(),
            processing_error: document.processing_error().map(|s| s.to_string()),
            enabled: document.enabled(),
            tags: document.tags().clone(),
            uploaded_at: document.uploaded_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentsResponseDto {
    pub documents_created: usize,
    pub processing_accepted: usize,
    pub documents: Vec<DocumentResponseDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMetaDto {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListResponseDto {
    pub documents: Vec<DocumentResponseDto>,
    pub pagination: PaginationMetaDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsQueryDto {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequestDto {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub tags: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperationRequestDto {
    pub operation: String,
    pub document_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperationResponseDto {
    pub affected: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkResponseDto {
    pub id: Uuid,
    pub document_id: Uuid,
    pub chunk_index: i32,
    pub chunk_hash: String,
    pub content: String,
    pub content_length: i32,
    pub token_count: i32,
    pub start_offset: i32,
    pub end_offset: i32,
    pub embedding_model: Option<String>,
    pub tags: TagSlots,
}

impl From<&DocumentChunk> for ChunkResponseDto {
    fn from(chunk: &DocumentChunk) -> Self {
        Self {
            id: chunk.id(),
            document_id: chunk.document_id(),
            chunk_index: chunk.chunk_index(),
            chunk_hash: chunk.chunk_hash().to_string(),
            content: chunk.content().to_string(),
            content_length: chunk.content_length(),
            token_count: chunk.token_count(),
            start_offset: chunk.start_offset(),
            end_offset: chunk.end_offset(),
            embedding_model: chunk.embedding_model().map(|s| s.to_string()),
            tags: chunk.tags().clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponseDto {
    pub message: String,
}
