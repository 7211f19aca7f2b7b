use chrono::{DateTime, Utc};
use diesel::prelude::*;
use pgvector::Vector;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::DocumentChunk;
use crate::domain::value_objects::TagSlots;
use crate::infrastructure::database::schema::document_chunks;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Serialize)]
#[diesel(belongs_to(super::DocumentModel, foreign_key = document_id))]
#[diesel(table_name = document_chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentChunkModel {
    pub id: Uuid,
    pub document_id: Uuid,
    pub knowledge_base_id: Uuid,
    pub chunk_index: i32,
    pub chunk_hash: String,
    pub content: String,
    pub content_length: i32,
    pub token_count: i32,
    pub embedding: Option<Vector>,
    pub embedding_model: Option<String>,
    pub start_offset: i32,
    pub end_offset: i32,
    pub tag1: Option<String>,
    pub tag2: Option<String>,
    pub tag3: Option<String>,
    pub tag4: Option<String>,
    pub tag5: Option<String>,
    pub tag6: Option<String>,
    pub tag7: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = document_chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewDocumentChunkModel {
    pub id: Uuid,
    pub document_id: Uuid,
    pub knowledge_base_id: Uuid,
    pub chunk_index: i32,
    pub chunk_hash: String,
    pub content: String,
    pub content_length: i32,
    pub token_count: i32,
    pub embedding: Option<Vector>,
    pub embedding_model: Option<String>,
    pub start_offset: i32,
    pub end_offset: i32,
    pub tag1: Option<String>,
    pub tag2: Option<String>,
    pub tag3: Option<String>,
    pub tag4: Option<String>,
    pub tag5: Option<String>,
    pub tag6: Option<String>,
    pub tag7: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&DocumentChunk> for NewDocumentChunkModel {
    fn from(chunk: &DocumentChunk) -> Self {
        let tags = chunk.tags().clone();

        Self {
            id: chunk.id(),
            document_id: chunk.document_id(),
            knowledge_base_id: chunk.knowledge_base_id(),
            chunk_index: chunk.chunk_index(),
            chunk_hash: chunk.chunk_hash().to_string(),
            content: chunk.content().to_string(),
            content_length: chunk.content_length(),
            token_count: chunk.token_count(),
            embedding: chunk.embedding().cloned(),
            embedding_model: chunk.embedding_model().map(|s| s.to_string()),
            start_offset: chunk.start_offset(),
            end_offset: chunk.end_offset(),
            tag1: tags.tag1,
            tag2: tags.tag2,
            tag3: tags.tag3,
            tag4: tags.tag4,
            tag5: tags.tag5,
            tag6: tags.tag6,
            tag7: tags.tag7,
            created_at: chunk.created_at(),
        }
    }
}

impl From<DocumentChunkModel> for DocumentChunk {
    fn from(model: DocumentChunkModel) -> Self {
        let tags = TagSlots {
            tag1: model.tag1,
            tag2: model.tag2,
            tag3: model.tag3,
            tag4: model.tag4,
            tag5: model.tag5,
            tag6: model.tag6,
            tag7: model.tag7,
        };

        DocumentChunk::from_database(
            model.id,
            model.document_id,
            model.knowledge_base_id,
            model.chunk_index,
            model.chunk_hash,
            model.content,
            model.content_length,
            model.token_count,
            model.embedding,
            model.embedding_model,
            model.start_offset,
            model.end_offset,
            tags,
            model.created_at,
        )
    }
}
