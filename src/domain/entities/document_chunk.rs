use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::value_objects::TagSlots;

/// One contiguous slice of a document's extracted text, the unit of
/// embedding and retrieval. Offsets are character offsets into the extracted
/// text, half-open `[start_offset, end_offset)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    id: Uuid,
    document_id: Uuid,
    knowledge_base_id: Uuid,
    chunk_index: i32,
    chunk_hash: String,
    content: String,
    content_length: i32,
    token_count: i32,
    embedding: Option<Vector>,
    embedding_model: Option<String>,
    start_offset: i32,
    end_offset: i32,
    tags: TagSlots,
    created_at: DateTime<Utc>,
}

impl DocumentChunk {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        document_id: Uuid,
        knowledge_base_id: Uuid,
        chunk_index: i32,
        content: String,
        token_count: i32,
        start_offset: i32,
        end_offset: i32,
        tags: TagSlots,
    ) -> Self {
        let chunk_hash = Self::hash_content(&content);
        let content_length = content.chars().count() as i32;

        Self {
            id: Uuid::new_v4(),
            document_id,
            knowledge_base_id,
            chunk_index,
            chunk_hash,
            content,
            content_length,
            token_count,
            embedding: None,
            embedding_model: None,
            start_offset,
            end_offset,
            tags,
            created_at: Utc::now(),
        }
    }

    /// Stable fingerprint of the chunk content; identical content always
    /// hashes identically across retries.
    pub fn hash_content(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn with_embedding(mut self, embedding: Vector, model: String) -> Self {
        self.embedding = Some(embedding);
        self.embedding_model = Some(model);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document_id(&self) -> Uuid {
        self.document_id
    }

    pub fn knowledge_base_id(&self) -> Uuid {
        self.knowledge_base_id
    }

    pub fn chunk_index(&self) -> i32 {
        self.chunk_index
    }

    pub fn chunk_hash(&self) -> &str {
        &self.chunk_hash
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn content_length(&self) -> i32 {
        self.content_length
    }

    pub fn token_count(&self) -> i32 {
        self.token_count
    }

    pub fn embedding(&self) -> Option<&Vector> {
        self.embedding.as_ref()
    }

    pub fn embedding_model(&self) -> Option<&str> {
        self.embedding_model.as_deref()
    }

    pub fn start_offset(&self) -> i32 {
        self.start_offset
    }

    pub fn end_offset(&self) -> i32 {
        self.end_offset
    }

    pub fn tags(&self) -> &TagSlots {
        &self.tags
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Reconstruct a chunk from persisted values.
    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        document_id: Uuid,
        knowledge_base_id: Uuid,
        chunk_index: i32,
        chunk_hash: String,
        content: String,
        content_length: i32,
        token_count: i32,
        embedding: Option<Vector>,
        embedding_model: Option<String>,
        start_offset: i32,
        end_offset: i32,
        tags: TagSlots,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            document_id,
            knowledge_base_id,
            chunk_index,
            chunk_hash,
            content,
            content_length,
            token_count,
            embedding,
            embedding_model,
            start_offset,
            end_offset,
            tags,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_creation() {
        let chunk = DocumentChunk::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            0,
            "The quick brown fox".to_string(),
            5,
            0,
            19,
            TagSlots::default(),
        );

        assert_eq!(chunk.chunk_index(), 0);
        assert_eq!(chunk.content_length(), 19);
        assert_eq!(chunk.end_offset() - chunk.start_offset(), 19);
        assert!(chunk.embedding().is_none());
    }

    #[test]
    fn test_hash_is_stable() {
        let first = DocumentChunk::hash_content("same content");
        let second = DocumentChunk::hash_content("same content");
        let other = DocumentChunk::hash_content("different content");

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn test_with_embedding() {
        let chunk = DocumentChunk::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            0,
            "text".to_string(),
            1,
            0,
            4,
            TagSlots::default(),
        )
        .with_embedding(Vector::from(vec![0.1, 0.2]), "test-model".to_string());

        assert!(chunk.embedding().is_some());
        assert_eq!(chunk.embedding_model(), Some("test-model"));
    }
}
