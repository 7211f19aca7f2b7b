pub mod chunk_repository;
pub mod document_repository;

pub use chunk_repository::{ChunkRepository, ChunkRepositoryError};
pub use document_repository::{
    DocumentFilters, DocumentPage, DocumentRepository, DocumentRepositoryError,
};
