pub mod postgres_chunk_repository;
pub mod postgres_document_repository;

pub use postgres_chunk_repository::PostgresChunkRepository;
pub use postgres_document_repository::PostgresDocumentRepository;
