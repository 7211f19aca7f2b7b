pub mod document_extractors;
pub mod inference_client;
pub mod ocr_client;
pub mod storage_client;
pub mod text_chunker;

pub use document_extractors::FallbackContentExtractor;
pub use inference_client::{InferenceClient, InferenceEmbeddingProvider};
pub use ocr_client::{OcrClientConfig, RemoteOcrClient};
pub use storage_client::{S3ObjectStorage, S3StorageConfig};
pub use text_chunker::{TextChunk, TextChunker};
