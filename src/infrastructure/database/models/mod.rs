pub mod chunk_model;
pub mod document_model;

pub use chunk_model::{DocumentChunkModel, NewDocumentChunkModel};
pub use document_model::{DocumentModel, NewDocumentModel};
