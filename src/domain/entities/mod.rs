pub mod document;
pub mod document_chunk;
pub mod queued_job;

pub use document::{Document, ProcessingCounters};
pub use document_chunk::DocumentChunk;
pub use queued_job::QueuedJob;
