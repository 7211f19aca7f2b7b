pub mod document_processor;
pub mod processing_orchestrator;

pub use document_processor::{
    DocumentProcessorService, ProcessingOptions, ProcessingOutcome,
};
pub use processing_orchestrator::{
    DocumentJobHandler, ProcessingOrchestrator, SchedulerConfig,
};
