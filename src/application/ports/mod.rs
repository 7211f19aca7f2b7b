pub mod content_extractor;
pub mod embedding_provider;
pub mod job_queue;
pub mod object_storage;
pub mod task_dispatcher;

pub use content_extractor::ContentExtractor;
pub use embedding_provider::EmbeddingProvider;
pub use job_queue::{JobHandler, JobQueue};
pub use object_storage::ObjectStorage;
pub use task_dispatcher::TaskDispatcher;
