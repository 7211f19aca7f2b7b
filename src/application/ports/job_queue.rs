use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::entities::QueuedJob;

#[derive(Debug)]
pub enum JobQueueError {
    SerializationError(String),
    BackendError(String),
}

impl std::fmt::Display for JobQueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobQueueError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            JobQueueError::BackendError(msg) => write!(f, "Queue backend error: {}", msg),
        }
    }
}

impl std::error::Error for JobQueueError {}

#[derive(Debug, Clone, Copy)]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub backend_available: bool,
}

/// Executes one job. A returned `Err` makes the queue retry the job until
/// its attempts are exhausted.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &QueuedJob) -> Result<(), String>;
}

/// Best-effort job queue: distributed backend when one is reachable,
/// in-process fallback otherwise. Not an exactly-once log — the durable
/// outcome of a job lives in the row it mutates.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a job, returning its id.
    async fn add_job(
        &self,
        job_type: &str,
        payload: serde_json::Value,
        max_attempts: u32,
    ) -> Result<String, JobQueueError>;

    /// Start the consumer loops bound to `handler`. Idempotent — calling
    /// again while consumers run is a no-op.
    async fn process_jobs(&self, handler: Arc<dyn JobHandler>) -> Result<(), JobQueueError>;

    async fn queue_stats(&self) -> QueueStats;

    async fn clear(&self) -> Result<(), JobQueueError>;

    /// Whether the distributed backend is currently usable.
    fn backend_available(&self) -> bool;
}
