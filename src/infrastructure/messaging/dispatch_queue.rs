use async_trait::async_trait;
use redis::Client as RedisClient;
use regex::Regex;
use std::collections::VecDeque;
use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::application::ports::job_queue::{JobHandler, JobQueue, JobQueueError, QueueStats};
use crate::domain::entities::QueuedJob;

const CONNECTION_LOSS_PATTERN: &str =
    r"(?i)connection refused|connection reset|connection closed|broken pipe|timed out|unreachable|io error";

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub max_concurrency: usize,
    pub poll_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub retry_delay_ms: u64,
    pub backend_failure_threshold: u32,
    pub list_key: String,
}

impl QueueConfig {
    pub fn from_env() -> Self {
        let read = |name: &str, default: u64| {
            env::var(name)
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(default)
        };

        Self {
            max_concurrency: read("QUEUE_MAX_CONCURRENCY", 4) as usize,
            poll_timeout_secs: read("QUEUE_POLL_TIMEOUT_SECS", 2),
            poll_interval_ms: read("QUEUE_POLL_INTERVAL_MS", 250),
            retry_delay_ms: read("QUEUE_RETRY_DELAY_MS", 1_000),
            backend_failure_threshold: read("QUEUE_BACKEND_FAILURE_THRESHOLD", 3) as u32,
            list_key: env::var("QUEUE_LIST_KEY").unwrap_or_else(|_| "docbase:jobs".to_string()),
        }
    }
}

/// Redis list backend: LPUSH to enqueue, BRPOP with a short block timeout to
/// consume.
pub struct RedisBackend {
    client: RedisClient,
    list_key: String,
}

impl RedisBackend {
    pub fn from_env(list_key: &str) -> Option<Self> {
        let url = env::var("REDIS_URL").ok()?;

        match RedisClient::open(url.as_str()) {
            Ok(client) => Some(Self {
                client,
                list_key: list_key.to_string(),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Invalid REDIS_URL, running without distributed queue");
                None
            }
        }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, JobQueueError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| JobQueueError::BackendError(e.to_string()))
    }

    async fn push(&self, job: &QueuedJob) -> Result<(), JobQueueError> {
        let payload = serde_json::to_string(job)
            .map_err(|e| JobQueueError::SerializationError(e.to_string()))?;

        let mut conn = self.connection().await?;
        let _length: i64 = redis::cmd("LPUSH")
            .arg(&self.list_key)
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| JobQueueError::BackendError(e.to_string()))?;

        Ok(())
    }

    async fn pop(&self, timeout_secs: u64) -> Result<Option<QueuedJob>, JobQueueError> {
        let mut conn = self.connection().await?;
        let reply: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(&self.list_key)
            .arg(timeout_secs)
            .query_async(&mut conn)
            .await
            .map_err(|e| JobQueueError::BackendError(e.to_string()))?;

        match reply {
            Some((_, payload)) => serde_json::from_str(&payload)
                .map(Some)
                .map_err(|e| JobQueueError::SerializationError(e.to_string())),
            None => Ok(None),
        }
    }

    async fn len(&self) -> Result<usize, JobQueueError> {
        let mut conn = self.connection().await?;
        let length: i64 = redis::cmd("LLEN")
            .arg(&self.list_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| JobQueueError::BackendError(e.to_string()))?;

        Ok(length.max(0) as usize)
    }

    async fn clear(&self) -> Result<(), JobQueueError> {
        let mut conn = self.connection().await?;
        let _removed: i64 = redis::cmd("DEL")
            .arg(&self.list_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| JobQueueError::BackendError(e.to_string()))?;

        Ok(())
    }
}

struct QueueInner {
    backend: Option<RedisBackend>,
    backend_healthy: AtomicBool,
    backend_failures: AtomicU32,
    local: Mutex<VecDeque<QueuedJob>>,
    consumers_running: AtomicBool,
    in_flight: AtomicUsize,
    config: QueueConfig,
    connection_loss: Regex,
}

impl QueueInner {
    fn backend_usable(&self) -> bool {
        self.backend.is_some() && self.backend_healthy.load(Ordering::Relaxed)
    }

    /// A connection-loss signature or a run of consecutive failures retires
    /// the distributed backend for the rest of the process; consumers keep
    /// draining the in-process list.
    fn note_backend_error(&self, error: &JobQueueError) {
        let message = error.to_string();
        let failures = self.backend_failures.fetch_add(1, Ordering::Relaxed) + 1;

        if self.connection_loss.is_match(&message)
            || failures >= self.config.backend_failure_threshold
        {
            if self.backend_healthy.swap(false, Ordering::Relaxed) {
                tracing::warn!(
                    error = %message,
                    failures,
                    "Abandoning distributed queue backend, continuing in-process"
                );
            }
        } else {
            tracing::warn!(error = %message, failures, "Queue backend error");
        }
    }

    fn note_backend_success(&self) {
        self.backend_failures.store(0, Ordering::Relaxed);
    }

    async fn enqueue(&self, job: QueuedJob) -> Result<(), JobQueueError> {
        if let Some(backend) = &self.backend {
            if self.backend_healthy.load(Ordering::Relaxed) {
                match backend.push(&job).await {
                    Ok(()) => {
                        self.note_backend_success();
                        return Ok(());
                    }
                    Err(error) => {
                        self.note_backend_error(&error);
                    }
                }
            }
        }

        self.local.lock().await.push_back(job);
        Ok(())
    }

    /// Next job from the distributed backend if usable, otherwise from the
    /// in-process list. `None` means both were empty.
    async fn next_job(&self) -> Option<QueuedJob> {
        if let Some(backend) = &self.backend {
            if self.backend_healthy.load(Ordering::Relaxed) {
                match backend.pop(self.config.poll_timeout_secs).await {
                    Ok(Some(job)) => {
                        self.note_backend_success();
                        return Some(job);
                    }
                    Ok(None) => {
                        self.note_backend_success();
                    }
                    Err(error) => {
                        self.note_backend_error(&error);
                    }
                }
            }
        }

        self.local.lock().await.pop_front()
    }

    async fn run_consumer(self: Arc<Self>, worker_id: usize, handler: Arc<dyn JobHandler>) {
        tracing::debug!(worker_id, "Queue consumer started");

        loop {
            let Some(mut job) = self.next_job().await else {
                // BRPOP already blocked when the backend is up; only the
                // local list needs an idle pause.
                if !self.backend_usable() {
                    tokio::time::sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
                }
                continue;
            };

            job.begin_attempt();
            self.in_flight.fetch_add(1, Ordering::Relaxed);
            let result = handler.handle(&job).await;
            self.in_flight.fetch_sub(1, Ordering::Relaxed);

            match result {
                Ok(()) => {
                    tracing::debug!(job_id = %job.id, worker_id, "Job completed");
                }
                Err(error) => {
                    if job.attempts_exhausted() {
                        tracing::warn!(
                            job_id = %job.id,
                            attempts = job.attempts,
                            error = %error,
                            "Dropping job permanently after exhausting attempts"
                        );
                    } else {
                        let delay =
                            job.retry_delay(Duration::from_millis(self.config.retry_delay_ms));
                        tracing::warn!(
                            job_id = %job.id,
                            attempts = job.attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "Job failed, re-enqueueing with backoff"
                        );

                        let inner = self.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            if let Err(e) = inner.enqueue(job).await {
                                tracing::error!(error = %e, "Failed to re-enqueue job");
                            }
                        });
                    }
                }
            }
        }
    }
}

/// Job queue with per-call backend selection: jobs go to the Redis list when
/// it is reachable, to an in-process list otherwise. Consumers self-heal
/// onto the in-process list when the backend dies mid-flight.
pub struct DispatchQueue {
    inner: Arc<QueueInner>,
}

impl DispatchQueue {
    pub fn new(backend: Option<RedisBackend>, config: QueueConfig) -> Self {
        let connection_loss =
            Regex::new(CONNECTION_LOSS_PATTERN).expect("connection-loss pattern is valid");

        Self {
            inner: Arc::new(QueueInner {
                backend,
                backend_healthy: AtomicBool::new(true),
                backend_failures: AtomicU32::new(0),
                local: Mutex::new(VecDeque::new()),
                consumers_running: AtomicBool::new(false),
                in_flight: AtomicUsize::new(0),
                config,
                connection_loss,
            }),
        }
    }

    pub fn from_env() -> Self {
        let config = QueueConfig::from_env();
        let backend = RedisBackend::from_env(&config.list_key);

        if backend.is_none() {
            tracing::info!("No REDIS_URL configured, queue runs in-process only");
        }

        Self::new(backend, config)
    }
}

#[async_trait]
impl JobQueue for DispatchQueue {
    async fn add_job(
        &self,
        job_type: &str,
        payload: serde_json::Value,
        max_attempts: u32,
    ) -> Result<String, JobQueueError> {
        let job = QueuedJob::new(job_type, payload, max_attempts);
        let job_id = job.id.clone();

        self.inner.enqueue(job).await?;
        tracing::debug!(job_id = %job_id, job_type, "Job enqueued");

        Ok(job_id)
    }

    async fn process_jobs(&self, handler: Arc<dyn JobHandler>) -> Result<(), JobQueueError> {
        if self.inner.consumers_running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        tracing::info!(
            workers = self.inner.config.max_concurrency,
            backend = self.inner.backend_usable(),
            "Starting queue consumers"
        );

        for worker_id in 0..self.inner.config.max_concurrency.max(1) {
            let inner = self.inner.clone();
            let handler = handler.clone();
            tokio::spawn(async move {
                inner.run_consumer(worker_id, handler).await;
            });
        }

        Ok(())
    }

    async fn queue_stats(&self) -> QueueStats {
        let local_pending = self.inner.local.lock().await.len();

        let backend_pending = match &self.inner.backend {
            Some(backend) if self.inner.backend_healthy.load(Ordering::Relaxed) => {
                match backend.len().await {
                    Ok(length) => length,
                    Err(error) => {
                        self.inner.note_backend_error(&error);
                        0
                    }
                }
            }
            _ => 0,
        };

        QueueStats {
            pending: local_pending + backend_pending,
            processing: self.inner.in_flight.load(Ordering::Relaxed),
            backend_available: self.inner.backend_usable(),
        }
    }

    async fn clear(&self) -> Result<(), JobQueueError> {
        self.inner.local.lock().await.clear();

        if let Some(backend) = &self.inner.backend {
            if self.inner.backend_healthy.load(Ordering::Relaxed) {
                backend.clear().await?;
            }
        }

        Ok(())
    }

    fn backend_available(&self) -> bool {
        self.inner.backend_usable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_config() -> QueueConfig {
        QueueConfig {
            max_concurrency: 2,
            poll_timeout_secs: 1,
            poll_interval_ms: 10,
            retry_delay_ms: 10,
            backend_failure_threshold: 3,
            list_key: "test:jobs".to_string(),
        }
    }

    struct RecordingHandler {
        handled: Mutex<Vec<QueuedJob>>,
        fail_first_attempts: u32,
    }

    #[async_trait]
    impl JobHandler for RecordingHandler {
        async fn handle(&self, job: &QueuedJob) -> Result<(), String> {
            self.handled.lock().await.push(job.clone());
            if job.attempts <= self.fail_first_attempts {
                Err("simulated failure".to_string())
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_in_process_job_executes() {
        let queue = DispatchQueue::new(None, test_config());
        let handler = Arc::new(RecordingHandler {
            handled: Mutex::new(Vec::new()),
            fail_first_attempts: 0,
        });

        assert!(!queue.backend_available());

        queue
            .add_job("document-process", json!({"documentId": "doc-1"}), 3)
            .await
            .unwrap();
        queue.process_jobs(handler.clone()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;

        let handled = handler.handled.lock().await;
        assert_eq!(handled.len(), 1);
        assert_eq!(handled[0].attempts, 1);

        drop(handled);
        let stats = queue.queue_stats().await;
        assert_eq!(stats.pending, 0);
    }

    #[tokio::test]
    async fn test_failed_job_retried_until_exhausted() {
        let queue = DispatchQueue::new(None, test_config());
        let handler = Arc::new(RecordingHandler {
            handled: Mutex::new(Vec::new()),
            fail_first_attempts: u32::MAX,
        });

        queue
            .add_job("document-process", json!({"documentId": "doc-2"}), 3)
            .await
            .unwrap();
        queue.process_jobs(handler.clone()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(800)).await;

        let handled = handler.handled.lock().await;
        // Attempts 1, 2, 3; dropped permanently afterwards.
        assert_eq!(handled.len(), 3);
        assert_eq!(
            handled.iter().map(|job| job.attempts).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        drop(handled);
        let stats = queue.queue_stats().await;
        assert_eq!(stats.pending, 0);
    }

    #[tokio::test]
    async fn test_process_jobs_is_idempotent() {
        let queue = DispatchQueue::new(None, test_config());
        let handler = Arc::new(RecordingHandler {
            handled: Mutex::new(Vec::new()),
            fail_first_attempts: 0,
        });

        queue.process_jobs(handler.clone()).await.unwrap();
        queue.process_jobs(handler.clone()).await.unwrap();

        queue
            .add_job("document-process", json!({"documentId": "doc-3"}), 3)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;

        // One consumer pool; the job executed exactly once.
        assert_eq!(handler.handled.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_drops_pending_jobs() {
        let queue = DispatchQueue::new(None, test_config());

        queue.add_job("document-process", json!({}), 3).await.unwrap();
        queue.add_job("document-process", json!({}), 3).await.unwrap();
        assert_eq!(queue.queue_stats().await.pending, 2);

        queue.clear().await.unwrap();
        assert_eq!(queue.queue_stats().await.pending, 0);
    }

    #[test]
    fn test_connection_loss_signatures() {
        let pattern = Regex::new(CONNECTION_LOSS_PATTERN).unwrap();

        assert!(pattern.is_match("Queue backend error: Connection refused (os error 111)"));
        assert!(pattern.is_match("broken pipe while writing"));
        assert!(pattern.is_match("operation timed out"));
        assert!(!pattern.is_match("WRONGTYPE Operation against a key"));
    }
}
