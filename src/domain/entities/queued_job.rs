use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An ephemeral unit of queued work. Jobs never outlive the queue backend;
/// the durable outcome of a job lives in the document row it targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedJob {
    pub id: String,
    pub job_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub attempts: u32,
    pub max_attempts: u32,
}

impl QueuedJob {
    pub fn new(job_type: &str, payload: serde_json::Value, max_attempts: u32) -> Self {
        let created_at = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();
        let id = format!(
            "{}-{}-{}",
            job_type,
            created_at.timestamp_millis(),
            &suffix[..8]
        );

        Self {
            id,
            job_type: job_type.to_string(),
            payload,
            created_at,
            attempts: 0,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Record the start of an execution attempt.
    pub fn begin_attempt(&mut self) {
        self.attempts += 1;
    }

    pub fn attempts_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Backoff before re-enqueueing this job: `base × 2^(attempts − 1)`.
    pub fn retry_delay(&self, base: std::time::Duration) -> std::time::Duration {
        let exponent = self.attempts.saturating_sub(1).min(16);
        base * 2u32.pow(exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_id_carries_type_prefix() {
        let job = QueuedJob::new("document-process", json!({"documentId": "x"}), 3);

        assert!(job.id.starts_with("document-process-"));
        assert_eq!(job.attempts, 0);
        assert_eq!(job.max_attempts, 3);
    }

    #[test]
    fn test_attempt_accounting() {
        let mut job = QueuedJob::new("document-process", json!({}), 3);

        job.begin_attempt();
        assert_eq!(job.attempts, 1);
        assert!(!job.attempts_exhausted());

        job.begin_attempt();
        job.begin_attempt();
        assert!(job.attempts_exhausted());
    }

    #[test]
    fn test_retry_delay_doubles() {
        let mut job = QueuedJob::new("document-process", json!({}), 5);
        let base = Duration::from_millis(100);

        job.begin_attempt();
        assert_eq!(job.retry_delay(base), Duration::from_millis(100));

        job.begin_attempt();
        assert_eq!(job.retry_delay(base), Duration::from_millis(200));

        job.begin_attempt();
        assert_eq!(job.retry_delay(base), Duration::from_millis(400));
    }

    #[test]
    fn test_max_attempts_floor() {
        let job = QueuedJob::new("document-process", json!({}), 0);
        assert_eq!(job.max_attempts, 1);
    }
}
