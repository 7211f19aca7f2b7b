use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::env;
use std::time::Duration;

use crate::application::ports::task_dispatcher::{DispatchTask, TaskDispatchError, TaskDispatcher};

const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 15;

#[derive(Serialize)]
struct TaskSubmission<'a> {
    #[serde(rename = "type")]
    task_type: &'a str,
    payload: &'a serde_json::Value,
}

/// Submits one task per document to external task-running infrastructure
/// over HTTP. The dispatcher owns concurrency and retry for accepted tasks.
pub struct HttpTaskDispatcher {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpTaskDispatcher {
    pub fn new(endpoint: String, api_key: String) -> Result<Self, TaskDispatchError> {
        if endpoint.trim().is_empty() {
            return Err(TaskDispatchError::Configuration(
                "Task dispatcher endpoint is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_SUBMIT_TIMEOUT_SECS))
            .build()
            .map_err(|e| TaskDispatchError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    pub fn from_env() -> Option<Result<Self, TaskDispatchError>> {
        let endpoint = env::var("TASK_DISPATCHER_URL").ok()?;
        let api_key = env::var("TASK_DISPATCHER_API_KEY").ok()?;

        Some(Self::new(endpoint, api_key))
    }
}

#[async_trait]
impl TaskDispatcher for HttpTaskDispatcher {
    async fn submit(&self, task: DispatchTask) -> Result<(), TaskDispatchError> {
        let submission = TaskSubmission {
            task_type: &task.task_type,
            payload: &task.payload,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&submission)
            .send()
            .await
            .map_err(|e| TaskDispatchError::NetworkError(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TaskDispatchError::Rejected(format!(
                "Dispatcher returned HTTP {}: {}",
                status,
                body.chars().take(300).collect::<String>()
            )));
        }

        Ok(())
    }
}
