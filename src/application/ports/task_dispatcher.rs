use async_trait::async_trait;

#[derive(Debug)]
pub enum TaskDispatchError {
    Configuration(String),
    NetworkError(String),
    Rejected(String),
}

impl std::fmt::Display for TaskDispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskDispatchError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            TaskDispatchError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            TaskDispatchError::Rejected(msg) => write!(f, "Task rejected: {}", msg),
        }
    }
}

impl std::error::Error for TaskDispatchError {}

#[derive(Debug, Clone)]
pub struct DispatchTask {
    pub task_type: String,
    pub payload: serde_json::Value,
}

/// External task-running infrastructure. It owns concurrency and retry for
/// the tasks it accepts; this service only submits them.
#[async_trait]
pub trait TaskDispatcher: Send + Sync {
    async fn submit(&self, task: DispatchTask) -> Result<(), TaskDispatchError>;
}
