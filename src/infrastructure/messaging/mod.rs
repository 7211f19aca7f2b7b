pub mod dispatch_queue;
pub mod task_dispatcher;

pub use dispatch_queue::{DispatchQueue, QueueConfig, RedisBackend};
pub use task_dispatcher::HttpTaskDispatcher;
