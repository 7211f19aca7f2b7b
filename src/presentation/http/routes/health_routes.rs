use axum::{Json, Router, extract::State, routing::get};
use std::sync::Arc;

use crate::application::ports::JobQueue;
use crate::presentation::http::dto::{ApiResponse, HealthResponseDto, QueueStatsDto};

pub fn health_routes() -> Router {
    Router::new().route("/health", get(health))
}

pub fn queue_routes(job_queue: Arc<dyn JobQueue>) -> Router {
    Router::new()
        .route("/queue/stats", get(queue_stats))
        .with_state(job_queue)
}

async fn health() -> Json<ApiResponse<HealthResponseDto>> {
    Json(ApiResponse::success(HealthResponseDto {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn queue_stats(
    State(job_queue): State<Arc<dyn JobQueue>>,
) -> Json<ApiResponse<QueueStatsDto>> {
    let stats = job_queue.queue_stats().await;

    Json(ApiResponse::success(QueueStatsDto {
        pending: stats.pending,
        processing: stats.processing,
        backend_available: stats.backend_available,
    }))
}
