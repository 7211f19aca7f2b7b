pub mod document_dto;
pub mod response_dto;

pub use response_dto::{ApiResponse, HealthResponseDto, QueueStatsDto};
