pub mod document_routes;
pub mod health_routes;

pub use document_routes::document_routes;
pub use health_routes::{health_routes, queue_routes};
