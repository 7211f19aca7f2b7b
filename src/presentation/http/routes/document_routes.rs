use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;

use crate::presentation::http::handlers::DocumentHandler;

pub fn document_routes(document_handler: Arc<DocumentHandler>) -> Router {
    Router::new()
        .route(
            "/knowledge-bases/{knowledge_base_id}/documents",
            post(DocumentHandler::create_documents),
        )
        .route(
            "/knowledge-bases/{knowledge_base_id}/documents",
            get(DocumentHandler::list_documents),
        )
        .route(
            "/knowledge-bases/{knowledge_base_id}/documents/bulk",
            post(DocumentHandler::bulk_operation),
        )
        .route(
            "/knowledge-bases/{knowledge_base_id}/documents/{document_id}/retry",
            post(DocumentHandler::retry_document),
        )
        .route(
            "/documents/{document_id}",
            get(DocumentHandler::get_document),
        )
        .route(
            "/documents/{document_id}",
            patch(DocumentHandler::update_document),
        )
        .route(
            "/documents/{document_id}",
            delete(DocumentHandler::delete_document),
        )
        .route(
            "/documents/{document_id}/chunks",
            get(DocumentHandler::get_document_chunks),
        )
        .route(
            "/documents/{document_id}/mark-dead",
            post(DocumentHandler::mark_document_dead),
        )
        .with_state(document_handler)
}
