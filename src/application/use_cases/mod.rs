pub mod bulk_document_operation;
pub mod create_documents;
pub mod delete_document;
pub mod get_document;
pub mod get_document_chunks;
pub mod list_documents;
pub mod mark_document_dead;
pub mod process_documents;
pub mod retry_document;
pub mod update_document;

pub use bulk_document_operation::BulkDocumentOperationUseCase;
pub use create_documents::CreateDocumentsUseCase;
pub use delete_document::DeleteDocumentUseCase;
pub use get_document::GetDocumentUseCase;
pub use get_document_chunks::GetDocumentChunksUseCase;
pub use list_documents::ListDocumentsUseCase;
pub use mark_document_dead::MarkDocumentDeadUseCase;
pub use process_documents::ProcessDocumentsUseCase;
pub use retry_document::RetryDocumentUseCase;
pub use update_document::UpdateDocumentUseCase;
