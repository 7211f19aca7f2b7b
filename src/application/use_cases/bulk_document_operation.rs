use std::sync::Arc;
use uuid::Uuid;

use crate::domain::repositories::DocumentRepository;

#[derive(Debug)]
pub enum BulkOperationError {
    ValidationError(String),
    RepositoryError(String),
}

impl std::fmt::Display for BulkOperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BulkOperationError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            BulkOperationError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for BulkOperationError {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BulkOperation {
    Enable,
    Disable,
    Delete,
}

impl BulkOperation {
    pub fn parse(raw: &str) -> Result<Self, BulkOperationError> {
        match raw.to_lowercase().as_str() {
            "enable" => Ok(BulkOperation::Enable),
            "disable" => Ok(BulkOperation::Disable),
            "delete" => Ok(BulkOperation::Delete),
            other => Err(BulkOperationError::ValidationError(format!(
                "Unknown bulk operation: {}",
                other
            ))),
        }
    }
}

pub struct BulkDocumentOperationUseCase {
    document_repository: Arc<dyn DocumentRepository>,
}

impl BulkDocumentOperationUseCase {
    pub fn new(document_repository: Arc<dyn DocumentRepository>) -> Self {
        Self {
            document_repository,
        }
    }

    /// Applies one operation to a set of documents; returns the number of
    /// rows affected.
    pub async fn execute(
        &self,
        knowledge_base_id: Uuid,
        operation: BulkOperation,
        document_ids: Vec<Uuid>,
    ) -> Result<usize, BulkOperationError> {
        if document_ids.is_empty() {
            return Err(BulkOperationError::ValidationError(
                "No document ids supplied".to_string(),
            ));
        }

        let affected = match operation {
            BulkOperation::Enable => {
                self.document_repository
                    .bulk_set_enabled(knowledge_base_id, &document_ids, true)
                    .await
            }
            BulkOperation::Disable => {
                self.document_repository
                    .bulk_set_enabled(knowledge_base_id, &document_ids, false)
                    .await
            }
            BulkOperation::Delete => {
                self.document_repository
                    .bulk_soft_delete(knowledge_base_id, &document_ids)
                    .await
            }
        }
        .map_err(|e| BulkOperationError::RepositoryError(e.to_string()))?;

        tracing::info!(
            knowledge_base_id = %knowledge_base_id,
            operation = ?operation,
            affected,
            "Bulk document operation applied"
        );

        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_parsing() {
        assert_eq!(BulkOperation::parse("enable").unwrap(), BulkOperation::Enable);
        assert_eq!(
            BulkOperation::parse("Disable").unwrap(),
            BulkOperation::Disable
        );
        assert_eq!(BulkOperation::parse("DELETE").unwrap(), BulkOperation::Delete);
        assert!(BulkOperation::parse("purge").is_err());
    }
}
