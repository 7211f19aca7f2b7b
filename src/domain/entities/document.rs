use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{ProcessingStatus, TagSlots};

/// Summary counters written when a document finishes processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingCounters {
    pub chunk_count: i32,
    pub token_count: i32,
    pub character_count: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: Uuid,
    knowledge_base_id: Uuid,
    filename: String,
    file_url: String,
    file_size: i64,
    mime_type: String,
    counters: ProcessingCounters,
    processing_status: ProcessingStatus,
    processing_started_at: Option<DateTime<Utc>>,
    processing_completed_at: Option<DateTime<Utc>>,
    enabled: bool,
    tags: TagSlots,
    uploaded_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(
        knowledge_base_id: Uuid,
        filename: String,
        file_url: String,
        file_size: i64,
        mime_type: String,
        tags: TagSlots,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            knowledge_base_id,
            filename,
            file_url,
            file_size,
            mime_type,
            counters: ProcessingCounters::default(),
            processing_status: ProcessingStatus::Pending,
            processing_started_at: None,
            processing_completed_at: None,
            enabled: true,
            tags,
            uploaded_at: Utc::now(),
            deleted_at: None,
        }
    }

    /// Reconstruct a document from persisted values.
    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        knowledge_base_id: Uuid,
        filename: String,
        file_url: String,
        file_size: i64,
        mime_type: String,
        counters: ProcessingCounters,
        processing_status: ProcessingStatus,
        processing_started_at: Option<DateTime<Utc>>,
        processing_completed_at: Option<DateTime<Utc>>,
        enabled: bool,
        tags: TagSlots,
        uploaded_at: DateTime<Utc>,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            knowledge_base_id,
            filename,
            file_url,
            file_size,
            mime_type,
            counters,
            processing_status,
            processing_started_at,
            processing_completed_at,
            enabled,
            tags,
            uploaded_at,
            deleted_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn knowledge_base_id(&self) -> Uuid {
        self.knowledge_base_id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn file_url(&self) -> &str {
        &self.file_url
    }

    pub fn file_size(&self) -> i64 {
        self.file_size
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn counters(&self) -> ProcessingCounters {
        self.counters
    }

    pub fn processing_status(&self) -> &ProcessingStatus {
        &self.processing_status
    }

    pub fn processing_started_at(&self) -> Option<DateTime<Utc>> {
        self.processing_started_at
    }

    pub fn processing_completed_at(&self) -> Option<DateTime<Utc>> {
        self.processing_completed_at
    }

    pub fn processing_error(&self) -> Option<&str> {
        self.processing_status.error_message()
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn tags(&self) -> &TagSlots {
        &self.tags
    }

    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// A document can enter the pipeline when it is pending, enabled, and
    /// not soft-deleted.
    pub fn is_processable(&self) -> bool {
        self.processing_status.is_pending() && self.enabled && !self.is_deleted()
    }

    pub fn begin_processing(&mut self) -> Result<(), String> {
        let next = ProcessingStatus::Processing;
        if !self.processing_status.can_transition_to(&next) {
            return Err(format!(
                "Document {} cannot start processing from state '{}'",
                self.id, self.processing_status
            ));
        }

        self.processing_status = next;
        self.processing_started_at = Some(Utc::now());
        self.processing_completed_at = None;
        Ok(())
    }

    pub fn complete_processing(&mut self, counters: ProcessingCounters) -> Result<(), String> {
        let next = ProcessingStatus::Completed;
        if !self.processing_status.can_transition_to(&next) {
            return Err(format!(
                "Document {} cannot complete from state '{}'",
                self.id, self.processing_status
            ));
        }

        self.processing_status = next;
        self.counters = counters;
        self.processing_completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail_processing(&mut self, error: String) -> Result<(), String> {
        let next = ProcessingStatus::Failed(error);
        if !self.processing_status.can_transition_to(&next) {
            return Err(format!(
                "Document {} cannot fail from state '{}'",
                self.id, self.processing_status
            ));
        }

        self.processing_status = next;
        self.processing_completed_at = Some(Utc::now());
        Ok(())
    }

    /// Explicit retry: back to pending with zeroed counters and cleared
    /// timestamps, as if freshly uploaded.
    pub fn reset_for_retry(&mut self) -> Result<(), String> {
        if self.processing_status.is_processing() {
            return Err(format!(
                "Document {} is still processing and cannot be retried",
                self.id
            ));
        }

        self.processing_status = ProcessingStatus::Pending;
        self.counters = ProcessingCounters::default();
        self.processing_started_at = None;
        self.processing_completed_at = None;
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_filename(&mut self, filename: String) {
        self.filename = filename;
    }

    pub fn set_tags(&mut self, tags: TagSlots) {
        self.tags = tags;
    }

    pub fn soft_delete(&mut self) {
        if self.deleted_at.is_none() {
            self.deleted_at = Some(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> Document {
        Document::new(
            Uuid::new_v4(),
            "report.pdf".to_string(),
            "https://files.example.com/report.pdf".to_string(),
            2048,
            "application/pdf".to_string(),
            TagSlots::default(),
        )
    }

    #[test]
    fn test_new_document_is_pending() {
        let document = sample_document();

        assert_eq!(document.processing_status(), &ProcessingStatus::Pending);
        assert_eq!(document.counters(), ProcessingCounters::default());
        assert!(document.processing_started_at().is_none());
        assert!(document.processing_completed_at().is_none());
        assert!(document.is_processable());
    }

    #[test]
    fn test_processing_lifecycle() {
        let mut document = sample_document();

        assert!(document.begin_processing().is_ok());
        assert!(document.processing_started_at().is_some());
        assert!(document.processing_completed_at().is_none());

        let counters = ProcessingCounters {
            chunk_count: 4,
            token_count: 512,
            character_count: 2048,
        };
        assert!(document.complete_processing(counters).is_ok());
        assert_eq!(document.counters().chunk_count, 4);
        assert!(document.processing_completed_at().is_some());

        // Completed is terminal.
        assert!(document.begin_processing().is_err());
        assert!(document.fail_processing("late error".to_string()).is_err());
    }

    #[test]
    fn test_failure_and_retry_reset() {
        let mut document = sample_document();

        document.begin_processing().unwrap();
        document.fail_processing("extraction failed".to_string()).unwrap();
        assert_eq!(document.processing_error(), Some("extraction failed"));
        assert!(document.processing_completed_at().is_some());

        document.reset_for_retry().unwrap();
        assert_eq!(document.processing_status(), &ProcessingStatus::Pending);
        assert_eq!(document.counters(), ProcessingCounters::default());
        assert!(document.processing_started_at().is_none());
        assert!(document.processing_completed_at().is_none());
    }

    #[test]
    fn test_retry_rejected_while_processing() {
        let mut document = sample_document();

        document.begin_processing().unwrap();
        assert!(document.reset_for_retry().is_err());
    }

    #[test]
    fn test_failed_document_can_reprocess() {
        let mut document = sample_document();

        document.begin_processing().unwrap();
        document.fail_processing("transient".to_string()).unwrap();

        // A queued retry starts a new attempt without a pending reset.
        assert!(document.begin_processing().is_ok());
        assert!(document.processing_completed_at().is_none());
    }

    #[test]
    fn test_soft_delete_excludes_from_processing() {
        let mut document = sample_document();

        document.soft_delete();
        assert!(document.is_deleted());
        assert!(!document.is_processable());
    }
}
