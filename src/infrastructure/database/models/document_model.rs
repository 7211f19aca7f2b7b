use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::{Document, ProcessingCounters};
use crate::domain::value_objects::{ProcessingStatus, TagSlots};
use crate::infrastructure::database::schema::documents;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentModel {
    pub id: Uuid,
    pub knowledge_base_id: Uuid,
    pub filename: String,
    pub file_url: String,
    pub file_size: i64,
    pub mime_type: String,
    pub chunk_count: i32,
    pub token_count: i32,
    pub character_count: i32,
    pub processing_status: String,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub processing_completed_at: Option<DateTime<Utc>>,
    pub processing_error: Option<String>,
    pub enabled: bool,
    pub tag1: Option<String>,
    pub tag2: Option<String>,
    pub tag3: Option<String>,
    pub tag4: Option<String>,
    pub tag5: Option<String>,
    pub tag6: Option<String>,
    pub tag7: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = documents)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewDocumentModel {
    pub id: Uuid,
    pub knowledge_base_id: Uuid,
    pub filename: String,
    pub file_url: String,
    pub file_size: i64,
    pub mime_type: String,
    pub chunk_count: i32,
    pub token_count: i32,
    pub character_count: i32,
    pub processing_status: String,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub processing_completed_at: Option<DateTime<Utc>>,
    pub processing_error: Option<String>,
    pub enabled: bool,
    pub tag1: Option<String>,
    pub tag2: Option<String>,
    pub tag3: Option<String>,
    pub tag4: Option<String>,
    pub tag5: Option<String>,
    pub tag6: Option<String>,
    pub tag7: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&Document> for NewDocumentModel {
    fn from(document: &Document) -> Self {
        let counters = document.counters();
        let tags = document.tags().clone();

        Self {
            id: document.id(),
            knowledge_base_id: document.knowledge_base_id(),
            filename: document.filename().to_string(),
            file_url: document.file_url().to_string(),
            file_size: document.file_size(),
            mime_type: document.mime_type().to_string(),
            chunk_count: counters.chunk_count,
            token_count: counters.token_count,
            character_count: counters.character_count,
            processing_status: document.processing_status().as_str().to_string(),
            processing_started_at: document.processing_started_at(),
            processing_completed_at: document.processing_completed_at(),
            processing_error: document.processing_error().map(|s| s.to_string()),
            enabled: document.enabled(),
            tag1: tags.tag1,
            tag2: tags.tag2,
            tag3: tags.tag3,
            tag4: tags.tag4,
            tag5: tags.tag5,
            tag6: tags.tag6,
            tag7: tags.tag7,
            uploaded_at: document.uploaded_at(),
            deleted_at: document.deleted_at(),
        }
    }
}

impl TryFrom<DocumentModel> for Document {
    type Error = String;

    fn try_from(model: DocumentModel) -> Result<Self, Self::Error> {
        let status = ProcessingStatus::from_parts(
            &model.processing_status,
            model.processing_error.as_deref(),
        )?;

        let tags = TagSlots {
            tag1: model.tag1,
            tag2: model.tag2,
            tag3: model.tag3,
            tag4: model.tag4,
            tag5: model.tag5,
            tag6: model.tag6,
            tag7: model.tag7,
        };

        Ok(Document::from_database(
            model.id,
            model.knowledge_base_id,
            model.filename,
            model.file_url,
            model.file_size,
            model.mime_type,
            ProcessingCounters {
                chunk_count: model.chunk_count,
                token_count: model.token_count,
                character_count: model.character_count,
            },
            status,
            model.processing_started_at,
            model.processing_completed_at,
            model.enabled,
            tags,
            model.uploaded_at,
            model.deleted_at,
        ))
    }
}
