use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use tokio::task;
use uuid::Uuid;

use crate::domain::entities::{Document, DocumentChunk, ProcessingCounters};
use crate::domain::repositories::document_repository::{
    DocumentFilters, DocumentPage, DocumentRepository, DocumentRepositoryError,
};
use crate::infrastructure::database::connection::{DbPool, get_connection_from_pool};
use crate::infrastructure::database::models::{
    DocumentModel, NewDocumentChunkModel, NewDocumentModel,
};
use crate::infrastructure::database::schema::{document_chunks, documents};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

pub struct PostgresDocumentRepository {
    pool: DbPool,
}

impl PostgresDocumentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn database_error(e: impl std::fmt::Display) -> DocumentRepositoryError {
        DocumentRepositoryError::DatabaseError(e.to_string())
    }
}

#[async_trait]
impl DocumentRepository for PostgresDocumentRepository {
    async fn create_batch(
        &self,
        docs: &[Document],
    ) -> Result<Vec<Document>, DocumentRepositoryError> {
        let pool = self.pool.clone();
        let new_models: Vec<NewDocumentModel> = docs.iter().map(NewDocumentModel::from).collect();

        let models = task::spawn_blocking(move || -> Result<Vec<DocumentModel>, DocumentRepositoryError> {
            let mut conn = get_connection_from_pool(&pool).map_err(Self::database_error)?;

            diesel::insert_into(documents::table)
                .values(&new_models)
                .get_results::<DocumentModel>(&mut conn)
                .map_err(Self::database_error)
        })
        .await
        .map_err(Self::database_error)??;

        models
            .into_iter()
            .map(|model| {
                Document::try_from(model).map_err(DocumentRepositoryError::ValidationError)
            })
            .collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Document>, DocumentRepositoryError> {
        let pool = self.pool.clone();

        let model = task::spawn_blocking(move || -> Result<Option<DocumentModel>, DocumentRepositoryError> {
            let mut conn = get_connection_from_pool(&pool).map_err(Self::database_error)?;

            documents::table
                .find(id)
                .first::<DocumentModel>(&mut conn)
                .optional()
                .map_err(Self::database_error)
        })
        .await
        .map_err(Self::database_error)??;

        match model {
            Some(model) => {
                let document =
                    Document::try_from(model).map_err(DocumentRepositoryError::ValidationError)?;
                Ok(Some(document))
            }
            None => Ok(None),
        }
    }

    async fn find_for_knowledge_base(
        &self,
        knowledge_base_id: Uuid,
        filters: DocumentFilters,
    ) -> Result<DocumentPage, DocumentRepositoryError> {
        let pool = self.pool.clone();

        let (models, total) = task::spawn_blocking(
            move || -> Result<(Vec<DocumentModel>, i64), DocumentRepositoryError> {
                let mut conn = get_connection_from_pool(&pool).map_err(Self::database_error)?;

                let mut query = documents::table
                    .filter(documents::knowledge_base_id.eq(knowledge_base_id))
                    .filter(documents::deleted_at.is_null())
                    .into_boxed();
                let mut count_query = documents::table
                    .filter(documents::knowledge_base_id.eq(knowledge_base_id))
                    .filter(documents::deleted_at.is_null())
                    .into_boxed();

                if let Some(status) = &filters.processing_status {
                    query = query.filter(documents::processing_status.eq(status.clone()));
                    count_query =
                        count_query.filter(documents::processing_status.eq(status.clone()));
                }

                if let Some(enabled) = filters.enabled {
                    query = query.filter(documents::enabled.eq(enabled));
                    count_query = count_query.filter(documents::enabled.eq(enabled));
                }

                if let Some(search) = &filters.search {
                    let pattern = format!("%{}%", search);
                    query = query.filter(documents::filename.ilike(pattern.clone()));
                    count_query = count_query.filter(documents::filename.ilike(pattern));
                }

                let total = count_query
                    .count()
                    .get_result::<i64>(&mut conn)
                    .map_err(Self::database_error)?;

                let limit = if filters.limit > 0 {
                    filters.limit.min(MAX_PAGE_SIZE)
                } else {
                    DEFAULT_PAGE_SIZE
                };

                let models = query
                    .order(documents::uploaded_at.desc())
                    .offset(filters.offset.max(0))
                    .limit(limit)
                    .load::<DocumentModel>(&mut conn)
                    .map_err(Self::database_error)?;

                Ok((models, total))
            },
        )
        .await
        .map_err(Self::database_error)??;

        let documents = models
            .into_iter()
            .map(|model| {
                Document::try_from(model).map_err(DocumentRepositoryError::ValidationError)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DocumentPage { documents, total })
    }

    async fn update(&self, document: &Document) -> Result<(), DocumentRepositoryError> {
        let pool = self.pool.clone();
        let id = document.id();
        let changeset = NewDocumentModel::from(document);

        task::spawn_blocking(move || -> Result<(), DocumentRepositoryError> {
            let mut conn = get_connection_from_pool(&pool).map_err(Self::database_error)?;

            let updated = diesel::update(documents::table.find(id))
                .set(&changeset)
                .execute(&mut conn)
                .map_err(Self::database_error)?;

            if updated == 0 {
                return Err(DocumentRepositoryError::NotFound(id));
            }

            Ok(())
        })
        .await
        .map_err(Self::database_error)?
    }

    async fn save_processing_state(
        &self,
        document: &Document,
    ) -> Result<(), DocumentRepositoryError> {
        let pool = self.pool.clone();
        let id = document.id();
        let status = document.processing_status().as_str().to_string();
        let started_at = document.processing_started_at();
        let completed_at = document.processing_completed_at();
        let error = document.processing_error().map(|s| s.to_string());

        task::spawn_blocking(move || -> Result<(), DocumentRepositoryError> {
            let mut conn = get_connection_from_pool(&pool).map_err(Self::database_error)?;

            let updated = diesel::update(documents::table.find(id))
                .set((
                    documents::processing_status.eq(status),
                    documents::processing_started_at.eq(started_at),
                    documents::processing_completed_at.eq(completed_at),
                    documents::processing_error.eq(error),
                ))
                .execute(&mut conn)
                .map_err(Self::database_error)?;

            if updated == 0 {
                return Err(DocumentRepositoryError::NotFound(id));
            }

            Ok(())
        })
        .await
        .map_err(Self::database_error)?
    }

    async fn finalize_processing(
        &self,
        document_id: Uuid,
        chunks: &[DocumentChunk],
        counters: ProcessingCounters,
    ) -> Result<(), DocumentRepositoryError> {
        let pool = self.pool.clone();
        let new_chunks: Vec<NewDocumentChunkModel> =
            chunks.iter().map(NewDocumentChunkModel::from).collect();

        task::spawn_blocking(move || -> Result<(), DocumentRepositoryError> {
            let mut conn = get_connection_from_pool(&pool).map_err(Self::database_error)?;

            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                diesel::delete(
                    document_chunks::table
                        .filter(document_chunks::document_id.eq(document_id)),
                )
                .execute(conn)?;

                if !new_chunks.is_empty() {
                    diesel::insert_into(document_chunks::table)
                        .values(&new_chunks)
                        .execute(conn)?;
                }

                diesel::update(documents::table.find(document_id))
                    .set((
                        documents::chunk_count.eq(counters.chunk_count),
                        documents::token_count.eq(counters.token_count),
                        documents::character_count.eq(counters.character_count),
                        documents::processing_status.eq("completed"),
                        documents::processing_completed_at.eq(Some(Utc::now())),
                        documents::processing_error.eq(None::<String>),
                    ))
                    .execute(conn)?;

                Ok(())
            })
            .map_err(Self::database_error)
        })
        .await
        .map_err(Self::database_error)?
    }

    async fn mark_failed(
        &self,
        document_id: Uuid,
        error_message: &str,
    ) -> Result<(), DocumentRepositoryError> {
        let pool = self.pool.clone();
        let error_message = error_message.to_string();

        task::spawn_blocking(move || -> Result<(), DocumentRepositoryError> {
            let mut conn = get_connection_from_pool(&pool).map_err(Self::database_error)?;

            let updated = diesel::update(documents::table.find(document_id))
                .set((
                    documents::processing_status.eq("failed"),
                    documents::processing_completed_at.eq(Some(Utc::now())),
                    documents::processing_error.eq(Some(error_message)),
                ))
                .execute(&mut conn)
                .map_err(Self::database_error)?;

            if updated == 0 {
                return Err(DocumentRepositoryError::NotFound(document_id));
            }

            Ok(())
        })
        .await
        .map_err(Self::database_error)?
    }

    async fn reset_for_retry(&self, document_id: Uuid) -> Result<(), DocumentRepositoryError> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> Result<(), DocumentRepositoryError> {
            let mut conn = get_connection_from_pool(&pool).map_err(Self::database_error)?;

            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                diesel::delete(
                    document_chunks::table
                        .filter(document_chunks::document_id.eq(document_id)),
                )
                .execute(conn)?;

                diesel::update(documents::table.find(document_id))
                    .set((
                        documents::chunk_count.eq(0),
                        documents::token_count.eq(0),
                        documents::character_count.eq(0),
                        documents::processing_status.eq("pending"),
                        documents::processing_started_at.eq(None::<chrono::DateTime<Utc>>),
                        documents::processing_completed_at.eq(None::<chrono::DateTime<Utc>>),
                        documents::processing_error.eq(None::<String>),
                    ))
                    .execute(conn)?;

                Ok(())
            })
            .map_err(Self::database_error)
        })
        .await
        .map_err(Self::database_error)?
    }

    async fn bulk_set_enabled(
        &self,
        knowledge_base_id: Uuid,
        document_ids: &[Uuid],
        enabled: bool,
    ) -> Result<usize, DocumentRepositoryError> {
        let pool = self.pool.clone();
        let ids = document_ids.to_vec();

        task::spawn_blocking(move || -> Result<usize, DocumentRepositoryError> {
            let mut conn = get_connection_from_pool(&pool).map_err(Self::database_error)?;

            diesel::update(
                documents::table
                    .filter(documents::knowledge_base_id.eq(knowledge_base_id))
                    .filter(documents::id.eq_any(ids))
                    .filter(documents::deleted_at.is_null()),
            )
            .set(documents::enabled.eq(enabled))
            .execute(&mut conn)
            .map_err(Self::database_error)
        })
        .await
        .map_err(Self::database_error)?
    }

    async fn bulk_soft_delete(
        &self,
        knowledge_base_id: Uuid,
        document_ids: &[Uuid],
    ) -> Result<usize, DocumentRepositoryError> {
        let pool = self.pool.clone();
        let ids = document_ids.to_vec();

        task::spawn_blocking(move || -> Result<usize, DocumentRepositoryError> {
            let mut conn = get_connection_from_pool(&pool).map_err(Self::database_error)?;

            diesel::update(
                documents::table
                    .filter(documents::knowledge_base_id.eq(knowledge_base_id))
                    .filter(documents::id.eq_any(ids))
                    .filter(documents::deleted_at.is_null()),
            )
            .set(documents::deleted_at.eq(Some(Utc::now())))
            .execute(&mut conn)
            .map_err(Self::database_error)
        })
        .await
        .map_err(Self::database_error)?
    }
}
