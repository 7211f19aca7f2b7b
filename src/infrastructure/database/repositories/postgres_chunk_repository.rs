use async_trait::async_trait;
use diesel::prelude::*;
use tokio::task;
use uuid::Uuid;

use crate::domain::entities::DocumentChunk;
use crate::domain::repositories::chunk_repository::{ChunkRepository, ChunkRepositoryError};
use crate::infrastructure::database::connection::{DbPool, get_connection_from_pool};
use crate::infrastructure::database::models::DocumentChunkModel;
use crate::infrastructure::database::schema::document_chunks;

pub struct PostgresChunkRepository {
    pool: DbPool,
}

impl PostgresChunkRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn database_error(e: impl std::fmt::Display) -> ChunkRepositoryError {
        ChunkRepositoryError::DatabaseError(e.to_string())
    }
}

#[async_trait]
impl ChunkRepository for PostgresChunkRepository {
    async fn find_by_document(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<DocumentChunk>, ChunkRepositoryError> {
        let pool = self.pool.clone();

        let models = task::spawn_blocking(
            move || -> Result<Vec<DocumentChunkModel>, ChunkRepositoryError> {
                let mut conn = get_connection_from_pool(&pool).map_err(Self::database_error)?;

                document_chunks::table
                    .filter(document_chunks::document_id.eq(document_id))
                    .order(document_chunks::chunk_index.asc())
                    .load::<DocumentChunkModel>(&mut conn)
                    .map_err(Self::database_error)
            },
        )
        .await
        .map_err(Self::database_error)??;

        Ok(models.into_iter().map(DocumentChunk::from).collect())
    }

    async fn count_for_document(&self, document_id: Uuid) -> Result<i64, ChunkRepositoryError> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> Result<i64, ChunkRepositoryError> {
            let mut conn = get_connection_from_pool(&pool).map_err(Self::database_error)?;

            document_chunks::table
                .filter(document_chunks::document_id.eq(document_id))
                .count()
                .get_result::<i64>(&mut conn)
                .map_err(Self::database_error)
        })
        .await
        .map_err(Self::database_error)?
    }
}
