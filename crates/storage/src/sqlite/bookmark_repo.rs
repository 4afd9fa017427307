use async_trait::async_trait;
use chrono::{DateTime, Utc};
use practice_core::model::QuestionId;

use crate::repository::{BookmarkRecord, BookmarkRepository, StorageError};

use super::SqliteRepository;
use super::mapping::{conn, map_bookmark_row};

#[async_trait]
impl BookmarkRepository for SqliteRepository {
    async fn list_bookmarks(&self) -> Result<Vec<BookmarkRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT question_id, created_at
            FROM bookmarks
            ORDER BY seq DESC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_bookmark_row).collect()
    }

    async fn toggle_bookmark(
        &self,
        question_id: &QuestionId,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let removed = sqlx::query("DELETE FROM bookmarks WHERE question_id = ?1")
            .bind(question_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?
            .rows_affected();

        if removed == 0 {
            sqlx::query("INSERT INTO bookmarks (question_id, created_at) VALUES (?1, ?2)")
                .bind(question_id.as_str())
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(removed == 0)
    }

    async fn clear_bookmarks(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM bookmarks")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
