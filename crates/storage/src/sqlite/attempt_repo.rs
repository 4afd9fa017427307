use async_trait::async_trait;
use practice_core::model::Attempt;

use crate::repository::{AttemptRepository, HistoryRepository, StorageError};

use super::SqliteRepository;
use super::mapping::{conn, limit_to_i64, map_attempt_row, to_json};

#[async_trait]
impl AttemptRepository for SqliteRepository {
    async fn load_unfinished(&self) -> Result<Option<Attempt>, StorageError> {
        let row = sqlx::query("SELECT attempt_json FROM unfinished_attempt WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_attempt_row).transpose()
    }

    async fn save_unfinished(&self, attempt: &Attempt) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO unfinished_attempt (
                id, attempt_id, question_id, status, attempt_json, updated_at
            )
            VALUES (1, ?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                attempt_id = excluded.attempt_id,
                question_id = excluded.question_id,
                status = excluded.status,
                attempt_json = excluded.attempt_json,
                updated_at = excluded.updated_at
            ",
        )
        .bind(attempt.id().value())
        .bind(attempt.question_id().as_str())
        .bind(attempt.status().as_str())
        .bind(to_json(attempt)?)
        .bind(attempt.updated_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn clear_unfinished(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM unfinished_attempt")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}

#[async_trait]
impl HistoryRepository for SqliteRepository {
    async fn append_history(&self, attempt: &Attempt, keep: usize) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query("DELETE FROM attempt_history WHERE attempt_id = ?1")
            .bind(attempt.id().value())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO attempt_history (
                attempt_id, question_id, status, attempt_json, recorded_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(attempt.id().value())
        .bind(attempt.question_id().as_str())
        .bind(attempt.status().as_str())
        .bind(to_json(attempt)?)
        .bind(attempt.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query(
            r"
            DELETE FROM attempt_history
            WHERE seq NOT IN (
                SELECT seq FROM attempt_history ORDER BY seq DESC LIMIT ?1
            )
            ",
        )
        .bind(limit_to_i64(keep))
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn list_history(&self, limit: usize) -> Result<Vec<Attempt>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT attempt_json
            FROM attempt_history
            ORDER BY seq DESC
            LIMIT ?1
            ",
        )
        .bind(limit_to_i64(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_attempt_row).collect()
    }

    async fn clear_history(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM attempt_history")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
