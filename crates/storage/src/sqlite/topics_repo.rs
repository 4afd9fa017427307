use async_trait::async_trait;
use chrono::Utc;
use practice_core::model::TopicsState;
use practice_core::practice::PracticeContext;

use crate::repository::{PracticeContextRepository, StorageError, TopicsStateRepository};

use super::SqliteRepository;
use super::mapping::{conn, json_column, to_json};

#[async_trait]
impl TopicsStateRepository for SqliteRepository {
    async fn load_topics_state(&self) -> Result<Option<TopicsState>, StorageError> {
        let row = sqlx::query("SELECT state_json FROM topics_state WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.map(|row| json_column(&row, "state_json")).transpose()
    }

    async fn save_topics_state(&self, state: &TopicsState) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO topics_state (id, active_role, state_json, updated_at)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                active_role = excluded.active_role,
                state_json = excluded.state_json,
                updated_at = excluded.updated_at
            ",
        )
        .bind(state.active_role().code())
        .bind(to_json(state)?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn clear_topics_state(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM topics_state")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}

#[async_trait]
impl PracticeContextRepository for SqliteRepository {
    async fn load_context(&self) -> Result<Option<PracticeContext>, StorageError> {
        let row = sqlx::query("SELECT context_json FROM practice_context WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.map(|row| json_column(&row, "context_json")).transpose()
    }

    async fn save_context(&self, context: &PracticeContext) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO practice_context (id, role, context_json, updated_at)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                role = excluded.role,
                context_json = excluded.context_json,
                updated_at = excluded.updated_at
            ",
        )
        .bind(context.role.code())
        .bind(to_json(context)?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn clear_context(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM practice_context")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
