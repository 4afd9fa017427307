use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS topics_state (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            active_role TEXT NOT NULL,
            state_json TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS practice_context (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            role TEXT NOT NULL,
            context_json TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS unfinished_attempt (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            attempt_id BLOB NOT NULL,
            question_id TEXT NOT NULL,
            status TEXT NOT NULL,
            attempt_json TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS attempt_history (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            attempt_id BLOB NOT NULL UNIQUE,
            question_id TEXT NOT NULL,
            status TEXT NOT NULL,
            attempt_json TEXT NOT NULL,
            recorded_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS bookmarks (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            question_id TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_attempt_history_question
            ON attempt_history (question_id, recorded_at);
    ",
];

/// Applies versioned schema migrations inside a transaction each.
///
/// Version 1 holds every practice table: topic picker snapshot, practice context,
/// unfinished attempt, attempt history and bookmarks.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        for statement in SCHEMA_V1.iter().copied() {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
