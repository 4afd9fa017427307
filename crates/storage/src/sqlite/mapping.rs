use practice_core::model::{Attempt, QuestionId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{BookmarkRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

pub(crate) fn from_json<T: DeserializeOwned>(raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn json_column<T: DeserializeOwned>(
    row: &SqliteRow,
    column: &'static str,
) -> Result<T, StorageError> {
    let raw: String = row.try_get(column).map_err(ser)?;
    from_json(&raw)
}

pub(crate) fn map_attempt_row(row: &SqliteRow) -> Result<Attempt, StorageError> {
    json_column(row, "attempt_json")
}

pub(crate) fn map_bookmark_row(row: &SqliteRow) -> Result<BookmarkRecord, StorageError> {
    let question_id: String = row.try_get("question_id").map_err(ser)?;
    Ok(BookmarkRecord {
        question_id: QuestionId::new(question_id),
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

/// `LIMIT` binds as `i64`; anything larger is effectively unbounded.
pub(crate) fn limit_to_i64(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
