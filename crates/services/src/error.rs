//! Shared error types for the services crate.

use thiserror::Error;

use practice_core::model::{
    AttemptError, FeedbackError, QuestionError, QuestionId, RoleSetError, TopicsStateError,
};
use practice_core::next_up::NextUpAction;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while reading `PracticeConfig` from the environment.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Errors emitted while loading a topic and question catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error("duplicate question id: {0}")]
    DuplicateQuestion(QuestionId),
}

/// Errors emitted by `TopicsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TopicsServiceError {
    #[error(transparent)]
    Roles(#[from] RoleSetError),
    #[error(transparent)]
    State(#[from] TopicsStateError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the practice loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PracticeError {
    #[error("question bank is empty")]
    EmptyBank,
    #[error("no active question")]
    NoActiveQuestion,
    #[error("next-up option {} is not offered for this question", .0.as_str())]
    OptionNotOffered(NextUpAction),
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Feedback(#[from] FeedbackError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
