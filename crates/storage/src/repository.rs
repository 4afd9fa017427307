use async_trait::async_trait;
use chrono::{DateTime, Utc};
use practice_core::model::{Attempt, QuestionId, TopicsState};
use practice_core::practice::PracticeContext;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A saved question, newest first when listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkRecord {
    pub question_id: QuestionId,
    pub created_at: DateTime<Utc>,
}

/// Topic picker state. A single snapshot is kept.
#[async_trait]
pub trait TopicsStateRepository: Send + Sync {
    /// Load the last saved snapshot, or `None` if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be read or decoded.
    async fn load_topics_state(&self) -> Result<Option<TopicsState>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save_topics_state(&self, state: &TopicsState) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn clear_topics_state(&self) -> Result<(), StorageError>;
}

#[async_trait]
pub trait PracticeContextRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the context cannot be read or decoded.
    async fn load_context(&self) -> Result<Option<PracticeContext>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the context cannot be stored.
    async fn save_context(&self, context: &PracticeContext) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn clear_context(&self) -> Result<(), StorageError>;
}

/// The single unfinished attempt a session resumes from.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the stored attempt cannot be read or decoded.
    async fn load_unfinished(&self) -> Result<Option<Attempt>, StorageError>;

    /// Replace the stored unfinished attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn save_unfinished(&self, attempt: &Attempt) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn clear_unfinished(&self) -> Result<(), StorageError>;
}

/// Rolling log of submitted and skipped attempts.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Put `attempt` at the front and drop entries beyond the `keep` most recent.
    /// Re-appending an attempt id moves it to the front.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn append_history(&self, attempt: &Attempt, keep: usize) -> Result<(), StorageError>;

    /// Newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if entries cannot be read or decoded.
    async fn list_history(&self, limit: usize) -> Result<Vec<Attempt>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn clear_history(&self) -> Result<(), StorageError>;
}

#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    /// Newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if bookmarks cannot be read.
    async fn list_bookmarks(&self) -> Result<Vec<BookmarkRecord>, StorageError>;

    /// Add the bookmark if absent, remove it otherwise. Returns whether the question
    /// is bookmarked afterwards.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn toggle_bookmark(
        &self,
        question_id: &QuestionId,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn clear_bookmarks(&self) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    topics: Arc<Mutex<Option<TopicsState>>>,
    context: Arc<Mutex<Option<PracticeContext>>>,
    unfinished: Arc<Mutex<Option<Attempt>>>,
    history: Arc<Mutex<VecDeque<Attempt>>>,
    bookmarks: Arc<Mutex<Vec<BookmarkRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(cell: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>, StorageError> {
    cell.lock().map_err(|e| StorageError::Connection(e.to_string()))
}

#[async_trait]
impl TopicsStateRepository for InMemoryRepository {
    async fn load_topics_state(&self) -> Result<Option<TopicsState>, StorageError> {
        Ok(lock(&self.topics)?.clone())
    }

    async fn save_topics_state(&self, state: &TopicsState) -> Result<(), StorageError> {
        *lock(&self.topics)? = Some(state.clone());
        Ok(())
    }

    async fn clear_topics_state(&self) -> Result<(), StorageError> {
        *lock(&self.topics)? = None;
        Ok(())
    }
}

#[async_trait]
impl PracticeContextRepository for InMemoryRepository {
    async fn load_context(&self) -> Result<Option<PracticeContext>, StorageError> {
        Ok(lock(&self.context)?.clone())
    }

    async fn save_context(&self, context: &PracticeContext) -> Result<(), StorageError> {
        *lock(&self.context)? = Some(context.clone());
        Ok(())
    }

    async fn clear_context(&self) -> Result<(), StorageError> {
        *lock(&self.context)? = None;
        Ok(())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn load_unfinished(&self) -> Result<Option<Attempt>, StorageError> {
        Ok(lock(&self.unfinished)?.clone())
    }

    async fn save_unfinished(&self, attempt: &Attempt) -> Result<(), StorageError> {
        *lock(&self.unfinished)? = Some(attempt.clone());
        Ok(())
    }

    async fn clear_unfinished(&self) -> Result<(), StorageError> {
        *lock(&self.unfinished)? = None;
        Ok(())
    }
}

#[async_trait]
impl HistoryRepository for InMemoryRepository {
    async fn append_history(&self, attempt: &Attempt, keep: usize) -> Result<(), StorageError> {
        let mut guard = lock(&self.history)?;
        guard.retain(|a| a.id() != attempt.id());
        guard.push_front(attempt.clone());
        guard.truncate(keep);
        Ok(())
    }

    async fn list_history(&self, limit: usize) -> Result<Vec<Attempt>, StorageError> {
        Ok(lock(&self.history)?.iter().take(limit).cloned().collect())
    }

    async fn clear_history(&self) -> Result<(), StorageError> {
        lock(&self.history)?.clear();
        Ok(())
    }
}

#[async_trait]
impl BookmarkRepository for InMemoryRepository {
    async fn list_bookmarks(&self) -> Result<Vec<BookmarkRecord>, StorageError> {
        Ok(lock(&self.bookmarks)?.iter().rev().cloned().collect())
    }

    async fn toggle_bookmark(
        &self,
        question_id: &QuestionId,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let mut guard = lock(&self.bookmarks)?;
        if let Some(pos) = guard.iter().position(|b| &b.question_id == question_id) {
            guard.remove(pos);
            return Ok(false);
        }
        guard.push(BookmarkRecord {
            question_id: question_id.clone(),
            created_at: now,
        });
        Ok(true)
    }

    async fn clear_bookmarks(&self) -> Result<(), StorageError> {
        lock(&self.bookmarks)?.clear();
        Ok(())
    }
}

/// Aggregates the practice repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub topics: Arc<dyn TopicsStateRepository>,
    pub context: Arc<dyn PracticeContextRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub history: Arc<dyn HistoryRepository>,
    pub bookmarks: Arc<dyn BookmarkRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            topics: Arc::new(repo.clone()),
            context: Arc::new(repo.clone()),
            attempts: Arc::new(repo.clone()),
            history: Arc::new(repo.clone()),
            bookmarks: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use practice_core::model::{AnswerPayload, AttemptId};
    use practice_core::time::fixed_now;

    fn skipped(question: &str) -> Attempt {
        Attempt::start(AttemptId::generate(), QuestionId::new(question), fixed_now())
            .skip(AnswerPayload::Text(String::new()), fixed_now())
            .unwrap()
    }

    #[tokio::test]
    async fn history_is_newest_first_and_bounded() {
        let repo = InMemoryRepository::new();
        for q in ["q1", "q2", "q3"] {
            repo.append_history(&skipped(q), 2).await.unwrap();
        }

        let listed = repo.list_history(10).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|a| a.question_id().as_str()).collect();
        assert_eq!(ids, vec!["q3", "q2"]);
        assert_eq!(repo.list_history(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bookmark_toggle_flips_membership() {
        let repo = InMemoryRepository::new();
        let q = QuestionId::new("q_sql_001");

        assert!(repo.toggle_bookmark(&q, fixed_now()).await.unwrap());
        assert_eq!(repo.list_bookmarks().await.unwrap().len(), 1);
        assert!(!repo.toggle_bookmark(&q, fixed_now()).await.unwrap());
        assert!(repo.list_bookmarks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unfinished_attempt_is_replaced_and_cleared() {
        let repo = InMemoryRepository::new();
        let first = Attempt::start(AttemptId::generate(), QuestionId::new("a"), fixed_now());
        let second = Attempt::start(AttemptId::generate(), QuestionId::new("b"), fixed_now());

        repo.save_unfinished(&first).await.unwrap();
        repo.save_unfinished(&second).await.unwrap();
        assert_eq!(repo.load_unfinished().await.unwrap(), Some(second));

        repo.clear_unfinished().await.unwrap();
        assert!(repo.load_unfinished().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn storage_handles_share_one_backend() {
        let storage = Storage::in_memory();
        storage
            .topics
            .save_topics_state(&TopicsState::default())
            .await
            .unwrap();
        storage
            .context
            .save_context(&PracticeContext::default())
            .await
            .unwrap();

        assert!(storage.topics.load_topics_state().await.unwrap().is_some());
        assert_eq!(
            storage.context.load_context().await.unwrap(),
            Some(PracticeContext::default())
        );
    }
}
