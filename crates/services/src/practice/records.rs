use std::sync::Arc;

use practice_core::model::{Attempt, Question, QuestionId};
use storage::repository::{BookmarkRepository, HistoryRepository};
use tracing::{debug, warn};

use crate::Clock;
use crate::catalog::QuestionBank;
use crate::error::PracticeError;

/// A history entry with its question, when the bank still carries it.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryItem {
    pub attempt: Attempt,
    pub question: Option<Question>,
}

/// Read access to past submitted and skipped attempts.
#[derive(Clone)]
pub struct HistoryService {
    bank: Arc<dyn QuestionBank>,
    history: Arc<dyn HistoryRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(bank: Arc<dyn QuestionBank>, history: Arc<dyn HistoryRepository>) -> Self {
        Self { bank, history }
    }

    /// Newest first, at most `limit` entries.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` on read failure.
    pub async fn list(&self, limit: usize) -> Result<Vec<HistoryItem>, PracticeError> {
        let attempts = self.history.list_history(limit).await?;
        Ok(attempts
            .into_iter()
            .map(|attempt| HistoryItem {
                question: self.bank.question(attempt.question_id()).cloned(),
                attempt,
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns `PracticeError::Storage` on backend failure.
    pub async fn clear(&self) -> Result<(), PracticeError> {
        self.history.clear_history().await?;
        debug!("history cleared");
        Ok(())
    }
}

#[derive(Clone)]
pub struct BookmarkService {
    clock: Clock,
    bank: Arc<dyn QuestionBank>,
    bookmarks: Arc<dyn BookmarkRepository>,
}

impl BookmarkService {
    #[must_use]
    pub fn new(
        clock: Clock,
        bank: Arc<dyn QuestionBank>,
        bookmarks: Arc<dyn BookmarkRepository>,
    ) -> Self {
        Self {
            clock,
            bank,
            bookmarks,
        }
    }

    /// Returns whether the question is bookmarked afterwards.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` on backend failure.
    pub async fn toggle(&self, question_id: &QuestionId) -> Result<bool, PracticeError> {
        let marked = self
            .bookmarks
            .toggle_bookmark(question_id, self.clock.now())
            .await?;
        debug!(%question_id, marked, "bookmark toggled");
        Ok(marked)
    }

    /// # Errors
    ///
    /// Returns `PracticeError::Storage` on backend failure.
    pub async fn is_bookmarked(&self, question_id: &QuestionId) -> Result<bool, PracticeError> {
        Ok(self
            .bookmarks
            .list_bookmarks()
            .await?
            .iter()
            .any(|b| &b.question_id == question_id))
    }

    /// Bookmarked questions newest first. Ids the bank no longer has are skipped.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` on read failure.
    pub async fn list_bookmarked_questions(&self) -> Result<Vec<Question>, PracticeError> {
        let records = self.bookmarks.list_bookmarks().await?;
        Ok(records
            .iter()
            .filter_map(|b| {
                let question = self.bank.question(&b.question_id).cloned();
                if question.is_none() {
                    warn!(question_id = %b.question_id, "bookmark has no matching question");
                }
                question
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns `PracticeError::Storage` on backend failure.
    pub async fn clear(&self) -> Result<(), PracticeError> {
        self.bookmarks.clear_bookmarks().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use practice_core::model::{Difficulty, QuestionFormat, Role, TopicNode};
    use practice_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn bank() -> Arc<InMemoryCatalog> {
        let question = Question {
            id: QuestionId::new("q_sql_001"),
            role: Role::DataEngineer,
            topic_path: vec!["SQL".into()],
            difficulty: Difficulty::new(2).unwrap(),
            format: QuestionFormat::Short,
            prompt: "Explain LEFT JOIN.".into(),
            choices: Vec::new(),
            multi_select: false,
            sequence: None,
            is_review_injection: false,
        };
        Arc::new(InMemoryCatalog::new(Vec::<TopicNode>::new(), vec![question]).unwrap())
    }

    #[tokio::test]
    async fn bookmarks_skip_questions_missing_from_bank() {
        let repo = Arc::new(InMemoryRepository::new());
        let svc = BookmarkService::new(fixed_clock(), bank(), repo);

        assert!(svc.toggle(&QuestionId::new("q_sql_001")).await.unwrap());
        assert!(svc.toggle(&QuestionId::new("gone")).await.unwrap());

        let listed = svc.list_bookmarked_questions().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id.as_str(), "q_sql_001");
        assert!(svc.is_bookmarked(&QuestionId::new("gone")).await.unwrap());
    }
}
