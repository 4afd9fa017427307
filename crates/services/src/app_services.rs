use std::sync::Arc;

use storage::repository::Storage;
use tracing::info;

use crate::Clock;
use crate::catalog::InMemoryCatalog;
use crate::config::PracticeConfig;
use crate::error::AppServicesError;
use crate::practice::{
    BookmarkService, Grader, HistoryService, MockGrader, PracticeLoopService, QuestionPicker,
};
use crate::telemetry::{TelemetrySink, TracingTelemetry};
use crate::topics_service::TopicsService;

/// Assembles app-facing services over one storage backend and catalog.
#[derive(Clone)]
pub struct AppServices {
    config: PracticeConfig,
    storage: Storage,
    topics: Arc<TopicsService>,
    practice: Arc<PracticeLoopService>,
    history: Arc<HistoryService>,
    bookmarks: Arc<BookmarkService>,
}

impl AppServices {
    /// Wire services with the mock grader and `tracing` telemetry.
    #[must_use]
    pub fn new(
        storage: Storage,
        clock: Clock,
        config: PracticeConfig,
        catalog: Arc<InMemoryCatalog>,
    ) -> Self {
        Self::with_parts(
            storage,
            clock,
            config,
            catalog,
            Arc::new(MockGrader::new()),
            Arc::new(TracingTelemetry),
        )
    }

    /// Like [`AppServices::new`] with an explicit grader and telemetry sink.
    #[must_use]
    pub fn with_parts(
        storage: Storage,
        clock: Clock,
        config: PracticeConfig,
        catalog: Arc<InMemoryCatalog>,
        grader: Arc<dyn Grader>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        let topics = Arc::new(TopicsService::new(
            catalog.clone(),
            Arc::clone(&storage.topics),
            Arc::clone(&storage.context),
            config.removal_policy,
            config.default_role,
            Arc::clone(&telemetry),
        ));
        let practice = Arc::new(PracticeLoopService::new(
            clock,
            config.history_limit,
            catalog.clone(),
            Arc::new(QuestionPicker::new(config.review_injection_rate)),
            grader,
            Arc::clone(&storage.context),
            Arc::clone(&storage.attempts),
            Arc::clone(&storage.history),
            telemetry,
        ));
        let history = Arc::new(HistoryService::new(
            catalog.clone(),
            Arc::clone(&storage.history),
        ));
        let bookmarks = Arc::new(BookmarkService::new(
            clock,
            catalog,
            Arc::clone(&storage.bookmarks),
        ));

        Self {
            config,
            storage,
            topics,
            practice,
            history,
            bookmarks,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: PracticeConfig,
        catalog: Arc<InMemoryCatalog>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        info!(db_url, "sqlite storage ready");
        Ok(Self::new(storage, clock, config, catalog))
    }

    /// In-memory storage, for tests and throwaway sessions.
    #[must_use]
    pub fn in_memory(clock: Clock, config: PracticeConfig, catalog: Arc<InMemoryCatalog>) -> Self {
        Self::new(Storage::in_memory(), clock, config, catalog)
    }

    #[must_use]
    pub fn config(&self) -> &PracticeConfig {
        &self.config
    }

    #[must_use]
    pub fn topics(&self) -> Arc<TopicsService> {
        Arc::clone(&self.topics)
    }

    #[must_use]
    pub fn practice(&self) -> Arc<PracticeLoopService> {
        Arc::clone(&self.practice)
    }

    #[must_use]
    pub fn history(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history)
    }

    #[must_use]
    pub fn bookmarks(&self) -> Arc<BookmarkService> {
        Arc::clone(&self.bookmarks)
    }

    /// Wipe every piece of local state: topic selection, practice context, the
    /// unfinished attempt, history, and bookmarks.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if any backend call fails.
    pub async fn clear_all(&self) -> Result<(), AppServicesError> {
        self.storage.topics.clear_topics_state().await?;
        self.storage.context.clear_context().await?;
        self.storage.attempts.clear_unfinished().await?;
        self.storage.history.clear_history().await?;
        self.storage.bookmarks.clear_bookmarks().await?;
        info!("local state cleared");
        Ok(())
    }
}
