#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog;
pub mod config;
pub mod error;
pub mod practice;
pub mod telemetry;
pub mod topics_service;

pub use practice_core::Clock;

pub use app_services::AppServices;
pub use catalog::{CatalogSeed, InMemoryCatalog, QuestionBank, TopicCatalog};
pub use config::{PracticeConfig, RemovalPolicy};
pub use error::{AppServicesError, CatalogError, ConfigError, PracticeError, TopicsServiceError};
pub use practice::{
    BookmarkService, Grader, HistoryItem, HistoryService, MockGrader, NextUpOutcome,
    PracticeLoopService, PracticeSession, QuestionPicker,
};
pub use telemetry::{NoopTelemetry, RecordingTelemetry, TelemetrySink, TracingTelemetry};
pub use topics_service::{TopicsService, TopicsView};
