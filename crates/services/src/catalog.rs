//! Topic trees and questions the app ships with.

use std::collections::{HashMap, HashSet};

use practice_core::graph::TopicGraph;
use practice_core::model::{Question, QuestionId, Role, TopicNode};
use serde::Deserialize;

use crate::error::CatalogError;

/// Base topic nodes per role.
pub trait TopicCatalog: Send + Sync {
    fn base_topics(&self, role: Role) -> Vec<TopicNode>;

    /// Graph for `role` with the user's custom nodes merged in.
    fn graph_for(&self, role: Role, custom: &[TopicNode]) -> TopicGraph {
        TopicGraph::assemble(
            self.base_topics(role),
            custom.iter().filter(|n| n.role == role).cloned(),
        )
    }
}

pub trait QuestionBank: Send + Sync {
    fn questions(&self) -> &[Question];

    fn question(&self, id: &QuestionId) -> Option<&Question>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub topics: Vec<TopicNode>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Catalog held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    topics: Vec<TopicNode>,
    questions: Vec<Question>,
    by_id: HashMap<QuestionId, usize>,
}

impl InMemoryCatalog {
    /// # Errors
    ///
    /// Returns `CatalogError` when a question fails validation or an id repeats.
    pub fn new(topics: Vec<TopicNode>, questions: Vec<Question>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for question in &questions {
            question.validate()?;
            if !seen.insert(question.id.clone()) {
                return Err(CatalogError::DuplicateQuestion(question.id.clone()));
            }
        }
        let by_id = questions
            .iter()
            .enumerate()
            .map(|(i, q)| (q.id.clone(), i))
            .collect();
        Ok(Self {
            topics,
            questions,
            by_id,
        })
    }

    /// Parse a JSON seed of the shape `{ "topics": [...], "questions": [...] }`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` for malformed JSON or invalid questions.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let seed: CatalogSeed = serde_json::from_str(raw)?;
        Self::new(seed.topics, seed.questions)
    }
}

impl TopicCatalog for InMemoryCatalog {
    fn base_topics(&self, role: Role) -> Vec<TopicNode> {
        self.topics
            .iter()
            .filter(|n| n.role == role)
            .cloned()
            .collect()
    }
}

impl QuestionBank for InMemoryCatalog {
    fn questions(&self) -> &[Question] {
        &self.questions
    }

    fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.by_id.get(id).and_then(|&i| self.questions.get(i))
    }
}
