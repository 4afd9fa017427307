use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Band, Role, TopicId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TopicError {
    #[error("topic label cannot be empty")]
    EmptyLabel,

    #[error("topic level must be at least 1")]
    InvalidLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// Practice statistics shown next to a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMetrics {
    pub band: Band,
    pub trend: Trend,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_practiced_at: Option<DateTime<Utc>>,
}

impl TopicMetrics {
    /// Metrics for a topic nobody has practiced yet.
    #[must_use]
    pub fn fresh() -> Self {
        Self {
            band: Band::MID,
            trend: Trend::Flat,
            attempts: 0,
            last_practiced_at: None,
        }
    }
}

/// A node in a role's topic hierarchy. Level 1 nodes are roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicNode {
    pub id: TopicId,
    pub role: Role,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TopicId>,
    #[serde(default)]
    pub children_ids: Vec<TopicId>,
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<TopicMetrics>,
}

impl TopicNode {
    /// Build a user-added topic with fresh metrics and no children.
    ///
    /// # Errors
    ///
    /// Returns `TopicError` if the label is blank or the level is zero.
    pub fn custom(
        id: TopicId,
        role: Role,
        label: impl Into<String>,
        level: u32,
        parent_id: Option<TopicId>,
    ) -> Result<Self, TopicError> {
        let label = label.into();
        let label = label.trim();
        if label.is_empty() {
            return Err(TopicError::EmptyLabel);
        }
        if level == 0 {
            return Err(TopicError::InvalidLevel);
        }

        Ok(Self {
            id,
            role,
            label: label.to_string(),
            parent_id,
            children_ids: Vec::new(),
            level,
            metrics: Some(TopicMetrics::fresh()),
        })
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_topic_trims_label_and_starts_fresh() {
        let node = TopicNode::custom(
            TopicId::new("de_custom_2_abcd1234"),
            Role::DataEngineer,
            "  dbt  ",
            2,
            None,
        )
        .unwrap();

        assert_eq!(node.label, "dbt");
        assert!(node.children_ids.is_empty());
        let metrics = node.metrics.unwrap();
        assert_eq!(metrics.band.value(), 3);
        assert_eq!(metrics.trend, Trend::Flat);
        assert_eq!(metrics.attempts, 0);
    }

    #[test]
    fn custom_topic_rejects_blank_label_and_level_zero() {
        let id = TopicId::new("x");
        assert_eq!(
            TopicNode::custom(id.clone(), Role::DataAnalyst, " ", 1, None).unwrap_err(),
            TopicError::EmptyLabel
        );
        assert_eq!(
            TopicNode::custom(id, Role::DataAnalyst, "Cohorts", 0, None).unwrap_err(),
            TopicError::InvalidLevel
        );
    }
}
