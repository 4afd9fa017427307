use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::TopicId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionState {
    /// Chosen directly by the user.
    Explicit,
    /// Included only through an explicit ancestor.
    Implicit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEntry {
    pub topic_id: TopicId,
    pub state: SelectionState,
    /// Only meaningful on explicit entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_children: Option<bool>,
}

impl SelectionEntry {
    #[must_use]
    pub fn explicit(topic_id: TopicId, include_children: bool) -> Self {
        Self {
            topic_id,
            state: SelectionState::Explicit,
            include_children: Some(include_children),
        }
    }

    #[must_use]
    pub fn implicit(topic_id: TopicId) -> Self {
        Self {
            topic_id,
            state: SelectionState::Implicit,
            include_children: None,
        }
    }

    #[must_use]
    pub fn is_explicit(&self) -> bool {
        self.state == SelectionState::Explicit
    }
}

/// Topic id → selection entry. A missing key means "unselected".
pub type SelectionMap = BTreeMap<TopicId, SelectionEntry>;

/// Explicit topic id → whether its descendants are pulled in (default `true`).
pub type IncludeChildren = BTreeMap<TopicId, bool>;
