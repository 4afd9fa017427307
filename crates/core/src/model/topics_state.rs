use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

use crate::graph::TopicGraph;
use crate::model::{
    IncludeChildren, Role, SelectionEntry, SelectionMap, TopicError, TopicId, TopicNode,
};
use crate::selection::{RemovalScope, remove_topic_and_descendants};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RoleSetError {
    #[error("cannot deselect {0}: at least one role must stay selected")]
    WouldBeEmpty(Role),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TopicsStateError {
    #[error("selected role set is empty")]
    EmptyRoleSet,

    #[error("active role {0} is not among the selected roles")]
    ActiveRoleNotSelected(Role),

    #[error("unknown topic: {0}")]
    UnknownTopic(TopicId),

    #[error("topic {0} is not explicitly selected")]
    NotExplicit(TopicId),

    #[error("unknown parent topic: {0}")]
    UnknownParent(TopicId),

    #[error("parent {parent} does not fit a level {level} {role} topic")]
    ParentMismatch {
        parent: TopicId,
        role: Role,
        level: u32,
    },

    #[error("topic id already in use: {0}")]
    DuplicateTopic(TopicId),

    #[error(transparent)]
    Topic(#[from] TopicError),
}

/// Per-role persisted topic data. `selection` holds explicit entries only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTopics {
    #[serde(default)]
    pub selection: SelectionMap,
    #[serde(default)]
    pub include_children: IncludeChildren,
    #[serde(default)]
    pub custom_topics: Vec<TopicNode>,
}

static EMPTY_ROLE: RoleTopics = RoleTopics {
    selection: BTreeMap::new(),
    include_children: BTreeMap::new(),
    custom_topics: Vec::new(),
};

/// Everything the topic picker persists.
///
/// The role set is never empty and always contains the active role. Every operation
/// returns a fresh value; the caller owns the state cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TopicsStateRepr")]
pub struct TopicsState {
    selected_roles: Vec<Role>,
    active_role: Role,
    #[serde(default)]
    by_role: BTreeMap<Role, RoleTopics>,
}

#[derive(Deserialize)]
struct TopicsStateRepr {
    selected_roles: Vec<Role>,
    active_role: Role,
    #[serde(default)]
    by_role: BTreeMap<Role, RoleTopics>,
}

impl TryFrom<TopicsStateRepr> for TopicsState {
    type Error = TopicsStateError;

    fn try_from(repr: TopicsStateRepr) -> Result<Self, Self::Error> {
        if repr.selected_roles.is_empty() {
            return Err(TopicsStateError::EmptyRoleSet);
        }
        if !repr.selected_roles.contains(&repr.active_role) {
            return Err(TopicsStateError::ActiveRoleNotSelected(repr.active_role));
        }

        let mut by_role = repr.by_role;
        for topics in by_role.values_mut() {
            topics.selection.retain(|_, entry| entry.is_explicit());
        }

        Ok(Self {
            selected_roles: repr.selected_roles,
            active_role: repr.active_role,
            by_role,
        })
    }
}

impl Default for TopicsState {
    fn default() -> Self {
        Self::new(Role::DataEngineer)
    }
}

/// `<role>_custom_<level>_<8 hex>`, e.g. `de_custom_2_1a2b3c4d`.
#[must_use]
pub fn custom_topic_id(role: Role, level: u32, token: Uuid) -> TopicId {
    let hex: String = token.simple().to_string().chars().take(8).collect();
    TopicId::new(format!(
        "{}_custom_{}_{}",
        role.code().to_lowercase(),
        level,
        hex
    ))
}

impl TopicsState {
    /// One role selected and active, nothing chosen yet.
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            selected_roles: vec![role],
            active_role: role,
            by_role: BTreeMap::new(),
        }
    }

    // ─── ACCESSORS ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn selected_roles(&self) -> &[Role] {
        &self.selected_roles
    }

    #[must_use]
    pub fn active_role(&self) -> Role {
        self.active_role
    }

    #[must_use]
    pub fn role_topics(&self, role: Role) -> &RoleTopics {
        self.by_role.get(&role).unwrap_or(&EMPTY_ROLE)
    }

    #[must_use]
    pub fn explicit(&self, role: Role) -> &SelectionMap {
        &self.role_topics(role).selection
    }

    #[must_use]
    pub fn include_children(&self, role: Role) -> &IncludeChildren {
        &self.role_topics(role).include_children
    }

    #[must_use]
    pub fn custom_topics(&self, role: Role) -> &[TopicNode] {
        &self.role_topics(role).custom_topics
    }

    // ─── ROLES ─────────────────────────────────────────────────────────────────

    /// Flip `role` in the selected set.
    ///
    /// When the active role is toggled off, the first remaining role becomes active.
    ///
    /// # Errors
    ///
    /// Returns `RoleSetError::WouldBeEmpty` when `role` is the only selected role.
    pub fn toggle_role(&self, role: Role) -> Result<Self, RoleSetError> {
        let mut next = self.clone();
        if let Some(pos) = next.selected_roles.iter().position(|r| *r == role) {
            if next.selected_roles.len() == 1 {
                return Err(RoleSetError::WouldBeEmpty(role));
            }
            next.selected_roles.remove(pos);
            if next.active_role == role {
                next.active_role = next.selected_roles[0];
            }
        } else {
            next.selected_roles.push(role);
        }
        Ok(next)
    }

    /// Make `role` active, selecting it first if needed.
    #[must_use]
    pub fn set_active_role(&self, role: Role) -> Self {
        let mut next = self.clone();
        if !next.selected_roles.contains(&role) {
            next.selected_roles.push(role);
        }
        next.active_role = role;
        next
    }

    // ─── SELECTION ─────────────────────────────────────────────────────────────

    /// Mark a topic explicit. Include-children defaults on and an existing record is
    /// kept.
    ///
    /// # Errors
    ///
    /// Returns `TopicsStateError::UnknownTopic` if the graph has no such node.
    pub fn select_explicit(
        &self,
        graph: &TopicGraph,
        topic_id: &TopicId,
    ) -> Result<Self, TopicsStateError> {
        let role = Self::role_of(graph, topic_id)?;
        let mut next = self.clone();
        let topics = next.by_role.entry(role).or_default();

        let include = *topics
            .include_children
            .entry(topic_id.clone())
            .or_insert(true);
        topics
            .selection
            .insert(topic_id.clone(), SelectionEntry::explicit(topic_id.clone(), include));
        Ok(next)
    }

    /// # Errors
    ///
    /// Returns `TopicsStateError::NotExplicit` unless the topic is explicitly selected.
    pub fn set_include_children(
        &self,
        role: Role,
        topic_id: &TopicId,
        include: bool,
    ) -> Result<Self, TopicsStateError> {
        let mut next = self.clone();
        let topics = next.by_role.entry(role).or_default();
        let Some(entry) = topics.selection.get_mut(topic_id) else {
            return Err(TopicsStateError::NotExplicit(topic_id.clone()));
        };
        entry.include_children = Some(include);
        topics.include_children.insert(topic_id.clone(), include);
        Ok(next)
    }

    /// Drop a topic and the descendants `scope` covers. Returns the new state and
    /// the number of descendant entries removed.
    ///
    /// # Errors
    ///
    /// Returns `TopicsStateError::UnknownTopic` if the graph has no such node.
    pub fn remove_topic(
        &self,
        graph: &TopicGraph,
        topic_id: &TopicId,
        scope: &RemovalScope,
    ) -> Result<(Self, usize), TopicsStateError> {
        let role = Self::role_of(graph, topic_id)?;
        let current = self.role_topics(role);
        let removal = remove_topic_and_descendants(
            graph,
            &current.selection,
            &current.include_children,
            topic_id,
            scope,
        );

        let mut next = self.clone();
        let topics = next.by_role.entry(role).or_default();
        topics.selection = removal.explicit;
        topics.include_children = removal.include_children;
        Ok((next, removal.removed_descendants))
    }

    // ─── CUSTOM TOPICS ─────────────────────────────────────────────────────────

    /// Append a user-added topic to the active role.
    ///
    /// A parent, when given, must be a node of the same role one level up. If the
    /// parent is itself custom, its stored children are updated too.
    ///
    /// # Errors
    ///
    /// Returns `TopicsStateError` for a blank label, a bad level, an unknown or
    /// mismatched parent, or an id that is already taken.
    pub fn add_custom_topic(
        &self,
        graph: &TopicGraph,
        id: TopicId,
        level: u32,
        label: &str,
        parent_id: Option<TopicId>,
    ) -> Result<(Self, TopicNode), TopicsStateError> {
        let role = self.active_role;
        if graph.contains(&id) {
            return Err(TopicsStateError::DuplicateTopic(id));
        }
        if let Some(parent_id) = &parent_id {
            let parent = graph
                .get(parent_id)
                .ok_or_else(|| TopicsStateError::UnknownParent(parent_id.clone()))?;
            if parent.role != role || parent.level.checked_add(1) != Some(level) {
                return Err(TopicsStateError::ParentMismatch {
                    parent: parent_id.clone(),
                    role,
                    level,
                });
            }
        }

        let node = TopicNode::custom(id, role, label, level, parent_id)?;

        let mut next = self.clone();
        let topics = next.by_role.entry(role).or_default();
        if let Some(parent_id) = &node.parent_id {
            if let Some(parent) = topics.custom_topics.iter_mut().find(|n| &n.id == parent_id) {
                parent.children_ids.push(node.id.clone());
            }
        }
        topics.custom_topics.push(node.clone());
        Ok((next, node))
    }

    fn role_of(graph: &TopicGraph, topic_id: &TopicId) -> Result<Role, TopicsStateError> {
        graph
            .get(topic_id)
            .map(|node| node.role)
            .ok_or_else(|| TopicsStateError::UnknownTopic(topic_id.clone()))
    }
}
