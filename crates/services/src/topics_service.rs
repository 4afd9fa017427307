use std::collections::BTreeMap;
use std::sync::Arc;

use practice_core::graph::TopicGraph;
use practice_core::model::{Role, SelectionMap, TopicId, TopicNode, TopicsState, TopicsStateError, custom_topic_id};
use practice_core::practice::PracticeContext;
use practice_core::selection::compute_inclusion;
use practice_core::visibility::{
    LevelView, RenderState, VisibleLevels, level_views, render_states, visible_levels,
    visible_topic_ids,
};
use serde_json::json;
use storage::repository::{PracticeContextRepository, StorageError, TopicsStateRepository};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::catalog::TopicCatalog;
use crate::config::RemovalPolicy;
use crate::error::TopicsServiceError;
use crate::telemetry::{self, TelemetrySink};

/// Everything the topic picker draws for the active role.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicsView {
    pub role: Role,
    pub inclusion: SelectionMap,
    pub render: BTreeMap<TopicId, RenderState>,
    pub visible: VisibleLevels,
    pub levels: Vec<LevelView>,
}

/// Loads, edits, and persists the topic selection.
///
/// Every mutation reads the stored snapshot, applies one pure transition, and saves
/// the result before returning it.
#[derive(Clone)]
pub struct TopicsService {
    catalog: Arc<dyn TopicCatalog>,
    topics: Arc<dyn TopicsStateRepository>,
    contexts: Arc<dyn PracticeContextRepository>,
    policy: RemovalPolicy,
    default_role: Role,
    telemetry: Arc<dyn TelemetrySink>,
}

impl TopicsService {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn TopicCatalog>,
        topics: Arc<dyn TopicsStateRepository>,
        contexts: Arc<dyn PracticeContextRepository>,
        policy: RemovalPolicy,
        default_role: Role,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            catalog,
            topics,
            contexts,
            policy,
            default_role,
            telemetry,
        }
    }

    /// Stored state, or a fresh one for the default role.
    ///
    /// A snapshot that no longer decodes is replaced by the default.
    ///
    /// # Errors
    ///
    /// Returns `TopicsServiceError::Storage` when the backend itself fails.
    pub async fn load(&self) -> Result<TopicsState, TopicsServiceError> {
        match self.topics.load_topics_state().await {
            Ok(Some(state)) => Ok(state),
            Ok(None) => Ok(TopicsState::new(self.default_role)),
            Err(StorageError::Serialization(reason)) => {
                warn!(%reason, "stored topic selection is unreadable, starting fresh");
                Ok(TopicsState::new(self.default_role))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Catalog nodes of `role` merged with the user's custom nodes.
    #[must_use]
    pub fn graph(&self, state: &TopicsState, role: Role) -> TopicGraph {
        self.catalog.graph_for(role, state.custom_topics(role))
    }

    #[must_use]
    pub fn view(&self, state: &TopicsState) -> TopicsView {
        let role = state.active_role();
        let graph = self.graph(state, role);
        let inclusion = compute_inclusion(&graph, state.explicit(role), state.include_children(role));
        let visible = visible_levels(&graph, role, state.explicit(role));
        let levels = level_views(&graph, role, &visible);
        let render = render_states(&graph, role, &inclusion);
        debug!(
            %role,
            explicit = state.explicit(role).len(),
            included = inclusion.len(),
            "topic view recomputed"
        );
        TopicsView {
            role,
            inclusion,
            render,
            visible,
            levels,
        }
    }

    /// # Errors
    ///
    /// Returns `TopicsServiceError` for an unknown topic or a storage failure.
    pub async fn select(&self, topic_id: &TopicId) -> Result<TopicsState, TopicsServiceError> {
        let state = self.load().await?;
        let graph = self.graph(&state, state.active_role());
        let next = state.select_explicit(&graph, topic_id)?;
        self.topics.save_topics_state(&next).await?;

        self.telemetry.record(
            telemetry::TOPIC_SELECTED,
            json!({ "topic_id": topic_id.as_str(), "role": next.active_role().code() }),
        );
        Ok(next)
    }

    /// Remove a topic and, per the removal policy, its descendants. Returns the new
    /// state and how many descendant entries went with it.
    ///
    /// # Errors
    ///
    /// Returns `TopicsServiceError` for an unknown topic or a storage failure.
    pub async fn remove(
        &self,
        topic_id: &TopicId,
    ) -> Result<(TopicsState, usize), TopicsServiceError> {
        let state = self.load().await?;
        let role = state.active_role();
        let graph = self.graph(&state, role);
        let levels = visible_levels(&graph, role, state.explicit(role));
        let scope = self.policy.scope(visible_topic_ids(&graph, role, &levels));

        let (next, removed) = state.remove_topic(&graph, topic_id, &scope)?;
        self.topics.save_topics_state(&next).await?;

        debug!(%topic_id, removed, "topic removed");
        self.telemetry.record(
            telemetry::TOPIC_REMOVED,
            json!({ "topic_id": topic_id.as_str(), "removed_descendant_count": removed }),
        );
        Ok((next, removed))
    }

    /// # Errors
    ///
    /// Returns `TopicsServiceError` if the topic is not explicitly selected or the
    /// state cannot be stored.
    pub async fn set_include_children(
        &self,
        topic_id: &TopicId,
        include: bool,
    ) -> Result<TopicsState, TopicsServiceError> {
        let state = self.load().await?;
        let next = state.set_include_children(state.active_role(), topic_id, include)?;
        self.topics.save_topics_state(&next).await?;

        self.telemetry.record(
            telemetry::TOPIC_INCLUDE_CHILDREN_CHANGED,
            json!({ "topic_id": topic_id.as_str(), "include_children": include }),
        );
        Ok(next)
    }

    /// # Errors
    ///
    /// Returns `TopicsServiceError::Roles` when the last selected role would be
    /// removed, or a storage error.
    pub async fn toggle_role(&self, role: Role) -> Result<TopicsState, TopicsServiceError> {
        let state = self.load().await?;
        let next = state.toggle_role(role)?;
        self.topics.save_topics_state(&next).await?;

        self.telemetry.record(
            telemetry::ROLE_TOGGLED,
            json!({
                "role": role.code(),
                "selected": next.selected_roles().contains(&role),
                "active_role": next.active_role().code(),
            }),
        );
        Ok(next)
    }

    /// # Errors
    ///
    /// Returns `TopicsServiceError::Storage` on persistence failure.
    pub async fn set_active_role(&self, role: Role) -> Result<TopicsState, TopicsServiceError> {
        let next = self.load().await?.set_active_role(role);
        self.topics.save_topics_state(&next).await?;
        debug!(%role, "active role changed");
        Ok(next)
    }

    /// Add a user topic to the active role under a freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns `TopicsServiceError` for a blank label, a bad level or parent, or a
    /// storage failure.
    pub async fn add_custom_topic(
        &self,
        level: u32,
        label: &str,
        parent_id: Option<TopicId>,
    ) -> Result<(TopicsState, TopicNode), TopicsServiceError> {
        let state = self.load().await?;
        let role = state.active_role();
        let graph = self.graph(&state, role);
        let id = custom_topic_id(role, level, Uuid::new_v4());

        let (next, node) = state.add_custom_topic(&graph, id, level, label, parent_id)?;
        self.topics.save_topics_state(&next).await?;

        self.telemetry.record(
            telemetry::TOPIC_ADDED,
            json!({
                "topic_id": node.id.as_str(),
                "role": role.code(),
                "level": level,
                "has_parent": node.parent_id.is_some(),
            }),
        );
        Ok((next, node))
    }

    /// Scope practice to every topic currently included for the active role.
    ///
    /// # Errors
    ///
    /// Returns `TopicsServiceError::Storage` on persistence failure.
    pub async fn practice_selection(&self) -> Result<PracticeContext, TopicsServiceError> {
        let state = self.load().await?;
        let role = state.active_role();
        let graph = self.graph(&state, role);
        let inclusion = compute_inclusion(&graph, state.explicit(role), state.include_children(role));

        let context = PracticeContext::from_inclusion(&graph, role, &inclusion);
        self.contexts.save_context(&context).await?;
        debug!(%role, scope = ?context.topic_scope, "practice scope saved");
        Ok(context)
    }

    /// Scope practice to a single topic of the active role.
    ///
    /// # Errors
    ///
    /// Returns `TopicsServiceError` for an unknown topic or a storage failure.
    pub async fn practice_topic(
        &self,
        topic_id: &TopicId,
    ) -> Result<PracticeContext, TopicsServiceError> {
        let state = self.load().await?;
        let graph = self.graph(&state, state.active_role());
        let context = PracticeContext::for_topic(&graph, topic_id)
            .ok_or_else(|| TopicsStateError::UnknownTopic(topic_id.clone()))?;
        self.contexts.save_context(&context).await?;
        Ok(context)
    }
}
