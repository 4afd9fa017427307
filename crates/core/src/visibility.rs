use std::collections::{BTreeMap, BTreeSet};

use crate::graph::TopicGraph;
use crate::model::{Role, SelectionMap, SelectionState, TopicId};

/// How a topic pill is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderState {
    Explicit,
    Implicit,
    Unselected,
}

impl From<SelectionState> for RenderState {
    fn from(state: SelectionState) -> Self {
        match state {
            SelectionState::Explicit => RenderState::Explicit,
            SelectionState::Implicit => RenderState::Implicit,
        }
    }
}

/// Hierarchy levels currently revealed for a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleLevels(BTreeSet<u32>);

impl VisibleLevels {
    #[must_use]
    pub fn contains(&self, level: u32) -> bool {
        self.0.contains(&level)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

/// Topic ids shown at one level, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelView {
    pub level: u32,
    pub topic_ids: Vec<TopicId>,
}

/// Level 1 is always visible; level N (N ≥ 2) is visible iff some node of `role` at
/// level N−1 is explicitly selected. Implicit entries never reveal a level.
#[must_use]
pub fn visible_levels(graph: &TopicGraph, role: Role, explicit: &SelectionMap) -> VisibleLevels {
    let mut levels = BTreeSet::from([1]);
    for entry in explicit.values().filter(|e| e.is_explicit()) {
        if let Some(node) = graph.get(&entry.topic_id).filter(|n| n.role == role) {
            if let Some(next) = node.level.checked_add(1) {
                levels.insert(next);
            }
        }
    }
    VisibleLevels(levels)
}

/// Render state for every node of `role`, visible or not, so a newly revealed level
/// shows its existing selection right away.
#[must_use]
pub fn render_states(
    graph: &TopicGraph,
    role: Role,
    inclusion: &SelectionMap,
) -> BTreeMap<TopicId, RenderState> {
    graph
        .nodes_for_role(role)
        .map(|node| {
            let state = inclusion
                .get(&node.id)
                .map_or(RenderState::Unselected, |e| e.state.into());
            (node.id.clone(), state)
        })
        .collect()
}

/// Levels that are both revealed and populated, ascending.
#[must_use]
pub fn level_views(graph: &TopicGraph, role: Role, levels: &VisibleLevels) -> Vec<LevelView> {
    graph
        .levels(role)
        .into_iter()
        .filter(|level| levels.contains(*level))
        .map(|level| LevelView {
            level,
            topic_ids: graph
                .nodes_at_level(role, level)
                .into_iter()
                .map(|n| n.id.clone())
                .collect(),
        })
        .collect()
}

/// Ids currently rendered; the natural scope for a visibility-scoped removal.
#[must_use]
pub fn visible_topic_ids(
    graph: &TopicGraph,
    role: Role,
    levels: &VisibleLevels,
) -> BTreeSet<TopicId> {
    graph
        .nodes_for_role(role)
        .filter(|n| levels.contains(n.level))
        .map(|n| n.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IncludeChildren, SelectionEntry, TopicNode};
    use crate::selection::compute_inclusion;

    fn node(role: Role, id: &str, parent: Option<&str>, children: &[&str], level: u32) -> TopicNode {
        TopicNode {
            id: TopicId::new(id),
            role,
            label: id.to_string(),
            parent_id: parent.map(TopicId::new),
            children_ids: children.iter().map(|c| TopicId::new(*c)).collect(),
            level,
            metrics: None,
        }
    }

    fn graph() -> TopicGraph {
        let de = Role::DataEngineer;
        TopicGraph::new([
            node(de, "de_sql", None, &["de_sql_joins", "de_sql_windows"], 1),
            node(de, "de_py", None, &["de_py_ds"], 1),
            node(de, "de_sql_joins", Some("de_sql"), &["de_sql_joins_adv"], 2),
            node(de, "de_sql_windows", Some("de_sql"), &[], 2),
            node(de, "de_py_ds", Some("de_py"), &[], 2),
            node(de, "de_sql_joins_adv", Some("de_sql_joins"), &[], 3),
            node(Role::DataAnalyst, "da_metrics", None, &[], 1),
        ])
    }

    fn select(ids: &[&str]) -> SelectionMap {
        ids.iter()
            .map(|id| (TopicId::new(*id), SelectionEntry::explicit(TopicId::new(*id), true)))
            .collect()
    }

    #[test]
    fn only_level_one_without_explicit_selection() {
        let levels = visible_levels(&graph(), Role::DataEngineer, &SelectionMap::new());
        assert!(levels.contains(1));
        assert!(!levels.contains(2));
    }

    #[test]
    fn explicit_level_one_reveals_level_two_with_implicit_children() {
        let g = graph();
        let explicit = select(&["de_sql"]);
        let levels = visible_levels(&g, Role::DataEngineer, &explicit);
        assert!(levels.contains(2));
        assert!(!levels.contains(3));

        let inclusion = compute_inclusion(&g, &explicit, &IncludeChildren::new());
        let states = render_states(&g, Role::DataEngineer, &inclusion);
        assert_eq!(states[&TopicId::new("de_sql")], RenderState::Explicit);
        assert_eq!(states[&TopicId::new("de_sql_joins")], RenderState::Implicit);
        assert_eq!(states[&TopicId::new("de_sql_windows")], RenderState::Implicit);
        assert_eq!(states[&TopicId::new("de_py_ds")], RenderState::Unselected);
        // Hidden level 3 already carries its state.
        assert_eq!(states[&TopicId::new("de_sql_joins_adv")], RenderState::Implicit);
        assert!(!states.contains_key(&TopicId::new("da_metrics")));
    }

    #[test]
    fn deepest_level_reveals_nothing_further() {
        let g = TopicGraph::new([node(Role::DataEngineer, "de_deep", None, &[], u32::MAX)]);
        let levels = visible_levels(&g, Role::DataEngineer, &select(&["de_deep"]));
        assert_eq!(levels.iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn implicit_entries_do_not_reveal_levels() {
        let g = graph();
        let mut explicit = select(&["de_sql"]);
        explicit.insert(
            TopicId::new("de_sql_joins"),
            SelectionEntry::implicit(TopicId::new("de_sql_joins")),
        );
        assert!(!visible_levels(&g, Role::DataEngineer, &explicit).contains(3));
    }

    #[test]
    fn other_roles_do_not_reveal_levels() {
        let levels = visible_levels(&graph(), Role::DataAnalyst, &select(&["de_sql"]));
        assert!(!levels.contains(2));
    }

    #[test]
    fn level_views_and_visible_ids_follow_revealed_levels() {
        let g = graph();
        let levels = visible_levels(&g, Role::DataEngineer, &select(&["de_sql_joins"]));

        let views = level_views(&g, Role::DataEngineer, &levels);
        let shown: Vec<u32> = views.iter().map(|v| v.level).collect();
        assert_eq!(shown, vec![1, 3]);

        let ids = visible_topic_ids(&g, Role::DataEngineer, &levels);
        assert!(ids.contains(&TopicId::new("de_sql_joins_adv")));
        assert!(!ids.contains(&TopicId::new("de_sql_joins")));
    }
}
