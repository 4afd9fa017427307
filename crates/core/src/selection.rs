//! Inclusion closure and scoped removal over the explicit selection layer.
//!
//! Both functions are total and pure: they read a snapshot and return a complete
//! replacement. Implicit entries are never stored; they are rebuilt from the explicit
//! layer on every call.

use std::collections::BTreeSet;

use crate::graph::TopicGraph;
use crate::model::{IncludeChildren, SelectionEntry, SelectionMap, TopicId};

/// Which descendants a removal is allowed to touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalScope {
    /// Every descendant of the removed topic.
    Subtree,
    /// Only descendants rendered on screen right now. Deeper explicit entries that are
    /// not in the set stay selected.
    Visible(BTreeSet<TopicId>),
}

impl RemovalScope {
    #[must_use]
    pub fn covers(&self, id: &TopicId) -> bool {
        match self {
            RemovalScope::Subtree => true,
            RemovalScope::Visible(ids) => ids.contains(id),
        }
    }
}

/// Explicit-layer records after a removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub explicit: SelectionMap,
    pub include_children: IncludeChildren,
    /// Descendant entries deleted, not counting the removed topic itself.
    pub removed_descendants: usize,
}

/// Whether an explicit topic pulls in its descendants.
///
/// The include-children record wins, then the entry's own flag, then `true`.
#[must_use]
pub fn includes_children(
    id: &TopicId,
    entry: &SelectionEntry,
    include_children: &IncludeChildren,
) -> bool {
    include_children
        .get(id)
        .copied()
        .or(entry.include_children)
        .unwrap_or(true)
}

/// Expand explicit entries into the full explicit + implicit map.
///
/// Non-explicit input entries are dropped. Descendants of every propagating explicit
/// topic become implicit unless they are explicit themselves; the result does not
/// depend on iteration order.
#[must_use]
pub fn compute_inclusion(
    graph: &TopicGraph,
    explicit: &SelectionMap,
    include_children: &IncludeChildren,
) -> SelectionMap {
    let mut next: SelectionMap = explicit
        .iter()
        .filter(|(_, entry)| entry.is_explicit())
        .map(|(id, entry)| (id.clone(), entry.clone()))
        .collect();

    let propagating: Vec<TopicId> = next
        .iter()
        .filter(|(id, entry)| includes_children(id, entry, include_children))
        .map(|(id, _)| id.clone())
        .collect();

    for id in propagating {
        for descendant in graph.descendants(&id) {
            next.entry(descendant.clone())
                .or_insert_with(|| SelectionEntry::implicit(descendant));
        }
    }

    next
}

/// Drop `topic_id` and the descendants `scope` covers from the explicit layer.
///
/// The topic's own entries are removed unconditionally. Inputs are left untouched.
#[must_use]
pub fn remove_topic_and_descendants(
    graph: &TopicGraph,
    explicit: &SelectionMap,
    include_children: &IncludeChildren,
    topic_id: &TopicId,
    scope: &RemovalScope,
) -> Removal {
    let mut next_explicit = explicit.clone();
    let mut next_include = include_children.clone();

    next_explicit.remove(topic_id);
    next_include.remove(topic_id);

    let mut removed_descendants = 0;
    for descendant in graph.descendants(topic_id) {
        if !scope.covers(&descendant) {
            continue;
        }
        if next_explicit.remove(&descendant).is_some() {
            removed_descendants += 1;
        }
        next_include.remove(&descendant);
    }

    Removal {
        explicit: next_explicit,
        include_children: next_include,
        removed_descendants,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, SelectionState, TopicNode};
    use proptest::prelude::*;

    fn node(id: &str, parent: Option<&str>, children: &[&str], level: u32) -> TopicNode {
        TopicNode {
            id: TopicId::new(id),
            role: Role::DataEngineer,
            label: id.to_string(),
            parent_id: parent.map(TopicId::new),
            children_ids: children.iter().map(|c| TopicId::new(*c)).collect(),
            level,
            metrics: None,
        }
    }

    /// a ─┬─ b ── d ── e
    ///    └─ c
    /// f    (second root)
    fn graph() -> TopicGraph {
        TopicGraph::new([
            node("a", None, &["b", "c"], 1),
            node("b", Some("a"), &["d"], 2),
            node("c", Some("a"), &[], 2),
            node("d", Some("b"), &["e"], 3),
            node("e", Some("d"), &[], 4),
            node("f", None, &[], 1),
        ])
    }

    fn explicit(ids: &[(&str, Option<bool>)]) -> (SelectionMap, IncludeChildren) {
        let mut sel = SelectionMap::new();
        let mut inc = IncludeChildren::new();
        for (id, flag) in ids {
            let id = TopicId::new(*id);
            sel.insert(id.clone(), SelectionEntry::explicit(id.clone(), flag.unwrap_or(true)));
            if let Some(flag) = flag {
                inc.insert(id, *flag);
            }
        }
        (sel, inc)
    }

    fn state_of(map: &SelectionMap, id: &str) -> Option<SelectionState> {
        map.get(&TopicId::new(id)).map(|e| e.state)
    }

    #[test]
    fn child_flag_false_does_not_block_ancestor_propagation() {
        let (sel, inc) = explicit(&[("a", Some(true)), ("b", Some(false))]);
        let out = compute_inclusion(&graph(), &sel, &inc);

        assert_eq!(state_of(&out, "a"), Some(SelectionState::Explicit));
        assert_eq!(state_of(&out, "b"), Some(SelectionState::Explicit));
        assert_eq!(state_of(&out, "c"), Some(SelectionState::Implicit));
        // a still reaches d and e through b's subtree.
        assert_eq!(state_of(&out, "d"), Some(SelectionState::Implicit));
    }

    #[test]
    fn include_children_false_alone_adds_nothing() {
        let (sel, inc) = explicit(&[("b", Some(false))]);
        let out = compute_inclusion(&graph(), &sel, &inc);

        assert_eq!(out.len(), 1);
        assert_eq!(state_of(&out, "d"), None);
    }

    #[test]
    fn missing_flag_defaults_to_including_children() {
        let mut sel = SelectionMap::new();
        sel.insert(
            TopicId::new("b"),
            SelectionEntry {
                topic_id: TopicId::new("b"),
                state: SelectionState::Explicit,
                include_children: None,
            },
        );
        let out = compute_inclusion(&graph(), &sel, &IncludeChildren::new());

        assert_eq!(state_of(&out, "d"), Some(SelectionState::Implicit));
        assert_eq!(state_of(&out, "e"), Some(SelectionState::Implicit));
    }

    #[test]
    fn stray_implicit_input_is_dropped() {
        let (mut sel, inc) = explicit(&[("f", None)]);
        sel.insert(TopicId::new("c"), SelectionEntry::implicit(TopicId::new("c")));
        let out = compute_inclusion(&graph(), &sel, &inc);

        assert_eq!(state_of(&out, "c"), None);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn removal_leaves_no_stale_implicit_entries() {
        let g = graph();
        let (sel, inc) = explicit(&[("a", None)]);
        let before = compute_inclusion(&g, &sel, &inc);
        assert_eq!(before.len(), 5);

        let removal =
            remove_topic_and_descendants(&g, &sel, &inc, &TopicId::new("a"), &RemovalScope::Subtree);
        let after = compute_inclusion(&g, &removal.explicit, &removal.include_children);
        assert!(after.is_empty());
    }

    #[test]
    fn visible_scope_keeps_deeper_explicit_descendants() {
        let g = graph();
        let (sel, inc) = explicit(&[("a", None), ("b", None), ("d", Some(false))]);
        let visible = RemovalScope::Visible(BTreeSet::from([TopicId::new("a"), TopicId::new("b")]));

        let removal = remove_topic_and_descendants(&g, &sel, &inc, &TopicId::new("a"), &visible);

        assert_eq!(removal.removed_descendants, 1);
        assert!(!removal.explicit.contains_key(&TopicId::new("a")));
        assert!(!removal.explicit.contains_key(&TopicId::new("b")));
        assert!(removal.explicit.contains_key(&TopicId::new("d")));
        assert_eq!(removal.include_children.get(&TopicId::new("d")), Some(&false));
        // Inputs are untouched.
        assert_eq!(sel.len(), 3);
    }

    #[test]
    fn subtree_scope_removes_every_explicit_descendant() {
        let g = graph();
        let (sel, inc) = explicit(&[("a", None), ("b", None), ("d", Some(false)), ("f", None)]);

        let removal =
            remove_topic_and_descendants(&g, &sel, &inc, &TopicId::new("a"), &RemovalScope::Subtree);

        assert_eq!(removal.removed_descendants, 2);
        assert_eq!(removal.explicit.keys().collect::<Vec<_>>(), vec![&TopicId::new("f")]);
        assert!(removal.include_children.is_empty());
    }

    #[test]
    fn removing_unselected_topic_still_clears_selected_descendants() {
        let g = graph();
        let (sel, inc) = explicit(&[("c", None)]);
        let removal =
            remove_topic_and_descendants(&g, &sel, &inc, &TopicId::new("a"), &RemovalScope::Subtree);

        assert_eq!(removal.removed_descendants, 1);
        assert!(removal.explicit.is_empty());
    }

    fn arb_selection() -> impl Strategy<Value = (SelectionMap, IncludeChildren)> {
        let ids = ["a", "b", "c", "d", "e", "f"];
        proptest::collection::vec((0..ids.len(), any::<bool>(), any::<Option<bool>>()), 0..8)
            .prop_map(move |picks| {
                let mut sel = SelectionMap::new();
                let mut inc = IncludeChildren::new();
                for (i, is_explicit, flag) in picks {
                    let id = TopicId::new(ids[i]);
                    let entry = if is_explicit {
                        SelectionEntry::explicit(id.clone(), flag.unwrap_or(true))
                    } else {
                        SelectionEntry::implicit(id.clone())
                    };
                    sel.insert(id.clone(), entry);
                    if let Some(flag) = flag {
                        inc.insert(id, flag);
                    }
                }
                (sel, inc)
            })
    }

    proptest! {
        #[test]
        fn inclusion_is_deterministic((sel, inc) in arb_selection()) {
            let g = graph();
            prop_assert_eq!(compute_inclusion(&g, &sel, &inc), compute_inclusion(&g, &sel, &inc));
        }

        #[test]
        fn explicit_input_stays_explicit((sel, inc) in arb_selection()) {
            let out = compute_inclusion(&graph(), &sel, &inc);
            for (id, entry) in &sel {
                if entry.is_explicit() {
                    prop_assert_eq!(out.get(id).map(|e| e.state), Some(SelectionState::Explicit));
                }
            }
        }

        #[test]
        fn inclusion_is_a_fixed_point((sel, inc) in arb_selection()) {
            let g = graph();
            let once = compute_inclusion(&g, &sel, &inc);
            prop_assert_eq!(compute_inclusion(&g, &once, &inc), once);
        }

        #[test]
        fn subtree_removal_never_leaves_descendants((sel, inc) in arb_selection()) {
            let g = graph();
            let root = TopicId::new("a");
            let removal = remove_topic_and_descendants(&g, &sel, &inc, &root, &RemovalScope::Subtree);
            prop_assert!(!removal.explicit.contains_key(&root));
            for d in g.descendants(&root) {
                prop_assert!(!removal.explicit.contains_key(&d));
                prop_assert!(!removal.include_children.contains_key(&d));
            }
        }
    }
}
