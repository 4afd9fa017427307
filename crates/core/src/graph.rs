use std::collections::{BTreeSet, HashMap, HashSet};

use crate::model::{Role, TopicId, TopicNode};

/// Read-only topic hierarchy for one query.
///
/// Nodes keep the order they were supplied in so level listings render the way the
/// catalog lists them.
#[derive(Debug, Clone, Default)]
pub struct TopicGraph {
    nodes: Vec<TopicNode>,
    index: HashMap<TopicId, usize>,
}

impl TopicGraph {
    /// Build a graph from nodes. A later node with a repeated id replaces the earlier one.
    #[must_use]
    pub fn new(nodes: impl IntoIterator<Item = TopicNode>) -> Self {
        let mut graph = Self::default();
        for node in nodes {
            graph.insert(node);
        }
        graph
    }

    /// Merge catalog nodes with user-added nodes.
    ///
    /// A custom node whose parent exists is linked into that parent's children so that
    /// selection propagates to it.
    #[must_use]
    pub fn assemble(
        base: impl IntoIterator<Item = TopicNode>,
        custom: impl IntoIterator<Item = TopicNode>,
    ) -> Self {
        let mut graph = Self::new(base);
        for node in custom {
            let child_id = node.id.clone();
            let parent_id = node.parent_id.clone();
            graph.insert(node);
            if let Some(parent) = parent_id.and_then(|id| graph.get_mut(&id)) {
                if !parent.children_ids.contains(&child_id) {
                    parent.children_ids.push(child_id);
                }
            }
        }
        graph
    }

    fn insert(&mut self, node: TopicNode) {
        match self.index.get(&node.id) {
            Some(&pos) => self.nodes[pos] = node,
            None => {
                self.index.insert(node.id.clone(), self.nodes.len());
                self.nodes.push(node);
            }
        }
    }

    fn get_mut(&mut self, id: &TopicId) -> Option<&mut TopicNode> {
        let pos = *self.index.get(id)?;
        self.nodes.get_mut(pos)
    }

    #[must_use]
    pub fn get(&self, id: &TopicId) -> Option<&TopicNode> {
        self.index.get(id).and_then(|&pos| self.nodes.get(pos))
    }

    #[must_use]
    pub fn contains(&self, id: &TopicId) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All descendants of `root`, excluding `root` itself.
    ///
    /// Unknown child ids are skipped and each node is visited once, so malformed
    /// custom data cannot loop forever.
    #[must_use]
    pub fn descendants(&self, root: &TopicId) -> Vec<TopicId> {
        let mut out = Vec::new();
        let mut seen: HashSet<&TopicId> = HashSet::from([root]);
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            for child in &node.children_ids {
                if seen.insert(child) {
                    out.push(child.clone());
                    stack.push(child);
                }
            }
        }
        out
    }

    pub fn nodes_for_role(&self, role: Role) -> impl Iterator<Item = &TopicNode> {
        self.nodes.iter().filter(move |n| n.role == role)
    }

    #[must_use]
    pub fn nodes_at_level(&self, role: Role, level: u32) -> Vec<&TopicNode> {
        self.nodes_for_role(role)
            .filter(|n| n.level == level)
            .collect()
    }

    /// Distinct levels that hold at least one node of `role`.
    #[must_use]
    pub fn levels(&self, role: Role) -> BTreeSet<u32> {
        self.nodes_for_role(role).map(|n| n.level).collect()
    }
}
