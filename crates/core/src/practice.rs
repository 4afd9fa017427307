use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::graph::TopicGraph;
use crate::model::{Difficulty, Question, Role, SelectionMap, TopicId};
use crate::next_up::NextUpAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyBias {
    Easier,
    #[default]
    Balanced,
    Harder,
}

impl DifficultyBias {
    /// Whether `candidate` honours the bias relative to `anchor`.
    #[must_use]
    pub fn admits(self, candidate: Difficulty, anchor: Difficulty) -> bool {
        match self {
            DifficultyBias::Easier => candidate < anchor,
            DifficultyBias::Balanced => true,
            DifficultyBias::Harder => candidate > anchor,
        }
    }
}

/// What the next question should be drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeContext {
    pub role: Role,
    /// Topic labels; a question matches when any label is on its topic path. Empty
    /// means every question of the role.
    pub topic_scope: Vec<String>,
    #[serde(default)]
    pub difficulty_bias: DifficultyBias,
    /// Difficulty the bias is measured against, usually the last question shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_difficulty: Option<Difficulty>,
}

impl Default for PracticeContext {
    fn default() -> Self {
        Self::new(Role::DataEngineer, vec!["SQL".to_string()])
    }
}

impl PracticeContext {
    #[must_use]
    pub fn new(role: Role, topic_scope: Vec<String>) -> Self {
        Self {
            role,
            topic_scope,
            difficulty_bias: DifficultyBias::Balanced,
            anchor_difficulty: None,
        }
    }

    /// "Practice this topic": scope is the single topic's label.
    #[must_use]
    pub fn for_topic(graph: &TopicGraph, topic_id: &TopicId) -> Option<Self> {
        graph
            .get(topic_id)
            .map(|node| Self::new(node.role, vec![node.label.clone()]))
    }

    /// "Practice this selection": labels of every included topic of `role`, sorted
    /// and de-duplicated.
    #[must_use]
    pub fn from_inclusion(graph: &TopicGraph, role: Role, inclusion: &SelectionMap) -> Self {
        let labels: BTreeSet<String> = inclusion
            .keys()
            .filter_map(|id| graph.get(id))
            .filter(|node| node.role == role)
            .map(|node| node.label.clone())
            .collect();
        Self::new(role, labels.into_iter().collect())
    }

    /// Context for the question that follows `current` after `action`.
    ///
    /// `Harder` and `Easier` anchor on the current difficulty; `NewRandom` and
    /// `ChangeTopic` drop any bias; `Continue` and `EndSession` keep it.
    #[must_use]
    pub fn after(&self, action: NextUpAction, current: &Question) -> Self {
        let mut next = self.clone();
        match action {
            NextUpAction::Harder => {
                next.difficulty_bias = DifficultyBias::Harder;
                next.anchor_difficulty = Some(current.difficulty);
            }
            NextUpAction::Easier => {
                next.difficulty_bias = DifficultyBias::Easier;
                next.anchor_difficulty = Some(current.difficulty);
            }
            NextUpAction::NewRandom | NextUpAction::ChangeTopic => {
                next.difficulty_bias = DifficultyBias::Balanced;
                next.anchor_difficulty = None;
            }
            NextUpAction::Continue | NextUpAction::EndSession => {}
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IncludeChildren, QuestionFormat, QuestionId, SelectionEntry, TopicNode};
    use crate::selection::compute_inclusion;

    fn node(role: Role, id: &str, label: &str, children: &[&str], level: u32) -> TopicNode {
        TopicNode {
            id: TopicId::new(id),
            role,
            label: label.to_string(),
            parent_id: None,
            children_ids: children.iter().map(|c| TopicId::new(*c)).collect(),
            level,
            metrics: None,
        }
    }

    fn graph() -> TopicGraph {
        TopicGraph::new([
            node(Role::DataEngineer, "de_sql", "SQL", &["de_sql_joins", "de_sql_windows"], 1),
            node(Role::DataEngineer, "de_sql_joins", "Joins", &[], 2),
            node(Role::DataEngineer, "de_sql_windows", "Window Functions", &[], 2),
            node(Role::DataAnalyst, "da_joins", "Joins", &[], 1),
        ])
    }

    fn question(difficulty: u8) -> Question {
        Question {
            id: QuestionId::new("q"),
            role: Role::DataEngineer,
            topic_path: vec!["SQL".into()],
            difficulty: Difficulty::new(difficulty).unwrap(),
            format: QuestionFormat::Short,
            prompt: "p".into(),
            choices: Vec::new(),
            multi_select: false,
            sequence: None,
            is_review_injection: false,
        }
    }

    #[test]
    fn default_context_targets_sql_for_data_engineers() {
        let ctx = PracticeContext::default();
        assert_eq!(ctx.role, Role::DataEngineer);
        assert_eq!(ctx.topic_scope, vec!["SQL".to_string()]);
        assert_eq!(ctx.difficulty_bias, DifficultyBias::Balanced);
    }

    #[test]
    fn selection_scope_collects_sorted_labels_for_role() {
        let g = graph();
        let explicit = SelectionMap::from([(
            TopicId::new("de_sql"),
            SelectionEntry::explicit(TopicId::new("de_sql"), true),
        )]);
        let inclusion = compute_inclusion(&g, &explicit, &IncludeChildren::new());

        let ctx = PracticeContext::from_inclusion(&g, Role::DataEngineer, &inclusion);
        assert_eq!(ctx.topic_scope, vec!["Joins", "SQL", "Window Functions"]);
    }

    #[test]
    fn single_topic_scope_uses_label() {
        let ctx = PracticeContext::for_topic(&graph(), &TopicId::new("da_joins")).unwrap();
        assert_eq!(ctx.role, Role::DataAnalyst);
        assert_eq!(ctx.topic_scope, vec!["Joins"]);
        assert!(PracticeContext::for_topic(&graph(), &TopicId::new("missing")).is_none());
    }

    #[test]
    fn harder_then_new_random_sets_and_clears_bias() {
        let current = question(3);
        let harder = PracticeContext::default().after(NextUpAction::Harder, &current);
        assert_eq!(harder.difficulty_bias, DifficultyBias::Harder);
        assert_eq!(harder.anchor_difficulty, Some(current.difficulty));

        let kept = harder.after(NextUpAction::Continue, &current);
        assert_eq!(kept, harder);

        let reset = harder.after(NextUpAction::NewRandom, &current);
        assert_eq!(reset.difficulty_bias, DifficultyBias::Balanced);
        assert!(reset.anchor_difficulty.is_none());
    }

    #[test]
    fn bias_admits_strictly_in_its_direction() {
        let three = Difficulty::new(3).unwrap();
        let four = Difficulty::new(4).unwrap();
        assert!(DifficultyBias::Harder.admits(four, three));
        assert!(!DifficultyBias::Harder.admits(three, three));
        assert!(DifficultyBias::Easier.admits(three, four));
        assert!(DifficultyBias::Balanced.admits(three, three));
    }
}
