use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ChoiceId, Difficulty, QuestionId, Role};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {0} has an empty prompt")]
    EmptyPrompt(QuestionId),

    #[error("question {0} has an empty topic path")]
    EmptyTopicPath(QuestionId),

    #[error("multiple-choice question {0} has no choices")]
    MissingChoices(QuestionId),

    #[error("question {id} has duplicate choice id {choice}")]
    DuplicateChoice { id: QuestionId, choice: ChoiceId },

    #[error("question {id} has invalid planned step {index} of {total}")]
    InvalidStep {
        id: QuestionId,
        index: u32,
        total: u32,
    },
}

//
// ─── FORMAT / SEQUENCE ─────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionFormat {
    Short,
    Code,
    #[serde(rename = "mcq")]
    MultipleChoice,
    Review,
    Strategy,
}

impl QuestionFormat {
    #[must_use]
    pub fn is_multiple_choice(self) -> bool {
        matches!(self, QuestionFormat::MultipleChoice)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: ChoiceId,
    pub text: String,
}

/// 1-based position inside a planned sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceStep {
    pub index: u32,
    pub total: u32,
}

/// Where a question sits in a thread of related questions.
///
/// `has_continue` decides whether Next-Up offers "Continue" in slot 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sequence {
    Planned {
        step: SequenceStep,
        has_continue: bool,
    },
    Unplanned {
        follow_up_of: QuestionId,
        has_continue: bool,
    },
}

impl Sequence {
    #[must_use]
    pub fn has_continue(&self) -> bool {
        match self {
            Sequence::Planned { has_continue, .. } | Sequence::Unplanned { has_continue, .. } => {
                *has_continue
            }
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub role: Role,
    /// Topic labels from root to leaf, e.g. `["SQL", "Joins"]`.
    pub topic_path: Vec<String>,
    pub difficulty: Difficulty,
    pub format: QuestionFormat,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub multi_select: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Sequence>,
    #[serde(default)]
    pub is_review_injection: bool,
}

impl Question {
    /// Check structural rules the bank relies on.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` describing the first rule that fails.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt(self.id.clone()));
        }
        if self.topic_path.is_empty() {
            return Err(QuestionError::EmptyTopicPath(self.id.clone()));
        }
        if self.format.is_multiple_choice() && self.choices.is_empty() {
            return Err(QuestionError::MissingChoices(self.id.clone()));
        }
        for (i, choice) in self.choices.iter().enumerate() {
            if self.choices[..i].iter().any(|c| c.id == choice.id) {
                return Err(QuestionError::DuplicateChoice {
                    id: self.id.clone(),
                    choice: choice.id.clone(),
                });
            }
        }
        if let Some(Sequence::Planned { step, .. }) = &self.sequence {
            if step.index == 0 || step.index > step.total {
                return Err(QuestionError::InvalidStep {
                    id: self.id.clone(),
                    index: step.index,
                    total: step.total,
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn has_continue(&self) -> bool {
        self.sequence.as_ref().is_some_and(Sequence::has_continue)
    }

    /// True when any scope label appears in this question's topic path.
    #[must_use]
    pub fn touches_scope(&self, scope: &[String]) -> bool {
        scope.iter().any(|label| self.topic_path.contains(label))
    }

    /// True when this question directly continues `previous`: the next planned
    /// step on the same topic path, or an unplanned follow-up of it.
    #[must_use]
    pub fn continues(&self, previous: &Question) -> bool {
        match (&self.sequence, &previous.sequence) {
            (Some(Sequence::Unplanned { follow_up_of, .. }), _) => *follow_up_of == previous.id,
            (
                Some(Sequence::Planned { step: next, .. }),
                Some(Sequence::Planned { step: prev, .. }),
            ) => {
                self.topic_path == previous.topic_path
                    && next.total == prev.total
                    && prev.index.checked_add(1) == Some(next.index)
            }
            _ => false,
        }
    }

    /// Returns a copy labelled as a review injection.
    #[must_use]
    pub fn into_review_injection(mut self) -> Self {
        self.is_review_injection = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, sequence: Option<Sequence>) -> Question {
        Question {
            id: QuestionId::new(id),
            role: Role::DataEngineer,
            topic_path: vec!["SQL".into(), "Joins".into()],
            difficulty: Difficulty::new(2).unwrap(),
            format: QuestionFormat::Short,
            prompt: "Explain INNER vs LEFT JOIN.".into(),
            choices: Vec::new(),
            multi_select: false,
            sequence,
            is_review_injection: false,
        }
    }

    fn planned(index: u32, total: u32, has_continue: bool) -> Option<Sequence> {
        Some(Sequence::Planned {
            step: SequenceStep { index, total },
            has_continue,
        })
    }

    #[test]
    fn multiple_choice_requires_choices() {
        let mut q = question("q1", None);
        q.format = QuestionFormat::MultipleChoice;
        assert_eq!(
            q.validate().unwrap_err(),
            QuestionError::MissingChoices(QuestionId::new("q1"))
        );

        q.choices = vec![Choice {
            id: ChoiceId::new("a"),
            text: "Day 7 retention".into(),
        }];
        assert!(q.validate().is_ok());
    }

    #[test]
    fn planned_step_must_be_in_range() {
        let q = question("q1", planned(3, 2, false));
        assert!(matches!(
            q.validate().unwrap_err(),
            QuestionError::InvalidStep { index: 3, total: 2, .. }
        ));
    }

    #[test]
    fn next_planned_step_continues_previous() {
        let first = question("q_sql_001", planned(1, 2, true));
        let second = question("q_sql_002", planned(2, 2, false));
        assert!(second.continues(&first));
        assert!(!first.continues(&second));
    }

    #[test]
    fn last_possible_step_has_no_successor() {
        let last = question("q_last", planned(u32::MAX, u32::MAX, false));
        let wrapped = question("q_wrapped", planned(0, u32::MAX, false));
        assert!(!wrapped.continues(&last));
        assert!(!last.continues(&last));
    }

    #[test]
    fn unplanned_follow_up_continues_its_origin() {
        let origin = question("q_py_000", None);
        let follow_up = question(
            "q_py_001",
            Some(Sequence::Unplanned {
                follow_up_of: QuestionId::new("q_py_000"),
                has_continue: false,
            }),
        );
        assert!(follow_up.continues(&origin));
    }

    #[test]
    fn sequence_json_uses_kind_tag() {
        let q = question("q_sql_001", planned(1, 2, true));
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["sequence"]["kind"], "planned");
        assert_eq!(json["sequence"]["has_continue"], true);
        assert!(q.has_continue());
    }
}
