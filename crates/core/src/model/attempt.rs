use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::{AttemptId, ChoiceId, Feedback, QuestionFormat, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Raised only when a caller drives the state machine out of order.
/// Answer content is never a reason to reject.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("cannot move attempt from {from} to {to}")]
    InvalidTransition {
        from: AttemptStatus,
        to: AttemptStatus,
    },

    #[error("answer can only change while the attempt is in progress (status: {0})")]
    AnswerLocked(AttemptStatus),
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// `InProgress → {SubmittedUnresolved | SkippedUnresolved} → Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    SubmittedUnresolved,
    SkippedUnresolved,
    Resolved,
}

impl AttemptStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::SubmittedUnresolved => "submitted_unresolved",
            AttemptStatus::SkippedUnresolved => "skipped_unresolved",
            AttemptStatus::Resolved => "resolved",
        }
    }

    /// Submitted or skipped, waiting for a Next-Up choice.
    #[must_use]
    pub fn awaits_next_up(self) -> bool {
        matches!(
            self,
            AttemptStatus::SubmittedUnresolved | AttemptStatus::SkippedUnresolved
        )
    }

    #[must_use]
    pub fn is_resolved(self) -> bool {
        matches!(self, AttemptStatus::Resolved)
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── ANSWER ────────────────────────────────────────────────────────────────────
//

/// What the user entered: free text, or selected choices for multiple-choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerPayload {
    Text(String),
    Choices(Vec<ChoiceId>),
}

impl AnswerPayload {
    /// Pick the field that is meaningful for `format`, discarding the other.
    #[must_use]
    pub fn for_format(format: QuestionFormat, text: String, choices: Vec<ChoiceId>) -> Self {
        if format.is_multiple_choice() {
            AnswerPayload::Choices(choices)
        } else {
            AnswerPayload::Text(text)
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerPayload::Text(text) => text.trim().is_empty(),
            AnswerPayload::Choices(choices) => choices.is_empty(),
        }
    }
}

//
// ─── ATTEMPT ───────────────────────────────────────────────────────────────────
//

/// One pass at one question.
///
/// Transitions consume the attempt and return the next value so callers always
/// replace their stored copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    id: AttemptId,
    question_id: QuestionId,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    status: AttemptStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    answer_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selected_choice_ids: Option<Vec<ChoiceId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feedback: Option<Feedback>,
}

impl Attempt {
    /// Start a fresh attempt in `InProgress`.
    #[must_use]
    pub fn start(id: AttemptId, question_id: QuestionId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            question_id,
            started_at: now,
            updated_at: now,
            status: AttemptStatus::InProgress,
            answer_text: None,
            selected_choice_ids: None,
            feedback: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    #[must_use]
    pub fn answer_text(&self) -> Option<&str> {
        self.answer_text.as_deref()
    }

    #[must_use]
    pub fn selected_choice_ids(&self) -> Option<&[ChoiceId]> {
        self.selected_choice_ids.as_deref()
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Replace the in-progress answer (a field edit).
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::AnswerLocked` once the attempt left `InProgress`.
    pub fn record_answer(
        mut self,
        answer: AnswerPayload,
        now: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        if self.status != AttemptStatus::InProgress {
            return Err(AttemptError::AnswerLocked(self.status));
        }
        self.bind(answer, now);
        Ok(self)
    }

    /// Bind the final answer and attach feedback. Empty answers are accepted.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::InvalidTransition` unless the attempt is `InProgress`.
    pub fn submit(
        self,
        answer: AnswerPayload,
        feedback: Feedback,
        now: DateTime<Utc>,
    ) -> Result<Self, AttemptError> {
        let mut next = self.transition(AttemptStatus::SubmittedUnresolved, now)?;
        next.bind(answer, now);
        next.feedback = Some(feedback);
        Ok(next)
    }

    /// Keep whatever partial answer exists and move on without feedback.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::InvalidTransition` unless the attempt is `InProgress`.
    pub fn skip(self, answer: AnswerPayload, now: DateTime<Utc>) -> Result<Self, AttemptError> {
        let mut next = self.transition(AttemptStatus::SkippedUnresolved, now)?;
        next.bind(answer, now);
        Ok(next)
    }

    /// Close the attempt after a Next-Up choice.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::InvalidTransition` unless the attempt awaits Next-Up.
    pub fn resolve(self, now: DateTime<Utc>) -> Result<Self, AttemptError> {
        self.transition(AttemptStatus::Resolved, now)
    }

    fn transition(mut self, to: AttemptStatus, now: DateTime<Utc>) -> Result<Self, AttemptError> {
        let allowed = match to {
            AttemptStatus::SubmittedUnresolved | AttemptStatus::SkippedUnresolved => {
                self.status == AttemptStatus::InProgress
            }
            AttemptStatus::Resolved => self.status.awaits_next_up(),
            AttemptStatus::InProgress => false,
        };
        if !allowed {
            return Err(AttemptError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = now;
        Ok(self)
    }

    fn bind(&mut self, answer: AnswerPayload, now: DateTime<Utc>) {
        match answer {
            AnswerPayload::Text(text) => {
                self.answer_text = Some(text);
                self.selected_choice_ids = None;
            }
            AnswerPayload::Choices(choices) => {
                self.answer_text = None;
                self.selected_choice_ids = Some(choices);
            }
        }
        self.updated_at = now;
    }
}
