use std::sync::Arc;

use practice_core::model::{AnswerPayload, Attempt, AttemptId, ChoiceId, Feedback, Question};
use practice_core::next_up::{NextUpAction, NextUpMenu, build_options};
use practice_core::practice::PracticeContext;
use serde_json::json;
use storage::repository::{
    AttemptRepository, HistoryRepository, PracticeContextRepository, StorageError,
};
use tracing::{debug, info, warn};

use super::grader::Grader;
use super::picker::{PickHint, QuestionPicker};
use super::session::PracticeSession;
use crate::Clock;
use crate::catalog::QuestionBank;
use crate::error::PracticeError;
use crate::telemetry::{self, TelemetrySink};

/// Result of choosing a Next-Up option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextUpOutcome {
    /// A fresh question is on screen. `topic_change_requested` is set for
    /// `change_topic` so a driver can offer topic selection.
    Loaded { topic_change_requested: bool },
    Ended,
}

/// Drives resume, answer, submit or skip, and Next-Up with persistence.
#[derive(Clone)]
pub struct PracticeLoopService {
    clock: Clock,
    history_limit: usize,
    bank: Arc<dyn QuestionBank>,
    picker: Arc<QuestionPicker>,
    grader: Arc<dyn Grader>,
    contexts: Arc<dyn PracticeContextRepository>,
    attempts: Arc<dyn AttemptRepository>,
    history: Arc<dyn HistoryRepository>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl PracticeLoopService {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clock: Clock,
        history_limit: usize,
        bank: Arc<dyn QuestionBank>,
        picker: Arc<QuestionPicker>,
        grader: Arc<dyn Grader>,
        contexts: Arc<dyn PracticeContextRepository>,
        attempts: Arc<dyn AttemptRepository>,
        history: Arc<dyn HistoryRepository>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            clock,
            history_limit,
            bank,
            picker,
            grader,
            contexts,
            attempts,
            history,
            telemetry,
        }
    }

    /// Resume the stored unfinished attempt, or start a new one from the saved
    /// practice context.
    ///
    /// A stored attempt that no longer decodes, or whose question left the bank,
    /// is discarded silently. An unreadable context falls back to the default.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::EmptyBank` when there is nothing to ask, or a storage
    /// error.
    pub async fn start_or_resume(&self) -> Result<PracticeSession, PracticeError> {
        let context = match self.contexts.load_context().await {
            Ok(context) => context.unwrap_or_default(),
            Err(StorageError::Serialization(reason)) => {
                warn!(%reason, "stored practice context is unreadable, using defaults");
                PracticeContext::default()
            }
            Err(err) => return Err(err.into()),
        };

        let stored = match self.attempts.load_unfinished().await {
            Ok(stored) => stored,
            Err(StorageError::Serialization(reason)) => {
                warn!(%reason, "discarding undecodable attempt");
                self.telemetry.record(
                    telemetry::STALE_ATTEMPT_DISCARDED,
                    json!({ "reason": reason }),
                );
                self.attempts.clear_unfinished().await?;
                None
            }
            Err(err) => return Err(err.into()),
        };

        if let Some(stored) = stored {
            match self.bank.question(stored.question_id()) {
                Some(question) if !stored.status().is_resolved() => {
                    info!(attempt_id = %stored.id(), status = %stored.status(), "resuming attempt");
                    self.telemetry.record(
                        telemetry::ATTEMPT_RESUMED,
                        json!({
                            "attempt_id": stored.id().to_string(),
                            "question_id": stored.question_id().as_str(),
                            "status": stored.status().as_str(),
                        }),
                    );
                    let mut session = PracticeSession::new(context, question.clone(), stored);
                    session.resumed = true;
                    return Ok(session);
                }
                _ => {
                    warn!(
                        attempt_id = %stored.id(),
                        question_id = %stored.question_id(),
                        "discarding stale attempt"
                    );
                    self.telemetry.record(
                        telemetry::STALE_ATTEMPT_DISCARDED,
                        json!({ "question_id": stored.question_id().as_str() }),
                    );
                    self.attempts.clear_unfinished().await?;
                }
            }
        }

        let question = self
            .picker
            .select_next(self.bank.as_ref(), &context, PickHint::default())
            .ok_or(PracticeError::EmptyBank)?;
        let attempt = self.begin(&question).await?;
        Ok(PracticeSession::new(context, question, attempt))
    }

    /// Store an in-progress answer edit.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError` if there is no active question, the attempt is past
    /// `in_progress`, or persistence fails.
    pub async fn record_answer(
        &self,
        session: &mut PracticeSession,
        text: String,
        choices: Vec<ChoiceId>,
    ) -> Result<(), PracticeError> {
        let (question, attempt) = active(session)?;
        let answer = AnswerPayload::for_format(question.format, text, choices);
        let next = attempt.record_answer(answer, self.clock.now())?;
        self.attempts.save_unfinished(&next).await?;
        replace_attempt(session, next);
        Ok(())
    }

    /// Grade and submit the answer. Empty answers are accepted.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError` for a missing question, a misuse of the attempt
    /// lifecycle, malformed feedback, or storage failures.
    pub async fn submit(
        &self,
        session: &mut PracticeSession,
        text: String,
        choices: Vec<ChoiceId>,
    ) -> Result<(Feedback, NextUpMenu), PracticeError> {
        let (question, attempt) = active(session)?;
        let answer = AnswerPayload::for_format(question.format, text, choices);
        let feedback = self.grader.grade(&question, &answer)?;
        let next = attempt.submit(answer, feedback.clone(), self.clock.now())?;

        self.attempts.save_unfinished(&next).await?;
        self.history.append_history(&next, self.history_limit).await?;

        info!(attempt_id = %next.id(), score = feedback.overall_score(), "attempt submitted");
        self.telemetry.record(
            telemetry::ATTEMPT_SUBMITTED,
            json!({
                "attempt_id": next.id().to_string(),
                "question_id": next.question_id().as_str(),
                "overall_score": feedback.overall_score(),
            }),
        );

        replace_attempt(session, next);
        Ok((feedback, build_options(&question)))
    }

    /// Skip with whatever partial answer exists.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError` for a missing question, a misuse of the attempt
    /// lifecycle, or storage failures.
    pub async fn skip(
        &self,
        session: &mut PracticeSession,
        text: String,
        choices: Vec<ChoiceId>,
    ) -> Result<NextUpMenu, PracticeError> {
        let (question, attempt) = active(session)?;
        let answer = AnswerPayload::for_format(question.format, text, choices);
        let next = attempt.skip(answer, self.clock.now())?;

        self.attempts.save_unfinished(&next).await?;
        self.history.append_history(&next, self.history_limit).await?;

        info!(attempt_id = %next.id(), "attempt skipped");
        self.telemetry.record(
            telemetry::ATTEMPT_SKIPPED,
            json!({
                "attempt_id": next.id().to_string(),
                "question_id": next.question_id().as_str(),
            }),
        );

        replace_attempt(session, next);
        Ok(build_options(&question))
    }

    /// Resolve the current attempt and act on a Next-Up option.
    ///
    /// `end_session` clears the active question. Every other option loads a new
    /// question scoped by the updated practice context.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::OptionNotOffered` for an action the menu does not
    /// show, `PracticeError::Attempt` if the attempt is not awaiting Next-Up, or a
    /// storage error.
    pub async fn choose_next(
        &self,
        session: &mut PracticeSession,
        action: NextUpAction,
    ) -> Result<NextUpOutcome, PracticeError> {
        let (question, attempt) = active(session)?;
        if !build_options(&question).offers(action) {
            return Err(PracticeError::OptionNotOffered(action));
        }

        let resolved = attempt.resolve(self.clock.now())?;
        self.attempts.clear_unfinished().await?;

        self.telemetry.record(
            telemetry::NEXT_UP_CHOSEN,
            json!({
                "action": action.as_str(),
                "attempt_id": resolved.id().to_string(),
                "question_id": question.id.as_str(),
            }),
        );

        if action.ends_session() {
            info!("practice session ended");
            session.current = None;
            return Ok(NextUpOutcome::Ended);
        }

        let context = session.context.after(action, &question);
        if context != session.context {
            self.contexts.save_context(&context).await?;
        }

        let hint = PickHint {
            previous: Some(&question),
            continuation: action == NextUpAction::Continue,
        };
        let next_question = self
            .picker
            .select_next(self.bank.as_ref(), &context, hint)
            .ok_or(PracticeError::EmptyBank)?;
        debug!(action = action.as_str(), question_id = %next_question.id, "next question picked");

        let next_attempt = self.begin(&next_question).await?;
        session.context = context;
        session.current = Some((next_question, next_attempt));
        session.resumed = false;

        Ok(NextUpOutcome::Loaded {
            topic_change_requested: action == NextUpAction::ChangeTopic,
        })
    }

    /// Persist a new context, e.g. after picking topics.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::Storage` on persistence failure.
    pub async fn save_context(&self, context: &PracticeContext) -> Result<(), PracticeError> {
        self.contexts.save_context(context).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `PracticeError::Storage` on read failure.
    pub async fn load_context(&self) -> Result<PracticeContext, PracticeError> {
        Ok(self.contexts.load_context().await?.unwrap_or_default())
    }

    async fn begin(&self, question: &Question) -> Result<Attempt, PracticeError> {
        let attempt = Attempt::start(AttemptId::generate(), question.id.clone(), self.clock.now());
        self.attempts.save_unfinished(&attempt).await?;

        info!(attempt_id = %attempt.id(), question_id = %question.id, "attempt started");
        self.telemetry.record(
            telemetry::ATTEMPT_STARTED,
            json!({
                "attempt_id": attempt.id().to_string(),
                "question_id": question.id.as_str(),
                "is_review_injection": question.is_review_injection,
            }),
        );
        Ok(attempt)
    }
}

fn active(session: &PracticeSession) -> Result<(Question, Attempt), PracticeError> {
    session
        .current
        .clone()
        .ok_or(PracticeError::NoActiveQuestion)
}

fn replace_attempt(session: &mut PracticeSession, attempt: Attempt) {
    if let Some((_, current)) = session.current.as_mut() {
        *current = attempt;
    }
}
