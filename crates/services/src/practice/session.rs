use practice_core::model::{Attempt, Question};
use practice_core::next_up::{NextUpMenu, build_options};
use practice_core::practice::PracticeContext;

/// The question on screen and the attempt bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeSession {
    pub(crate) context: PracticeContext,
    pub(crate) current: Option<(Question, Attempt)>,
    pub(crate) resumed: bool,
}

impl PracticeSession {
    pub(crate) fn new(context: PracticeContext, question: Question, attempt: Attempt) -> Self {
        Self {
            context,
            current: Some((question, attempt)),
            resumed: false,
        }
    }

    #[must_use]
    pub fn context(&self) -> &PracticeContext {
        &self.context
    }

    #[must_use]
    pub fn question(&self) -> Option<&Question> {
        self.current.as_ref().map(|(q, _)| q)
    }

    #[must_use]
    pub fn attempt(&self) -> Option<&Attempt> {
        self.current.as_ref().map(|(_, a)| a)
    }

    /// True when the session picked up a stored unfinished attempt.
    #[must_use]
    pub fn was_resumed(&self) -> bool {
        self.resumed
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.current.is_none()
    }

    /// Next-Up options, offered once the attempt was submitted or skipped.
    #[must_use]
    pub fn next_up(&self) -> Option<NextUpMenu> {
        let (question, attempt) = self.current.as_ref()?;
        attempt
            .status()
            .awaits_next_up()
            .then(|| build_options(question))
    }
}
