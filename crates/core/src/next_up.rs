use serde::Serialize;

use crate::model::Question;

/// Number of options the Next-Up card always shows.
pub const NEXT_UP_SLOTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NextUpAction {
    Continue,
    NewRandom,
    Harder,
    Easier,
    ChangeTopic,
    EndSession,
}

impl NextUpAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NextUpAction::Continue => "continue",
            NextUpAction::NewRandom => "new_random",
            NextUpAction::Harder => "harder",
            NextUpAction::Easier => "easier",
            NextUpAction::ChangeTopic => "change_topic",
            NextUpAction::EndSession => "end_session",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            NextUpAction::Continue => "Continue",
            NextUpAction::NewRandom => "New random",
            NextUpAction::Harder => "Harder",
            NextUpAction::Easier => "Easier",
            NextUpAction::ChangeTopic => "Change topic",
            NextUpAction::EndSession => "End session",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            NextUpAction::Continue => "Proceed to the next step / follow-up in this thread.",
            NextUpAction::NewRandom => "Load a fresh question from your current scope.",
            NextUpAction::Harder => "Bias toward a harder question next.",
            NextUpAction::Easier => "Bias toward an easier question next.",
            NextUpAction::ChangeTopic => "Go pick a different topic focus.",
            NextUpAction::EndSession => "Stop practice for now.",
        }
    }

    /// Only `EndSession` leaves the session without a next question.
    #[must_use]
    pub fn ends_session(self) -> bool {
        matches!(self, NextUpAction::EndSession)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NextUpOption {
    pub action: NextUpAction,
    pub title: &'static str,
    pub description: &'static str,
}

impl From<NextUpAction> for NextUpOption {
    fn from(action: NextUpAction) -> Self {
        Self {
            action,
            title: action.title(),
            description: action.description(),
        }
    }
}

/// The continuation menu. The array length makes "exactly five" a type-level fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NextUpMenu([NextUpOption; NEXT_UP_SLOTS]);

impl NextUpMenu {
    #[must_use]
    pub fn options(&self) -> &[NextUpOption; NEXT_UP_SLOTS] {
        &self.0
    }

    #[must_use]
    pub fn lead(&self) -> NextUpOption {
        self.0[0]
    }

    #[must_use]
    pub fn offers(&self, action: NextUpAction) -> bool {
        self.0.iter().any(|o| o.action == action)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NextUpOption> {
        self.0.iter()
    }
}

/// Slot 1 is `Continue` when the question's sequence allows it, `NewRandom` otherwise.
/// Slots 2–5 never change.
#[must_use]
pub fn build_options(question: &Question) -> NextUpMenu {
    let lead = if question.has_continue() {
        NextUpAction::Continue
    } else {
        NextUpAction::NewRandom
    };

    NextUpMenu([
        lead.into(),
        NextUpAction::Harder.into(),
        NextUpAction::Easier.into(),
        NextUpAction::ChangeTopic.into(),
        NextUpAction::EndSession.into(),
    ])
}
