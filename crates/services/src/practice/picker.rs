use std::sync::{Mutex, PoisonError};

use practice_core::model::Question;
use practice_core::practice::{DifficultyBias, PracticeContext};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::catalog::QuestionBank;

/// Draws the next question for a practice context.
pub struct QuestionPicker {
    injection_rate: f64,
    rng: Mutex<StdRng>,
}

/// What the last question was and how the next one relates to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PickHint<'a> {
    pub previous: Option<&'a Question>,
    /// Prefer a question that continues `previous`.
    pub continuation: bool,
}

impl QuestionPicker {
    #[must_use]
    pub fn new(injection_rate: f64) -> Self {
        Self::with_rng(injection_rate, StdRng::from_os_rng())
    }

    /// Deterministic picker for tests and replays.
    #[must_use]
    pub fn seeded(injection_rate: f64, seed: u64) -> Self {
        Self::with_rng(injection_rate, StdRng::seed_from_u64(seed))
    }

    fn with_rng(injection_rate: f64, rng: StdRng) -> Self {
        Self {
            injection_rate: injection_rate.clamp(0.0, 1.0),
            rng: Mutex::new(rng),
        }
    }

    /// Pick a question, or `None` when the bank is empty.
    ///
    /// Order of preference: a continuation of the previous question when asked for;
    /// then the role and scope pool narrowed by the difficulty bias; then the scope
    /// pool alone; then the whole bank. The previous question is avoided while
    /// another candidate exists. Random picks may be labelled as review injections.
    pub fn select_next(
        &self,
        bank: &dyn QuestionBank,
        context: &PracticeContext,
        hint: PickHint<'_>,
    ) -> Option<Question> {
        let all = bank.questions();
        if all.is_empty() {
            return None;
        }

        if let (true, Some(previous)) = (hint.continuation, hint.previous) {
            if let Some(next) = all.iter().find(|q| q.continues(previous)) {
                return Some(next.clone());
            }
        }

        let scoped: Vec<&Question> = all
            .iter()
            .filter(|q| q.role == context.role)
            .filter(|q| context.topic_scope.is_empty() || q.touches_scope(&context.topic_scope))
            .collect();
        let mut pool = if scoped.is_empty() {
            all.iter().collect()
        } else {
            scoped
        };

        if let (bias, Some(anchor)) = (context.difficulty_bias, context.anchor_difficulty) {
            if bias != DifficultyBias::Balanced {
                let biased: Vec<&Question> = pool
                    .iter()
                    .copied()
                    .filter(|q| bias.admits(q.difficulty, anchor))
                    .collect();
                if !biased.is_empty() {
                    pool = biased;
                }
            }
        }

        if let Some(previous) = hint.previous {
            if pool.len() > 1 {
                pool.retain(|q| q.id != previous.id);
            }
        }

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let picked = (*pool.choose(&mut *rng)?).clone();
        if rng.random_bool(self.injection_rate) {
            Some(picked.into_review_injection())
        } else {
            Some(picked)
        }
    }
}
