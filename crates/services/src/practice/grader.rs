use std::sync::{Mutex, PoisonError};

use practice_core::model::{
    AnswerPayload, Band, Confidence, Feedback, FeedbackDraft, FeedbackError, Question,
    RubricCategory, RubricScore,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Turns a submitted answer into feedback.
pub trait Grader: Send + Sync {
    /// # Errors
    ///
    /// Returns `FeedbackError` if the produced feedback is malformed.
    fn grade(&self, question: &Question, answer: &AnswerPayload) -> Result<Feedback, FeedbackError>;
}

/// Random placeholder grader with a fixed rubric and canned comments.
pub struct MockGrader {
    rng: Mutex<StdRng>,
}

impl Default for MockGrader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGrader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

fn random_band(rng: &mut StdRng) -> Result<Band, FeedbackError> {
    Ok(Band::new(rng.random_range(Band::MIN.value()..=Band::MAX.value()))?)
}

impl Grader for MockGrader {
    fn grade(&self, _question: &Question, _answer: &AnswerPayload) -> Result<Feedback, FeedbackError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        let overall_band = random_band(&mut rng)?;
        let jitter: u8 = rng.random_range(0..10);
        let overall_score = (overall_band.value() * 18 + jitter).min(100);

        let rubric = RubricCategory::ALL
            .into_iter()
            .map(|category| {
                Ok(RubricScore {
                    category,
                    band: random_band(&mut rng)?,
                    rationale: format!("Mock rationale for {}.", category.label()),
                })
            })
            .collect::<Result<Vec<_>, FeedbackError>>()?;

        FeedbackDraft {
            overall_score,
            overall_band,
            confidence: Confidence::from_band(overall_band),
            rubric,
            went_well: vec![
                "You stated the main idea clearly.".into(),
                "You gave at least one concrete example.".into(),
            ],
            missing: vec![
                "Call out edge cases explicitly.".into(),
                "Add a brief tradeoff / decision rule.".into(),
            ],
            exemplar_answer: "A strong answer defines terms, gives a simple example, then lists \
                              edge cases and tradeoffs."
                .into(),
        }
        .validate()
    }
}
