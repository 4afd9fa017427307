use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Band, ScaleError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FeedbackError {
    #[error("overall score must be between 0 and 100, got {0}")]
    InvalidScore(u8),

    #[error("rubric must list every category once, in order")]
    RubricMismatch,

    #[error(transparent)]
    Band(#[from] ScaleError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RubricCategory {
    Correctness,
    Completeness,
    Clarity,
    #[serde(rename = "Risk & Edge Cases")]
    RiskAndEdgeCases,
    Structure,
}

impl RubricCategory {
    pub const ALL: [RubricCategory; 5] = [
        RubricCategory::Correctness,
        RubricCategory::Completeness,
        RubricCategory::Clarity,
        RubricCategory::RiskAndEdgeCases,
        RubricCategory::Structure,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            RubricCategory::Correctness => "Correctness",
            RubricCategory::Completeness => "Completeness",
            RubricCategory::Clarity => "Clarity",
            RubricCategory::RiskAndEdgeCases => "Risk & Edge Cases",
            RubricCategory::Structure => "Structure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// High for bands 4–5, Medium for 3, Low otherwise.
    #[must_use]
    pub fn from_band(band: Band) -> Self {
        match band.value() {
            4.. => Confidence::High,
            3 => Confidence::Medium,
            _ => Confidence::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricScore {
    pub category: RubricCategory,
    pub band: Band,
    pub rationale: String,
}

/// Unvalidated feedback as produced by a grader or read from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackDraft {
    pub overall_score: u8,
    pub overall_band: Band,
    pub confidence: Confidence,
    pub rubric: Vec<RubricScore>,
    pub went_well: Vec<String>,
    pub missing: Vec<String>,
    pub exemplar_answer: String,
}

impl FeedbackDraft {
    /// # Errors
    ///
    /// Returns `FeedbackError` if the score is out of range or the rubric does not
    /// cover [`RubricCategory::ALL`] in order.
    pub fn validate(self) -> Result<Feedback, FeedbackError> {
        if self.overall_score > 100 {
            return Err(FeedbackError::InvalidScore(self.overall_score));
        }
        let categories = self.rubric.iter().map(|row| row.category);
        if !categories.eq(RubricCategory::ALL) {
            return Err(FeedbackError::RubricMismatch);
        }
        Ok(Feedback(self))
    }
}

/// Grading result attached to a submitted attempt. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FeedbackDraft", into = "FeedbackDraft")]
pub struct Feedback(FeedbackDraft);

impl Feedback {
    #[must_use]
    pub fn overall_score(&self) -> u8 {
        self.0.overall_score
    }

    #[must_use]
    pub fn overall_band(&self) -> Band {
        self.0.overall_band
    }

    #[must_use]
    pub fn confidence(&self) -> Confidence {
        self.0.confidence
    }

    #[must_use]
    pub fn rubric(&self) -> &[RubricScore] {
        &self.0.rubric
    }

    #[must_use]
    pub fn went_well(&self) -> &[String] {
        &self.0.went_well
    }

    #[must_use]
    pub fn missing(&self) -> &[String] {
        &self.0.missing
    }

    #[must_use]
    pub fn exemplar_answer(&self) -> &str {
        &self.0.exemplar_answer
    }
}

impl TryFrom<FeedbackDraft> for Feedback {
    type Error = FeedbackError;

    fn try_from(draft: FeedbackDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl From<Feedback> for FeedbackDraft {
    fn from(feedback: Feedback) -> Self {
        feedback.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> FeedbackDraft {
        FeedbackDraft {
            overall_score: 62,
            overall_band: Band::MID,
            confidence: Confidence::Medium,
            rubric: RubricCategory::ALL
                .into_iter()
                .map(|category| RubricScore {
                    category,
                    band: Band::MID,
                    rationale: format!("ok on {}", category.label()),
                })
                .collect(),
            went_well: vec!["clear".into()],
            missing: vec!["edge cases".into()],
            exemplar_answer: "define, example, tradeoffs".into(),
        }
    }

    #[test]
    fn confidence_follows_band() {
        assert_eq!(Confidence::from_band(Band::MAX), Confidence::High);
        assert_eq!(Confidence::from_band(Band::new(4).unwrap()), Confidence::High);
        assert_eq!(Confidence::from_band(Band::MID), Confidence::Medium);
        assert_eq!(Confidence::from_band(Band::MIN), Confidence::Low);
    }

    #[test]
    fn rejects_score_above_hundred() {
        let mut d = draft();
        d.overall_score = 101;
        assert_eq!(d.validate().unwrap_err(), FeedbackError::InvalidScore(101));
    }

    #[test]
    fn rejects_incomplete_rubric() {
        let mut d = draft();
        d.rubric.pop();
        assert_eq!(d.validate().unwrap_err(), FeedbackError::RubricMismatch);
    }

    #[test]
    fn serialized_feedback_is_revalidated_on_read() {
        let feedback = draft().validate().unwrap();
        let mut json = serde_json::to_value(&feedback).unwrap();
        assert_eq!(json["rubric"][3]["category"], "Risk & Edge Cases");

        json["overall_score"] = serde_json::json!(150);
        assert!(serde_json::from_value::<Feedback>(json).is_err());
    }
}
