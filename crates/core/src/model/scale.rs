use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScaleError {
    #[error("band must be between 1 and 5, got {0}")]
    InvalidBand(u8),

    #[error("difficulty must be between 1 and 5, got {0}")]
    InvalidDifficulty(u8),
}

//
// ─── BAND ──────────────────────────────────────────────────────────────────────
//

/// Five-step mastery/quality band (1 = weakest, 5 = strongest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Band(u8);

impl Band {
    pub const MIN: Band = Band(1);
    pub const MID: Band = Band(3);
    pub const MAX: Band = Band(5);

    /// # Errors
    ///
    /// Returns `ScaleError::InvalidBand` outside `1..=5`.
    pub fn new(value: u8) -> Result<Self, ScaleError> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ScaleError::InvalidBand(value))
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Band {
    type Error = ScaleError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Band> for u8 {
    fn from(band: Band) -> Self {
        band.0
    }
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Question difficulty on a 1–5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    /// # Errors
    ///
    /// Returns `ScaleError::InvalidDifficulty` outside `1..=5`.
    pub fn new(value: u8) -> Result<Self, ScaleError> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ScaleError::InvalidDifficulty(value))
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = ScaleError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Difficulty> for u8 {
    fn from(difficulty: Difficulty) -> Self {
        difficulty.0
    }
}
