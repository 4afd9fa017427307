use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Professional role a topic tree belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "DE")]
    DataEngineer,
    #[serde(rename = "DS")]
    DataScientist,
    #[serde(rename = "DA")]
    DataAnalyst,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::DataEngineer, Role::DataScientist, Role::DataAnalyst];

    /// Short code used in ids and persisted state (`DE`, `DS`, `DA`).
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Role::DataEngineer => "DE",
            Role::DataScientist => "DS",
            Role::DataAnalyst => "DA",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Role::DataEngineer => "Data Engineer",
            Role::DataScientist => "Data Scientist",
            Role::DataAnalyst => "Data Analyst",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Role::ALL
            .into_iter()
            .find(|role| role.code().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseRoleError(trimmed.to_string()))
    }
}
