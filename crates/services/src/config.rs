use std::collections::BTreeSet;
use std::env;

use practice_core::model::{Role, TopicId};
use practice_core::selection::RemovalScope;

use crate::error::ConfigError;

pub const DEFAULT_REVIEW_INJECTION_RATE: f64 = 0.05;
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

/// Which descendants removing a topic clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovalPolicy {
    /// Only descendants on currently revealed levels.
    #[default]
    Visible,
    /// The whole subtree.
    Subtree,
}

impl RemovalPolicy {
    #[must_use]
    pub fn scope(self, visible: BTreeSet<TopicId>) -> RemovalScope {
        match self {
            RemovalPolicy::Visible => RemovalScope::Visible(visible),
            RemovalPolicy::Subtree => RemovalScope::Subtree,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PracticeConfig {
    pub removal_policy: RemovalPolicy,
    pub review_injection_rate: f64,
    pub history_limit: usize,
    pub default_role: Role,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            removal_policy: RemovalPolicy::Visible,
            review_injection_rate: DEFAULT_REVIEW_INJECTION_RATE,
            history_limit: DEFAULT_HISTORY_LIMIT,
            default_role: Role::DataEngineer,
        }
    }
}

impl PracticeConfig {
    /// Defaults overridden by `PRACTICE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` with a custom variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set to an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let read = |var: &'static str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|v| (var, v))
        };

        if let Some((var, value)) = read("PRACTICE_REMOVAL_SCOPE") {
            config.removal_policy = match value.to_ascii_lowercase().as_str() {
                "visible" => RemovalPolicy::Visible,
                "subtree" => RemovalPolicy::Subtree,
                _ => return Err(invalid(var, value, "expected `visible` or `subtree`")),
            };
        }

        if let Some((var, value)) = read("PRACTICE_REVIEW_INJECTION_RATE") {
            config.review_injection_rate = match value.parse::<f64>() {
                Ok(rate) if (0.0..=1.0).contains(&rate) => rate,
                _ => return Err(invalid(var, value, "expected a number between 0 and 1")),
            };
        }

        if let Some((var, value)) = read("PRACTICE_HISTORY_LIMIT") {
            config.history_limit = match value.parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => return Err(invalid(var, value, "expected a positive integer")),
            };
        }

        if let Some((var, value)) = read("PRACTICE_DEFAULT_ROLE") {
            config.default_role = match value.parse::<Role>() {
                Ok(role) => role,
                Err(_) => return Err(invalid(var, value, "expected DE, DS or DA")),
            };
        }

        Ok(config)
    }
}

fn invalid(var: &'static str, value: String, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { var, value, reason }
}
