//! Error kinds raised by the arena

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArenaError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArenaError {
    /// Invalid tournament, duel or policy parameters. Raised before any
    /// simulation work begins.
    #[error("invalid configuration field `{field}`: {detail}")]
    Configuration { field: String, detail: String },

    #[error("unknown policy `{name}`")]
    UnknownPolicy { name: String },

    #[error("unknown action token `{token}` (expected `coop` or `defect`)")]
    UnknownAction { token: String },

    /// Joint action absent from the payoff table
    #[error("no payoffs defined for action pair `{key}`")]
    UnknownActionPair { key: String },

    #[error("a game needs exactly two players, got {count}")]
    InvalidPlayerCount { count: usize },

    /// Every player was culled in the same stage
    #[error("tournament ended with no winner")]
    EmptyPopulation,
}

impl ArenaError {
    pub(crate) fn config(field: &str, detail: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.to_string(),
            detail: detail.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::UnknownPolicy { .. } => "unknown_policy",
            Self::UnknownAction { .. } => "unknown_action",
            Self::UnknownActionPair { .. } => "lookup",
            Self::InvalidPlayerCount { .. } => "player_count",
            Self::EmptyPopulation => "empty_population",
        }
    }

    /// Only an extinct population is a reportable outcome rather than a failure
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::EmptyPopulation)
    }
}
