//! Configuration records
//!
//! Parsed from JSON by the caller and validated before any simulation work
//! begins.

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};
use crate::game::RoundCount;
use crate::lookup::MAX_LOOKBACK;
use crate::payoff::{PayoffMapping, PayoffMatrix};
use crate::random::SeededRng;
use crate::registry::PolicySpec;

/// Evolutionary tournament parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TournamentConfig {
    pub n_players: usize,
    pub n_rounds: u32,
    pub length_lookback: usize,
    pub payoff_mapping: PayoffMapping,
    #[serde(default)]
    pub round_count: RoundCount,
    #[serde(default)]
    pub seed: u64,
    /// Overrides the default budget of `n_players / 2` stages
    #[serde(default)]
    pub max_stages: Option<usize>,
}

impl TournamentConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ArenaError::config("tournament_config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_players < 2 {
            return Err(ArenaError::config(
                "n_players",
                format!("must be at least 2, got {}", self.n_players),
            ));
        }
        if self.n_rounds < 1 {
            return Err(ArenaError::config("n_rounds", "must be at least 1, got 0"));
        }
        if self.length_lookback > MAX_LOOKBACK {
            return Err(ArenaError::config(
                "length_lookback",
                format!("must be at most {}, got {}", MAX_LOOKBACK, self.length_lookback),
            ));
        }
        if self.max_stages == Some(0) {
            return Err(ArenaError::config("max_stages", "must be at least 1"));
        }
        PayoffMatrix::from_mapping(&self.payoff_mapping)?;
        Ok(())
    }

    pub fn payoff_matrix(&self) -> Result<PayoffMatrix> {
        PayoffMatrix::from_mapping(&self.payoff_mapping)
    }

    /// Rounds actually played per match
    pub fn rounds_per_match(&self) -> u32 {
        self.round_count.rounds_for(self.n_rounds)
    }

    pub fn stage_budget(&self) -> usize {
        self.max_stages.unwrap_or(self.n_players / 2)
    }
}

fn default_duel_rounds() -> u32 {
    10_000
}

/// A single long game between two named policies
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DuelConfig {
    pub policy_player_1: PolicySpec,
    pub policy_player_2: PolicySpec,
    #[serde(default = "default_duel_rounds")]
    pub n_rounds: u32,
    /// Defaults to the years-in-prison table
    #[serde(default)]
    pub payoff_mapping: Option<PayoffMapping>,
    #[serde(default)]
    pub round_count: RoundCount,
    #[serde(default)]
    pub seed: u64,
}

impl DuelConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ArenaError::config("duel_config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Both policies are built once with a throwaway RNG so bad keyword
    /// values surface here rather than when the duel starts.
    pub fn validate(&self) -> Result<()> {
        let mut rng = SeededRng::new(0, 0);
        self.policy_player_1.build(&mut rng)?;
        self.policy_player_2.build(&mut rng)?;
        if self.n_rounds < 1 {
            return Err(ArenaError::config("n_rounds", "must be at least 1, got 0"));
        }
        self.payoff_matrix()?;
        Ok(())
    }

    pub fn payoff_matrix(&self) -> Result<PayoffMatrix> {
        match &self.payoff_mapping {
            Some(mapping) => PayoffMatrix::from_mapping(mapping),
            None => Ok(PayoffMatrix::prison_years()),
        }
    }

    pub fn rounds_per_match(&self) -> u32 {
        self.round_count.rounds_for(self.n_rounds)
    }
}
