//! Players: a policy plus an accumulated score

use serde::{Deserialize, Serialize};

use crate::policy::{Action, Policy};
use crate::random::SeededRng;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Position in the initial population; stable across culls
    pub id: usize,
    pub policy: Policy,
    pub score: f64,
    /// Cleared when the player is culled
    pub is_active: bool,
}

impl Player {
    pub fn new(id: usize, policy: Policy) -> Self {
        Self {
            id,
            policy,
            score: 0.0,
            is_active: true,
        }
    }

    /// Get action from policy
    pub fn act(&self, opponent_history: &[Action], rng: &mut SeededRng) -> Action {
        self.policy.next_action(opponent_history, rng)
    }

    /// Add one round's payoff. No cap; scores may go negative.
    pub fn record_round_result(&mut self, payoff: f64) {
        self.score += payoff;
    }

    pub fn reset_score(&mut self) {
        self.score = 0.0;
    }
}
