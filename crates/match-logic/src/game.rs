//! Match execution engine

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};
use crate::payoff::PayoffMatrix;
use crate::player::Player;
use crate::policy::Action;
use crate::random::SeededRng;

/// Result of a single round
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round: u32,
    pub action_a: Action,
    pub action_b: Action,
    pub payoff_a: f64,
    pub payoff_b: f64,
    /// Player scores after this round, including earlier matches
    pub cumulative_a: f64,
    pub cumulative_b: f64,
}

/// Result of a complete match
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub rounds: Vec<RoundResult>,
    /// Points earned in this match only
    pub total_a: f64,
    pub total_b: f64,
    pub round_count: u32,
}

/// How a configured `n_rounds` translates into rounds actually played
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundCount {
    /// `n_rounds - 1` rounds, matching the historical tournament runner
    #[default]
    Inherited,
    /// Exactly `n_rounds` rounds
    Exact,
}

impl RoundCount {
    pub fn rounds_for(self, n_rounds: u32) -> u32 {
        match self {
            RoundCount::Inherited => n_rounds.saturating_sub(1),
            RoundCount::Exact => n_rounds,
        }
    }
}

/// Repeated game between two players
///
/// Borrows both players for the duration of the match. Histories belong to
/// the game and are dropped with it.
pub struct Game<'a> {
    player_a: &'a mut Player,
    player_b: &'a mut Player,
    payoff_matrix: &'a PayoffMatrix,
    /// Moves made by A, read by B
    history_a: Vec<Action>,
    /// Moves made by B, read by A
    history_b: Vec<Action>,
    rng: SeededRng,
    rounds_played: u32,
    total_a: f64,
    total_b: f64,
}

impl<'a> Game<'a> {
    pub fn new(
        player_a: &'a mut Player,
        player_b: &'a mut Player,
        payoff_matrix: &'a PayoffMatrix,
        rng: SeededRng,
    ) -> Self {
        Self {
            player_a,
            player_b,
            payoff_matrix,
            history_a: Vec::new(),
            history_b: Vec::new(),
            rng,
            rounds_played: 0,
            total_a: 0.0,
            total_b: 0.0,
        }
    }

    /// Game over a slice that must hold exactly two players
    pub fn from_players(
        players: &'a mut [Player],
        payoff_matrix: &'a PayoffMatrix,
        rng: SeededRng,
    ) -> Result<Self> {
        match players {
            [a, b] => Ok(Self::new(a, b, payoff_matrix, rng)),
            _ => Err(ArenaError::InvalidPlayerCount { count: players.len() }),
        }
    }

    /// Play one round
    ///
    /// Both players decide before either move is revealed, so each sees only
    /// the other's earlier moves.
    pub fn play_round(&mut self) -> RoundResult {
        let round = self.rounds_played;

        // Create per-round RNG for each player (so they don't affect each other)
        let mut rng_a = self.rng.for_round(round.wrapping_mul(2));
        let mut rng_b = self.rng.for_round(round.wrapping_mul(2).wrapping_add(1));

        let action_a = self.player_a.act(&self.history_b, &mut rng_a);
        let action_b = self.player_b.act(&self.history_a, &mut rng_b);

        self.history_a.push(action_a);
        self.history_b.push(action_b);

        let (payoff_a, payoff_b) = self.payoff_matrix.get_payoffs(action_a, action_b);
        self.player_a.record_round_result(payoff_a);
        self.player_b.record_round_result(payoff_b);
        self.total_a += payoff_a;
        self.total_b += payoff_b;
        self.rounds_played += 1;

        log::debug!("Player {} plays: {}", self.player_a.id, action_a);
        log::debug!("Player {} plays: {}", self.player_b.id, action_b);
        log::debug!("This round's payoffs are: [{}, {}]", payoff_a, payoff_b);
        log::debug!(
            "The cumulative payoffs are: [{}, {}]",
            self.player_a.score,
            self.player_b.score
        );

        RoundResult {
            round,
            action_a,
            action_b,
            payoff_a,
            payoff_b,
            cumulative_a: self.player_a.score,
            cumulative_b: self.player_b.score,
        }
    }

    /// Play exactly `rounds` rounds
    pub fn play(&mut self, rounds: u32) -> MatchResult {
        let results = (0..rounds).map(|_| self.play_round()).collect();
        MatchResult {
            rounds: results,
            total_a: self.total_a,
            total_b: self.total_b,
            round_count: self.rounds_played,
        }
    }

    /// Play `rounds` rounds keeping only the running totals
    pub fn play_unrecorded(&mut self, rounds: u32) -> (f64, f64) {
        for _ in 0..rounds {
            self.play_round();
        }
        (self.total_a, self.total_b)
    }

    pub fn history_a(&self) -> &[Action] {
        &self.history_a
    }

    pub fn history_b(&self) -> &[Action] {
        &self.history_b
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }
}

/// Run a complete match between two players
///
/// # Arguments
/// * `player_a` - First player (scores are updated in place)
/// * `player_b` - Second player
/// * `payoff_matrix` - Shared payoff table
/// * `rounds` - Number of rounds actually played
/// * `seed` - Tournament randomness seed
/// * `match_index` - Index of this match in the tournament
pub fn run_match(
    player_a: &mut Player,
    player_b: &mut Player,
    payoff_matrix: &PayoffMatrix,
    rounds: u32,
    seed: u64,
    match_index: u32,
) -> MatchResult {
    let rng = SeededRng::new(seed, match_index);
    Game::new(player_a, player_b, payoff_matrix, rng).play(rounds)
}
