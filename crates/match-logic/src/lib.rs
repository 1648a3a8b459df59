//! Match Logic for the Evolution Arena
//!
//! Core game logic for iterated Prisoner's Dilemma games and the
//! evolutionary culling tournament built on them.
//! This crate is compiled to:
//! - Native (for the command-line runner)
//! - WASM (for in-browser replay)

mod config;
mod error;
mod game;
mod lookup;
mod pairing;
mod payoff;
mod player;
mod policy;
mod random;
mod registry;
mod tournament;

#[cfg(feature = "wasm")]
mod wasm;

pub use config::{DuelConfig, TournamentConfig};
pub use error::{ArenaError, Result};
pub use game::{run_match, Game, MatchResult, RoundCount, RoundResult};
pub use lookup::{LookupTable, MAX_LOOKBACK};
pub use pairing::{adjacent_pairs, pair_mut, unpaired};
pub use payoff::{PayoffMapping, PayoffMatrix, PAYOFF_KEYS};
pub use player::Player;
pub use policy::{Action, Policy};
pub use random::SeededRng;
pub use registry::{registered_policies, PolicySpec};
pub use tournament::{EvolutionTournament, StageReport, Termination, TournamentOutcome};

/// Play a configured duel between two named policies
///
/// Returns both players (with final scores) and the round-by-round result.
pub fn run_duel(config: &DuelConfig) -> Result<(Player, Player, MatchResult)> {
    config.validate()?;
    let matrix = config.payoff_matrix()?;
    let mut rng = SeededRng::new(config.seed, u32::MAX);
    let mut player_1 = Player::new(0, config.policy_player_1.build(&mut rng)?);
    let mut player_2 = Player::new(1, config.policy_player_2.build(&mut rng)?);

    let result = run_match(
        &mut player_1,
        &mut player_2,
        &matrix,
        config.rounds_per_match(),
        config.seed,
        0,
    );
    Ok((player_1, player_2, result))
}
