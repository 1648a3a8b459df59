//! Evolutionary culling tournament
//!
//! Each stage pairs neighbouring players, plays one match per pair, then
//! keeps only the players whose running score is strictly above the
//! population mean. Stages repeat until one player (or none) is left or the
//! stage budget runs out.
//!
//! Ties are never broken randomly. A player exactly at the mean is culled,
//! so a stage where every score is equal culls everyone. Survivors keep
//! their relative order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::TournamentConfig;
use crate::error::{ArenaError, Result};
use crate::game::Game;
use crate::pairing::{adjacent_pairs, pair_mut, unpaired};
use crate::payoff::PayoffMatrix;
use crate::player::Player;
use crate::policy::{Action, Policy};
use crate::random::SeededRng;

/// RNG stream reserved for population initialization; match streams count up from 0
const INIT_STREAM: u32 = u32::MAX;

/// Summary of one stage
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    /// 1-based
    pub stage: usize,
    /// Population size when the stage started
    pub population: usize,
    pub matches: usize,
    /// Id of the player who sat the stage out
    pub unpaired: Option<usize>,
    pub average_score: f64,
    pub survivors: Vec<usize>,
    /// (player id, score) of every culled player
    pub eliminated: Vec<(usize, f64)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    SingleSurvivor,
    /// Every remaining player was culled in the same stage
    Extinct,
    /// Budget used up with more than one player left
    StageBudgetExhausted,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentOutcome {
    pub stages: Vec<StageReport>,
    pub termination: Termination,
    /// Remaining players in population order
    pub survivors: Vec<Player>,
    /// Culled players, in order of elimination
    pub eliminated: Vec<Player>,
}

impl TournamentOutcome {
    /// The reported winner: the first remaining player
    pub fn champion(&self) -> Result<&Player> {
        self.survivors.first().ok_or(ArenaError::EmptyPopulation)
    }

    /// The champion's full lookup mapping, if it plays a lookup table
    pub fn winning_mapping(&self) -> Option<BTreeMap<String, Action>> {
        let champion = self.champion().ok()?;
        champion.policy.lookup_table().map(|table| table.mapping())
    }
}

pub struct EvolutionTournament {
    config: TournamentConfig,
    payoff_matrix: PayoffMatrix,
    players: Vec<Player>,
    /// Culled players, in order of elimination
    eliminated: Vec<Player>,
    stages_run: usize,
    matches_played: u32,
}

impl EvolutionTournament {
    /// Population of `n_players` fresh random lookup-table players
    pub fn new(config: TournamentConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = SeededRng::new(config.seed, INIT_STREAM);
        let mut players = Vec::with_capacity(config.n_players);
        for id in 0..config.n_players {
            let policy = Policy::random_lookup(config.length_lookback, &mut rng)?;
            players.push(Player::new(id, policy));
        }
        Self::build(config, players)
    }

    /// Tournament over a caller-supplied population
    ///
    /// `config.n_players` is replaced by the population size.
    pub fn with_players(mut config: TournamentConfig, players: Vec<Player>) -> Result<Self> {
        if players.len() < 2 {
            return Err(ArenaError::config(
                "players",
                format!("need at least 2 players, got {}", players.len()),
            ));
        }
        config.n_players = players.len();
        config.validate()?;
        Self::build(config, players)
    }

    fn build(config: TournamentConfig, players: Vec<Player>) -> Result<Self> {
        let payoff_matrix = config.payoff_matrix()?;
        log::info!(
            "Tournament with {} players, {} rounds per match, lookback {}",
            players.len(),
            config.rounds_per_match(),
            config.length_lookback
        );
        Ok(Self {
            config,
            payoff_matrix,
            players,
            eliminated: Vec::new(),
            stages_run: 0,
            matches_played: 0,
        })
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    pub fn payoff_matrix(&self) -> &PayoffMatrix {
        &self.payoff_matrix
    }

    /// Current population in order
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn eliminated(&self) -> &[Player] {
        &self.eliminated
    }

    pub fn stages_run(&self) -> usize {
        self.stages_run
    }

    /// Arithmetic mean of the current population's scores
    pub fn average_score(&self) -> Result<f64> {
        if self.players.is_empty() {
            return Err(ArenaError::EmptyPopulation);
        }
        let total: f64 = self.players.iter().map(|p| p.score).sum();
        Ok(total / self.players.len() as f64)
    }

    /// Pair, play and cull once
    pub fn run_stage(&mut self) -> Result<StageReport> {
        let population = self.players.len();
        if population == 0 {
            return Err(ArenaError::EmptyPopulation);
        }
        self.stages_run += 1;

        let rounds = self.config.rounds_per_match();
        let pairs = adjacent_pairs(population);
        for &(i, j) in &pairs {
            let (a, b) = pair_mut(&mut self.players, i, j);
            let rng = SeededRng::new(self.config.seed, self.matches_played);
            Game::new(a, b, &self.payoff_matrix, rng).play_unrecorded(rounds);
            self.matches_played += 1;
        }
        let unpaired = unpaired(population).map(|i| self.players[i].id);

        let average_score = self.average_score()?;
        log::info!("Number of players still in game: {}", population);

        let mut eliminated = Vec::new();
        if population > 1 {
            // A float mean of equal scores can round below them
            let tied = self.players.iter().all(|p| p.score == self.players[0].score);
            let (survivors, culled): (Vec<_>, Vec<_>) = std::mem::take(&mut self.players)
                .into_iter()
                .partition(|p| !tied && p.score > average_score);
            self.players = survivors;
            for mut player in culled {
                player.is_active = false;
                eliminated.push((player.id, player.score));
                self.eliminated.push(player);
            }
        }

        let report = StageReport {
            stage: self.stages_run,
            population,
            matches: pairs.len(),
            unpaired,
            average_score,
            survivors: self.players.iter().map(|p| p.id).collect(),
            eliminated,
        };
        log::info!(
            "Stage {}: average score {:.3}, {} survive, {} culled",
            report.stage,
            report.average_score,
            report.survivors.len(),
            report.eliminated.len()
        );
        Ok(report)
    }

    /// Run stages until at most one player remains or the budget is spent
    pub fn run(mut self) -> Result<TournamentOutcome> {
        let budget = self.config.stage_budget();
        let mut stages = Vec::new();

        while self.stages_run < budget && self.players.len() > 1 {
            stages.push(self.run_stage()?);
        }

        let termination = match self.players.len() {
            0 => Termination::Extinct,
            1 => Termination::SingleSurvivor,
            _ => Termination::StageBudgetExhausted,
        };

        log::info!("The tournament is over!");
        match self.players.first() {
            Some(champion) => log::info!(
                "The winning player is #{} ({}) with score {}",
                champion.id,
                champion.policy.name(),
                champion.score
            ),
            None => log::info!("{}", ArenaError::EmptyPopulation),
        }

        Ok(TournamentOutcome {
            stages,
            termination,
            survivors: self.players,
            eliminated: self.eliminated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::RoundCount;

    fn config(n_rounds: u32, matrix: PayoffMatrix) -> TournamentConfig {
        TournamentConfig {
            n_players: 0,
            n_rounds,
            length_lookback: 2,
            payoff_mapping: matrix.to_mapping(),
            round_count: RoundCount::Inherited,
            seed: 11,
            max_stages: None,
        }
    }

    fn population(policies: &[Policy]) -> Vec<Player> {
        policies
            .iter()
            .enumerate()
            .map(|(id, p)| Player::new(id, p.clone()))
            .collect()
    }

    #[test]
    fn test_all_tied_goes_extinct() {
        let players = population(&vec![Policy::AlwaysCooperate; 4]);
        let t = EvolutionTournament::with_players(config(3, PayoffMatrix::standard()), players)
            .unwrap();

        let outcome = t.run().unwrap();
        assert_eq!(outcome.termination, Termination::Extinct);
        assert_eq!(outcome.stages.len(), 1);
        assert_eq!(outcome.stages[0].average_score, 6.0);
        assert_eq!(outcome.stages[0].eliminated.len(), 4);
        assert_eq!(outcome.champion(), Err(ArenaError::EmptyPopulation));
        assert!(outcome.winning_mapping().is_none());
    }

    #[test]
    fn test_defector_survives_every_cull() {
        let mut policies = vec![Policy::AlwaysDefect];
        policies.extend(std::iter::repeat(Policy::AlwaysCooperate).take(7));
        let cfg = config(5, PayoffMatrix::prison_years());
        let t = EvolutionTournament::with_players(cfg, population(&policies)).unwrap();

        let outcome = t.run().unwrap();

        let sizes: Vec<_> = outcome.stages.iter().map(|s| s.survivors.len()).collect();
        assert_eq!(sizes, vec![7, 2, 1]);
        assert!(outcome.stages.iter().all(|s| s.survivors.contains(&0)));
        assert_eq!(outcome.termination, Termination::SingleSurvivor);
        assert_eq!(outcome.champion().unwrap().id, 0);
        assert_eq!(outcome.champion().unwrap().score, 0.0);
    }

    #[test]
    fn test_unpaired_player_counts_toward_mean() {
        let players = population(&[
            Policy::AlwaysDefect,
            Policy::AlwaysCooperate,
            Policy::AlwaysCooperate,
        ]);
        let mut cfg = config(2, PayoffMatrix::standard());
        cfg.round_count = RoundCount::Exact;
        let mut t = EvolutionTournament::with_players(cfg, players).unwrap();

        let report = t.run_stage().unwrap();
        assert_eq!(report.matches, 1);
        assert_eq!(report.unpaired, Some(2));
        assert_eq!(report.average_score, 10.0 / 3.0);
        assert_eq!(report.survivors, vec![0]);
        assert_eq!(report.eliminated, vec![(1, 0.0), (2, 0.0)]);
    }

    #[test]
    fn test_stage_budget_exhausted() {
        let players = population(&[
            Policy::AlwaysDefect,
            Policy::AlwaysCooperate,
            Policy::AlwaysDefect,
            Policy::AlwaysCooperate,
        ]);
        let mut cfg = config(1, PayoffMatrix::standard());
        cfg.round_count = RoundCount::Exact;
        cfg.max_stages = Some(1);
        let t = EvolutionTournament::with_players(cfg, players).unwrap();

        let outcome = t.run().unwrap();
        assert_eq!(outcome.termination, Termination::StageBudgetExhausted);
        let ids: Vec<_> = outcome.survivors.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 2]);
        assert_eq!(outcome.champion().unwrap().id, 0);
    }

    #[test]
    fn test_flat_matrix_culls_everyone() {
        let flat = PayoffMatrix::new((1.0, 1.0), (1.0, 1.0), (1.0, 1.0), (1.0, 1.0));
        let players = population(&vec![Policy::TitForTat; 6]);
        let t = EvolutionTournament::with_players(config(4, flat), players).unwrap();
        assert_eq!(t.config().stage_budget(), 3);

        let outcome = t.run().unwrap();
        assert_eq!(outcome.termination, Termination::Extinct);
        assert_eq!(outcome.eliminated.len(), 6);
        assert!(outcome.eliminated.iter().all(|p| !p.is_active));
    }

    #[test]
    fn test_fractional_ties_cull_everyone() {
        // Ten scores of 0.1 sum to just under 1.0
        let matrix = PayoffMatrix::new((0.1, 0.1), (0.0, 5.0), (5.0, 0.0), (1.0, 1.0));
        let mut cfg = config(2, matrix);
        cfg.max_stages = Some(1);
        let players = population(&vec![Policy::AlwaysCooperate; 10]);
        let mut t = EvolutionTournament::with_players(cfg, players).unwrap();
        assert_eq!(t.average_score().unwrap(), 0.0);

        let report = t.run_stage().unwrap();
        assert!(report.average_score < 0.1);
        assert!(report.survivors.is_empty());
        assert_eq!(report.eliminated.len(), 10);
        assert!(report.eliminated.iter().all(|&(_, score)| score == 0.1));
    }

    #[test]
    fn test_fractional_ties_end_extinct_within_budget() {
        let matrix = PayoffMatrix::new((0.1, 0.1), (0.0, 5.0), (5.0, 0.0), (1.0, 1.0));
        let mut cfg = config(2, matrix);
        cfg.max_stages = Some(1);
        let players = population(&vec![Policy::AlwaysCooperate; 10]);

        let outcome = EvolutionTournament::with_players(cfg, players)
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(outcome.termination, Termination::Extinct);
        assert_eq!(outcome.eliminated.len(), 10);
    }

    #[test]
    fn test_scores_carry_across_stages() {
        let players = population(&[
            Policy::AlwaysDefect,
            Policy::AlwaysCooperate,
            Policy::AlwaysDefect,
            Policy::AlwaysDefect,
            Policy::AlwaysCooperate,
            Policy::AlwaysCooperate,
        ]);
        let mut cfg = config(1, PayoffMatrix::standard());
        cfg.round_count = RoundCount::Exact;
        let mut t = EvolutionTournament::with_players(cfg, players).unwrap();

        // D-C: 5/0, D-D: 1/1, C-C: 3/3; mean 13/6
        let first = t.run_stage().unwrap();
        assert_eq!(first.survivors, vec![0, 4, 5]);

        // 0 (5) vs 4 (3): 10/3, 5 sits out at 3; mean 16/3
        let second = t.run_stage().unwrap();
        assert_eq!(second.unpaired, Some(5));
        assert_eq!(second.survivors, vec![0]);
        assert_eq!(t.players()[0].score, 10.0);
    }

    #[test]
    fn test_random_population_is_reproducible() {
        let mut cfg = config(10, PayoffMatrix::standard());
        cfg.n_players = 16;
        cfg.length_lookback = 3;

        let a = EvolutionTournament::new(cfg.clone()).unwrap();
        let b = EvolutionTournament::new(cfg.clone()).unwrap();
        assert_eq!(a.players(), b.players());
        let initial = a.players().to_vec();
        assert!(a
            .players()
            .iter()
            .all(|p| p.policy.lookup_table().map(|t| t.len()) == Some(8)));

        let (oa, ob) = (a.run().unwrap(), b.run().unwrap());
        assert_eq!(oa, ob);
        assert!(oa.stages.len() <= 8);

        assert_eq!(oa.survivors.len() + oa.eliminated.len(), 16);

        cfg.seed += 1;
        let c = EvolutionTournament::new(cfg).unwrap();
        assert_ne!(c.players(), initial.as_slice());
    }

    #[test]
    fn test_invalid_construction() {
        let mut cfg = config(3, PayoffMatrix::standard());
        cfg.n_players = 1;
        let err = EvolutionTournament::new(cfg.clone()).err();
        assert_eq!(err.map(|e| e.code()), Some("configuration"));

        let one = population(&[Policy::TitForTat]);
        assert!(EvolutionTournament::with_players(cfg.clone(), one).is_err());

        cfg.n_players = 4;
        cfg.n_rounds = 0;
        assert!(EvolutionTournament::new(cfg).is_err());
    }

    #[test]
    fn test_winning_mapping_reported() {
        let mut cfg = config(6, PayoffMatrix::standard());
        cfg.n_players = 2;
        cfg.length_lookback = 1;
        let outcome = EvolutionTournament::new(cfg).unwrap().run().unwrap();

        match outcome.champion() {
            Ok(champion) => {
                let mapping = outcome.winning_mapping().unwrap();
                assert_eq!(mapping.len(), 2);
                assert_eq!(
                    Some(mapping),
                    champion.policy.lookup_table().map(|t| t.mapping())
                );
            }
            Err(e) => assert_eq!(e, ArenaError::EmptyPopulation),
        }
    }
}
