//! Evolution Arena - command-line runner
//!
//! Loads a JSON configuration, validates it, and runs either the
//! evolutionary culling tournament or a single long duel between two named
//! policies. Per-round detail is logged at debug level (`-v`), per-stage
//! progress at info.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use match_logic::{
    registered_policies, run_duel, Action, ArenaError, DuelConfig, EvolutionTournament,
    PolicySpec, SeededRng, Termination, TournamentConfig, TournamentOutcome,
};

#[derive(Parser, Debug)]
#[command(name = "evolution-arena", version, about = "Evolutionary Prisoner's Dilemma tournaments")]
struct Cli {
    /// Raise log verbosity (-v: per-round detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the evolutionary culling tournament
    Tournament {
        #[arg(long, default_value = "./config/tournament_config.json")]
        config: PathBuf,
        /// Override the configured seed
        #[arg(long)]
        seed: Option<u64>,
        /// Print the outcome as JSON instead of a text report
        #[arg(long)]
        json: bool,
    },
    /// Play one long game between two named policies
    Duel {
        #[arg(long, default_value = "./config/duel_config.json")]
        config: PathBuf,
        /// Override the configured round count
        #[arg(long)]
        rounds: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// List the registered policies
    Policies,
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn read_config(path: &Path) -> Result<String> {
    log::debug!("reading config {}", path.display());
    fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))
}

fn run_tournament(path: &Path, seed: Option<u64>, json: bool) -> Result<()> {
    let mut config = TournamentConfig::from_json_str(&read_config(path)?)
        .with_context(|| format!("loading tournament config {}", path.display()))?;
    if let Some(seed) = seed {
        config.seed = seed;
    }
    log::info!("Tournament seed {}", config.seed);

    let outcome = EvolutionTournament::new(config)?.run()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn print_outcome(outcome: &TournamentOutcome) {
    for stage in &outcome.stages {
        println!(
            "Stage {:>3}: {:>4} players, mean {:>10.3}, {:>4} survive",
            stage.stage,
            stage.population,
            stage.average_score,
            stage.survivors.len()
        );
    }

    println!("The tournament is over!");
    let champion = match outcome.champion() {
        Ok(champion) => champion,
        Err(ArenaError::EmptyPopulation) => {
            println!("Tournament ended with no winner.");
            return;
        }
        Err(e) => {
            println!("{}", e);
            return;
        }
    };

    if outcome.termination == Termination::StageBudgetExhausted {
        println!(
            "Stage budget exhausted with {} players left; reporting the first.",
            outcome.survivors.len()
        );
    }
    println!(
        "Winner: player #{} ({}) with score {}",
        champion.id,
        champion.policy.name(),
        champion.score
    );
    if let Some(mapping) = outcome.winning_mapping() {
        println!("The winning player's strategy is:");
        for (window, action) in mapping {
            let window = if window.is_empty() { "(none)".to_string() } else { window };
            println!("  {} -> {}", window, action);
        }
    }
}

fn duel(path: &Path, rounds: Option<u32>, json: bool) -> Result<()> {
    let mut config = DuelConfig::from_json_str(&read_config(path)?)
        .with_context(|| format!("loading duel config {}", path.display()))?;
    if let Some(rounds) = rounds {
        config.n_rounds = rounds;
        config.validate()?;
    }

    let (player_1, player_2, result) = run_duel(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let defections_a = result.rounds.iter().filter(|r| r.action_a == Action::Defect).count();
    let defections_b = result.rounds.iter().filter(|r| r.action_b == Action::Defect).count();
    println!("Rounds played: {}", result.round_count);
    println!(
        "Player 1 ({}): score {}, {} defections",
        player_1.policy.name(),
        player_1.score,
        defections_a
    );
    println!(
        "Player 2 ({}): score {}, {} defections",
        player_2.policy.name(),
        player_2.score,
        defections_b
    );
    Ok(())
}

fn list_policies() -> Result<()> {
    let mut rng = SeededRng::new(0, 0);
    for name in registered_policies() {
        let spec = match name {
            "Probabilistic" => PolicySpec::new(name).with_kwarg("p_defect", 0.5),
            "LookupTable" => PolicySpec::new(name).with_kwarg("length_lookback", 3.0),
            _ => PolicySpec::new(name),
        };
        println!("{:<16} {}", name, spec.build(&mut rng)?.describe());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Command::Tournament { config, seed, json } => run_tournament(&config, seed, json),
        Command::Duel { config, rounds, json } => duel(&config, rounds, json),
        Command::Policies => list_policies(),
    }
}
