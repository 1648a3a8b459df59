//! WASM bindings for in-browser replay

#![cfg(feature = "wasm")]

use wasm_bindgen::prelude::*;

use crate::{
    adjacent_pairs, registered_policies, run_duel, DuelConfig, EvolutionTournament, PolicySpec,
    SeededRng, TournamentConfig,
};

fn serialize<T: serde::Serialize>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Replay a duel with full round-by-round details
///
/// # Arguments
/// * `config_json` - JSON serialized DuelConfig
///
/// # Returns
/// `{player_1, player_2, result}` with final scores and every round
#[wasm_bindgen]
pub fn replay_duel(config_json: &str) -> Result<JsValue, JsError> {
    let config = DuelConfig::from_json_str(config_json)
        .map_err(|e| JsError::new(&format!("Invalid duel config: {}", e)))?;
    let (player_1, player_2, result) =
        run_duel(&config).map_err(|e| JsError::new(&e.to_string()))?;

    serialize(&DuelReplay { player_1, player_2, result })
}

#[derive(serde::Serialize)]
struct DuelReplay {
    player_1: crate::Player,
    player_2: crate::Player,
    result: crate::MatchResult,
}

/// Run a full evolution tournament
///
/// # Arguments
/// * `config_json` - JSON serialized TournamentConfig
///
/// # Returns
/// Serialized TournamentOutcome. An extinct population is a normal outcome
/// (`termination: "Extinct"`, no survivors), not an error.
#[wasm_bindgen]
pub fn run_evolution(config_json: &str) -> Result<JsValue, JsError> {
    let config = TournamentConfig::from_json_str(config_json)
        .map_err(|e| JsError::new(&format!("Invalid tournament config: {}", e)))?;
    let outcome = EvolutionTournament::new(config)
        .and_then(EvolutionTournament::run)
        .map_err(|e| JsError::new(&e.to_string()))?;

    serialize(&outcome)
}

/// Get human-readable description of a policy spec
#[wasm_bindgen]
pub fn get_policy_description(spec_json: &str) -> Result<String, JsError> {
    let spec: PolicySpec = serde_json::from_str(spec_json)
        .map_err(|e| JsError::new(&format!("Invalid policy: {}", e)))?;
    let policy = spec
        .build(&mut SeededRng::new(0, 0))
        .map_err(|e| JsError::new(&e.to_string()))?;

    Ok(policy.describe())
}

/// Get all registered policy names
#[wasm_bindgen]
pub fn get_policy_types() -> Result<JsValue, JsError> {
    serialize(&registered_policies())
}

/// Get the stage pairings for a population of the given size
#[wasm_bindgen]
pub fn get_stage_pairings(population: usize) -> Result<JsValue, JsError> {
    serialize(&adjacent_pairs(population))
}
