//! Actions and policy definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};
use crate::lookup::LookupTable;
use crate::random::SeededRng;

/// A move in the Prisoner's Dilemma
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "coop")]
    Cooperate,
    #[serde(rename = "defect")]
    Defect,
}

impl Action {
    pub const ALL: [Action; 2] = [Action::Cooperate, Action::Defect];

    /// Configuration token: `coop` or `defect`
    pub fn token(self) -> &'static str {
        match self {
            Action::Cooperate => "coop",
            Action::Defect => "defect",
        }
    }

    /// Lookup-key bit: cooperate = 1, defect = 0
    pub fn bit(self) -> u8 {
        match self {
            Action::Cooperate => 1,
            Action::Defect => 0,
        }
    }

    pub fn from_bit(bit: u8) -> Self {
        if bit == 0 {
            Action::Defect
        } else {
            Action::Cooperate
        }
    }

    pub fn flip(self) -> Self {
        match self {
            Action::Cooperate => Action::Defect,
            Action::Defect => Action::Cooperate,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Action::Cooperate => 0,
            Action::Defect => 1,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Action {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "coop" => Ok(Action::Cooperate),
            "defect" => Ok(Action::Defect),
            _ => Err(ArenaError::UnknownAction { token: s.to_string() }),
        }
    }
}

/// A strategy mapping the opponent's history to the next action
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Policy {
    /// Always cooperate, never defect.
    AlwaysCooperate,
    /// Always defect, never cooperate.
    AlwaysDefect,
    /// Defect with probability `p_defect` each round.
    Probabilistic { p_defect: f64 },
    /// Copy opponent's last move. Start with cooperate.
    TitForTat,
    /// Respond to the last `length_lookback` opponent moves via a fixed table.
    LookupTable(LookupTable),
}

impl Policy {
    /// Checked constructor for [`Policy::Probabilistic`]
    pub fn probabilistic(p_defect: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&p_defect) {
            return Err(ArenaError::config(
                "p_defect",
                format!("must lie in [0, 1], got {}", p_defect),
            ));
        }
        Ok(Policy::Probabilistic { p_defect })
    }

    /// Lookup-table policy with a freshly randomized mapping
    pub fn random_lookup(length_lookback: usize, rng: &mut SeededRng) -> Result<Self> {
        LookupTable::random(length_lookback, rng).map(Policy::LookupTable)
    }

    /// Decide the next action
    ///
    /// `opponent_history` is ordered oldest first. Only `Probabilistic`
    /// draws from `rng`.
    pub fn next_action(&self, opponent_history: &[Action], rng: &mut SeededRng) -> Action {
        match self {
            Policy::AlwaysCooperate => Action::Cooperate,
            Policy::AlwaysDefect => Action::Defect,
            Policy::Probabilistic { p_defect } => {
                if rng.next_f64() < *p_defect {
                    Action::Defect
                } else {
                    Action::Cooperate
                }
            }
            Policy::TitForTat => match opponent_history.last() {
                None | Some(Action::Cooperate) => Action::Cooperate,
                Some(Action::Defect) => Action::Defect,
            },
            Policy::LookupTable(table) => table.get_action(opponent_history),
        }
    }

    /// Registry name of this policy
    pub fn name(&self) -> &'static str {
        match self {
            Policy::AlwaysCooperate => "AlwaysCooperate",
            Policy::AlwaysDefect => "AlwaysDefect",
            Policy::Probabilistic { .. } => "Probabilistic",
            Policy::TitForTat => "TitForTat",
            Policy::LookupTable(_) => "LookupTable",
        }
    }

    pub fn lookup_table(&self) -> Option<&LookupTable> {
        match self {
            Policy::LookupTable(table) => Some(table),
            _ => None,
        }
    }

    /// Get a human-readable description of a policy
    pub fn describe(&self) -> String {
        match self {
            Policy::AlwaysCooperate => "Never defects. Always cooperates.".to_string(),
            Policy::AlwaysDefect => "Never cooperates. Always defects.".to_string(),
            Policy::Probabilistic { p_defect } => {
                format!("Defects with probability {}.", p_defect)
            }
            Policy::TitForTat => "Copies opponent's last move. Starts by cooperating.".to_string(),
            Policy::LookupTable(table) => format!(
                "Responds to the opponent's last {} moves via a {}-entry table.",
                table.length_lookback(),
                table.len()
            ),
        }
    }
}
