//! Payoff matrix for the Prisoner's Dilemma

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};
use crate::policy::Action;

/// String-keyed payoff table as it appears in configuration files:
/// `"coop_defect" -> [payoff_a, payoff_b]`
pub type PayoffMapping = BTreeMap<String, Vec<f64>>;

/// Keys a payoff mapping must define, in table order
pub const PAYOFF_KEYS: [&str; 4] = ["coop_coop", "coop_defect", "defect_coop", "defect_defect"];

/// Immutable payoffs for each joint action, indexed `[action_a][action_b]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayoffMatrix {
    table: [[(f64, f64); 2]; 2],
}

impl PayoffMatrix {
    /// Build from explicit payoffs for (coop,coop), (coop,defect),
    /// (defect,coop) and (defect,defect)
    pub fn new(cc: (f64, f64), cd: (f64, f64), dc: (f64, f64), dd: (f64, f64)) -> Self {
        Self {
            table: [[cc, cd], [dc, dd]],
        }
    }

    /// Classic 3/0/5/1 table
    pub fn standard() -> Self {
        Self::new((3.0, 3.0), (0.0, 5.0), (5.0, 0.0), (1.0, 1.0))
    }

    /// Years-in-prison table (all payoffs negative)
    pub fn prison_years() -> Self {
        Self::new((-1.0, -1.0), (-3.0, 0.0), (0.0, -3.0), (-2.0, -2.0))
    }

    /// Validate a configured mapping and freeze it into a matrix
    ///
    /// All four keys must be present, nothing else may be, and every entry
    /// must hold exactly two finite numbers.
    pub fn from_mapping(mapping: &PayoffMapping) -> Result<Self> {
        if let Some(unknown) = mapping.keys().find(|k| !PAYOFF_KEYS.contains(&k.as_str())) {
            return Err(ArenaError::config(
                "payoff_mapping",
                format!("unexpected key `{}`", unknown),
            ));
        }

        let mut pairs = [(0.0, 0.0); 4];
        for (slot, key) in pairs.iter_mut().zip(PAYOFF_KEYS) {
            let values = mapping.get(key).ok_or_else(|| {
                ArenaError::config("payoff_mapping", format!("missing key `{}`", key))
            })?;
            let &[a, b] = values.as_slice() else {
                return Err(ArenaError::config(
                    "payoff_mapping",
                    format!("`{}` needs exactly two payoffs, got {}", key, values.len()),
                ));
            };
            if !a.is_finite() || !b.is_finite() {
                return Err(ArenaError::config(
                    "payoff_mapping",
                    format!("`{}` payoffs must be finite", key),
                ));
            }
            *slot = (a, b);
        }

        Ok(Self::new(pairs[0], pairs[1], pairs[2], pairs[3]))
    }

    /// Returns (payoff_a, payoff_b) for the joint action
    pub fn get_payoffs(&self, a: Action, b: Action) -> (f64, f64) {
        self.table[a.index()][b.index()]
    }

    /// Lookup by configuration key, e.g. `"defect_coop"`
    pub fn get_payoffs_by_key(&self, key: &str) -> Result<(f64, f64)> {
        let unknown = || ArenaError::UnknownActionPair { key: key.to_string() };
        let (a, b) = key.split_once('_').ok_or_else(unknown)?;
        let a: Action = a.parse().map_err(|_| unknown())?;
        let b: Action = b.parse().map_err(|_| unknown())?;
        Ok(self.get_payoffs(a, b))
    }

    /// The string-keyed form, suitable for writing back to a config file
    pub fn to_mapping(&self) -> PayoffMapping {
        Action::ALL
            .iter()
            .flat_map(|a| Action::ALL.iter().map(move |b| (*a, *b)))
            .map(|(a, b)| {
                let (pa, pb) = self.get_payoffs(a, b);
                (format!("{}_{}", a.token(), b.token()), vec![pa, pb])
            })
            .collect()
    }

    /// True if defecting is strictly better for player A whatever B does
    pub fn defect_dominates(&self) -> bool {
        let [[cc, cd], [dc, dd]] = self.table;
        dc.0 > cc.0 && dd.0 > cd.0
    }
}

impl Default for PayoffMatrix {
    fn default() -> Self {
        Self::standard()
    }
}
