//! Static policy registry
//!
//! Policies are named in configuration files as `{"name": ..., "kwargs": {...}}`.
//! Names resolve through a fixed table of constructors; unknown names and
//! bad keyword arguments are configuration errors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};
use crate::policy::Policy;
use crate::random::SeededRng;

type Kwargs = BTreeMap<String, f64>;
type Constructor = fn(&Kwargs, &mut SeededRng) -> Result<Policy>;

struct Entry {
    name: &'static str,
    aliases: &'static [&'static str],
    kwargs: &'static [&'static str],
    build: Constructor,
}

static REGISTRY: &[Entry] = &[
    Entry {
        name: "AlwaysCooperate",
        aliases: &["AlwaysCoopPolicy"],
        kwargs: &[],
        build: |_, _| Ok(Policy::AlwaysCooperate),
    },
    Entry {
        name: "AlwaysDefect",
        aliases: &["AlwaysDefectPolicy"],
        kwargs: &[],
        build: |_, _| Ok(Policy::AlwaysDefect),
    },
    Entry {
        name: "Probabilistic",
        aliases: &["ProbabilisticPolicy"],
        kwargs: &["p_defect"],
        build: |kwargs, _| Policy::probabilistic(required(kwargs, "p_defect")?),
    },
    Entry {
        name: "TitForTat",
        aliases: &["TitForTatPolicy"],
        kwargs: &[],
        build: |_, _| Ok(Policy::TitForTat),
    },
    Entry {
        name: "LookupTable",
        aliases: &["RandomStaticPolicy", "GeneralPolicy"],
        kwargs: &["length_lookback"],
        build: |kwargs, rng| {
            let length = required(kwargs, "length_lookback")?;
            if length < 0.0 || length.fract() != 0.0 {
                return Err(ArenaError::config(
                    "length_lookback",
                    format!("must be a non-negative integer, got {}", length),
                ));
            }
            Policy::random_lookup(length as usize, rng)
        },
    },
];

fn required(kwargs: &Kwargs, key: &str) -> Result<f64> {
    kwargs
        .get(key)
        .copied()
        .ok_or_else(|| ArenaError::config(key, "missing required keyword argument"))
}

/// A policy named in configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicySpec {
    pub name: String,
    #[serde(default)]
    pub kwargs: BTreeMap<String, f64>,
}

impl PolicySpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kwargs: BTreeMap::new(),
        }
    }

    pub fn with_kwarg(mut self, key: impl Into<String>, value: f64) -> Self {
        self.kwargs.insert(key.into(), value);
        self
    }

    fn entry(&self) -> Result<&'static Entry> {
        REGISTRY
            .iter()
            .find(|e| e.name == self.name || e.aliases.contains(&self.name.as_str()))
            .ok_or_else(|| ArenaError::UnknownPolicy { name: self.name.clone() })
    }

    /// Check the name and keyword arguments without constructing anything
    pub fn validate(&self) -> Result<()> {
        let entry = self.entry()?;
        if let Some(extra) = self.kwargs.keys().find(|k| !entry.kwargs.contains(&k.as_str())) {
            return Err(ArenaError::config(
                extra,
                format!("not a keyword argument of {}", entry.name),
            ));
        }
        Ok(())
    }

    /// Resolve and construct the policy
    ///
    /// `rng` seeds policies with random initial state (lookup tables).
    pub fn build(&self, rng: &mut SeededRng) -> Result<Policy> {
        self.validate()?;
        (self.entry()?.build)(&self.kwargs, rng)
    }
}

/// Canonical names of every registered policy
pub fn registered_policies() -> Vec<&'static str> {
    REGISTRY.iter().map(|e| e.name).collect()
}
