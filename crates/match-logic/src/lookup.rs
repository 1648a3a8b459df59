//! History-window lookup-table policy
//!
//! A table maps every binary string of length `length_lookback` (the last
//! `length_lookback` opponent moves, oldest first, cooperate = `1`,
//! defect = `0`) to a response. Histories shorter than the window are
//! treated as if the opponent had cooperated in the missing rounds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};
use crate::policy::Action;
use crate::random::SeededRng;

/// Largest supported window (65536 table entries)
pub const MAX_LOOKBACK: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LookupTableRepr", into = "LookupTableRepr")]
pub struct LookupTable {
    length_lookback: usize,
    /// Indexed by the window read as a binary number, oldest move as MSB
    responses: Vec<Action>,
}

/// Wire form: the window length plus the string-keyed mapping
#[derive(Clone, Debug, Serialize, Deserialize)]
struct LookupTableRepr {
    length_lookback: usize,
    mapping: BTreeMap<String, Action>,
}

fn check_lookback(length_lookback: usize) -> Result<()> {
    if length_lookback > MAX_LOOKBACK {
        return Err(ArenaError::config(
            "length_lookback",
            format!("must be at most {}, got {}", MAX_LOOKBACK, length_lookback),
        ));
    }
    Ok(())
}

impl LookupTable {
    /// Random table: one fair draw per window
    pub fn random(length_lookback: usize, rng: &mut SeededRng) -> Result<Self> {
        check_lookback(length_lookback)?;
        let responses = (0..1usize << length_lookback)
            .map(|_| if rng.next_bool() { Action::Cooperate } else { Action::Defect })
            .collect();
        Ok(Self { length_lookback, responses })
    }

    /// Table from an explicit mapping
    ///
    /// The mapping must hold exactly the `2^length_lookback` binary keys of
    /// length `length_lookback`.
    pub fn from_mapping(length_lookback: usize, mapping: &BTreeMap<String, Action>) -> Result<Self> {
        check_lookback(length_lookback)?;
        let size = 1usize << length_lookback;
        if mapping.len() != size {
            return Err(ArenaError::config(
                "mapping",
                format!("expected {} entries, got {}", size, mapping.len()),
            ));
        }

        let mut responses = vec![Action::Cooperate; size];
        for (key, action) in mapping {
            let index = parse_key(key, length_lookback)?;
            responses[index] = *action;
        }
        Ok(Self { length_lookback, responses })
    }

    pub fn length_lookback(&self) -> usize {
        self.length_lookback
    }

    /// Number of entries, always `2^length_lookback`
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Index of the window the policy would condition on for this history
    fn window_index(&self, opponent_history: &[Action]) -> usize {
        let l = self.length_lookback;
        let start = opponent_history.len().saturating_sub(l);
        let padding = l - (opponent_history.len() - start);

        std::iter::repeat(Action::Cooperate)
            .take(padding)
            .chain(opponent_history[start..].iter().copied())
            .fold(0usize, |acc, a| (acc << 1) | a.bit() as usize)
    }

    /// Encoded window for a history, e.g. `"101"`
    pub fn key_for(&self, opponent_history: &[Action]) -> String {
        encode_key(self.window_index(opponent_history), self.length_lookback)
    }

    pub fn get_action(&self, opponent_history: &[Action]) -> Action {
        self.responses[self.window_index(opponent_history)]
    }

    /// Read-only view of the full mapping, sorted by key
    pub fn mapping(&self) -> BTreeMap<String, Action> {
        self.responses
            .iter()
            .enumerate()
            .map(|(i, a)| (encode_key(i, self.length_lookback), *a))
            .collect()
    }

    /// Fraction of windows answered with cooperate
    pub fn cooperation_rate(&self) -> f64 {
        let coop = self.responses.iter().filter(|a| **a == Action::Cooperate).count();
        coop as f64 / self.responses.len() as f64
    }
}

fn encode_key(index: usize, length: usize) -> String {
    (0..length)
        .rev()
        .map(|bit| if (index >> bit) & 1 == 1 { '1' } else { '0' })
        .collect()
}

fn parse_key(key: &str, length: usize) -> Result<usize> {
    let malformed = || {
        ArenaError::config(
            "mapping",
            format!("key `{}` is not a binary string of length {}", key, length),
        )
    };
    if key.len() != length {
        return Err(malformed());
    }
    key.chars().try_fold(0usize, |acc, c| match c {
        '1' => Ok((acc << 1) | 1),
        '0' => Ok(acc << 1),
        _ => Err(malformed()),
    })
}

impl TryFrom<LookupTableRepr> for LookupTable {
    type Error = ArenaError;

    fn try_from(repr: LookupTableRepr) -> Result<Self> {
        Self::from_mapping(repr.length_lookback, &repr.mapping)
    }
}

impl From<LookupTable> for LookupTableRepr {
    fn from(table: LookupTable) -> Self {
        Self {
            length_lookback: table.length_lookback,
            mapping: table.mapping(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use Action::{Cooperate as C, Defect as D};

    fn table(length: usize, entries: &[(&str, Action)]) -> LookupTable {
        let mapping = entries.iter().map(|(k, a)| (k.to_string(), *a)).collect();
        LookupTable::from_mapping(length, &mapping).unwrap()
    }

    #[test]
    fn test_size_is_power_of_two() {
        let mut rng = SeededRng::new(1, 0);
        for l in 0..=8 {
            let t = LookupTable::random(l, &mut rng).unwrap();
            let mapping = t.mapping();
            assert_eq!(mapping.len(), 1 << l);
            assert!(mapping.keys().all(|k| k.len() == l));
        }
    }

    #[test]
    fn test_lookback_limit() {
        let mut rng = SeededRng::new(1, 0);
        assert!(LookupTable::random(MAX_LOOKBACK, &mut rng).is_ok());
        let err = LookupTable::random(MAX_LOOKBACK + 1, &mut rng).unwrap_err();
        assert_eq!(err.code(), "configuration");
    }

    #[test]
    fn test_zero_lookback_is_constant() {
        let t = table(0, &[("", D)]);
        assert_eq!(t.len(), 1);
        assert_eq!(t.key_for(&[]), "");
        assert_eq!(t.get_action(&[]), D);
        assert_eq!(t.get_action(&[C, C, D, C]), D);
    }

    #[test]
    fn test_short_history_padded_with_cooperate() {
        let t = table(3, &[
            ("000", D), ("001", D), ("010", D), ("011", C),
            ("100", D), ("101", C), ("110", D), ("111", C),
        ]);

        assert_eq!(t.key_for(&[]), "111");
        assert_eq!(t.key_for(&[D]), "110");
        assert_eq!(t.key_for(&[D, C]), "101");
        assert_eq!(t.get_action(&[]), C);
        assert_eq!(t.get_action(&[D]), D);
        assert_eq!(t.get_action(&[D, C]), C);
    }

    #[test]
    fn test_window_uses_most_recent_moves() {
        let t = table(2, &[("00", D), ("01", C), ("10", D), ("11", C)]);

        assert_eq!(t.key_for(&[D, D, C, D]), "10");
        assert_eq!(t.key_for(&[C, C, D, C]), "01");
        assert_eq!(t.get_action(&[C, C, D, C]), C);
    }

    #[test]
    fn test_caller_history_untouched() {
        let t = table(3, &[
            ("000", D), ("001", D), ("010", D), ("011", D),
            ("100", D), ("101", D), ("110", D), ("111", D),
        ]);
        let history = vec![D];
        t.get_action(&history);
        assert_eq!(history, vec![D]);
    }

    #[test]
    fn test_from_mapping_rejects_bad_keys() {
        let mut mapping = BTreeMap::new();
        mapping.insert("0".to_string(), C);
        mapping.insert("2".to_string(), C);
        assert!(LookupTable::from_mapping(1, &mapping).is_err());

        mapping.remove("2");
        assert!(LookupTable::from_mapping(1, &mapping).is_err());

        mapping.insert("10".to_string(), C);
        assert!(LookupTable::from_mapping(1, &mapping).is_err());
    }

    #[test]
    fn test_from_mapping_rejects_non_binary_keys() {
        let mut mapping = BTreeMap::new();
        for key in ["00", "01", "10", "1x"] {
            mapping.insert(key.to_string(), C);
        }
        assert!(LookupTable::from_mapping(2, &mapping).is_err());
    }

    #[test]
    fn test_json_round_trip_shape() {
        let t = table(1, &[("0", D), ("1", C)]);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"length_lookback": 1, "mapping": {"0": "defect", "1": "coop"}})
        );

        let back: LookupTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);

        let bad = serde_json::json!({"length_lookback": 1, "mapping": {"0": "defect"}});
        assert!(serde_json::from_value::<LookupTable>(bad).is_err());
    }

    #[test]
    fn test_random_is_seeded() {
        let a = LookupTable::random(6, &mut SeededRng::new(5, 0)).unwrap();
        let b = LookupTable::random(6, &mut SeededRng::new(5, 0)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_cooperation_rate() {
        let t = table(2, &[("00", D), ("01", C), ("10", D), ("11", C)]);
        assert_eq!(t.cooperation_rate(), 0.5);
    }

    proptest! {
        #[test]
        fn prop_mapping_is_total(l in 0usize..10, seed in any::<u64>()) {
            let t = LookupTable::random(l, &mut SeededRng::new(seed, 0)).unwrap();
            let mapping = t.mapping();
            prop_assert_eq!(mapping.len(), 1usize << l);
            for (i, key) in mapping.keys().enumerate() {
                prop_assert_eq!(key.clone(), encode_key(i, l));
            }
        }

        #[test]
        fn prop_get_action_matches_mapping(
            l in 0usize..6,
            seed in any::<u64>(),
            hist in prop::collection::vec(prop::sample::select(Action::ALL.to_vec()), 0..12),
        ) {
            let t = LookupTable::random(l, &mut SeededRng::new(seed, 0)).unwrap();
            let first = t.get_action(&hist);
            prop_assert_eq!(first, t.get_action(&hist));
            prop_assert_eq!(first, t.mapping()[&t.key_for(&hist)]);
        }
    }
}
