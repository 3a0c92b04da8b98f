use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{PlayerId, Team};

/// Unordered pair of distinct players stored as `(min id, max id)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey(PlayerId, PlayerId);

impl PairKey {
    pub fn new(a: &PlayerId, b: &PlayerId) -> Option<Self> {
        if a == b {
            return None;
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Some(Self(low.clone(), high.clone()))
    }

    pub fn first(&self) -> &PlayerId {
        &self.0
    }

    pub fn second(&self) -> &PlayerId {
        &self.1
    }
}

/// Symmetric partner and opponent counters.
#[derive(Debug, Clone, Default)]
pub struct PairwiseHistory {
    partners: HashMap<PairKey, u32>,
    opponents: HashMap<PairKey, u32>,
}

impl PairwiseHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partner_count(&self, a: &PlayerId, b: &PlayerId) -> u32 {
        lookup(&self.partners, a, b)
    }

    pub fn opponent_count(&self, a: &PlayerId, b: &PlayerId) -> u32 {
        lookup(&self.opponents, a, b)
    }

    pub fn record_match(&mut self, winners: &Team, losers: &Team) {
        for team in [winners, losers] {
            let [a, b] = team.players();
            bump(&mut self.partners, a, b);
        }
        for w in winners.iter() {
            for l in losers.iter() {
                bump(&mut self.opponents, w, l);
            }
        }
    }

    /// Pairs partnered more than once, with their counts.
    pub fn repeated_partners(&self) -> Vec<(PairKey, u32)> {
        let mut repeated: Vec<(PairKey, u32)> = self
            .partners
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(key, count)| (key.clone(), *count))
            .collect();
        repeated.sort();
        repeated
    }

    pub fn clear(&mut self) {
        self.partners.clear();
        self.opponents.clear();
    }
}

fn lookup(map: &HashMap<PairKey, u32>, a: &PlayerId, b: &PlayerId) -> u32 {
    PairKey::new(a, b)
        .and_then(|key| map.get(&key).copied())
        .unwrap_or(0)
}

fn bump(map: &mut HashMap<PairKey, u32>, a: &PlayerId, b: &PlayerId) {
    if let Some(key) = PairKey::new(a, b) {
        *map.entry(key).or_insert(0) += 1;
    }
}
