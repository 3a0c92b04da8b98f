use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterLimits {
    pub max_consecutive_games: u32,
    pub max_consecutive_stays: u32,
}

impl Default for CounterLimits {
    fn default() -> Self {
        Self {
            max_consecutive_games: 2,
            max_consecutive_stays: 1,
        }
    }
}

/// Per-player rotation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCounters {
    /// Match completions witnessed from the resting queue since last seated.
    pub rest_count: u32,
    /// Matches played without passing through the resting queue.
    pub consecutive_games: u32,
    /// Times carried over on the same court without resting.
    pub consecutive_stays: u32,
}

impl PlayerCounters {
    /// Seated from the resting queue.
    pub fn seat_fresh(&mut self, limits: CounterLimits) {
        self.rest_count = 0;
        self.consecutive_games = (self.consecutive_games + 1).min(limits.max_consecutive_games);
        self.consecutive_stays = 0;
    }

    /// Kept on court for the next match.
    pub fn carry_over(&mut self, limits: CounterLimits) {
        self.rest_count = 0;
        self.consecutive_games = (self.consecutive_games + 1).min(limits.max_consecutive_games);
        self.consecutive_stays = (self.consecutive_stays + 1).min(limits.max_consecutive_stays);
    }

    /// Sent to rest (or out of rotation); everything starts over.
    pub fn rest(&mut self) {
        *self = PlayerCounters::default();
    }

    pub fn tick_rest(&mut self) {
        self.rest_count += 1;
    }

    pub fn can_be_seated(&self, limits: CounterLimits) -> bool {
        self.consecutive_games < limits.max_consecutive_games
    }

    pub fn can_carry_over(&self, limits: CounterLimits) -> bool {
        self.consecutive_games < limits.max_consecutive_games
            && self.consecutive_stays < limits.max_consecutive_stays
    }
}

#[derive(Debug, Clone, Default)]
pub struct CounterTable {
    counters: HashMap<PlayerId, PlayerCounters>,
}

impl CounterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unknown players read as all-zero counters.
    pub fn get(&self, id: &PlayerId) -> PlayerCounters {
        self.counters.get(id).copied().unwrap_or_default()
    }

    pub fn rest_count(&self, id: &PlayerId) -> u32 {
        self.get(id).rest_count
    }

    pub fn entry(&mut self, id: &PlayerId) -> &mut PlayerCounters {
        self.counters.entry(id.clone()).or_default()
    }

    pub fn remove(&mut self, id: &PlayerId) {
        self.counters.remove(id);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlayerId, &PlayerCounters)> {
        self.counters.iter()
    }

    pub fn clear(&mut self) {
        self.counters.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_games_saturate_at_limit() {
        let limits = CounterLimits::default();
        let mut counters = PlayerCounters::default();
        counters.seat_fresh(limits);
        counters.carry_over(limits);
        counters.carry_over(limits);
        assert_eq!(counters.consecutive_games, limits.max_consecutive_games);
        assert_eq!(counters.consecutive_stays, limits.max_consecutive_stays);
        assert!(!counters.can_be_seated(limits));
        assert!(!counters.can_carry_over(limits));
    }

    #[test]
    fn fresh_seating_clears_rest_and_stays() {
        let limits = CounterLimits {
            max_consecutive_games: 3,
            max_consecutive_stays: 2,
        };
        let mut counters = PlayerCounters {
            rest_count: 4,
            consecutive_games: 0,
            consecutive_stays: 1,
        };
        counters.seat_fresh(limits);
        assert_eq!(counters.rest_count, 0);
        assert_eq!(counters.consecutive_games, 1);
        assert_eq!(counters.consecutive_stays, 0);
        assert!(counters.can_carry_over(limits));
    }

    #[test]
    fn resting_resets_everything() {
        let mut counters = PlayerCounters {
            rest_count: 2,
            consecutive_games: 2,
            consecutive_stays: 1,
        };
        counters.rest();
        assert_eq!(counters, PlayerCounters::default());
        counters.tick_rest();
        assert_eq!(counters.rest_count, 1);
    }

    #[test]
    fn table_defaults_unknown_players() {
        let mut table = CounterTable::new();
        let ana = PlayerId::new("ana");
        assert_eq!(table.rest_count(&ana), 0);
        table.entry(&ana).tick_rest();
        assert_eq!(table.rest_count(&ana), 1);
    }
}
