use std::collections::{BTreeSet, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::model::{PlayerId, Team};

/// Canonical (sorted) id set of four distinct players.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuartetKey([PlayerId; 4]);

impl QuartetKey {
    pub fn new(ids: [PlayerId; 4]) -> Option<Self> {
        let mut ids = ids;
        ids.sort();
        if ids.windows(2).any(|pair| pair[0] == pair[1]) {
            return None;
        }
        Some(Self(ids))
    }

    pub fn from_slice(ids: &[PlayerId]) -> Option<Self> {
        match ids {
            [a, b, c, d] => Self::new([a.clone(), b.clone(), c.clone(), d.clone()]),
            _ => None,
        }
    }

    pub fn from_teams(first: &Team, second: &Team) -> Option<Self> {
        let ids: Vec<PlayerId> = first.iter().chain(second.iter()).cloned().collect();
        Self::from_slice(&ids)
    }

    pub fn members(&self) -> &[PlayerId; 4] {
        &self.0
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.0.binary_search(id).is_ok()
    }

    /// The other three members, as seen by `id`.
    pub fn without(&self, id: &PlayerId) -> BTreeSet<PlayerId> {
        self.0.iter().filter(|p| *p != id).cloned().collect()
    }
}

/// Remembers which quartets have played, to keep groups from re-forming.
#[derive(Debug, Clone)]
pub struct QuartetMemory {
    last_by_player: HashMap<PlayerId, BTreeSet<PlayerId>>,
    usage: HashMap<QuartetKey, u32>,
    recent: VecDeque<QuartetKey>,
    window: usize,
}

impl QuartetMemory {
    pub fn new(window: usize) -> Self {
        Self {
            last_by_player: HashMap::new(),
            usage: HashMap::new(),
            recent: VecDeque::with_capacity(window),
            window,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// A quartet was put on a court.
    pub fn record_seated(&mut self, key: &QuartetKey) {
        *self.usage.entry(key.clone()).or_insert(0) += 1;
        if self.window == 0 {
            return;
        }
        self.recent.push_back(key.clone());
        while self.recent.len() > self.window {
            self.recent.pop_front();
        }
    }

    /// A quartet finished a match; each member remembers the other three.
    pub fn record_finished(&mut self, key: &QuartetKey) {
        for member in key.members() {
            self.last_by_player
                .insert(member.clone(), key.without(member));
        }
    }

    pub fn usage(&self, key: &QuartetKey) -> u32 {
        self.usage.get(key).copied().unwrap_or(0)
    }

    pub fn is_recent(&self, key: &QuartetKey) -> bool {
        self.recent.contains(key)
    }

    pub fn last_quartet_of(&self, id: &PlayerId) -> Option<&BTreeSet<PlayerId>> {
        self.last_by_player.get(id)
    }

    /// True when any member would be reunited with exactly their previous three.
    pub fn repeats_last_quartet(&self, key: &QuartetKey) -> bool {
        key.members().iter().any(|member| {
            self.last_by_player
                .get(member)
                .is_some_and(|last| *last == key.without(member))
        })
    }

    pub fn clear(&mut self) {
        self.last_by_player.clear();
        self.usage.clear();
        self.recent.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(names: [&str; 4]) -> QuartetKey {
        QuartetKey::new(names.map(PlayerId::new)).expect("distinct")
    }

    #[test]
    fn key_is_order_independent_and_rejects_duplicates() {
        assert_eq!(key(["d", "a", "c", "b"]), key(["a", "b", "c", "d"]));
        assert!(QuartetKey::new(["a", "a", "b", "c"].map(PlayerId::new)).is_none());
        assert!(QuartetKey::from_slice(&[PlayerId::new("a")]).is_none());
    }

    #[test]
    fn recent_window_is_bounded() {
        let mut memory = QuartetMemory::new(2);
        let first = key(["a", "b", "c", "d"]);
        memory.record_seated(&first);
        memory.record_seated(&key(["a", "b", "c", "e"]));
        assert!(memory.is_recent(&first));
        memory.record_seated(&key(["a", "b", "c", "f"]));
        assert!(!memory.is_recent(&first));
        assert_eq!(memory.usage(&first), 1);
    }

    #[test]
    fn finished_quartet_blocks_exact_regroup() {
        let mut memory = QuartetMemory::new(6);
        memory.record_finished(&key(["a", "b", "c", "d"]));

        assert!(memory.repeats_last_quartet(&key(["a", "b", "c", "d"])));
        assert!(!memory.repeats_last_quartet(&key(["a", "b", "c", "e"])));
        assert_eq!(
            memory.last_quartet_of(&PlayerId::new("a")).map(|s| s.len()),
            Some(3)
        );
    }

    #[test]
    fn partial_overlap_with_newer_group_is_allowed() {
        let mut memory = QuartetMemory::new(6);
        memory.record_finished(&key(["a", "b", "c", "d"]));
        memory.record_finished(&key(["a", "e", "f", "g"]));

        // "b" still remembers a,c,d but "a" has moved on; b,c,d + a is still blocked via "b".
        assert!(memory.repeats_last_quartet(&key(["a", "b", "c", "d"])));
        assert!(!memory.repeats_last_quartet(&key(["b", "c", "e", "h"])));
    }
}
