use std::collections::{BTreeMap, HashMap};

use super::{CommitStatus, MatchKey, MatchRecord, PersistenceError, ResultStore};
use crate::model::{Player, PlayerId};

/// In-process store. Optional failure injection makes retry paths testable.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    players: HashMap<PlayerId, Player>,
    matches: BTreeMap<MatchKey, MatchRecord>,
    fail_budget: u32,
    failure_every: Option<u64>,
    attempts: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_players(players: impl IntoIterator<Item = Player>) -> Self {
        let mut store = Self::new();
        for player in players {
            store.insert_player(player);
        }
        store
    }

    /// Inserts or replaces a player record.
    pub fn insert_player(&mut self, player: Player) {
        self.players.insert(player.id().clone(), player);
    }

    /// The next `count` commits fail with a transient error.
    pub fn fail_next(&mut self, count: u32) {
        self.fail_budget = count;
    }

    /// Every `n`th commit attempt fails with a transient error.
    pub fn fail_every(&mut self, n: Option<u64>) {
        self.failure_every = n.filter(|n| *n > 0);
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn matches(&self) -> impl Iterator<Item = &MatchRecord> {
        self.matches.values()
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }
}

impl ResultStore for MemoryStore {
    fn load_player(&self, id: &PlayerId) -> Option<Player> {
        self.players.get(id).cloned()
    }

    fn commit_match(&mut self, record: &MatchRecord) -> Result<CommitStatus, PersistenceError> {
        self.attempts += 1;
        if self.fail_budget > 0 {
            self.fail_budget -= 1;
            return Err(PersistenceError::Transient {
                message: "injected failure".to_string(),
            });
        }
        if let Some(n) = self.failure_every {
            if self.attempts % n == 0 {
                return Err(PersistenceError::Transient {
                    message: format!("injected failure on attempt {}", self.attempts),
                });
            }
        }

        if let Some(existing) = self.matches.get(&record.key) {
            return if existing == record {
                Ok(CommitStatus::AlreadyRecorded)
            } else {
                Err(PersistenceError::Conflict {
                    key: record.key.clone(),
                })
            };
        }

        // Validate everything before touching any row.
        for (id, _) in record.participants() {
            if !self.players.contains_key(id) {
                return Err(PersistenceError::MissingPlayer { id: id.clone() });
            }
        }
        for (id, won) in record.participants() {
            if let Some(player) = self.players.get_mut(id) {
                player.record_result(won);
            }
        }
        self.matches.insert(record.key.clone(), record.clone());
        Ok(CommitStatus::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Team;

    fn record(sequence: u64, winners: [&str; 2], losers: [&str; 2]) -> MatchRecord {
        MatchRecord {
            key: MatchKey {
                session_id: "s1".into(),
                court_number: 1,
                sequence,
            },
            winners: Team::new(PlayerId::new(winners[0]), PlayerId::new(winners[1])).unwrap(),
            losers: Team::new(PlayerId::new(losers[0]), PlayerId::new(losers[1])).unwrap(),
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::with_players(["a", "b", "c", "d"].map(Player::new))
    }

    #[test]
    fn commit_is_idempotent_per_key() {
        let mut store = store();
        let first = record(1, ["a", "b"], ["c", "d"]);
        assert_eq!(store.commit_match(&first), Ok(CommitStatus::Applied));
        assert_eq!(store.commit_match(&first), Ok(CommitStatus::AlreadyRecorded));

        let a = store.load_player(&PlayerId::new("a")).unwrap();
        assert_eq!((a.wins(), a.losses()), (1, 0));
        let d = store.load_player(&PlayerId::new("d")).unwrap();
        assert_eq!((d.wins(), d.losses()), (0, 1));
        assert_eq!(store.match_count(), 1);
    }

    #[test]
    fn conflicting_payload_for_same_key_is_rejected() {
        let mut store = store();
        store.commit_match(&record(1, ["a", "b"], ["c", "d"])).unwrap();
        let err = store.commit_match(&record(1, ["c", "d"], ["a", "b"])).unwrap_err();
        assert!(matches!(err, PersistenceError::Conflict { .. }));
        assert_eq!(store.player(&PlayerId::new("c")).unwrap().wins(), 0);
    }

    #[test]
    fn missing_player_leaves_store_untouched() {
        let mut store = store();
        let err = store.commit_match(&record(1, ["a", "zed"], ["c", "d"])).unwrap_err();
        assert_eq!(err, PersistenceError::MissingPlayer { id: PlayerId::new("zed") });
        assert_eq!(store.player(&PlayerId::new("a")).unwrap().games_played(), 0);
        assert_eq!(store.match_count(), 0);
    }

    #[test]
    fn injected_failures_are_transient() {
        let mut store = store();
        store.fail_next(1);
        let rec = record(1, ["a", "b"], ["c", "d"]);
        assert!(store.commit_match(&rec).unwrap_err().is_retryable());
        assert_eq!(store.commit_match(&rec), Ok(CommitStatus::Applied));

        store.fail_every(Some(3));
        assert!(store.commit_match(&record(2, ["a", "c"], ["b", "d"])).is_err());
        assert_eq!(store.attempts(), 3);
    }
}
