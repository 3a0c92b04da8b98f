use std::collections::HashMap;

use super::player::{Player, PlayerId};

/// In-memory copy of the player records the session works with.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: HashMap<PlayerId, Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.contains_key(id)
    }

    /// Adds a player unless one with the same id is already known; returns the stored record.
    pub fn register(&mut self, player: Player) -> &Player {
        self.players
            .entry(player.id().clone())
            .or_insert(player)
    }

    /// Applies one result to the cumulative record. Returns false for unknown players.
    pub fn record_result(&mut self, id: &PlayerId, won: bool) -> bool {
        match self.players.get_mut(id) {
            Some(player) => {
                player.record_result(won);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }
}
