use core::fmt;
use serde::{Deserialize, Serialize};

/// Normalized player identity: the trimmed, lower-cased display name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Cumulative record for one player. Games played and win rate are derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    name: String,
    wins: u32,
    losses: u32,
}

impl Player {
    pub fn new(name: &str) -> Self {
        Self::with_record(name, 0, 0)
    }

    pub fn with_record(name: &str, wins: u32, losses: u32) -> Self {
        let name = name.trim().to_string();
        Self {
            id: PlayerId::new(&name),
            name,
            wins,
            losses,
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn wins(&self) -> u32 {
        self.wins
    }

    pub fn losses(&self) -> u32 {
        self.losses
    }

    pub fn games_played(&self) -> u32 {
        self.wins + self.losses
    }

    pub fn winrate(&self) -> f64 {
        let games = self.games_played();
        if games == 0 {
            0.0
        } else {
            self.wins as f64 / games as f64
        }
    }

    pub fn win_percent(&self) -> u32 {
        (self.winrate() * 100.0) as u32
    }

    pub fn record_result(&mut self, won: bool) {
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
