use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{PlayerId, Roster, SkillTier};

/// A win streak of at least this length is flagged as hot.
pub const HOT_STREAK: u32 = 3;

/// Results of the current session only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    /// Consecutive wins in this session; any loss resets it.
    pub streak: u32,
}

impl SessionStats {
    pub fn record(&mut self, won: bool) {
        self.games += 1;
        if won {
            self.wins += 1;
            self.streak += 1;
        } else {
            self.losses += 1;
            self.streak = 0;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatsBook {
    entries: HashMap<PlayerId, SessionStats>,
}

impl StatsBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &PlayerId) -> SessionStats {
        self.entries.get(id).copied().unwrap_or_default()
    }

    pub fn record(&mut self, id: &PlayerId, won: bool) {
        self.entries.entry(id.clone()).or_default().record(won);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// One line of the stats table shown to players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsRow {
    pub player_id: PlayerId,
    pub name: String,
    pub current_games: u32,
    pub current_wins: u32,
    pub current_losses: u32,
    pub overall_games: u32,
    pub overall_wins: u32,
    pub overall_losses: u32,
    pub overall_win_percent: u32,
    pub win_streak: u32,
    pub hot_streak: bool,
    pub tier: SkillTier,
}

/// Rows for `players`, busiest first, then most wins, then by name.
pub fn build_rows<'a>(
    players: impl IntoIterator<Item = &'a PlayerId>,
    roster: &Roster,
    book: &StatsBook,
) -> Vec<StatsRow> {
    let mut rows: Vec<StatsRow> = players
        .into_iter()
        .filter_map(|id| {
            let player = roster.get(id)?;
            let current = book.get(id);
            Some(StatsRow {
                player_id: id.clone(),
                name: player.name().to_string(),
                current_games: current.games,
                current_wins: current.wins,
                current_losses: current.losses,
                overall_games: player.games_played(),
                overall_wins: player.wins(),
                overall_losses: player.losses(),
                overall_win_percent: player.win_percent(),
                win_streak: current.streak,
                hot_streak: current.streak >= HOT_STREAK,
                tier: SkillTier::for_player(player),
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        b.current_games
            .cmp(&a.current_games)
            .then(b.current_wins.cmp(&a.current_wins))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    rows
}
