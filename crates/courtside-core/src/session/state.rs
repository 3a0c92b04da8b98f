use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::history::{CounterLimits, CounterTable, QuartetKey};
use crate::model::{Court, PlayerId};
use crate::rotation::RestingQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    Setup,
    Active,
    Ended,
}

impl SessionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionPhase::Setup => "setup",
            SessionPhase::Active => "active",
            SessionPhase::Ended => "ended",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a session player currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Court {
        court_index: usize,
        team: usize,
        position: usize,
    },
    Resting {
        index: usize,
    },
    SittingOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("player {id} is placed {placements} times")]
    PlayerMisplaced { id: PlayerId, placements: usize },
    #[error("player {id} is placed but not part of the session")]
    UnexpectedPlayer { id: PlayerId },
    #[error("player {id} exceeds rotation limits ({games} games, {stays} stays)")]
    LimitExceeded { id: PlayerId, games: u32, stays: u32 },
}

/// Placement and counters for one running session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub(crate) session_id: String,
    pub(crate) courts: Vec<Court>,
    pub(crate) players: BTreeSet<PlayerId>,
    pub(crate) queue: RestingQueue,
    pub(crate) sitting_out: Vec<PlayerId>,
    pub(crate) counters: CounterTable,
    pub(crate) sequences: HashMap<u32, u64>,
    pub(crate) last_court_group: HashMap<u32, QuartetKey>,
}

impl SessionState {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            ..Self::default()
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn courts(&self) -> &[Court] {
        &self.courts
    }

    pub fn players(&self) -> &BTreeSet<PlayerId> {
        &self.players
    }

    pub fn queue(&self) -> &RestingQueue {
        &self.queue
    }

    pub fn sitting_out(&self) -> &[PlayerId] {
        &self.sitting_out
    }

    pub fn counters(&self) -> &CounterTable {
        &self.counters
    }

    /// Session players not sitting out.
    pub fn active_player_count(&self) -> usize {
        self.players.len() - self.sitting_out.len()
    }

    pub fn occupied_court_count(&self) -> usize {
        self.courts.iter().filter(|court| !court.is_empty()).count()
    }

    pub fn next_court_number(&self) -> u32 {
        self.courts.iter().map(Court::number).max().unwrap_or(0) + 1
    }

    /// Allocates the next match sequence number on `court_number`, starting at 1.
    pub(crate) fn next_sequence(&mut self, court_number: u32) -> u64 {
        let sequence = self.sequences.entry(court_number).or_insert(0);
        *sequence += 1;
        *sequence
    }

    pub fn is_sitting_out(&self, id: &PlayerId) -> bool {
        self.sitting_out.contains(id)
    }

    pub fn locate(&self, id: &PlayerId) -> Option<Placement> {
        for (court_index, court) in self.courts.iter().enumerate() {
            if let Some((team, position)) = court.matchup().and_then(|m| m.locate(id)) {
                return Some(Placement::Court {
                    court_index,
                    team,
                    position,
                });
            }
        }
        if let Some(index) = self.queue.position(id) {
            return Some(Placement::Resting { index });
        }
        if self.is_sitting_out(id) {
            return Some(Placement::SittingOut);
        }
        None
    }

    /// Every session player sits in exactly one place and no counter is past its cap.
    pub fn check_invariants(&self, limits: CounterLimits) -> Result<(), InvariantViolation> {
        let mut placements: HashMap<&PlayerId, usize> = HashMap::new();
        let on_court = self
            .courts
            .iter()
            .filter_map(Court::matchup)
            .flat_map(|matchup| matchup.players());
        for id in on_court.chain(self.queue.iter()).chain(self.sitting_out.iter()) {
            *placements.entry(id).or_insert(0) += 1;
        }

        for id in placements.keys() {
            if !self.players.contains(*id) {
                return Err(InvariantViolation::UnexpectedPlayer { id: (*id).clone() });
            }
        }
        for id in &self.players {
            let count = placements.get(id).copied().unwrap_or(0);
            if count != 1 {
                return Err(InvariantViolation::PlayerMisplaced {
                    id: id.clone(),
                    placements: count,
                });
            }
        }
        for (id, counters) in self.counters.iter() {
            if counters.consecutive_games > limits.max_consecutive_games
                || counters.consecutive_stays > limits.max_consecutive_stays
            {
                return Err(InvariantViolation::LimitExceeded {
                    id: id.clone(),
                    games: counters.consecutive_games,
                    stays: counters.consecutive_stays,
                });
            }
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.session_id.clear();
        self.courts.clear();
        self.players.clear();
        self.queue.clear();
        self.sitting_out.clear();
        self.counters.clear();
        self.sequences.clear();
        self.last_court_group.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Matchup, Team};

    fn id(name: &str) -> PlayerId {
        PlayerId::new(name)
    }

    fn state_with_court() -> SessionState {
        let mut state = SessionState::new("s".into());
        let matchup = Matchup::new(
            Team::new(id("a"), id("b")).unwrap(),
            Team::new(id("c"), id("d")).unwrap(),
        )
        .unwrap();
        state.courts.push(Court::with_matchup(1, matchup));
        for name in ["a", "b", "c", "d", "e", "f"] {
            state.players.insert(id(name));
        }
        state.queue.enqueue(id("e"));
        state.sitting_out.push(id("f"));
        state
    }

    #[test]
    fn consistent_state_passes() {
        let state = state_with_court();
        assert_eq!(state.check_invariants(CounterLimits::default()), Ok(()));
        assert_eq!(state.active_player_count(), 5);
        assert_eq!(state.next_court_number(), 2);
        assert_eq!(
            state.locate(&id("d")),
            Some(Placement::Court {
                court_index: 0,
                team: 1,
                position: 1
            })
        );
        assert_eq!(state.locate(&id("f")), Some(Placement::SittingOut));
    }

    #[test]
    fn empty_courts_are_not_occupied() {
        let mut state = state_with_court();
        state.courts.push(Court::new(2));
        assert_eq!(state.occupied_court_count(), 1);
        state.courts[0].take_matchup();
        assert_eq!(state.occupied_court_count(), 0);
    }

    #[test]
    fn double_placement_is_reported() {
        let mut state = state_with_court();
        state.queue.enqueue(id("f"));
        assert_eq!(
            state.check_invariants(CounterLimits::default()),
            Err(InvariantViolation::PlayerMisplaced {
                id: id("f"),
                placements: 2
            })
        );
    }

    #[test]
    fn missing_and_foreign_players_are_reported() {
        let mut state = state_with_court();
        state.queue.remove(&id("e"));
        assert!(matches!(
            state.check_invariants(CounterLimits::default()),
            Err(InvariantViolation::PlayerMisplaced { placements: 0, .. })
        ));
        state.queue.enqueue(id("e"));
        state.queue.enqueue(id("stranger"));
        assert!(matches!(
            state.check_invariants(CounterLimits::default()),
            Err(InvariantViolation::UnexpectedPlayer { .. })
        ));
    }

    #[test]
    fn sequences_are_per_court() {
        let mut state = SessionState::new("s".into());
        assert_eq!(state.next_sequence(1), 1);
        assert_eq!(state.next_sequence(1), 2);
        assert_eq!(state.next_sequence(2), 1);
    }
}
