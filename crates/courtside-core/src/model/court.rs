use serde::{Deserialize, Serialize};

use super::player::PlayerId;

/// Two distinct players sharing one side of the net. Member order is display order only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    players: [PlayerId; 2],
}

impl Team {
    pub fn new(first: PlayerId, second: PlayerId) -> Option<Self> {
        if first == second {
            return None;
        }
        Some(Self {
            players: [first, second],
        })
    }

    pub fn players(&self) -> &[PlayerId; 2] {
        &self.players
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.iter().any(|p| p == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlayerId> {
        self.players.iter()
    }

    pub fn swap_order(&mut self) {
        self.players.swap(0, 1);
    }

    /// True when both teams hold the same two players regardless of order.
    pub fn same_pair(&self, other: &Team) -> bool {
        other.contains(&self.players[0]) && other.contains(&self.players[1])
    }
}

/// Two disjoint teams assigned to one court for one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matchup {
    teams: [Team; 2],
}

impl Matchup {
    pub fn new(first: Team, second: Team) -> Option<Self> {
        if first.iter().any(|id| second.contains(id)) {
            return None;
        }
        Some(Self {
            teams: [first, second],
        })
    }

    pub fn teams(&self) -> &[Team; 2] {
        &self.teams
    }

    pub fn team(&self, index: usize) -> Option<&Team> {
        self.teams.get(index)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerId> {
        self.teams.iter().flat_map(|team| team.iter())
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.teams.iter().any(|team| team.contains(id))
    }

    /// Returns `(team index, position in team)` for a player on this court.
    pub fn locate(&self, id: &PlayerId) -> Option<(usize, usize)> {
        self.teams.iter().enumerate().find_map(|(team_index, team)| {
            team.players()
                .iter()
                .position(|p| p == id)
                .map(|position| (team_index, position))
        })
    }

    pub fn player_at(&self, team: usize, position: usize) -> Option<&PlayerId> {
        self.teams.get(team).and_then(|t| t.players.get(position))
    }

    /// Replaces the occupant of one slot. Rejected if the newcomer already plays here.
    pub fn replace_at(&mut self, team: usize, position: usize, incoming: PlayerId) -> Option<PlayerId> {
        if self.contains(&incoming) || team > 1 || position > 1 {
            return None;
        }
        let slot = &mut self.teams[team].players[position];
        Some(std::mem::replace(slot, incoming))
    }

    /// Exchanges two slots on the same court.
    pub fn swap_slots(&mut self, a: (usize, usize), b: (usize, usize)) -> bool {
        if a.0 > 1 || a.1 > 1 || b.0 > 1 || b.1 > 1 {
            return false;
        }
        if a == b {
            return true;
        }
        let first = self.teams[a.0].players[a.1].clone();
        let second = self.teams[b.0].players[b.1].clone();
        self.teams[a.0].players[a.1] = second;
        self.teams[b.0].players[b.1] = first;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtState {
    Empty,
    Occupied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Court {
    number: u32,
    matchup: Option<Matchup>,
}

impl Court {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            matchup: None,
        }
    }

    pub fn with_matchup(number: u32, matchup: Matchup) -> Self {
        Self {
            number,
            matchup: Some(matchup),
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn matchup(&self) -> Option<&Matchup> {
        self.matchup.as_ref()
    }

    pub fn matchup_mut(&mut self) -> Option<&mut Matchup> {
        self.matchup.as_mut()
    }

    pub fn state(&self) -> CourtState {
        if self.matchup.is_some() {
            CourtState::Occupied
        } else {
            CourtState::Empty
        }
    }

    pub fn is_empty(&self) -> bool {
        self.matchup.is_none()
    }

    pub fn set_matchup(&mut self, matchup: Matchup) {
        self.matchup = Some(matchup);
    }

    pub fn take_matchup(&mut self) -> Option<Matchup> {
        self.matchup.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> PlayerId {
        PlayerId::new(name)
    }

    fn team(a: &str, b: &str) -> Team {
        Team::new(id(a), id(b)).expect("distinct players")
    }

    #[test]
    fn team_rejects_duplicate_member() {
        assert!(Team::new(id("ana"), id("ANA")).is_none());
    }

    #[test]
    fn matchup_rejects_overlapping_teams() {
        assert!(Matchup::new(team("a", "b"), team("b", "c")).is_none());
        assert!(Matchup::new(team("a", "b"), team("c", "d")).is_some());
    }

    #[test]
    fn locate_reports_team_and_position() {
        let matchup = Matchup::new(team("a", "b"), team("c", "d")).unwrap();
        assert_eq!(matchup.locate(&id("d")), Some((1, 1)));
        assert_eq!(matchup.locate(&id("z")), None);
        assert_eq!(matchup.players().count(), 4);
    }

    #[test]
    fn replace_refuses_player_already_on_court() {
        let mut matchup = Matchup::new(team("a", "b"), team("c", "d")).unwrap();
        assert!(matchup.replace_at(0, 0, id("c")).is_none());
        assert_eq!(matchup.replace_at(0, 0, id("e")), Some(id("a")));
        assert!(matchup.contains(&id("e")));
    }

    #[test]
    fn court_state_follows_matchup() {
        let mut court = Court::new(3);
        assert_eq!(court.state(), CourtState::Empty);
        court.set_matchup(Matchup::new(team("a", "b"), team("c", "d")).unwrap());
        assert_eq!(court.state(), CourtState::Occupied);
        assert!(court.take_matchup().is_some());
        assert!(court.is_empty());
    }

    #[test]
    fn same_pair_ignores_order() {
        assert!(team("a", "b").same_pair(&team("b", "a")));
        assert!(!team("a", "b").same_pair(&team("a", "c")));
    }
}
