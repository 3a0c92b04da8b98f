use crate::model::{PlayerId, Team};

/// Tracks how often one configured pair ends up as teammates when both play.
#[derive(Debug, Clone, Default)]
pub struct SocialPairStats {
    pair: Option<(PlayerId, PlayerId)>,
    together: u32,
    teammates: u32,
}

impl SocialPairStats {
    pub fn new(pair: Option<(PlayerId, PlayerId)>) -> Self {
        Self {
            pair: pair.filter(|(a, b)| a != b),
            together: 0,
            teammates: 0,
        }
    }

    pub fn pair(&self) -> Option<&(PlayerId, PlayerId)> {
        self.pair.as_ref()
    }

    /// True when both designated players are among `ids`.
    pub fn both_present<'a>(&self, ids: impl IntoIterator<Item = &'a PlayerId> + Clone) -> bool {
        match &self.pair {
            Some((a, b)) => {
                ids.clone().into_iter().any(|id| id == a) && ids.into_iter().any(|id| id == b)
            }
            None => false,
        }
    }

    pub fn on_same_team(&self, team: &Team) -> bool {
        match &self.pair {
            Some((a, b)) => team.contains(a) && team.contains(b),
            None => false,
        }
    }

    pub fn record_match(&mut self, winners: &Team, losers: &Team) {
        if !self.both_present(winners.iter().chain(losers.iter())) {
            return;
        }
        self.together += 1;
        if self.on_same_team(winners) || self.on_same_team(losers) {
            self.teammates += 1;
        }
    }

    /// Share of shared matches spent as teammates; 0 before they have met.
    pub fn observed_ratio(&self) -> f64 {
        if self.together == 0 {
            0.0
        } else {
            self.teammates as f64 / self.together as f64
        }
    }

    pub fn together(&self) -> u32 {
        self.together
    }

    pub fn teammates(&self) -> u32 {
        self.teammates
    }

    pub fn reset(&mut self) {
        self.together = 0;
        self.teammates = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> PlayerId {
        PlayerId::new(name)
    }

    fn team(a: &str, b: &str) -> Team {
        Team::new(id(a), id(b)).unwrap()
    }

    #[test]
    fn counts_only_matches_with_both_players() {
        let mut stats = SocialPairStats::new(Some((id("chad"), id("budong"))));
        stats.record_match(&team("chad", "x"), &team("y", "z"));
        assert_eq!(stats.together(), 0);

        stats.record_match(&team("chad", "budong"), &team("y", "z"));
        stats.record_match(&team("chad", "x"), &team("budong", "z"));
        assert_eq!(stats.together(), 2);
        assert_eq!(stats.teammates(), 1);
        assert!((stats.observed_ratio() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn unset_pair_never_counts() {
        let mut stats = SocialPairStats::new(None);
        stats.record_match(&team("a", "b"), &team("c", "d"));
        assert_eq!(stats.together(), 0);
        assert_eq!(stats.observed_ratio(), 0.0);
    }
}
