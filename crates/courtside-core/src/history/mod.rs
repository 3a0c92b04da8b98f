//! Engine memory accumulated over a session: rest/streak counters, pairwise
//! partner and opponent history, quartet usage and the social pair ratio.

pub mod counters;
pub mod pairwise;
pub mod quartet;
pub mod social;

pub use counters::{CounterLimits, CounterTable, PlayerCounters};
pub use pairwise::{PairKey, PairwiseHistory};
pub use quartet::{QuartetKey, QuartetMemory};
pub use social::SocialPairStats;

use crate::model::Team;

/// Match-derived history owned by one session.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    pub pairwise: PairwiseHistory,
    pub quartets: QuartetMemory,
    pub social: SocialPairStats,
}

impl SessionHistory {
    pub fn new(recent_window: usize, social: SocialPairStats) -> Self {
        Self {
            pairwise: PairwiseHistory::new(),
            quartets: QuartetMemory::new(recent_window),
            social,
        }
    }

    pub fn record_match(&mut self, winners: &Team, losers: &Team) {
        self.pairwise.record_match(winners, losers);
        self.social.record_match(winners, losers);
        if let Some(key) = QuartetKey::from_teams(winners, losers) {
            self.quartets.record_finished(&key);
        }
    }

    pub fn clear(&mut self) {
        self.pairwise.clear();
        self.quartets.clear();
        self.social.reset();
    }
}
