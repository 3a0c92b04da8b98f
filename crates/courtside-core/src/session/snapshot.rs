use serde::{Deserialize, Serialize};

use super::engine::Session;
use super::state::SessionPhase;
use super::stats::StatsRow;
use crate::model::{Court, PlayerId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourtSnapshot {
    pub number: u32,
    /// Two teams of two, or `None` for an empty court.
    pub teams: Option<[[PlayerId; 2]; 2]>,
}

impl CourtSnapshot {
    fn capture(court: &Court) -> Self {
        CourtSnapshot {
            number: court.number(),
            teams: court.matchup().map(|matchup| {
                let [first, second] = matchup.teams();
                [first.players().clone(), second.players().clone()]
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestingSnapshot {
    pub player_id: PlayerId,
    pub rest_count: u32,
}

/// Everything a display needs about a session at one moment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub phase: SessionPhase,
    pub seed: u64,
    pub courts: Vec<CourtSnapshot>,
    pub resting: Vec<RestingSnapshot>,
    pub sitting_out: Vec<PlayerId>,
    pub stats: Vec<StatsRow>,
    #[serde(default)]
    pub pending_results: usize,
}

impl SessionSnapshot {
    pub fn capture(session: &Session) -> Self {
        SessionSnapshot {
            session_id: session.session_id().to_string(),
            phase: session.phase(),
            seed: session.seed(),
            courts: session.courts().iter().map(CourtSnapshot::capture).collect(),
            resting: session
                .resting()
                .map(|id| RestingSnapshot {
                    player_id: id.clone(),
                    rest_count: session.counters(id).rest_count,
                })
                .collect(),
            sitting_out: session.sitting_out().to_vec(),
            stats: session.stats_rows(),
            pending_results: session.pending_results(),
        }
    }

    pub fn to_json(session: &Session) -> serde_json::Result<String> {
        let snapshot = Self::capture(session);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
