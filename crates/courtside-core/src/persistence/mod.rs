//! Boundary to the store that owns player records and match history.
//!
//! The engine applies results to its own state immediately and hands each
//! finished match to an [`Outbox`]. Flushing the outbox writes records to a
//! [`ResultStore`]; writes are idempotent per [`MatchKey`], so a record can be
//! retried until the store accepts it.

pub mod memory;
pub mod outbox;

pub use memory::MemoryStore;
pub use outbox::{FlushReport, Outbox};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Player, PlayerId, Team};

/// Identity of one match: which session, which court, which game on it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchKey {
    pub session_id: String,
    pub court_number: u32,
    pub sequence: u64,
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/court-{}/#{}", self.session_id, self.court_number, self.sequence)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub key: MatchKey,
    pub winners: Team,
    pub losers: Team,
}

impl MatchRecord {
    pub fn participants(&self) -> impl Iterator<Item = (&PlayerId, bool)> {
        self.winners
            .iter()
            .map(|id| (id, true))
            .chain(self.losers.iter().map(|id| (id, false)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    Applied,
    /// The key was already stored; nothing changed.
    AlreadyRecorded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("store temporarily unavailable: {message}")]
    Transient { message: String },
    #[error("store has no record for player {id}")]
    MissingPlayer { id: PlayerId },
    #[error("conflicting record already stored for {key}")]
    Conflict { key: MatchKey },
}

impl PersistenceError {
    /// Whether the same write may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PersistenceError::Transient { .. })
    }
}

/// Storage collaborator for player records and match results.
pub trait ResultStore {
    fn load_player(&self, id: &PlayerId) -> Option<Player>;

    /// Applies a match transactionally: both teams' records and the match row
    /// are written together or not at all.
    fn commit_match(&mut self, record: &MatchRecord) -> Result<CommitStatus, PersistenceError>;
}
