use thiserror::Error;

use super::state::SessionPhase;
use crate::model::PlayerId;

/// Failures returned by session events. An event that fails leaves the
/// session exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("need {needed} players but only {available} are available")]
    InsufficientPlayers { needed: usize, available: usize },
    #[error("player {id} would appear twice in one quartet")]
    DuplicatePlayerInQuartet { id: PlayerId },
    #[error("{location} no longer holds {expected}")]
    StaleReference { location: String, expected: PlayerId },
    #[error("operation requires a {expected} session but it is {actual}")]
    InvalidPhase {
        expected: SessionPhase,
        actual: SessionPhase,
    },
    #[error("court index {index} is out of range ({courts} courts)")]
    CourtOutOfRange { index: usize, courts: usize },
    #[error("court index {index} has no match in progress")]
    CourtEmpty { index: usize },
    #[error("team index {index} is invalid; expected 0 or 1")]
    InvalidTeam { index: usize },
    #[error("unknown player {id}")]
    UnknownPlayer { id: PlayerId },
    #[error("player {id} is already in the session")]
    PlayerAlreadyInSession { id: PlayerId },
    #[error("player {id} is not sitting out")]
    NotSittingOut { id: PlayerId },
    #[error("court count must be at least 1, got {count}")]
    InvalidCourtCount { count: usize },
}
