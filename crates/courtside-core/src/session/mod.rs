//! The event-driven session: start, finished matches, court and roster edits, end.

pub mod engine;
pub mod error;
pub mod snapshot;
pub mod state;
pub mod stats;

pub use engine::{MatchReport, Session, Slot, SlotRef};
pub use error::SessionError;
pub use snapshot::{CourtSnapshot, RestingSnapshot, SessionSnapshot};
pub use state::{InvariantViolation, Placement, SessionPhase, SessionState};
pub use stats::{HOT_STREAK, SessionStats, StatsBook, StatsRow};
