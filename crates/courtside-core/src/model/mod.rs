pub mod court;
pub mod player;
pub mod roster;
pub mod skill;

pub use court::{Court, CourtState, Matchup, Team};
pub use player::{Player, PlayerId};
pub use roster::Roster;
pub use skill::SkillTier;
