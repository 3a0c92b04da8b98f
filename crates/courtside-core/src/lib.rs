#![deny(warnings)]
pub mod history;
pub mod model;
pub mod persistence;
pub mod rotation;
pub mod session;

pub use model::{Court, Matchup, Player, PlayerId, Team};
pub use session::{Session, SessionError, SessionPhase};

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "courtside"
    }

    pub const fn codename() -> &'static str {
        "Court Rotation"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
