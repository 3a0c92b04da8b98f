use core::fmt;
use serde::{Deserialize, Serialize};

use super::player::Player;

/// Players with fewer games than this are shown as provisional.
pub const TIER_MIN_GAMES: u32 = 10;

/// Coarse skill band derived from a player's cumulative win rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillTier {
    Provisional,
    Developing,
    Steady,
    Solid,
    Strong,
    Elite,
    Dominant,
}

impl SkillTier {
    pub fn for_player(player: &Player) -> Self {
        if player.games_played() < TIER_MIN_GAMES {
            return SkillTier::Provisional;
        }
        Self::for_winrate(player.winrate())
    }

    pub fn for_winrate(winrate: f64) -> Self {
        match winrate {
            wr if wr < 0.40 => SkillTier::Developing,
            wr if wr < 0.50 => SkillTier::Steady,
            wr if wr < 0.60 => SkillTier::Solid,
            wr if wr < 0.70 => SkillTier::Strong,
            wr if wr < 0.80 => SkillTier::Elite,
            _ => SkillTier::Dominant,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SkillTier::Provisional => "provisional",
            SkillTier::Developing => "developing",
            SkillTier::Steady => "steady",
            SkillTier::Solid => "solid",
            SkillTier::Strong => "strong",
            SkillTier::Elite => "elite",
            SkillTier::Dominant => "dominant",
        }
    }
}

impl fmt::Display for SkillTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
