use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::history::CounterLimits;
use crate::model::PlayerId;

/// Smallest and largest candidate window the quartet selector will enumerate.
pub const MIN_CANDIDATE_WINDOW: usize = 8;
pub const MAX_CANDIDATE_WINDOW: usize = 10;

/// Every tunable weight and limit of the rotation engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    pub limits: LimitsConfig,
    pub selection: SelectionWeights,
    pub partition: PartitionWeights,
    pub carry_over: CarryOverConfig,
}

impl RotationConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.limits.validate()?;
        self.selection.validate()?;
        self.partition.validate()?;
        self.carry_over.validate()?;
        Ok(())
    }

    pub fn counter_limits(&self) -> CounterLimits {
        CounterLimits {
            max_consecutive_games: self.limits.max_consecutive_games,
            max_consecutive_stays: self.limits.max_consecutive_stays,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_consecutive_games: u32,
    pub max_consecutive_stays: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = CounterLimits::default();
        Self {
            max_consecutive_games: limits.max_consecutive_games,
            max_consecutive_stays: limits.max_consecutive_stays,
        }
    }
}

impl LimitsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.max_consecutive_games == 0 {
            return Err(ValidationError::field(
                "limits.max_consecutive_games",
                "must allow at least one game",
            ));
        }
        Ok(())
    }
}

/// Weights used when scoring candidate groups drawn from the resting queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionWeights {
    /// Number of longest-resting players enumerated (clamped to 8..=10).
    pub candidate_window: usize,
    pub rest_weight: f64,
    /// Reward per pair inside the group that has never been on opposite sides.
    pub diversity_weight: f64,
    /// Penalty per previous use of exactly this quartet.
    pub repeat_weight: f64,
    /// Extra penalty for quartets still in the recent window.
    pub recent_penalty: f64,
    pub recent_window: usize,
}

impl Default for SelectionWeights {
    fn default() -> Self {
        Self {
            candidate_window: MIN_CANDIDATE_WINDOW,
            rest_weight: 1.0,
            diversity_weight: 0.5,
            repeat_weight: 0.75,
            recent_penalty: 50.0,
            recent_window: 6,
        }
    }
}

impl SelectionWeights {
    pub fn window(&self) -> usize {
        self.candidate_window
            .clamp(MIN_CANDIDATE_WINDOW, MAX_CANDIDATE_WINDOW)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_CANDIDATE_WINDOW..=MAX_CANDIDATE_WINDOW).contains(&self.candidate_window) {
            return Err(ValidationError::field(
                "selection.candidate_window",
                format!("must be between {MIN_CANDIDATE_WINDOW} and {MAX_CANDIDATE_WINDOW}"),
            ));
        }
        for (label, value) in [
            ("selection.rest_weight", self.rest_weight),
            ("selection.diversity_weight", self.diversity_weight),
            ("selection.repeat_weight", self.repeat_weight),
            ("selection.recent_penalty", self.recent_penalty),
        ] {
            ensure_non_negative(label, value)?;
        }
        Ok(())
    }
}

/// Cost weights for splitting a quartet into two teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionWeights {
    /// Weight on how often each team's pair has partnered before.
    pub partner_weight: f64,
    /// Weight on how often cross-team pairs have faced each other.
    pub opponent_weight: f64,
    /// Below this many games a player is rated `neutral_rating`.
    pub rating_min_games: u32,
    pub neutral_rating: f64,
    pub high_performer_min_games: u32,
    pub high_performer_winrate: f64,
    pub social: Option<SocialBiasConfig>,
}

impl Default for PartitionWeights {
    fn default() -> Self {
        Self {
            partner_weight: 1.0,
            opponent_weight: 0.5,
            rating_min_games: 10,
            neutral_rating: 0.5,
            high_performer_min_games: 10,
            high_performer_winrate: 0.65,
            social: None,
        }
    }
}

impl PartitionWeights {
    fn validate(&self) -> Result<(), ValidationError> {
        ensure_non_negative("partition.partner_weight", self.partner_weight)?;
        ensure_non_negative("partition.opponent_weight", self.opponent_weight)?;
        ensure_unit("partition.neutral_rating", self.neutral_rating)?;
        ensure_unit("partition.high_performer_winrate", self.high_performer_winrate)?;
        if let Some(social) = &self.social {
            social.validate()?;
        }
        Ok(())
    }
}

/// Nudges one named pair toward a target share of matches as teammates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialBiasConfig {
    pub players: [String; 2],
    #[serde(default = "default_desired_ratio")]
    pub desired_ratio: f64,
    #[serde(default = "default_social_weight")]
    pub weight: f64,
}

impl SocialBiasConfig {
    pub fn new(first: &str, second: &str) -> Self {
        Self {
            players: [first.to_string(), second.to_string()],
            desired_ratio: default_desired_ratio(),
            weight: default_social_weight(),
        }
    }

    pub fn pair(&self) -> (PlayerId, PlayerId) {
        (PlayerId::new(&self.players[0]), PlayerId::new(&self.players[1]))
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let (a, b) = self.pair();
        if a.is_empty() || b.is_empty() || a == b {
            return Err(ValidationError::field(
                "partition.social.players",
                "needs two distinct, non-empty names",
            ));
        }
        ensure_unit("partition.social.desired_ratio", self.desired_ratio)?;
        ensure_non_negative("partition.social.weight", self.weight)
    }
}

fn default_desired_ratio() -> f64 {
    0.60
}

fn default_social_weight() -> f64 {
    2.0
}

/// Gating and search parameters for keeping finishers on court.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarryOverConfig {
    pub enabled: bool,
    /// Carry-over only runs when exactly this many courts are active.
    pub required_courts: usize,
    /// ... and the active session has at most this many players.
    pub max_session_players: usize,
    pub min_carry: usize,
    pub max_carry: usize,
    /// Longest-resting players considered for the open spots.
    pub candidate_pool: usize,
}

impl Default for CarryOverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            required_courts: 2,
            max_session_players: 12,
            min_carry: 1,
            max_carry: 2,
            candidate_pool: 8,
        }
    }
}

impl CarryOverConfig {
    pub fn gate_open(&self, active_courts: usize, session_players: usize) -> bool {
        self.enabled
            && active_courts == self.required_courts
            && session_players <= self.max_session_players
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.min_carry == 0 || self.min_carry > self.max_carry {
            return Err(ValidationError::field(
                "carry_over.min_carry",
                "must be at least 1 and not exceed max_carry",
            ));
        }
        if self.max_carry > 2 {
            return Err(ValidationError::field(
                "carry_over.max_carry",
                "at most 2 finishers can stay on court",
            ));
        }
        if self.candidate_pool < 4 {
            return Err(ValidationError::field(
                "carry_over.candidate_pool",
                "must be at least 4",
            ));
        }
        Ok(())
    }
}

fn ensure_non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::field(field, "must be a finite, non-negative number"))
    }
}

fn ensure_unit(field: &str, value: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::field(field, "must be between 0 and 1"))
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

impl ValidationError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
