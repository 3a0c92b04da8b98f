use courtside_core::model::{Player, PlayerId};
use courtside_core::rotation::RotationConfig;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_STRENGTH: f64 = 0.5;
const DEFAULT_FLUSH_EVERY: usize = 1;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root simulation configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SimulationConfig {
    pub run_id: String,
    pub session: SessionConfig,
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: SimulationConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.session.validate()?;
        self.rotation.validate()?;
        self.persistence.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();

        let mut known: HashSet<PlayerId> = self
            .session
            .roster()
            .iter()
            .map(|spec| PlayerId::new(&spec.name))
            .collect();
        self.events.validate(self.session.matches, &mut known)?;
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
            plots_dir: resolve_template(&self.run_id, &self.outputs.plots_dir),
        }
    }
}

/// Session shape: courts, players and how many matches to play.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SessionConfig {
    pub seed: Option<u64>,
    pub courts: usize,
    pub matches: usize,
    #[serde(default)]
    pub players: Vec<PlayerSpec>,
    /// Extra anonymous players appended after `players`.
    #[serde(default)]
    pub generated_players: usize,
}

impl SessionConfig {
    /// Named players followed by generated ones.
    pub fn roster(&self) -> Vec<PlayerSpec> {
        let mut roster = self.players.clone();
        for index in 0..self.generated_players {
            roster.push(PlayerSpec {
                name: format!("Player {:02}", index + 1),
                strength: 0.35 + 0.075 * (index % 5) as f64,
                wins: 0,
                losses: 0,
            });
        }
        roster
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.courts == 0 {
            return Err(ValidationError::field(
                "session.courts",
                "at least one court is required",
            ));
        }

        if self.matches == 0 {
            return Err(ValidationError::field(
                "session.matches",
                "number of matches must be greater than zero",
            ));
        }

        let roster = self.roster();
        let needed = self.courts * 4;
        if roster.len() < needed {
            return Err(ValidationError::field(
                "session.players",
                format!(
                    "{} court(s) need {needed} players but only {} are configured",
                    self.courts,
                    roster.len()
                ),
            ));
        }

        let mut seen = HashSet::new();
        for spec in &roster {
            spec.validate("session.players")?;
            if !seen.insert(PlayerId::new(&spec.name)) {
                return Err(ValidationError::field(
                    "session.players",
                    format!("player '{}' defined more than once", spec.name),
                ));
            }
        }
        Ok(())
    }
}

/// A simulated player. `strength` drives who wins a simulated match.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlayerSpec {
    pub name: String,
    #[serde(default = "default_strength")]
    pub strength: f64,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
}

impl PlayerSpec {
    pub fn to_player(&self) -> Player {
        Player::with_record(&self.name, self.wins, self.losses)
    }

    fn validate(&self, field: &str) -> Result<(), ValidationError> {
        if PlayerId::new(&self.name).is_empty() {
            return Err(ValidationError::field(field, "player name must not be empty"));
        }
        if !self.strength.is_finite() || self.strength <= 0.0 {
            return Err(ValidationError::field(
                field,
                format!("strength of '{}' must be a positive number", self.name),
            ));
        }
        Ok(())
    }
}

fn default_strength() -> f64 {
    DEFAULT_STRENGTH
}

/// Roster changes replayed at fixed points of the run.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct EventsConfig {
    #[serde(default)]
    pub late_arrivals: Vec<LateArrival>,
    #[serde(default)]
    pub sit_outs: Vec<RosterEvent>,
    #[serde(default)]
    pub restores: Vec<RosterEvent>,
}

impl EventsConfig {
    fn validate(&self, matches: usize, known: &mut HashSet<PlayerId>) -> Result<(), ValidationError> {
        for arrival in &self.late_arrivals {
            check_after_match("events.late_arrivals", arrival.after_match, matches)?;
            arrival.player.validate("events.late_arrivals")?;
            if !known.insert(PlayerId::new(&arrival.player.name)) {
                return Err(ValidationError::field(
                    "events.late_arrivals",
                    format!("player '{}' is already in the session", arrival.player.name),
                ));
            }
        }

        for (label, events) in [
            ("events.sit_outs", &self.sit_outs),
            ("events.restores", &self.restores),
        ] {
            for event in events {
                check_after_match(label, event.after_match, matches)?;
                if !known.contains(&PlayerId::new(&event.player)) {
                    return Err(ValidationError::field(
                        label,
                        format!("unknown player '{}'", event.player),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn check_after_match(field: &str, after_match: usize, matches: usize) -> Result<(), ValidationError> {
    if after_match >= matches {
        return Err(ValidationError::field(
            field,
            format!("after_match {after_match} is beyond the last match ({matches})"),
        ));
    }
    Ok(())
}

/// Events fire once `after_match` matches have finished.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LateArrival {
    pub after_match: usize,
    #[serde(flatten)]
    pub player: PlayerSpec,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RosterEvent {
    pub after_match: usize,
    pub player: String,
}

/// Behaviour of the in-memory result store.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PersistenceConfig {
    /// Every `n`th commit fails transiently; `None` never fails.
    #[serde(default)]
    pub failure_every: Option<u64>,
    #[serde(default = "default_flush_every")]
    pub flush_every: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            failure_every: None,
            flush_every: DEFAULT_FLUSH_EVERY,
        }
    }
}

impl PersistenceConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if matches!(self.failure_every, Some(n) if n < 2) {
            return Err(ValidationError::field(
                "persistence.failure_every",
                "must be at least 2 so retries can make progress",
            ));
        }
        if self.flush_every == 0 {
            return Err(ValidationError::field(
                "persistence.flush_every",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

fn default_flush_every() -> usize {
    DEFAULT_FLUSH_EVERY
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
    pub plots_dir: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
            ("outputs.plots_dir", &self.plots_dir),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::field(label, "path must not be empty"));
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::field(label, "resolved path is invalid"));
            }
        }
        Ok(())
    }
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::field("run_id", "run_id must not be empty"));
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::field(
            "run_id",
            "run_id may only contain alphanumeric characters, '.', '_' or '-'",
        ));
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
    pub plots_dir: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
    #[error("rotation.{0}")]
    Rotation(#[from] courtside_core::rotation::ValidationError),
}

impl ValidationError {
    fn field(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
