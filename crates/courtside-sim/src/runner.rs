use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use courtside_core::model::{Player, PlayerId, Team};
use courtside_core::persistence::{FlushReport, MemoryStore};
use courtside_core::rotation::ValidationError as RotationValidationError;
use courtside_core::session::{MatchReport, Session, SessionError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{PlayerSpec, ResolvedOutputs, SimulationConfig};
use crate::logging::telemetry_path;

const MAX_FINAL_FLUSH_ATTEMPTS: usize = 16;

/// Drives one seeded session through the configured number of matches.
pub struct SimulationRunner {
    config: SimulationConfig,
    outputs: ResolvedOutputs,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub matches_played: usize,
    pub rows_written: usize,
    pub carry_overs: usize,
    pub committed: usize,
    /// Results still in the outbox when the session ended.
    pub unsent: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub plot_path: Option<PathBuf>,
    pub telemetry_path: Option<PathBuf>,
}

/// One JSONL line per finished match.
#[derive(Debug, Serialize)]
struct MatchLogRow<'a> {
    run_id: &'a str,
    session_id: &'a str,
    match_index: usize,
    match_key: String,
    court_number: u32,
    sequence: u64,
    winners: &'a [PlayerId; 2],
    losers: &'a [PlayerId; 2],
    carried_over: &'a [PlayerId],
    refilled: &'a [u32],
    resting: Vec<&'a PlayerId>,
    sitting_out: &'a [PlayerId],
    pending_results: usize,
}

impl SimulationRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: SimulationConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        config.rotation.validate()?;
        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
        })
    }

    /// Play the session, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;
        if !self.outputs.plots_dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.outputs.plots_dir)?;
        }

        let run_id = self.config.run_id.as_str();
        let seed = self.config.session.seed.unwrap_or(0);
        let roster = self.config.session.roster();

        let mut strengths: HashMap<PlayerId, f64> = HashMap::new();
        let mut store = MemoryStore::new();
        let mut analytics = AnalyticsCollector::new(run_id);
        for spec in &roster {
            self.admit(spec, &mut strengths, &mut store, &mut analytics);
        }
        store.fail_every(self.config.persistence.failure_every);

        let mut session = Session::with_seed(self.config.rotation.clone(), seed)?;
        let players: Vec<Player> = roster.iter().map(PlayerSpec::to_player).collect();
        session.start_session(players, self.config.session.courts)?;
        info!(
            target: "courtside_sim",
            run_id,
            session_id = session.session_id(),
            seed,
            "simulation started"
        );

        let mut outcomes = StdRng::seed_from_u64(seed.wrapping_add(1));
        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rows_written = 0usize;
        let mut committed = 0usize;

        for match_index in 0..self.config.session.matches {
            self.apply_events(match_index, &mut session, &mut strengths, &mut store, &mut analytics)?;

            if session.state().occupied_court_count() == 0 {
                return Err(RunnerError::Stalled { match_index });
            }
            let occupied: Vec<usize> = session
                .courts()
                .iter()
                .enumerate()
                .filter(|(_, court)| !court.is_empty())
                .map(|(index, _)| index)
                .collect();
            let court_index = occupied[outcomes.gen_range(0..occupied.len())];
            let winning_team = pick_winner(&session, court_index, &strengths, &mut outcomes);

            let report = session.match_finished(court_index, winning_team)?;
            session
                .check_invariants()
                .map_err(|violation| RunnerError::Invariant {
                    match_index,
                    message: violation.to_string(),
                })?;
            analytics.record_match(&report, &session)?;
            write_match_row(&mut writer, run_id, match_index, &report, &session)?;
            rows_written += 1;

            if (match_index + 1) % self.config.persistence.flush_every == 0 {
                committed += note_flush(session.flush_results(&mut store));
            }
        }

        writer.flush()?;

        for _ in 0..MAX_FINAL_FLUSH_ATTEMPTS {
            if session.pending_results() == 0 {
                break;
            }
            committed += note_flush(session.flush_results(&mut store));
        }

        let unsent = session.end_session()?.len();
        if unsent > 0 {
            warn!(target: "courtside_sim", unsent, "session ended with unsent results");
        }

        let summary = analytics.finalize();
        summary.write_markdown(&self.outputs.summary_md)?;
        let plot_path = match summary.render_plot(&self.outputs.plots_dir) {
            Ok(path) => Some(path),
            Err(err) => {
                eprintln!("WARN: {}", err);
                None
            }
        };

        let telemetry_path = if self.logging_enabled {
            Some(telemetry_path(&self.outputs))
        } else {
            None
        };

        Ok(RunSummary {
            matches_played: summary.matches,
            rows_written,
            carry_overs: summary.carry_overs,
            committed,
            unsent,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            plot_path,
            telemetry_path,
        })
    }

    fn admit(
        &self,
        spec: &PlayerSpec,
        strengths: &mut HashMap<PlayerId, f64>,
        store: &mut MemoryStore,
        analytics: &mut AnalyticsCollector,
    ) -> Player {
        let player = spec.to_player();
        strengths.insert(player.id().clone(), spec.strength);
        store.insert_player(player.clone());
        analytics.register(&player);
        player
    }

    fn apply_events(
        &self,
        match_index: usize,
        session: &mut Session,
        strengths: &mut HashMap<PlayerId, f64>,
        store: &mut MemoryStore,
        analytics: &mut AnalyticsCollector,
    ) -> Result<(), RunnerError> {
        let events = &self.config.events;

        for arrival in events.late_arrivals.iter().filter(|e| e.after_match == match_index) {
            let player = self.admit(&arrival.player, strengths, store, analytics);
            session.add_late_player(player)?;
        }

        for event in events.sit_outs.iter().filter(|e| e.after_match == match_index) {
            let id = PlayerId::new(&event.player);
            match session.sit_out(&id, None) {
                Ok(replacement) => info!(
                    target: "courtside_sim",
                    player = %id,
                    replacement = ?replacement.as_ref().map(PlayerId::as_str),
                    "player sat out"
                ),
                Err(err) => warn!(target: "courtside_sim", player = %id, error = %err, "sit-out skipped"),
            }
        }

        for event in events.restores.iter().filter(|e| e.after_match == match_index) {
            let id = PlayerId::new(&event.player);
            if let Err(err) = session.restore(std::slice::from_ref(&id)) {
                warn!(target: "courtside_sim", player = %id, error = %err, "restore skipped");
            }
        }
        Ok(())
    }
}

/// Team 0 wins with probability proportional to its combined strength.
fn pick_winner(
    session: &Session,
    court_index: usize,
    strengths: &HashMap<PlayerId, f64>,
    rng: &mut StdRng,
) -> usize {
    let Some(matchup) = session.courts().get(court_index).and_then(|court| court.matchup()) else {
        return 0;
    };
    let [first, second] = matchup.teams();
    let strength = |team: &Team| -> f64 {
        team.iter()
            .map(|id| strengths.get(id).copied().unwrap_or(0.5))
            .sum()
    };
    let (a, b) = (strength(first), strength(second));
    let p_first = if a + b > 0.0 { a / (a + b) } else { 0.5 };
    if rng.gen_bool(p_first.clamp(0.0, 1.0)) { 0 } else { 1 }
}

fn note_flush(report: FlushReport) -> usize {
    for (record, error) in &report.rejected {
        warn!(target: "courtside_sim", key = %record.key, error = %error, "result rejected by store");
    }
    report.committed
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_match_row(
    writer: &mut BufWriter<File>,
    run_id: &str,
    match_index: usize,
    report: &MatchReport,
    session: &Session,
) -> Result<(), RunnerError> {
    let key = &report.record.key;
    let row = MatchLogRow {
        run_id,
        session_id: session.session_id(),
        match_index,
        match_key: key.to_string(),
        court_number: key.court_number,
        sequence: key.sequence,
        winners: report.record.winners.players(),
        losers: report.record.losers.players(),
        carried_over: &report.carried_over,
        refilled: &report.refilled,
        resting: session.resting().collect(),
        sitting_out: session.sitting_out(),
        pending_results: session.pending_results(),
    };
    serde_json::to_writer(&mut *writer, &row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("invalid rotation configuration: {0}")]
    Rotation(#[from] RotationValidationError),
    #[error("session rejected an event: {0}")]
    Session(#[from] SessionError),
    #[error("no court was in play before match {match_index}")]
    Stalled { match_index: usize },
    #[error("invariant broken after match {match_index}: {message}")]
    Invariant { match_index: usize, message: String },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}
