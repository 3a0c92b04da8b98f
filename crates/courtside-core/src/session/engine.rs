use std::collections::HashSet;
use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info, warn};

use super::error::SessionError;
use super::snapshot::SessionSnapshot;
use super::state::{InvariantViolation, Placement, SessionPhase, SessionState};
use super::stats::{StatsBook, StatsRow, build_rows};
use crate::history::{PlayerCounters, QuartetKey, SessionHistory, SocialPairStats};
use crate::model::{Court, Matchup, Player, PlayerId, Roster};
use crate::persistence::{FlushReport, MatchKey, MatchRecord, Outbox, ResultStore};
use crate::rotation::{
    CarryOverContext, PartitionContext, RotationConfig, SelectionContext, SocialBiasConfig,
    ValidationError, choose_best_pairing, choose_quartet, plan_carry_over, resolve_collisions,
};

/// A position a manual edit can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Court {
        court_index: usize,
        team: usize,
        position: usize,
    },
    Resting {
        index: usize,
    },
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Court {
                court_index,
                team,
                position,
            } => write!(f, "court {court_index} team {team} position {position}"),
            Slot::Resting { index } => write!(f, "resting position {index}"),
        }
    }
}

/// A slot together with the player the caller saw there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRef {
    pub slot: Slot,
    pub expected: PlayerId,
}

impl SlotRef {
    pub fn court(court_index: usize, team: usize, position: usize, expected: PlayerId) -> Self {
        Self {
            slot: Slot::Court {
                court_index,
                team,
                position,
            },
            expected,
        }
    }

    pub fn resting(index: usize, expected: PlayerId) -> Self {
        Self {
            slot: Slot::Resting { index },
            expected,
        }
    }
}

/// What a finished match changed.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchReport {
    pub record: MatchRecord,
    /// Finishers kept on the court for the next match; empty on the standard path.
    pub carried_over: Vec<PlayerId>,
    /// Numbers of courts that received a new quartet.
    pub refilled: Vec<u32>,
}

/// One social doubles session: courts, resting queue and all rotation history.
///
/// Every event runs to completion on `&mut self`. Randomness comes from one
/// seeded generator, so a session built with [`Session::with_seed`] replays
/// identically for the same sequence of events.
#[derive(Debug, Clone)]
pub struct Session {
    phase: SessionPhase,
    config: RotationConfig,
    seed: u64,
    rng: StdRng,
    roster: Roster,
    state: SessionState,
    history: SessionHistory,
    stats: StatsBook,
    outbox: Outbox,
    applied: HashSet<MatchKey>,
}

impl Session {
    pub fn new(config: RotationConfig) -> Result<Self, ValidationError> {
        Self::with_seed(config, rand::random())
    }

    pub fn with_seed(config: RotationConfig, seed: u64) -> Result<Self, ValidationError> {
        config.validate()?;
        let social = SocialPairStats::new(config.partition.social.as_ref().map(SocialBiasConfig::pair));
        let history = SessionHistory::new(config.selection.recent_window, social);
        Ok(Self {
            phase: SessionPhase::Setup,
            config,
            seed,
            rng: StdRng::seed_from_u64(seed),
            roster: Roster::new(),
            state: SessionState::default(),
            history,
            stats: StatsBook::new(),
            outbox: Outbox::new(),
            applied: HashSet::new(),
        })
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    pub fn session_id(&self) -> &str {
        self.state.session_id()
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn courts(&self) -> &[Court] {
        self.state.courts()
    }

    pub fn resting(&self) -> impl Iterator<Item = &PlayerId> {
        self.state.queue().iter()
    }

    pub fn sitting_out(&self) -> &[PlayerId] {
        self.state.sitting_out()
    }

    pub fn counters(&self, id: &PlayerId) -> PlayerCounters {
        self.state.counters().get(id)
    }

    pub fn pending_results(&self) -> usize {
        self.outbox.len()
    }

    pub fn stats_rows(&self) -> Vec<StatsRow> {
        build_rows(self.state.players(), &self.roster, &self.stats)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(self)
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.state.check_invariants(self.config.counter_limits())
    }

    /// Adds a player record to the local roster, keeping any record already known.
    pub fn register_player(&mut self, player: Player) {
        self.roster.register(player);
    }

    /// Loads a player's cumulative record from the store into the roster.
    pub fn register_from_store(&mut self, store: &dyn ResultStore, id: &PlayerId) -> bool {
        match store.load_player(id) {
            Some(player) => {
                self.roster.register(player);
                true
            }
            None => false,
        }
    }

    fn require(&self, expected: SessionPhase) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    /// Seats `court_count` quartets from the shuffled pool and queues everyone else.
    pub fn start_session(
        &mut self,
        selected: Vec<Player>,
        court_count: usize,
    ) -> Result<(), SessionError> {
        self.require(SessionPhase::Setup)?;
        if court_count == 0 {
            return Err(SessionError::InvalidCourtCount { count: court_count });
        }
        let mut ids: Vec<PlayerId> = Vec::with_capacity(selected.len());
        for player in &selected {
            if !player.id().is_empty() && !ids.contains(player.id()) {
                ids.push(player.id().clone());
            }
        }
        let needed = court_count * 4;
        if ids.len() < needed {
            return Err(SessionError::InsufficientPlayers {
                needed,
                available: ids.len(),
            });
        }

        for player in selected {
            self.roster.register(player);
        }
        let mut state = SessionState::new(format!("{:016x}", self.rng.next_u64()));
        state.players = ids.iter().cloned().collect();
        ids.shuffle(&mut self.rng);

        let mut seated = Vec::with_capacity(court_count);
        for chunk in ids.chunks_exact(4).take(court_count) {
            let players = [
                chunk[0].clone(),
                chunk[1].clone(),
                chunk[2].clone(),
                chunk[3].clone(),
            ];
            let matchup = self.pair_up(&players)?;
            seated.push((players, matchup));
        }

        let limits = self.config.counter_limits();
        for (number, (players, matchup)) in (1u32..).zip(seated) {
            for id in &players {
                state.counters.entry(id).seat_fresh(limits);
            }
            if let Some(key) = QuartetKey::new(players) {
                self.history.quartets.record_seated(&key);
            }
            state.courts.push(Court::with_matchup(number, matchup));
        }
        for id in &ids[needed..] {
            state.counters.entry(id).rest();
            state.queue.enqueue(id.clone());
        }

        info!(
            target: "courtside_core::session",
            session_id = %state.session_id,
            players = state.players.len(),
            courts = court_count,
            resting = state.queue.len(),
            "session started"
        );
        self.state = state;
        self.phase = SessionPhase::Active;
        Ok(())
    }

    /// Records the result on one court, then rotates players and refills courts.
    pub fn match_finished(
        &mut self,
        court_index: usize,
        winning_team: usize,
    ) -> Result<MatchReport, SessionError> {
        self.require(SessionPhase::Active)?;
        let courts = self.state.courts.len();
        let court = self
            .state
            .courts
            .get(court_index)
            .ok_or(SessionError::CourtOutOfRange {
                index: court_index,
                courts,
            })?;
        let matchup = court
            .matchup()
            .ok_or(SessionError::CourtEmpty { index: court_index })?;
        if winning_team > 1 {
            return Err(SessionError::InvalidTeam {
                index: winning_team,
            });
        }
        let court_number = court.number();
        let [first, second] = matchup.teams();
        let (winners, losers) = if winning_team == 0 {
            (first.clone(), second.clone())
        } else {
            (second.clone(), first.clone())
        };

        let sequence = self.state.next_sequence(court_number);
        let record = MatchRecord {
            key: MatchKey {
                session_id: self.state.session_id.clone(),
                court_number,
                sequence,
            },
            winners,
            losers,
        };
        self.apply_match_record(&record);
        self.outbox.push(record.clone());

        let [w0, w1] = record.winners.players().clone();
        let [l0, l1] = record.losers.players().clone();
        let finishers = [w0, w1, l0, l1];
        self.state.courts[court_index].take_matchup();
        if let Some(key) = QuartetKey::new(finishers.clone()) {
            self.state.last_court_group.insert(court_number, key);
        }

        let carried_over = self.try_carry_over(court_index, &finishers).unwrap_or_default();
        if carried_over.is_empty() {
            for id in &finishers {
                self.state.counters.entry(id).rest();
                self.state.queue.enqueue(id.clone());
            }
        }

        let refilled = self.refill_empty_courts();
        self.state.queue.tick_rest(&mut self.state.counters);

        debug!(
            target: "courtside_core::session",
            key = %record.key,
            carried = carried_over.len(),
            refilled = refilled.len(),
            resting = self.state.queue.len(),
            "match finished"
        );
        Ok(MatchReport {
            record,
            carried_over,
            refilled,
        })
    }

    /// Applies a result to records, stats and history once per match key.
    /// Returns false when the key was already applied.
    pub fn apply_match_record(&mut self, record: &MatchRecord) -> bool {
        if !self.applied.insert(record.key.clone()) {
            debug!(
                target: "courtside_core::session",
                key = %record.key,
                "ignoring replayed match result"
            );
            return false;
        }
        for (id, won) in record.participants() {
            self.roster.record_result(id, won);
            self.stats.record(id, won);
        }
        self.history.record_match(&record.winners, &record.losers);
        true
    }

    fn try_carry_over(&mut self, court_index: usize, finishers: &[PlayerId; 4]) -> Option<Vec<PlayerId>> {
        if !self
            .config
            .carry_over
            .gate_open(self.state.courts.len(), self.state.active_player_count())
        {
            return None;
        }
        let limits = self.config.counter_limits();
        let ctx = CarryOverContext {
            selection: SelectionContext {
                counters: &self.state.counters,
                limits,
                pairwise: &self.history.pairwise,
                quartets: &self.history.quartets,
                weights: &self.config.selection,
            },
            config: &self.config.carry_over,
        };
        let mut plan = plan_carry_over(finishers, &self.state.queue, &ctx, &mut self.rng)?;
        if let Err(err) =
            resolve_collisions(&mut plan, &self.state.queue, &self.state.counters, &mut self.rng)
        {
            warn!(
                target: "courtside_core::session",
                error = %err,
                "carry-over abandoned; resting all finishers"
            );
            return None;
        }
        let players = plan.players()?;
        let matchup = match self.pair_up(&players) {
            Ok(matchup) => matchup,
            Err(err) => {
                warn!(
                    target: "courtside_core::session",
                    error = %err,
                    "carry-over abandoned; resting all finishers"
                );
                return None;
            }
        };

        for id in &plan.departed {
            self.state.counters.entry(id).rest();
            self.state.queue.enqueue(id.clone());
        }
        for id in &plan.entrants {
            self.state.queue.remove(id);
            self.state.counters.entry(id).seat_fresh(limits);
        }
        for id in &plan.carried {
            self.state.counters.entry(id).carry_over(limits);
        }
        self.history.quartets.record_seated(&plan.key);
        self.state.courts[court_index].set_matchup(matchup);

        info!(
            target: "courtside_core::session",
            court = self.state.courts[court_index].number(),
            carried = ?plan.carried,
            entrants = ?plan.entrants,
            "carried players over"
        );
        Some(plan.carried)
    }

    fn refill_empty_courts(&mut self) -> Vec<u32> {
        let mut refilled = Vec::new();
        for index in 0..self.state.courts.len() {
            if !self.state.courts[index].is_empty() {
                continue;
            }
            let number = self.state.courts[index].number();
            let avoid = self.state.last_court_group.get(&number).cloned();
            match self.seat_quartet(index, avoid.as_ref()) {
                Ok(true) => refilled.push(number),
                Ok(false) => debug!(
                    target: "courtside_core::session",
                    court = number,
                    "court left empty; not enough resting players"
                ),
                Err(err) => warn!(
                    target: "courtside_core::session",
                    court = number,
                    error = %err,
                    "could not seat quartet"
                ),
            }
        }
        refilled
    }

    /// Draws four resting players onto an empty court. `Ok(false)` when the
    /// queue is too short.
    fn seat_quartet(&mut self, court_index: usize, avoid: Option<&QuartetKey>) -> Result<bool, SessionError> {
        let limits = self.config.counter_limits();
        let ctx = SelectionContext {
            counters: &self.state.counters,
            limits,
            pairwise: &self.history.pairwise,
            quartets: &self.history.quartets,
            weights: &self.config.selection,
        };
        let Some(pick) = choose_quartet(&self.state.queue, avoid, &ctx, &mut self.rng) else {
            return Ok(false);
        };
        let matchup = self.pair_up(&pick.players)?;
        for id in &pick.players {
            self.state.queue.remove(id);
            self.state.counters.entry(id).seat_fresh(limits);
        }
        self.history.quartets.record_seated(&pick.key);
        self.state.courts[court_index].set_matchup(matchup);
        Ok(true)
    }

    fn pair_up(&mut self, players: &[PlayerId; 4]) -> Result<Matchup, SessionError> {
        let ctx = PartitionContext {
            roster: &self.roster,
            pairwise: &self.history.pairwise,
            social: &self.history.social,
            weights: &self.config.partition,
        };
        choose_best_pairing(players, &ctx, &mut self.rng).ok_or_else(|| {
            let duplicate = players
                .iter()
                .enumerate()
                .find(|(i, id)| players[..*i].contains(id))
                .map(|(_, id)| id.clone())
                .unwrap_or_else(|| players[0].clone());
            SessionError::DuplicatePlayerInQuartet { id: duplicate }
        })
    }

    /// Opens a new court numbered after the highest existing one.
    pub fn add_court(&mut self) -> Result<u32, SessionError> {
        self.require(SessionPhase::Active)?;
        let available = self.state.queue.len();
        if available < 4 {
            return Err(SessionError::InsufficientPlayers {
                needed: 4,
                available,
            });
        }
        let number = self.state.next_court_number();
        self.state.courts.push(Court::new(number));
        let index = self.state.courts.len() - 1;
        match self.seat_quartet(index, None) {
            Ok(true) => {
                info!(target: "courtside_core::session", court = number, "court added");
                Ok(number)
            }
            Ok(false) => {
                self.state.courts.pop();
                Err(SessionError::InsufficientPlayers {
                    needed: 4,
                    available,
                })
            }
            Err(err) => {
                self.state.courts.pop();
                Err(err)
            }
        }
    }

    /// Removes a court; its players join the resting queue.
    pub fn delete_court(&mut self, court_index: usize) -> Result<Vec<PlayerId>, SessionError> {
        self.require(SessionPhase::Active)?;
        let courts = self.state.courts.len();
        if court_index >= courts {
            return Err(SessionError::CourtOutOfRange {
                index: court_index,
                courts,
            });
        }
        let mut court = self.state.courts.remove(court_index);
        self.state.last_court_group.remove(&court.number());
        let released: Vec<PlayerId> = court
            .take_matchup()
            .map(|matchup| matchup.players().cloned().collect())
            .unwrap_or_default();
        for id in &released {
            self.state.counters.entry(id).rest();
            self.state.queue.enqueue(id.clone());
        }
        info!(
            target: "courtside_core::session",
            court = court.number(),
            released = released.len(),
            "court deleted"
        );
        Ok(released)
    }

    /// Adds someone who arrived after the start to the back of the queue.
    pub fn add_late_player(&mut self, player: Player) -> Result<(), SessionError> {
        self.require(SessionPhase::Active)?;
        let id = player.id().clone();
        if self.state.players.contains(&id) {
            return Err(SessionError::PlayerAlreadyInSession { id });
        }
        if id.is_empty() {
            return Err(SessionError::UnknownPlayer { id });
        }
        self.roster.register(player);
        self.state.players.insert(id.clone());
        self.state.counters.entry(&id).rest();
        self.state.queue.enqueue(id.clone());
        debug!(target: "courtside_core::session", player = %id, "late player queued");
        Ok(())
    }

    /// Takes a player out of rotation. A player on court is replaced by
    /// `replacement` (which must be resting) or by the fairest resting player.
    /// Returns who took their place, if anyone.
    pub fn sit_out(
        &mut self,
        id: &PlayerId,
        replacement: Option<&PlayerId>,
    ) -> Result<Option<PlayerId>, SessionError> {
        self.require(SessionPhase::Active)?;
        let placement = self
            .state
            .locate(id)
            .ok_or_else(|| SessionError::UnknownPlayer { id: id.clone() })?;

        match placement {
            Placement::SittingOut => Ok(None),
            Placement::Resting { .. } => {
                self.state.queue.remove(id);
                self.state.counters.entry(id).rest();
                self.state.sitting_out.push(id.clone());
                debug!(target: "courtside_core::session", player = %id, "resting player sat out");
                Ok(None)
            }
            Placement::Court {
                court_index,
                team,
                position,
            } => {
                let incoming = match replacement {
                    Some(chosen) => {
                        if !self.state.queue.remove(chosen) {
                            return Err(SessionError::StaleReference {
                                location: "resting queue".to_string(),
                                expected: chosen.clone(),
                            });
                        }
                        chosen.clone()
                    }
                    None => self
                        .state
                        .queue
                        .dequeue_fair(1, &[], &self.state.counters, &mut self.rng)
                        .pop()
                        .ok_or(SessionError::InsufficientPlayers {
                            needed: 1,
                            available: 0,
                        })?,
                };

                let replaced = self
                    .state
                    .courts
                    .get_mut(court_index)
                    .and_then(Court::matchup_mut)
                    .and_then(|matchup| matchup.replace_at(team, position, incoming.clone()));
                if replaced.is_none() {
                    self.state.queue.enqueue(incoming.clone());
                    return Err(SessionError::DuplicatePlayerInQuartet { id: incoming });
                }

                let limits = self.config.counter_limits();
                self.state.counters.entry(&incoming).seat_fresh(limits);
                self.state.counters.entry(id).rest();
                self.state.sitting_out.push(id.clone());
                debug!(
                    target: "courtside_core::session",
                    player = %id,
                    replacement = %incoming,
                    "playing player sat out"
                );
                Ok(Some(incoming))
            }
        }
    }

    /// Returns sitting-out players to the resting queue. Fails without
    /// changes if any of them is not sitting out.
    pub fn restore(&mut self, ids: &[PlayerId]) -> Result<(), SessionError> {
        self.require(SessionPhase::Active)?;
        for id in ids {
            if !self.state.is_sitting_out(id) {
                return Err(SessionError::NotSittingOut { id: id.clone() });
            }
        }
        for id in ids {
            self.state.sitting_out.retain(|out| out != id);
            self.state.counters.entry(id).rest();
            self.state.queue.enqueue(id.clone());
        }
        debug!(target: "courtside_core::session", restored = ids.len(), "players restored");
        Ok(())
    }

    /// Swaps the players in two slots after checking each still holds the
    /// player the caller expects.
    pub fn manual_swap(&mut self, a: SlotRef, b: SlotRef) -> Result<(), SessionError> {
        self.require(SessionPhase::Active)?;
        self.verify_slot(&a)?;
        self.verify_slot(&b)?;
        if a.slot == b.slot {
            return Ok(());
        }

        match (a.slot, b.slot) {
            (
                Slot::Court {
                    court_index: ca,
                    team: ta,
                    position: pa,
                },
                Slot::Court {
                    court_index: cb,
                    team: tb,
                    position: pb,
                },
            ) => {
                if ca == cb {
                    let matchup = self.court_matchup_mut(ca)?;
                    if !matchup.swap_slots((ta, pa), (tb, pb)) {
                        return Err(stale(&b));
                    }
                } else {
                    self.court_matchup_mut(ca)?
                        .replace_at(ta, pa, b.expected.clone())
                        .ok_or_else(|| stale(&b))?;
                    self.court_matchup_mut(cb)?
                        .replace_at(tb, pb, a.expected.clone())
                        .ok_or_else(|| stale(&a))?;
                }
            }
            (
                Slot::Court {
                    court_index,
                    team,
                    position,
                },
                Slot::Resting { index },
            ) => self.swap_with_resting((court_index, team, position), &a.expected, index, &b.expected)?,
            (
                Slot::Resting { index },
                Slot::Court {
                    court_index,
                    team,
                    position,
                },
            ) => self.swap_with_resting((court_index, team, position), &b.expected, index, &a.expected)?,
            (Slot::Resting { index: ia }, Slot::Resting { index: ib }) => {
                self.state.queue.swap(ia, ib);
            }
        }
        debug!(
            target: "courtside_core::session",
            a = %a.slot,
            b = %b.slot,
            "manual swap applied"
        );
        Ok(())
    }

    fn swap_with_resting(
        &mut self,
        court: (usize, usize, usize),
        on_court: &PlayerId,
        index: usize,
        resting: &PlayerId,
    ) -> Result<(), SessionError> {
        let (court_index, team, position) = court;
        self.court_matchup_mut(court_index)?
            .replace_at(team, position, resting.clone())
            .ok_or_else(|| SessionError::DuplicatePlayerInQuartet { id: resting.clone() })?;
        if self.state.queue.replace_at(index, on_court.clone()).is_none() {
            self.court_matchup_mut(court_index)?
                .replace_at(team, position, on_court.clone());
            return Err(SessionError::DuplicatePlayerInQuartet {
                id: on_court.clone(),
            });
        }
        let limits = self.config.counter_limits();
        self.state.counters.entry(on_court).rest();
        self.state.counters.entry(resting).seat_fresh(limits);
        Ok(())
    }

    fn player_in_slot(&self, slot: Slot) -> Result<Option<&PlayerId>, SessionError> {
        match slot {
            Slot::Court {
                court_index,
                team,
                position,
            } => {
                let court = self
                    .state
                    .courts
                    .get(court_index)
                    .ok_or(SessionError::CourtOutOfRange {
                        index: court_index,
                        courts: self.state.courts.len(),
                    })?;
                Ok(court.matchup().and_then(|m| m.player_at(team, position)))
            }
            Slot::Resting { index } => Ok(self.state.queue.get(index)),
        }
    }

    fn verify_slot(&self, slot_ref: &SlotRef) -> Result<(), SessionError> {
        match self.player_in_slot(slot_ref.slot)? {
            Some(found) if *found == slot_ref.expected => Ok(()),
            _ => Err(stale(slot_ref)),
        }
    }

    fn court_matchup_mut(&mut self, court_index: usize) -> Result<&mut Matchup, SessionError> {
        let courts = self.state.courts.len();
        self.state
            .courts
            .get_mut(court_index)
            .ok_or(SessionError::CourtOutOfRange {
                index: court_index,
                courts,
            })?
            .matchup_mut()
            .ok_or(SessionError::CourtEmpty { index: court_index })
    }

    /// Writes pending results to `store`. Failed writes stay queued.
    pub fn flush_results(&mut self, store: &mut dyn ResultStore) -> FlushReport {
        let report = self.outbox.flush(store);
        if !report.is_clean() {
            warn!(
                target: "courtside_core::session",
                committed = report.committed,
                retained = report.retained,
                rejected = report.rejected.len(),
                "some match results were not persisted"
            );
        }
        report
    }

    /// Ends the session for good, clearing courts, queues, counters and
    /// history. Returns results that were never flushed.
    pub fn end_session(&mut self) -> Result<Vec<MatchRecord>, SessionError> {
        if self.phase == SessionPhase::Ended {
            return Err(SessionError::InvalidPhase {
                expected: SessionPhase::Active,
                actual: self.phase,
            });
        }
        let session_id = std::mem::take(&mut self.state.session_id);
        self.state.clear();
        self.history.clear();
        self.stats.clear();
        self.applied.clear();
        let unsent = self.outbox.drain();
        self.phase = SessionPhase::Ended;
        info!(
            target: "courtside_core::session",
            session_id = %session_id,
            unsent = unsent.len(),
            "session ended"
        );
        Ok(unsent)
    }
}

fn stale(slot_ref: &SlotRef) -> SessionError {
    SessionError::StaleReference {
        location: slot_ref.slot.to_string(),
        expected: slot_ref.expected.clone(),
    }
}
