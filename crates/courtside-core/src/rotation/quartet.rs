use rand::Rng;
use tracing::debug;

use super::choose_index_combinations;
use super::config::SelectionWeights;
use super::queue::RestingQueue;
use crate::history::{CounterLimits, CounterTable, PairwiseHistory, QuartetKey, QuartetMemory};
use crate::model::PlayerId;

/// Read-only view of the history the selector scores against.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    pub counters: &'a CounterTable,
    pub limits: CounterLimits,
    pub pairwise: &'a PairwiseHistory,
    pub quartets: &'a QuartetMemory,
    pub weights: &'a SelectionWeights,
}

/// How far the constraints had to be relaxed to find a quartet.
///
/// Dropping the recent-window penalty never changes which quartets are
/// admissible, so it happens together with the last-quartet relaxation
/// rather than as a stage of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStage {
    /// No avoid-set match and no last-quartet repeat; recent-window quartets
    /// carry the recent penalty.
    Strict,
    /// Last-quartet repeats admitted and the recent penalty dropped. The
    /// avoid set is still rejected.
    Relaxed,
    /// Longest-resting four, with at most one swap to break an avoid-set match.
    Fallback,
}

impl SelectionStage {
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionStage::Strict => "strict",
            SelectionStage::Relaxed => "relaxed",
            SelectionStage::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuartetPick {
    pub players: [PlayerId; 4],
    pub key: QuartetKey,
    pub score: f64,
    pub stage: SelectionStage,
}

/// Number of pairs in `group` that have never been on opposite sides.
pub fn zero_history_pairs(group: &[PlayerId], pairwise: &PairwiseHistory) -> usize {
    let mut count = 0;
    for (i, a) in group.iter().enumerate() {
        for b in &group[i + 1..] {
            if pairwise.opponent_count(a, b) == 0 {
                count += 1;
            }
        }
    }
    count
}

/// Rest reward plus diversity reward minus the quartet's reuse penalty.
pub fn score_group(group: &[PlayerId], ctx: &SelectionContext<'_>) -> f64 {
    let weights = ctx.weights;
    let rest: u32 = group.iter().map(|id| ctx.counters.rest_count(id)).sum();
    let usage = QuartetKey::from_slice(group)
        .map(|key| ctx.quartets.usage(&key))
        .unwrap_or(0);
    weights.rest_weight * f64::from(rest)
        + weights.diversity_weight * zero_history_pairs(group, ctx.pairwise) as f64
        - weights.repeat_weight * f64::from(usage)
}

/// Picks four resting players for a court without removing them from the queue.
///
/// `avoid` is the quartet that just left this court, if any. Returns `None`
/// when fewer than four players are queued.
pub fn choose_quartet<R: Rng + ?Sized>(
    queue: &RestingQueue,
    avoid: Option<&QuartetKey>,
    ctx: &SelectionContext<'_>,
    rng: &mut R,
) -> Option<QuartetPick> {
    let window = ctx.weights.window();
    let mut candidates = queue.longest_resting(window, ctx.counters, rng, |id| {
        ctx.counters.get(id).can_be_seated(ctx.limits)
    });
    if candidates.len() < 4 {
        candidates = queue.longest_resting(window, ctx.counters, rng, |_| true);
    }
    if candidates.len() < 4 {
        debug!(
            target: "courtside_core::rotation",
            queued = queue.len(),
            "not enough resting players for a quartet"
        );
        return None;
    }

    let pick = best_admissible(&candidates, avoid, ctx, SelectionStage::Strict)
        .or_else(|| best_admissible(&candidates, avoid, ctx, SelectionStage::Relaxed))
        .or_else(|| fallback_pick(&candidates, avoid, ctx));

    if let Some(pick) = &pick {
        debug!(
            target: "courtside_core::rotation",
            stage = pick.stage.as_str(),
            score = pick.score,
            candidates = candidates.len(),
            quartet = ?pick.key.members(),
            "selected quartet"
        );
    }
    pick
}

fn best_admissible(
    candidates: &[PlayerId],
    avoid: Option<&QuartetKey>,
    ctx: &SelectionContext<'_>,
    stage: SelectionStage,
) -> Option<QuartetPick> {
    let strict = stage == SelectionStage::Strict;
    let mut best: Option<QuartetPick> = None;
    for indices in choose_index_combinations(candidates.len(), 4) {
        let players = [
            candidates[indices[0]].clone(),
            candidates[indices[1]].clone(),
            candidates[indices[2]].clone(),
            candidates[indices[3]].clone(),
        ];
        let Some(key) = QuartetKey::new(players.clone()) else {
            continue;
        };
        if avoid == Some(&key) || (strict && ctx.quartets.repeats_last_quartet(&key)) {
            continue;
        }
        let mut score = score_group(&players, ctx);
        if strict && ctx.quartets.is_recent(&key) {
            score -= ctx.weights.recent_penalty;
        }
        // Candidates arrive shuffled within equal rest, so keeping the first
        // maximum is already a random tie-break.
        if best.as_ref().is_none_or(|current| score > current.score) {
            best = Some(QuartetPick {
                players,
                key,
                score,
                stage,
            });
        }
    }
    best
}

fn fallback_pick(
    candidates: &[PlayerId],
    avoid: Option<&QuartetKey>,
    ctx: &SelectionContext<'_>,
) -> Option<QuartetPick> {
    let mut players = [
        candidates[0].clone(),
        candidates[1].clone(),
        candidates[2].clone(),
        candidates[3].clone(),
    ];
    let mut key = QuartetKey::new(players.clone())?;
    if avoid == Some(&key) {
        if let Some(spare) = candidates.get(4) {
            players[3] = spare.clone();
            key = QuartetKey::new(players.clone())?;
        }
    }
    let score = score_group(&players, ctx);
    Some(QuartetPick {
        players,
        key,
        score,
        stage: SelectionStage::Fallback,
    })
}
