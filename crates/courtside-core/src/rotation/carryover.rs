use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::debug;

use super::choose_index_combinations;
use super::config::CarryOverConfig;
use super::quartet::{SelectionContext, score_group};
use super::queue::RestingQueue;
use crate::history::{CounterTable, QuartetKey};
use crate::model::PlayerId;

#[derive(Debug, Clone, Copy)]
pub struct CarryOverContext<'a> {
    pub selection: SelectionContext<'a>,
    pub config: &'a CarryOverConfig,
}

/// Who stays, who comes in and who leaves the court after a match.
#[derive(Debug, Clone, PartialEq)]
pub struct CarryOverPlan {
    /// Finishers that remain on court.
    pub carried: Vec<PlayerId>,
    /// Resting players taking the open spots.
    pub entrants: Vec<PlayerId>,
    /// Finishers that go to the resting queue.
    pub departed: Vec<PlayerId>,
    pub key: QuartetKey,
    pub score: f64,
}

impl CarryOverPlan {
    pub fn quartet(&self) -> Vec<PlayerId> {
        self.carried.iter().chain(self.entrants.iter()).cloned().collect()
    }

    pub fn players(&self) -> Option<[PlayerId; 4]> {
        let quartet = self.quartet();
        match quartet.as_slice() {
            [a, b, c, d] => Some([a.clone(), b.clone(), c.clone(), d.clone()]),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CarryOverError {
    #[error("player {id} appears twice in the next quartet and no resting substitute is available")]
    DuplicatePlayer { id: PlayerId },
}

/// Plans keeping one or more finishers on court. Nothing is mutated; `None`
/// means the standard path (everyone rests) should run instead.
///
/// A carry count is only feasible when the resting queue alone can fill the
/// other seats; finishers never stand in for missing entrants.
pub fn plan_carry_over<R: Rng + ?Sized>(
    finishers: &[PlayerId; 4],
    queue: &RestingQueue,
    ctx: &CarryOverContext<'_>,
    rng: &mut R,
) -> Option<CarryOverPlan> {
    let config = ctx.config;
    let selection = &ctx.selection;
    let counters = selection.counters;
    let limits = selection.limits;
    let finished_key = QuartetKey::new(finishers.clone())?;

    let eligible: Vec<PlayerId> = finishers
        .iter()
        .filter(|id| counters.get(id).can_carry_over(limits))
        .cloned()
        .collect();
    if eligible.len() < config.min_carry {
        debug!(
            target: "courtside_core::rotation",
            eligible = eligible.len(),
            "carry-over skipped: too few eligible finishers"
        );
        return None;
    }

    let desired = rng.gen_range(config.min_carry..=config.max_carry);
    for count in (config.min_carry..=desired).rev() {
        if eligible.len() < count {
            continue;
        }
        let carriers = pick_carriers(&eligible, counters, count, rng);
        let need = 4 - count;

        let pool = queue.longest_resting(config.candidate_pool, counters, rng, |id| {
            counters.get(id).can_be_seated(limits)
        });
        if pool.len() < need {
            debug!(
                target: "courtside_core::rotation",
                count,
                need,
                pool = pool.len(),
                "too few resting players for carry count"
            );
            continue;
        }

        let mut best: Option<(f64, Vec<usize>, QuartetKey)> = None;
        for indices in choose_index_combinations(pool.len(), need) {
            let group: Vec<PlayerId> = carriers
                .iter()
                .cloned()
                .chain(indices.iter().map(|&i| pool[i].clone()))
                .collect();
            let Some(key) = QuartetKey::from_slice(&group) else {
                continue;
            };
            if key == finished_key || selection.quartets.repeats_last_quartet(&key) {
                continue;
            }
            let score = score_group(&group, selection);
            if best.as_ref().is_none_or(|(current, _, _)| score > *current) {
                best = Some((score, indices, key));
            }
        }

        if let Some((score, indices, key)) = best {
            let carried = carriers;
            let entrants: Vec<PlayerId> = indices.iter().map(|&i| pool[i].clone()).collect();
            let departed = finishers
                .iter()
                .filter(|id| !carried.contains(id))
                .cloned()
                .collect();
            debug!(
                target: "courtside_core::rotation",
                desired,
                carried = carried.len(),
                score,
                "planned carry-over"
            );
            return Some(CarryOverPlan {
                carried,
                entrants,
                departed,
                key,
                score,
            });
        }
        debug!(
            target: "courtside_core::rotation",
            count,
            pool = pool.len(),
            "no admissible quartet for carry count"
        );
    }
    None
}

/// Random carriers, drawn from finishers who have not stayed yet when there
/// are enough of them.
fn pick_carriers<R: Rng + ?Sized>(
    eligible: &[PlayerId],
    counters: &CounterTable,
    count: usize,
    rng: &mut R,
) -> Vec<PlayerId> {
    let fresh: Vec<PlayerId> = eligible
        .iter()
        .filter(|id| counters.get(id).consecutive_stays == 0)
        .cloned()
        .collect();
    let mut pool = if fresh.len() >= count {
        fresh
    } else {
        eligible.to_vec()
    };
    pool.shuffle(rng);
    pool.truncate(count);
    pool
}

/// Makes sure the planned quartet has four distinct players, replacing any
/// repeated entrant with the longest-resting unused player.
pub fn resolve_collisions<R: Rng + ?Sized>(
    plan: &mut CarryOverPlan,
    queue: &RestingQueue,
    counters: &CounterTable,
    rng: &mut R,
) -> Result<(), CarryOverError> {
    let mut seen: HashSet<PlayerId> = HashSet::new();
    let mut duplicates = Vec::new();
    for id in &plan.carried {
        if !seen.insert(id.clone()) {
            return Err(CarryOverError::DuplicatePlayer { id: id.clone() });
        }
    }
    for (index, id) in plan.entrants.iter().enumerate() {
        if !seen.insert(id.clone()) {
            duplicates.push(index);
        }
    }
    if duplicates.is_empty() {
        return Ok(());
    }

    for index in duplicates {
        let substitute = queue
            .longest_resting(1, counters, rng, |id| !seen.contains(id))
            .into_iter()
            .next();
        let Some(substitute) = substitute else {
            return Err(CarryOverError::DuplicatePlayer {
                id: plan.entrants[index].clone(),
            });
        };
        debug!(
            target: "courtside_core::rotation",
            replaced = %plan.entrants[index],
            substitute = %substitute,
            "substituted duplicate carry-over entrant"
        );
        seen.insert(substitute.clone());
        plan.entrants[index] = substitute;
    }

    let quartet = plan.quartet();
    match QuartetKey::from_slice(&quartet) {
        Some(key) => {
            plan.key = key;
            Ok(())
        }
        None => Err(CarryOverError::DuplicatePlayer {
            id: quartet.first().cloned().unwrap_or_else(|| PlayerId::new("")),
        }),
    }
}
