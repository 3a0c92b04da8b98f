use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::history::CounterTable;
use crate::model::PlayerId;

/// Players waiting for a court, in display order.
///
/// Order is only for display and manual edits; fairness is decided by the
/// rest counters, with ties shuffled on every draw.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestingQueue {
    order: Vec<PlayerId>,
}

impl RestingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.order.contains(id)
    }

    pub fn position(&self, id: &PlayerId) -> Option<usize> {
        self.order.iter().position(|queued| queued == id)
    }

    pub fn get(&self, index: usize) -> Option<&PlayerId> {
        self.order.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerId> {
        self.order.iter()
    }

    /// Appends `id`; returns false if it was already queued.
    pub fn enqueue(&mut self, id: PlayerId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.order.push(id);
        true
    }

    pub fn remove(&mut self, id: &PlayerId) -> bool {
        match self.position(id) {
            Some(index) => {
                self.order.remove(index);
                true
            }
            None => false,
        }
    }

    /// Puts `incoming` at `index`, returning the player it displaced.
    pub fn replace_at(&mut self, index: usize, incoming: PlayerId) -> Option<PlayerId> {
        if self.order.iter().enumerate().any(|(i, id)| i != index && *id == incoming) {
            return None;
        }
        let slot = self.order.get_mut(index)?;
        Some(std::mem::replace(slot, incoming))
    }

    pub fn swap(&mut self, a: usize, b: usize) -> bool {
        if a >= self.order.len() || b >= self.order.len() {
            return false;
        }
        self.order.swap(a, b);
        true
    }

    /// Up to `k` queued players accepted by `eligible`, longest rest first.
    ///
    /// Players are shuffled before the stable sort, so equal rest counts come
    /// out in random order.
    pub fn longest_resting<R, F>(
        &self,
        k: usize,
        counters: &CounterTable,
        rng: &mut R,
        mut eligible: F,
    ) -> Vec<PlayerId>
    where
        R: Rng + ?Sized,
        F: FnMut(&PlayerId) -> bool,
    {
        let mut pool: Vec<PlayerId> = self.order.iter().filter(|id| eligible(*id)).cloned().collect();
        pool.shuffle(rng);
        pool.sort_by_key(|id| std::cmp::Reverse(counters.rest_count(id)));
        pool.truncate(k);
        pool
    }

    /// Removes and returns the `n` fairest players, preferring players outside
    /// `avoid`. Returns an empty vector (and leaves the queue untouched) when
    /// fewer than `n` are queued.
    pub fn dequeue_fair<R: Rng + ?Sized>(
        &mut self,
        n: usize,
        avoid: &[PlayerId],
        counters: &CounterTable,
        rng: &mut R,
    ) -> Vec<PlayerId> {
        if n == 0 || self.order.len() < n {
            return Vec::new();
        }
        let mut picked = self.longest_resting(n, counters, rng, |id| !avoid.contains(id));
        if picked.len() < n {
            let extra = self.longest_resting(n - picked.len(), counters, rng, |id| {
                avoid.contains(id)
            });
            picked.extend(extra);
        }
        for id in &picked {
            self.remove(id);
        }
        picked
    }

    /// One more match finished while everyone here waited.
    pub fn tick_rest(&self, counters: &mut CounterTable) {
        for id in &self.order {
            counters.entry(id).tick_rest();
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn queue_with(rests: &[(&str, u32)]) -> (RestingQueue, CounterTable) {
        let mut queue = RestingQueue::new();
        let mut counters = CounterTable::new();
        for (name, rest) in rests {
            let id = PlayerId::new(name);
            counters.entry(&id).rest_count = *rest;
            queue.enqueue(id);
        }
        (queue, counters)
    }

    #[test]
    fn enqueue_ignores_duplicates() {
        let mut queue = RestingQueue::new();
        assert!(queue.enqueue(PlayerId::new("a")));
        assert!(!queue.enqueue(PlayerId::new("A ")));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn longest_resting_orders_by_rest() {
        let (queue, counters) = queue_with(&[("a", 0), ("b", 4), ("c", 2), ("d", 4)]);
        let mut rng = StdRng::seed_from_u64(3);
        let top = queue.longest_resting(3, &counters, &mut rng, |_| true);
        assert_eq!(top.len(), 3);
        assert!(top[..2].contains(&PlayerId::new("b")));
        assert!(top[..2].contains(&PlayerId::new("d")));
        assert_eq!(top[2], PlayerId::new("c"));
    }

    #[test]
    fn ties_are_not_always_broken_the_same_way() {
        let (queue, counters) = queue_with(&[("a", 1), ("b", 1), ("c", 1), ("d", 1)]);
        let mut rng = StdRng::seed_from_u64(11);
        let firsts: std::collections::HashSet<PlayerId> = (0..40)
            .map(|_| queue.longest_resting(1, &counters, &mut rng, |_| true)[0].clone())
            .collect();
        assert!(firsts.len() > 1);
    }

    #[test]
    fn dequeue_fair_prefers_players_outside_avoid() {
        let (mut queue, counters) = queue_with(&[("a", 5), ("b", 1), ("c", 0)]);
        let mut rng = StdRng::seed_from_u64(7);
        let picked = queue.dequeue_fair(1, &[PlayerId::new("a")], &counters, &mut rng);
        assert_eq!(picked, vec![PlayerId::new("b")]);
        assert!(!queue.contains(&PlayerId::new("b")));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn dequeue_fair_leaves_short_queue_untouched() {
        let (mut queue, counters) = queue_with(&[("a", 0), ("b", 0)]);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(queue.dequeue_fair(3, &[], &counters, &mut rng).is_empty());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn tick_rest_bumps_every_queued_player() {
        let (queue, mut counters) = queue_with(&[("a", 0), ("b", 2)]);
        queue.tick_rest(&mut counters);
        assert_eq!(counters.rest_count(&PlayerId::new("a")), 1);
        assert_eq!(counters.rest_count(&PlayerId::new("b")), 3);
        assert_eq!(counters.rest_count(&PlayerId::new("zed")), 0);
    }

    #[test]
    fn replace_at_rejects_players_already_queued_elsewhere() {
        let (mut queue, _) = queue_with(&[("a", 0), ("b", 0)]);
        assert!(queue.replace_at(0, PlayerId::new("b")).is_none());
        assert_eq!(queue.replace_at(0, PlayerId::new("c")), Some(PlayerId::new("a")));
        assert_eq!(queue.get(0), Some(&PlayerId::new("c")));
    }
}
