use std::collections::VecDeque;

use tracing::warn;

use super::{CommitStatus, MatchRecord, PersistenceError, ResultStore};

/// Finished matches waiting to be written, oldest first.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    pending: VecDeque<MatchRecord>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushReport {
    pub committed: usize,
    pub duplicates: usize,
    /// Records still pending after a retryable failure.
    pub retained: usize,
    /// Records dropped because the store refused them for good.
    pub rejected: Vec<(MatchRecord, PersistenceError)>,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.retained == 0 && self.rejected.is_empty()
    }
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: MatchRecord) {
        self.pending.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchRecord> {
        self.pending.iter()
    }

    pub fn drain(&mut self) -> Vec<MatchRecord> {
        self.pending.drain(..).collect()
    }

    /// Writes pending records in order. A retryable failure stops the flush
    /// and keeps that record and everything after it for the next attempt.
    pub fn flush(&mut self, store: &mut dyn ResultStore) -> FlushReport {
        let mut report = FlushReport::default();
        while let Some(record) = self.pending.front() {
            match store.commit_match(record) {
                Ok(CommitStatus::Applied) => report.committed += 1,
                Ok(CommitStatus::AlreadyRecorded) => report.duplicates += 1,
                Err(err) if err.is_retryable() => {
                    warn!(
                        target: "courtside_core::persistence",
                        key = %record.key,
                        error = %err,
                        pending = self.pending.len(),
                        "result write failed; will retry"
                    );
                    report.retained = self.pending.len();
                    return report;
                }
                Err(err) => {
                    warn!(
                        target: "courtside_core::persistence",
                        key = %record.key,
                        error = %err,
                        "result write rejected"
                    );
                    if let Some(record) = self.pending.pop_front() {
                        report.rejected.push((record, err));
                    }
                    continue;
                }
            }
            self.pending.pop_front();
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Player, PlayerId, Team};
    use crate::persistence::{MatchKey, MemoryStore};

    fn record(sequence: u64, loser: &str) -> MatchRecord {
        MatchRecord {
            key: MatchKey {
                session_id: "s".into(),
                court_number: 1,
                sequence,
            },
            winners: Team::new(PlayerId::new("a"), PlayerId::new("b")).unwrap(),
            losers: Team::new(PlayerId::new("c"), PlayerId::new(loser)).unwrap(),
        }
    }

    #[test]
    fn transient_failure_keeps_records_for_retry() {
        let mut store = MemoryStore::with_players(["a", "b", "c", "d"].map(Player::new));
        let mut outbox = Outbox::new();
        outbox.push(record(1, "d"));
        outbox.push(record(2, "d"));

        store.fail_next(1);
        let report = outbox.flush(&mut store);
        assert_eq!(report.committed, 0);
        assert_eq!(report.retained, 2);
        assert_eq!(outbox.len(), 2);

        let report = outbox.flush(&mut store);
        assert_eq!(report.committed, 2);
        assert!(report.is_clean());
        assert!(outbox.is_empty());
        assert_eq!(store.player(&PlayerId::new("a")).unwrap().wins(), 2);
    }

    #[test]
    fn replayed_record_counts_as_duplicate() {
        let mut store = MemoryStore::with_players(["a", "b", "c", "d"].map(Player::new));
        let mut outbox = Outbox::new();
        outbox.push(record(1, "d"));
        outbox.push(record(1, "d"));
        let report = outbox.flush(&mut store);
        assert_eq!((report.committed, report.duplicates), (1, 1));
        assert_eq!(store.player(&PlayerId::new("c")).unwrap().losses(), 1);
    }

    #[test]
    fn permanent_failure_drops_only_that_record() {
        let mut store = MemoryStore::with_players(["a", "b", "c", "d"].map(Player::new));
        let mut outbox = Outbox::new();
        outbox.push(record(1, "ghost"));
        outbox.push(record(2, "d"));
        let report = outbox.flush(&mut store);
        assert_eq!(report.committed, 1);
        assert_eq!(report.rejected.len(), 1);
        assert!(outbox.is_empty());
    }
}
