use courtside_core::history::{CounterLimits, CounterTable, PairwiseHistory, QuartetMemory, SocialPairStats};
use courtside_core::model::{Player, PlayerId, Roster};
use courtside_core::persistence::{CommitStatus, MemoryStore, ResultStore};
use courtside_core::rotation::{
    PartitionContext, PartitionWeights, RestingQueue, RotationConfig, SelectionContext,
    SelectionWeights, choose_best_pairing, choose_quartet, partition_cost,
};
use courtside_core::session::{Session, SlotRef};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn roster_of(count: usize) -> Vec<Player> {
    (0..count).map(|i| Player::new(&format!("Player {i:02}"))).collect()
}

fn started(count: usize, courts: usize, seed: u64) -> Session {
    let mut session = Session::with_seed(RotationConfig::default(), seed).expect("valid config");
    session.start_session(roster_of(count), courts).expect("start");
    session
}

fn occupied_courts(session: &Session) -> Vec<usize> {
    session
        .courts()
        .iter()
        .enumerate()
        .filter(|(_, court)| !court.is_empty())
        .map(|(index, _)| index)
        .collect()
}

#[test]
fn every_player_has_exactly_one_place_under_random_events() {
    for seed in 0..6u64 {
        let mut session = started(11, 2, seed);
        let mut driver = StdRng::seed_from_u64(seed + 100);
        let mut late = 0;

        for _ in 0..150 {
            match driver.gen_range(0..10) {
                0 => {
                    let resting: Vec<PlayerId> = session.resting().cloned().collect();
                    if let Some(id) = resting.first() {
                        let _ = session.sit_out(id, None);
                    }
                }
                1 => {
                    let out = session.sitting_out().to_vec();
                    let _ = session.restore(&out);
                }
                2 if late < 3 => {
                    late += 1;
                    let _ = session.add_late_player(Player::new(&format!("Late {late}")));
                }
                3 => {
                    let _ = session.add_court();
                }
                4 if session.courts().len() > 1 => {
                    let index = driver.gen_range(0..session.courts().len());
                    let _ = session.delete_court(index);
                }
                5 => {
                    let first = session
                        .courts()
                        .first()
                        .and_then(|court| court.matchup())
                        .and_then(|m| m.player_at(0, 1))
                        .cloned();
                    let resting = session.resting().next().cloned();
                    if let (Some(a), Some(b)) = (first, resting) {
                        let _ = session.manual_swap(SlotRef::court(0, 0, 1, a), SlotRef::resting(0, b));
                    }
                }
                _ => {
                    let courts = occupied_courts(&session);
                    if !courts.is_empty() {
                        let index = courts[driver.gen_range(0..courts.len())];
                        session
                            .match_finished(index, driver.gen_range(0..2))
                            .expect("occupied court accepts a result");
                    }
                }
            }
            if let Err(violation) = session.check_invariants() {
                panic!("seed {seed}: {violation}");
            }
        }
    }
}

#[test]
fn counters_never_exceed_limits() {
    let limits = CounterLimits::default();
    for seed in 0..4u64 {
        let mut session = started(10, 2, seed);
        for round in 0..200usize {
            let courts = occupied_courts(&session);
            let index = courts[round % courts.len()];
            let report = session.match_finished(index, round % 2).unwrap();
            for id in session.state().players() {
                let counters = session.counters(id);
                assert!(counters.consecutive_games <= limits.max_consecutive_games);
                assert!(counters.consecutive_stays <= limits.max_consecutive_stays);
            }
            for id in &report.carried_over {
                assert!(session.counters(id).consecutive_stays >= 1);
            }
        }
    }
}

#[test]
fn rest_counts_stay_within_the_selection_window() {
    let window = SelectionWeights::default().window() as u32;
    for seed in 0..4u64 {
        let mut session = started(12, 2, seed);
        for round in 0..300usize {
            session.match_finished(round % 2, (round / 2) % 2).unwrap();
            for id in session.resting() {
                assert!(
                    session.counters(id).rest_count <= window,
                    "seed {seed} round {round}: {id} waited too long"
                );
            }
        }
    }
}

#[test]
fn replaying_a_result_never_counts_twice() {
    let mut session = started(8, 2, 17);
    let mut store = MemoryStore::with_players(roster_of(8));
    let report = session.match_finished(0, 1).unwrap();
    let winner = report.record.winners.players()[0].clone();

    assert!(!session.apply_match_record(&report.record));
    assert_eq!(session.roster().get(&winner).unwrap().wins(), 1);

    assert_eq!(store.commit_match(&report.record), Ok(CommitStatus::Applied));
    assert_eq!(store.commit_match(&report.record), Ok(CommitStatus::AlreadyRecorded));
    assert_eq!(store.load_player(&winner).unwrap().wins(), 1);
}

#[test]
fn flushed_store_matches_local_records() {
    let mut session = started(12, 2, 5);
    let mut store = MemoryStore::with_players(roster_of(12));
    store.fail_every(Some(4));

    for round in 0..60usize {
        session.match_finished(round % 2, round % 2).unwrap();
        session.flush_results(&mut store);
    }
    store.fail_every(None);
    let report = session.flush_results(&mut store);
    assert!(report.is_clean());
    assert_eq!(session.pending_results(), 0);
    assert_eq!(store.match_count(), 60);

    for player in session.roster().iter() {
        let stored = store.load_player(player.id()).unwrap();
        assert_eq!((stored.wins(), stored.losses()), (player.wins(), player.losses()));
    }
}

#[test]
fn fair_draw_takes_the_longest_resting() {
    let mut queue = RestingQueue::new();
    let mut counters = CounterTable::new();
    for (name, rest) in [("P1", 3), ("P2", 3), ("P3", 1), ("P4", 0), ("P5", 0)] {
        let id = PlayerId::new(name);
        counters.entry(&id).rest_count = rest;
        queue.enqueue(id);
    }
    let pairwise = PairwiseHistory::new();
    let quartets = QuartetMemory::new(6);
    let weights = SelectionWeights::default();
    let ctx = SelectionContext {
        counters: &counters,
        limits: CounterLimits::default(),
        pairwise: &pairwise,
        quartets: &quartets,
        weights: &weights,
    };

    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let pick = choose_quartet(&queue, None, &ctx, &mut rng).unwrap();
        for name in ["p1", "p2", "p3"] {
            assert!(pick.key.contains(&PlayerId::new(name)));
        }
        assert!(pick.key.contains(&PlayerId::new("p4")) ^ pick.key.contains(&PlayerId::new("p5")));
    }
}

#[test]
fn newcomers_partition_at_zero_cost() {
    let mut roster = Roster::new();
    for name in ["A", "B", "C", "D"] {
        roster.register(Player::new(name));
    }
    let players = ["a", "b", "c", "d"].map(PlayerId::new);
    let pairwise = PairwiseHistory::new();
    let social = SocialPairStats::new(None);
    let weights = PartitionWeights::default();
    let ctx = PartitionContext {
        roster: &roster,
        pairwise: &pairwise,
        social: &social,
        weights: &weights,
    };

    for pairing in 0..3 {
        assert_eq!(partition_cost(&players, pairing, &ctx).total, 0.0);
    }
    let mut rng = StdRng::seed_from_u64(1);
    let matchup = choose_best_pairing(&players, &ctx, &mut rng).unwrap();
    let [first, second] = matchup.teams();
    assert_eq!(first.players().len(), 2);
    assert!(first.iter().all(|id| !second.contains(id)));
}

#[test]
fn ended_session_is_terminal() {
    let mut session = started(8, 2, 3);
    session.match_finished(0, 0).unwrap();
    let unsent = session.end_session().unwrap();
    assert_eq!(unsent.len(), 1);
    assert!(session.state().players().is_empty());
    assert!(session.history().pairwise.repeated_partners().is_empty());
    assert!(session.match_finished(0, 0).is_err());
    assert!(session.add_late_player(Player::new("x")).is_err());
}
