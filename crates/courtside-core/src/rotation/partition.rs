use rand::Rng;
use rand::seq::SliceRandom;
use tracing::trace;

use super::config::PartitionWeights;
use crate::history::{PairwiseHistory, SocialPairStats};
use crate::model::{Matchup, Player, PlayerId, Roster, Team};

/// The three ways to split four players into two teams, as index pairs.
pub const PAIRINGS: [[[usize; 2]; 2]; 3] = [
    [[0, 1], [2, 3]],
    [[0, 2], [1, 3]],
    [[0, 3], [1, 2]],
];

const COST_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
pub struct PartitionContext<'a> {
    pub roster: &'a Roster,
    pub pairwise: &'a PairwiseHistory,
    pub social: &'a SocialPairStats,
    pub weights: &'a PartitionWeights,
}

/// Cost of one pairing broken down by term.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PartitionCost {
    pub balance: f64,
    pub partner: f64,
    pub opponent: f64,
    pub social: f64,
    pub total: f64,
}

/// Strength used for balancing; players with few games count as neutral.
pub fn rating(player: Option<&Player>, weights: &PartitionWeights) -> f64 {
    match player {
        Some(player) if player.games_played() >= weights.rating_min_games => player.winrate(),
        _ => weights.neutral_rating,
    }
}

fn is_high_performer(player: Option<&Player>, weights: &PartitionWeights) -> bool {
    player.is_some_and(|p| {
        p.games_played() >= weights.high_performer_min_games
            && p.winrate() >= weights.high_performer_winrate
    })
}

pub fn partition_cost(
    players: &[PlayerId; 4],
    pairing: usize,
    ctx: &PartitionContext<'_>,
) -> PartitionCost {
    let [left, right] = PAIRINGS[pairing % PAIRINGS.len()];
    let rate = |i: usize| rating(ctx.roster.get(&players[i]), ctx.weights);

    let left_avg = (rate(left[0]) + rate(left[1])) / 2.0;
    let right_avg = (rate(right[0]) + rate(right[1])) / 2.0;
    let balance = (left_avg - right_avg).abs();

    let partner = f64::from(
        ctx.pairwise.partner_count(&players[left[0]], &players[left[1]])
            + ctx.pairwise.partner_count(&players[right[0]], &players[right[1]]),
    );

    let mut opponent_total = 0u32;
    for &l in &left {
        for &r in &right {
            opponent_total += ctx.pairwise.opponent_count(&players[l], &players[r]);
        }
    }
    let opponent = f64::from(opponent_total);

    let social = social_bias(players, left, right, ctx);

    PartitionCost {
        balance,
        partner,
        opponent,
        social,
        total: balance
            + ctx.weights.partner_weight * partner
            + ctx.weights.opponent_weight * opponent
            + social,
    }
}

fn social_bias(
    players: &[PlayerId; 4],
    left: [usize; 2],
    right: [usize; 2],
    ctx: &PartitionContext<'_>,
) -> f64 {
    let Some(config) = &ctx.weights.social else {
        return 0.0;
    };
    if !ctx.social.both_present(players.iter()) {
        return 0.0;
    }
    let team = |side: [usize; 2]| Team::new(players[side[0]].clone(), players[side[1]].clone());
    let together = [team(left), team(right)]
        .iter()
        .flatten()
        .any(|t| ctx.social.on_same_team(t));
    let gap = config.desired_ratio - ctx.social.observed_ratio();
    let sign = if together { -1.0 } else { 1.0 };
    sign * config.weight * gap
}

/// Pairings that respect the high-performer spread, or all three if none do.
fn admissible_pairings(players: &[PlayerId; 4], ctx: &PartitionContext<'_>) -> Vec<usize> {
    let all: Vec<usize> = (0..PAIRINGS.len()).collect();
    let high: Vec<usize> = (0..4)
        .filter(|&i| is_high_performer(ctx.roster.get(&players[i]), ctx.weights))
        .collect();

    let filtered: Vec<usize> = match high.len() {
        2 => all
            .iter()
            .copied()
            .filter(|&p| {
                let [left, _] = PAIRINGS[p];
                left.iter().filter(|i| high.contains(i)).count() == 1
            })
            .collect(),
        3 => {
            let winrate = |i: usize| ctx.roster.get(&players[i]).map_or(0.0, Player::winrate);
            let mut strongest = high[0];
            for &i in &high[1..] {
                if winrate(i) > winrate(strongest) {
                    strongest = i;
                }
            }
            let Some(other) = (0..4).find(|i| !high.contains(i)) else {
                return all;
            };
            all.iter()
                .copied()
                .filter(|&p| {
                    PAIRINGS[p]
                        .iter()
                        .any(|team| team.contains(&strongest) && team.contains(&other))
                })
                .collect()
        }
        _ => Vec::new(),
    };

    if filtered.is_empty() { all } else { filtered }
}

/// Splits four distinct players into the cheapest matchup.
///
/// Ties within a tiny epsilon are broken at random and each team's internal
/// order is shuffled; everything else is a pure function of the history.
pub fn choose_best_pairing<R: Rng + ?Sized>(
    players: &[PlayerId; 4],
    ctx: &PartitionContext<'_>,
    rng: &mut R,
) -> Option<Matchup> {
    let scored: Vec<(usize, PartitionCost)> = admissible_pairings(players, ctx)
        .into_iter()
        .map(|p| (p, partition_cost(players, p, ctx)))
        .collect();
    let min = scored
        .iter()
        .map(|(_, cost)| cost.total)
        .fold(f64::INFINITY, f64::min);
    let best: Vec<&(usize, PartitionCost)> = scored
        .iter()
        .filter(|(_, cost)| cost.total <= min + COST_EPSILON)
        .collect();
    let (pairing, cost) = **best.choose(rng)?;

    trace!(
        target: "courtside_core::rotation",
        pairing,
        total = cost.total,
        balance = cost.balance,
        partner = cost.partner,
        opponent = cost.opponent,
        social = cost.social,
        "chose team partition"
    );

    let [left, right] = PAIRINGS[pairing];
    let mut first = Team::new(players[left[0]].clone(), players[left[1]].clone())?;
    let mut second = Team::new(players[right[0]].clone(), players[right[1]].clone())?;
    if rng.gen_bool(0.5) {
        first.swap_order();
    }
    if rng.gen_bool(0.5) {
        second.swap_order();
    }
    Matchup::new(first, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::config::SocialBiasConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn ids(names: [&str; 4]) -> [PlayerId; 4] {
        names.map(PlayerId::new)
    }

    fn team(a: &str, b: &str) -> Team {
        Team::new(PlayerId::new(a), PlayerId::new(b)).unwrap()
    }

    struct Fixture {
        roster: Roster,
        pairwise: PairwiseHistory,
        social: SocialPairStats,
        weights: PartitionWeights,
    }

    impl Fixture {
        fn new(players: &[(&str, u32, u32)]) -> Self {
            let mut roster = Roster::new();
            for (name, wins, losses) in players {
                roster.register(Player::with_record(name, *wins, *losses));
            }
            Self {
                roster,
                pairwise: PairwiseHistory::new(),
                social: SocialPairStats::new(None),
                weights: PartitionWeights::default(),
            }
        }

        fn ctx(&self) -> PartitionContext<'_> {
            PartitionContext {
                roster: &self.roster,
                pairwise: &self.pairwise,
                social: &self.social,
                weights: &self.weights,
            }
        }
    }

    #[test]
    fn newcomers_balance_perfectly_under_every_pairing() {
        let fixture = Fixture::new(&[("a", 0, 0), ("b", 3, 1), ("c", 0, 9), ("d", 1, 0)]);
        let players = ids(["a", "b", "c", "d"]);
        for pairing in 0..3 {
            let cost = partition_cost(&players, pairing, &fixture.ctx());
            assert_eq!(cost.balance, 0.0);
            assert_eq!(cost.total, 0.0);
        }
    }

    #[test]
    fn equal_costs_yield_each_pairing_eventually() {
        let fixture = Fixture::new(&[]);
        let players = ids(["a", "b", "c", "d"]);
        let mut seen = HashSet::new();
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let matchup = choose_best_pairing(&players, &fixture.ctx(), &mut rng).unwrap();
            let a = PlayerId::new("a");
            let (t, _) = matchup.locate(&a).unwrap();
            let partner = matchup
                .team(t)
                .unwrap()
                .iter()
                .find(|id| **id != a)
                .cloned()
                .unwrap();
            seen.insert(partner);
            assert_eq!(matchup.players().count(), 4);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn partner_history_steers_away_from_repeat_teams() {
        let mut fixture = Fixture::new(&[]);
        fixture.pairwise.record_match(&team("a", "b"), &team("c", "d"));
        let players = ids(["a", "b", "c", "d"]);
        let mut rng = StdRng::seed_from_u64(4);
        let matchup = choose_best_pairing(&players, &fixture.ctx(), &mut rng).unwrap();
        for t in matchup.teams() {
            assert!(!t.same_pair(&team("a", "b")));
            assert!(!t.same_pair(&team("c", "d")));
        }
    }

    #[test]
    fn skill_balance_pairs_strong_with_weak() {
        let fixture = Fixture::new(&[
            ("ace", 16, 4),
            ("pro", 15, 5),
            ("mid", 10, 10),
            ("low", 4, 16),
        ]);
        let players = ids(["ace", "pro", "mid", "low"]);
        let mut rng = StdRng::seed_from_u64(8);
        let matchup = choose_best_pairing(&players, &fixture.ctx(), &mut rng).unwrap();
        let (team, _) = matchup.locate(&PlayerId::new("ace")).unwrap();
        let ace_team = matchup.team(team).unwrap();
        assert!(!ace_team.contains(&PlayerId::new("pro")));
    }

    #[test]
    fn three_high_performers_put_the_best_with_the_outsider() {
        let fixture = Fixture::new(&[
            ("h1", 14, 6),
            ("h2", 18, 2),
            ("h3", 13, 7),
            ("n", 2, 18),
        ]);
        let players = ids(["h1", "h2", "h3", "n"]);
        assert_eq!(admissible_pairings(&players, &fixture.ctx()), vec![1]);
        let mut rng = StdRng::seed_from_u64(1);
        let matchup = choose_best_pairing(&players, &fixture.ctx(), &mut rng).unwrap();
        let (t, _) = matchup.locate(&PlayerId::new("h2")).unwrap();
        assert!(matchup.team(t).unwrap().contains(&PlayerId::new("n")));
    }

    #[test]
    fn two_high_performers_are_split() {
        let fixture = Fixture::new(&[
            ("h1", 14, 6),
            ("x", 5, 5),
            ("h2", 18, 2),
            ("y", 0, 0),
        ]);
        let players = ids(["h1", "x", "h2", "y"]);
        assert_eq!(admissible_pairings(&players, &fixture.ctx()), vec![0, 2]);
    }

    #[test]
    fn social_bias_pulls_pair_together_when_below_target() {
        let mut fixture = Fixture::new(&[]);
        fixture.weights.social = Some(SocialBiasConfig::new("chad", "budong"));
        fixture.social = SocialPairStats::new(Some((PlayerId::new("chad"), PlayerId::new("budong"))));
        let players = ids(["chad", "x", "budong", "y"]);

        let together = partition_cost(&players, 1, &fixture.ctx());
        let apart = partition_cost(&players, 0, &fixture.ctx());
        assert!((together.social + 1.2).abs() < 1e-12);
        assert!((apart.social - 1.2).abs() < 1e-12);

        let mut rng = StdRng::seed_from_u64(0);
        let matchup = choose_best_pairing(&players, &fixture.ctx(), &mut rng).unwrap();
        let (t, _) = matchup.locate(&PlayerId::new("chad")).unwrap();
        assert!(matchup.team(t).unwrap().contains(&PlayerId::new("budong")));
    }
}
