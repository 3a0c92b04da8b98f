use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use courtside_core::model::{Player, PlayerId};
use courtside_core::session::{MatchReport, Session};
use plotters::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("player '{0}' appeared in a match but was never registered")]
    UnknownPlayer(PlayerId),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render plot: {0}")]
    Plot(String),
}

/// Tallies fairness figures while a simulated session runs.
pub struct AnalyticsCollector {
    run_id: String,
    players: HashMap<PlayerId, PlayerAccumulator>,
    player_order: Vec<PlayerId>,
    matches: usize,
    carry_overs: usize,
    carried_players: usize,
}

impl AnalyticsCollector {
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            players: HashMap::new(),
            player_order: Vec::new(),
            matches: 0,
            carry_overs: 0,
            carried_players: 0,
        }
    }

    pub fn register(&mut self, player: &Player) {
        if self.players.contains_key(player.id()) {
            return;
        }
        self.players.insert(
            player.id().clone(),
            PlayerAccumulator::new(player.name().to_string()),
        );
        self.player_order.push(player.id().clone());
    }

    /// Folds one finished match in. `session` must already reflect it.
    pub fn record_match(&mut self, report: &MatchReport, session: &Session) -> Result<(), AnalyticsError> {
        self.matches += 1;
        if !report.carried_over.is_empty() {
            self.carry_overs += 1;
            self.carried_players += report.carried_over.len();
        }

        let pairwise = &session.history().pairwise;
        for (team, won) in [(&report.record.winners, true), (&report.record.losers, false)] {
            let [first, second] = team.players();
            let repeated = pairwise.partner_count(first, second) > 1;
            for id in team.iter() {
                let acc = self
                    .players
                    .get_mut(id)
                    .ok_or_else(|| AnalyticsError::UnknownPlayer(id.clone()))?;
                acc.games += 1;
                if won {
                    acc.wins += 1;
                }
                if repeated {
                    acc.partner_repeats += 1;
                }
            }
        }

        for id in session.resting() {
            let rest_count = session.counters(id).rest_count;
            let acc = self
                .players
                .get_mut(id)
                .ok_or_else(|| AnalyticsError::UnknownPlayer(id.clone()))?;
            acc.rests += 1;
            acc.longest_wait = acc.longest_wait.max(rest_count);
        }
        Ok(())
    }

    pub fn finalize(self) -> AnalyticsSummary {
        let mut players = self.players;
        let reports: Vec<PlayerReport> = self
            .player_order
            .iter()
            .filter_map(|id| players.remove(id).map(|acc| acc.into_report(id.clone())))
            .collect();

        let games: Vec<f64> = reports.iter().map(|r| r.games as f64).collect();
        let (games_mean, games_std_dev) = describe(&games);
        let games_spread = match (
            reports.iter().map(|r| r.games).max(),
            reports.iter().map(|r| r.games).min(),
        ) {
            (Some(max), Some(min)) => max - min,
            _ => 0,
        };

        AnalyticsSummary {
            run_id: self.run_id,
            matches: self.matches,
            carry_overs: self.carry_overs,
            carried_players: self.carried_players,
            games_mean,
            games_std_dev,
            games_spread,
            longest_wait: reports.iter().map(|r| r.longest_wait).max().unwrap_or(0),
            players: reports,
        }
    }
}

fn describe(values: &[f64]) -> (f64, f64) {
    match values.len() {
        0 => (0.0, 0.0),
        1 => (values[0], 0.0),
        _ => (values.iter().mean(), values.iter().std_dev()),
    }
}

struct PlayerAccumulator {
    name: String,
    games: u32,
    wins: u32,
    rests: u32,
    partner_repeats: u32,
    longest_wait: u32,
}

impl PlayerAccumulator {
    fn new(name: String) -> Self {
        Self {
            name,
            games: 0,
            wins: 0,
            rests: 0,
            partner_repeats: 0,
            longest_wait: 0,
        }
    }

    fn into_report(self, id: PlayerId) -> PlayerReport {
        let win_rate = if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        };
        PlayerReport {
            player_id: id,
            name: self.name,
            games: self.games,
            wins: self.wins,
            win_rate,
            rests: self.rests,
            partner_repeats: self.partner_repeats,
            longest_wait: self.longest_wait,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerReport {
    pub player_id: PlayerId,
    pub name: String,
    pub games: u32,
    pub wins: u32,
    pub win_rate: f64,
    /// Matches finished while this player was in the resting queue.
    pub rests: u32,
    pub partner_repeats: u32,
    /// Highest rest count observed for this player.
    pub longest_wait: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub run_id: String,
    pub matches: usize,
    pub carry_overs: usize,
    pub carried_players: usize,
    pub games_mean: f64,
    pub games_std_dev: f64,
    pub games_spread: u32,
    pub longest_wait: u32,
    pub players: Vec<PlayerReport>,
}

impl AnalyticsSummary {
    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str(&format!("# Rotation Summary: {}\n\n", self.run_id));
        rows.push_str(&format!(
            "Matches: {} | Carry-overs: {} ({} players kept on court)\n\n",
            self.matches, self.carry_overs, self.carried_players
        ));
        rows.push_str(&format!(
            "Games per player: mean {:.2}, std dev {:.2}, spread {} | Longest wait: {} matches\n\n",
            self.games_mean, self.games_std_dev, self.games_spread, self.longest_wait
        ));
        rows.push_str("| Player | Games | Wins | Win % | Rests | Longest Wait | Partner Repeats |\n");
        rows.push_str("|--------|-------|------|-------|-------|--------------|-----------------|\n");

        for player in &self.players {
            rows.push_str(&format!(
                "| {name} | {games} | {wins} | {win:.1}% | {rests} | {wait} | {repeats} |\n",
                name = player.name,
                games = player.games,
                wins = player.wins,
                win = player.win_rate * 100.0,
                rests = player.rests,
                wait = player.longest_wait,
                repeats = player.partner_repeats,
            ));
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }

    pub fn render_plot(&self, dir: impl AsRef<Path>) -> Result<PathBuf, AnalyticsError> {
        let dir = dir.as_ref();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| AnalyticsError::Io {
                context: "creating plots directory",
                source: e,
            })?;
        }

        let output_path = dir.join("games_per_player.png");
        let mean = self.games_mean;
        let players_snapshot = self.players.clone();

        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let plot_attempt = std::panic::catch_unwind(move || {
            let root = BitMapBackend::new(&output_path, (800, 480)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            let mut players = players_snapshot;
            players.sort_by(|a, b| b.games.cmp(&a.games).then_with(|| a.name.cmp(&b.name)));

            let y_max = players.iter().map(|p| p.games).max().unwrap_or(0) as f64 + 1.0;

            let mut chart = ChartBuilder::on(&root)
                .margin(20)
                .caption("Games played per player", ("sans-serif", 22))
                .set_label_area_size(LabelAreaPosition::Left, 50)
                .set_label_area_size(LabelAreaPosition::Bottom, 60)
                .build_cartesian_2d(0..players.len(), 0.0..y_max)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .configure_mesh()
                .disable_mesh()
                .y_desc("Games")
                .x_desc("Player")
                .x_label_formatter(&|idx| {
                    players
                        .get(*idx)
                        .map(|player| player.name.clone())
                        .unwrap_or_default()
                })
                .draw()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .draw_series(players.iter().enumerate().map(|(idx, player)| {
                    let color = if (player.games as f64) < mean - 1.0 {
                        &RED
                    } else {
                        &GREEN
                    };
                    Rectangle::new([(idx, 0.0), (idx + 1, player.games as f64)], color.filled())
                }))
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(chart);

            root.present()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(root);

            Ok(output_path)
        });

        std::panic::set_hook(prev_hook);

        match plot_attempt {
            Ok(result) => result,
            Err(_) => Err(AnalyticsError::Plot(
                "plotters panicked while rendering (missing font support?)".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtside_core::rotation::RotationConfig;
    use tempfile::tempdir;

    fn session_with(players: &[Player]) -> Session {
        let mut session = Session::with_seed(RotationConfig::default(), 11).expect("valid");
        session.start_session(players.to_vec(), 1).expect("start");
        session
    }

    #[test]
    fn describe_handles_short_inputs() {
        assert_eq!(describe(&[]), (0.0, 0.0));
        assert_eq!(describe(&[3.0]), (3.0, 0.0));
        let (mean, std_dev) = describe(&[2.0, 4.0]);
        assert!((mean - 3.0).abs() < 1e-12);
        assert!((std_dev - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn collector_counts_games_and_rests() {
        let players: Vec<Player> = (0..6).map(|i| Player::new(&format!("p{i}"))).collect();
        let mut session = session_with(&players);
        let mut collector = AnalyticsCollector::new("unit");
        for player in &players {
            collector.register(player);
        }

        for _ in 0..3 {
            let report = session.match_finished(0, 0).expect("match");
            collector.record_match(&report, &session).expect("record");
        }
        let summary = collector.finalize();

        assert_eq!(summary.matches, 3);
        assert_eq!(summary.players.len(), 6);
        let games: u32 = summary.players.iter().map(|p| p.games).sum();
        let rests: u32 = summary.players.iter().map(|p| p.rests).sum();
        assert_eq!(games, 12);
        assert_eq!(rests, 6);
        assert!((summary.games_mean - 2.0).abs() < 1e-12);
    }

    #[test]
    fn unregistered_player_is_an_error() {
        let players: Vec<Player> = (0..4).map(|i| Player::new(&format!("p{i}"))).collect();
        let mut session = session_with(&players);
        let mut collector = AnalyticsCollector::new("unit");
        let report = session.match_finished(0, 1).expect("match");
        let err = collector.record_match(&report, &session).expect_err("nobody registered");
        assert!(matches!(err, AnalyticsError::UnknownPlayer(_)));
    }

    #[test]
    fn markdown_lists_every_player() {
        let players: Vec<Player> = (0..5).map(|i| Player::new(&format!("p{i}"))).collect();
        let mut session = session_with(&players);
        let mut collector = AnalyticsCollector::new("md");
        for player in &players {
            collector.register(player);
        }
        let report = session.match_finished(0, 0).expect("match");
        collector.record_match(&report, &session).expect("record");

        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("summary.md");
        collector.finalize().write_markdown(&path).expect("write");
        let text = fs::read_to_string(&path).expect("read");
        assert!(text.starts_with("# Rotation Summary: md"));
        for player in &players {
            assert!(text.contains(&format!("| {} |", player.name())));
        }
    }
}
