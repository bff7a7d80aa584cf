//! Per-opponent statistics, shared by every worker of a tournament.
//!
//! Workers call [`ResultsAggregator::record`] as games finish, in any order and from any
//! thread. All updates go through a single mutex, so concurrent records commute: the totals are
//! the same as if the games had been recorded one after the other.

use std::fmt::Display;
use std::sync::Mutex;

use crate::tournament_scheduler::ScheduleSummary;

/// Score of one game, from the point of view of one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Score {
    /// 1 point
    Win,
    /// 1/2 point
    Draw,
    /// 0 point
    Loss,
}

impl Score {
    /// Points earned.
    pub fn value(self) -> f64 {
        match self {
            Score::Win => 1.0,
            Score::Draw => 0.5,
            Score::Loss => 0.0,
        }
    }
}

/// Tally of the games counted in one report row.
///
/// `score == wins + 0.5 * draws` at all times.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct OpponentStats {
    /// Games won.
    pub wins: u32,
    /// Games drawn.
    pub draws: u32,
    /// Games lost, unfinished games included.
    pub losses: u32,
    /// Points earned.
    pub score: f64,
}

impl OpponentStats {
    /// Games recorded.
    pub fn games(&self) -> u32 {
        self.wins + self.draws + self.losses
    }

    /// Score over games recorded, in `[0, 1]`. Zero when no game was recorded.
    pub fn ratio(&self) -> f64 {
        match self.games() {
            0 => 0.0,
            n => self.score / f64::from(n),
        }
    }

    /// [`ratio`](Self::ratio) as a percentage.
    pub fn percentage(&self) -> f64 {
        self.ratio() * 100.0
    }

    fn add(&mut self, score: Score) {
        match score {
            Score::Win => self.wins += 1,
            Score::Draw => self.draws += 1,
            Score::Loss => self.losses += 1,
        }
        self.score += score.value();
    }

    fn merge(&mut self, other: &OpponentStats) {
        self.wins += other.wins;
        self.draws += other.draws;
        self.losses += other.losses;
        self.score += other.score;
    }
}

/// Rating difference matching a score ratio `p`, using the logistic Elo model:
/// `-400 * log10((1 - p) / p)`.
///
/// Infinite when `p` is 0 or 1.
pub fn rating_difference(p: f64) -> f64 {
    if p >= 1.0 {
        f64::INFINITY
    } else if p <= 0.0 {
        f64::NEG_INFINITY
    } else {
        // + 0.0 turns -0.0 into 0.0
        -400.0 * ((1.0 - p) / p).log10() + 0.0
    }
}

/// Performance rating relative to the opponents, printed `+N`, `-N`, `+inf` or `-inf`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingEstimate(pub f64);

impl RatingEstimate {
    /// Estimate from a score ratio.
    pub fn from_ratio(p: f64) -> Self {
        RatingEstimate(rating_difference(p))
    }
}

impl Display for RatingEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 == f64::INFINITY {
            write!(f, "+inf")
        } else if self.0 == f64::NEG_INFINITY {
            write!(f, "-inf")
        } else {
            write!(f, "{:+.0}", self.0)
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    rows: Vec<(String, OpponentStats)>,
    unfinished: u32,
    unlogged: u32,
}

impl Tally {
    fn row_mut(&mut self, key: &str) -> &mut OpponentStats {
        let index = match self.rows.iter().position(|(k, _)| k == key) {
            Some(index) => index,
            None => {
                self.rows.push((key.to_owned(), OpponentStats::default()));
                self.rows.len() - 1
            }
        };
        &mut self.rows[index].1
    }

    fn total(&self) -> OpponentStats {
        let mut total = OpponentStats::default();
        for (_, stats) in &self.rows {
            total.merge(stats);
        }
        total
    }
}

/// Thread-safe accumulator of game results, one row per key.
#[derive(Debug, Default)]
pub struct ResultsAggregator {
    tally: Mutex<Tally>,
}

impl ResultsAggregator {
    /// Empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty row, fixing its position in the report. Rows recorded without having been
    /// registered are appended in the order they first appear.
    pub fn register(&self, key: &str) {
        let mut tally = self.tally.lock().expect("poisoned");
        tally.row_mut(key);
    }

    /// Count one game for row `key`.
    pub fn record(&self, key: &str, score: Score) {
        let mut tally = self.tally.lock().expect("poisoned");
        tally.row_mut(key).add(score);
    }

    /// Count one game that ended without result (`*`). Its score is recorded separately.
    pub fn record_unfinished(&self) {
        let mut tally = self.tally.lock().expect("poisoned");
        tally.unfinished += 1;
    }

    /// Count one game that could not be written to the game log. It is still tallied.
    pub fn record_unlogged(&self) {
        let mut tally = self.tally.lock().expect("poisoned");
        tally.unlogged += 1;
    }

    /// Copy of the rows, in report order.
    pub fn snapshot(&self) -> Vec<(String, OpponentStats)> {
        self.tally.lock().expect("poisoned").rows.clone()
    }

    /// Sum of every row.
    pub fn total(&self) -> OpponentStats {
        self.tally.lock().expect("poisoned").total()
    }

    /// Final report of a tournament whose scheduling ended with `summary`.
    pub fn final_report(
        &self,
        title: impl Into<String>,
        summary: ScheduleSummary,
    ) -> TournamentReport {
        let tally = self.tally.lock().expect("poisoned");
        let total = tally.total();
        TournamentReport {
            title: title.into(),
            rows: tally.rows.clone(),
            total,
            unfinished: tally.unfinished,
            unlogged: tally.unlogged,
            summary,
        }
    }
}

/// Read-only view of a finished tournament.
#[derive(Debug, Clone, PartialEq)]
pub struct TournamentReport {
    /// Printed above the table.
    pub title: String,
    /// Per-row stats, in registration order.
    pub rows: Vec<(String, OpponentStats)>,
    /// Sum of every row.
    pub total: OpponentStats,
    /// Games that ended without result.
    pub unfinished: u32,
    /// Games played but missing from the game log.
    pub unlogged: u32,
    /// How scheduling went.
    pub summary: ScheduleSummary,
}

const WIDTH: usize = 60;

impl TournamentReport {
    /// Performance rating of the tracked side over every row.
    pub fn rating(&self) -> RatingEstimate {
        RatingEstimate::from_ratio(self.total.ratio())
    }

    /// Table with one line per row, then the grand total. `first_column` names the rows.
    pub fn table(&self, first_column: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n", "=".repeat(WIDTH)));
        out.push_str(&format!("{:^WIDTH$}\n", self.title));
        out.push_str(&format!("{}\n", "=".repeat(WIDTH)));
        out.push_str(&format!(
            "{:<12} {:>4} {:>4} {:>4} {:>8} {:>6} {:>7}\n",
            first_column, "W", "D", "L", "Score", "/ N", "%"
        ));
        out.push_str(&format!("{}\n", "-".repeat(WIDTH)));
        for (key, stats) in &self.rows {
            out.push_str(&Self::line(key, stats));
        }
        out.push_str(&format!("{}\n", "-".repeat(WIDTH)));
        out.push_str(&Self::line("TOTAL", &self.total));
        out.push_str(&format!("{}\n", "=".repeat(WIDTH)));
        out
    }

    /// Single-row summary, for head-to-head matches.
    pub fn duel(&self, tracked: &str, other: &str) -> String {
        let t = &self.total;
        let mut out = String::new();
        out.push_str(&format!("{}\n", "=".repeat(WIDTH)));
        out.push_str(&format!("{:^WIDTH$}\n", self.title));
        out.push_str(&format!("{}\n", "=".repeat(WIDTH)));
        out.push_str(&format!("  {:<14}{}\n", format!("{tracked} wins:"), t.wins));
        out.push_str(&format!("  {:<14}{}\n", "Draws:", t.draws));
        out.push_str(&format!("  {:<14}{}\n", format!("{other} wins:"), t.losses));
        out.push_str(&format!(
            "  {:<14}{:.1}/{} ({:.1}%)\n",
            "Score:",
            t.score,
            t.games(),
            t.percentage()
        ));
        out.push_str(&format!(
            "  {:<14}{} ({tracked} relative to {other})\n",
            "Elo diff:",
            self.rating()
        ));
        out.push_str(&format!("{}\n", "=".repeat(WIDTH)));
        out
    }

    /// Scheduled, completed, dropped and skipped games.
    pub fn counts(&self) -> String {
        let s = &self.summary;
        let mut line = format!(
            "{} games scheduled, {} completed, {} dropped, {} skipped",
            s.submitted, s.completed, s.failed, s.skipped
        );
        if self.unfinished > 0 {
            line.push_str(&format!(" ({} without result)", self.unfinished));
        }
        if self.unlogged > 0 {
            line.push_str(&format!(", {} not written to the log", self.unlogged));
        }
        line
    }

    /// Games written to the game log.
    pub fn logged(&self) -> usize {
        self.summary.completed.saturating_sub(self.unlogged as usize)
    }

    fn line(key: &str, stats: &OpponentStats) -> String {
        format!(
            "  {:<10} {:>4} {:>4} {:>4} {:>8.1} {:>6} {:>6.1}%\n",
            key,
            stats.wins,
            stats.draws,
            stats.losses,
            stats.score,
            format!("/{}", stats.games()),
            stats.percentage()
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn row(results: &ResultsAggregator, key: &str) -> Option<OpponentStats> {
        results
            .snapshot()
            .into_iter()
            .find_map(|(k, stats)| (k == key).then_some(stats))
    }

    #[test]
    fn score_values() {
        assert_eq!(Score::Win.value(), 1.0);
        assert_eq!(Score::Draw.value(), 0.5);
        assert_eq!(Score::Loss.value(), 0.0);
    }

    #[test]
    fn rating_difference_bounds() {
        assert_eq!(rating_difference(0.5), 0.0);
        assert_eq!(rating_difference(1.0), f64::INFINITY);
        assert_eq!(rating_difference(0.0), f64::NEG_INFINITY);
        assert!((rating_difference(0.75) - 190.848).abs() < 0.01);
        assert!((rating_difference(0.25) + 190.848).abs() < 0.01);
    }

    #[test]
    fn rating_difference_is_monotonic() {
        let mut previous = rating_difference(0.0);
        for i in 1..=100 {
            let current = rating_difference(f64::from(i) / 100.0);
            assert!(current > previous, "not increasing at p = {i}%");
            previous = current;
        }
    }

    #[test]
    fn rating_display() {
        assert_eq!(RatingEstimate::from_ratio(0.5).to_string(), "+0");
        assert_eq!(RatingEstimate::from_ratio(0.75).to_string(), "+191");
        assert_eq!(RatingEstimate::from_ratio(0.25).to_string(), "-191");
        assert_eq!(RatingEstimate::from_ratio(1.0).to_string(), "+inf");
        assert_eq!(RatingEstimate::from_ratio(0.0).to_string(), "-inf");
    }

    #[test]
    fn rows_keep_registration_order() {
        let results = ResultsAggregator::new();
        results.register("SF-1320");
        results.register("SF-1420");
        results.record("SF-1420", Score::Win);
        results.record("SF-1320", Score::Draw);
        results.record("late", Score::Loss);

        let keys = results
            .snapshot()
            .into_iter()
            .map(|(k, _)| k)
            .collect::<Vec<_>>();
        assert_eq!(keys, ["SF-1320", "SF-1420", "late"]);
    }

    #[test]
    fn score_matches_counts() {
        let results = ResultsAggregator::new();
        for s in [Score::Win, Score::Draw, Score::Draw, Score::Loss, Score::Win] {
            results.record("A", s);
        }
        let a = row(&results, "A").unwrap();
        assert_eq!((a.wins, a.draws, a.losses), (2, 2, 1));
        assert_eq!(a.score, f64::from(a.wins) + 0.5 * f64::from(a.draws));
        assert_eq!(a.games(), 5);
        assert!((a.percentage() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn concurrent_records_commute() {
        let scores = [Score::Win, Score::Draw, Score::Loss, Score::Draw];
        let results = Arc::new(ResultsAggregator::new());
        let handles = (0..8)
            .map(|t| {
                let results = results.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        let key = if (t + i) % 2 == 0 { "even" } else { "odd" };
                        results.record(key, scores[(t + i) % scores.len()]);
                    }
                })
            })
            .collect::<Vec<_>>();
        for h in handles {
            h.join().unwrap();
        }

        let sequential = ResultsAggregator::new();
        for t in 0..8 {
            for i in 0..250 {
                let key = if (t + i) % 2 == 0 { "even" } else { "odd" };
                sequential.record(key, scores[(t + i) % scores.len()]);
            }
        }

        for key in ["even", "odd"] {
            assert_eq!(row(&results, key), row(&sequential, key));
        }
    }

    #[test]
    fn report_totals_and_table() {
        let results = ResultsAggregator::new();
        results.register("SF-1320");
        results.register("SF-1420");
        results.record("SF-1320", Score::Win);
        results.record("SF-1320", Score::Win);
        results.record("SF-1420", Score::Draw);
        results.record("SF-1420", Score::Loss);
        results.record_unfinished();

        let summary = ScheduleSummary {
            submitted: 5,
            completed: 4,
            failed: 1,
            skipped: 0,
        };
        let report = results.final_report("Challenger RESULTS", summary);
        assert_eq!(report.total.games(), 4);
        assert_eq!(report.total.score, 2.5);
        assert_eq!(report.rating(), RatingEstimate::from_ratio(0.625));

        let table = report.table("Opponent");
        assert!(table.contains("Challenger RESULTS"));
        assert!(table.contains("Opponent        W    D    L"));
        assert!(table.contains("  SF-1320       2    0    0      2.0     /2  100.0%"));
        assert!(table.contains("  TOTAL         2    1    1      2.5     /4   62.5%"));
        assert_eq!(
            report.counts(),
            "5 games scheduled, 4 completed, 1 dropped, 0 skipped (1 without result)"
        );
        assert_eq!(report.logged(), 4);
    }

    #[test]
    fn unlogged_games_are_still_tallied() {
        let results = ResultsAggregator::new();
        results.record("A", Score::Win);
        results.record_unlogged();
        results.record("A", Score::Draw);

        let summary = ScheduleSummary {
            submitted: 2,
            completed: 2,
            failed: 0,
            skipped: 0,
        };
        let report = results.final_report("RESULTS", summary);
        assert_eq!(report.total.games(), 2);
        assert_eq!(report.unlogged, 1);
        assert_eq!(report.logged(), 1);
        assert!(report.counts().ends_with(", 1 not written to the log"));
    }
}
