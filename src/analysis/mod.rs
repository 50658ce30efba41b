// Fantasy analysis: pure functions over enriched rosters.

pub mod injury;
pub mod league;
pub mod matchup;
pub mod position;
pub mod profile;
pub mod streaming;
pub mod trade;

use serde::Serialize;

use crate::category::{Category, CategoryValues};
use crate::league::LeaguePlayer;
use crate::stats::StatLine;
use injury::InjuryReport;
use position::{primary_position, Position};

// ---------------------------------------------------------------------------
// Roster players
// ---------------------------------------------------------------------------

/// A league player joined with NBA stats and an injury assessment.
///
/// `stats` is `None` when no stat record matched the player (a data gap).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterPlayer {
    pub player: LeaguePlayer,
    pub stats: Option<StatLine>,
    pub injury: InjuryReport,
}

impl RosterPlayer {
    pub fn name(&self) -> &str {
        &self.player.name
    }

    pub fn has_stats(&self) -> bool {
        self.stats.is_some()
    }

    pub fn severity(&self) -> f64 {
        self.injury.severity
    }

    /// Fraction of a player's value kept given their injury severity.
    pub fn durability(&self, penalty: f64) -> f64 {
        1.0 - penalty * self.severity().clamp(0.0, 1.0)
    }

    pub fn position(&self) -> Position {
        if self.player.position.trim().is_empty() {
            if let Some(first) = self.player.eligible_positions.first() {
                return primary_position(first);
            }
        }
        primary_position(&self.player.position)
    }
}

// ---------------------------------------------------------------------------
// Pool statistics
// ---------------------------------------------------------------------------

/// Mean and standard deviation of one category across a player pool.
#[derive(Debug, Clone, Copy)]
pub struct PoolStats {
    pub mean: f64,
    pub stdev: f64,
}

/// Threshold below which standard deviation is treated as zero.
const STDEV_EPSILON: f64 = 1e-9;

/// Population mean and standard deviation; zeros for an empty slice.
pub fn compute_pool_stats(values: &[f64]) -> PoolStats {
    if values.is_empty() {
        return PoolStats {
            mean: 0.0,
            stdev: 0.0,
        };
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    PoolStats {
        mean,
        stdev: variance.sqrt(),
    }
}

/// Z-score of `value`; 0.0 when the pool has no spread.
pub fn compute_zscore(value: f64, stats: &PoolStats) -> f64 {
    if stats.stdev < STDEV_EPSILON {
        return 0.0;
    }
    (value - stats.mean) / stats.stdev
}

/// Z-score every row of `rows` per category against the rows themselves.
/// Negative categories are sign-flipped so higher is always better.
pub fn zscores_within(rows: &[CategoryValues]) -> Vec<CategoryValues> {
    let mut out = vec![CategoryValues::zero(); rows.len()];
    for cat in Category::ALL {
        let values: Vec<f64> = rows.iter().map(|r| r.get(cat)).collect();
        let pool = compute_pool_stats(&values);
        for (z, value) in out.iter_mut().zip(&values) {
            let mut score = compute_zscore(*value, &pool);
            if cat.is_negative() {
                score = -score;
            }
            z.set(cat, score);
        }
    }
    out
}

/// Per-game z-scores of `players` computed over that same pool. Players
/// without stats get a zero vector and do not shift the pool.
pub fn local_player_zscores(players: &[&RosterPlayer]) -> Vec<CategoryValues> {
    let with_stats: Vec<(usize, CategoryValues)> = players
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.stats.map(|s| (i, s.per_game)))
        .collect();
    let rows: Vec<CategoryValues> = with_stats.iter().map(|(_, v)| *v).collect();
    let zs = zscores_within(&rows);

    let mut out = vec![CategoryValues::zero(); players.len()];
    for ((i, _), z) in with_stats.iter().zip(zs) {
        out[*i] = z;
    }
    out
}

/// Normalize so the values sum to 1. Returns `None` when the sum is not
/// positive.
pub fn normalized(values: &CategoryValues) -> Option<CategoryValues> {
    let total = values.sum();
    (total > 0.0).then(|| values.scale(1.0 / total))
}

/// Categories with a positive contribution, strongest first, at most `n`.
/// Ties keep display order.
pub fn top_categories(
    contrib: &CategoryValues,
    cats: impl IntoIterator<Item = Category>,
    n: usize,
) -> Vec<Category> {
    let mut helped: Vec<Category> = cats.into_iter().filter(|c| contrib.get(*c) > 0.0).collect();
    helped.sort_by(|a, b| contrib.get(*b).total_cmp(&contrib.get(*a)));
    helped.truncate(n);
    helped
}

// ---------------------------------------------------------------------------
// Stat accumulation
// ---------------------------------------------------------------------------

/// Sums stat lines into category totals. Counting stats add up; shooting
/// percentages are total makes over total attempts, falling back to the
/// factor-weighted mean when no attempt data is present.
#[derive(Debug, Clone, Default)]
pub struct StatAccumulator {
    totals: CategoryValues,
    makes: [f64; 2],
    attempts: [f64; 2],
    pct_weighted: [f64; 2],
    weight: f64,
}

fn pct_slot(cat: Category) -> Option<usize> {
    match cat {
        Category::FgPct => Some(0),
        Category::FtPct => Some(1),
        _ => None,
    }
}

impl StatAccumulator {
    /// Add `line` scaled by `factor` (games played, availability, ...).
    pub fn add(&mut self, line: &StatLine, factor: f64) {
        if factor <= 0.0 {
            return;
        }
        self.weight += factor;
        for cat in Category::ALL {
            match (pct_slot(cat), line.attempts(cat)) {
                (Some(slot), Some((made, att))) => {
                    self.makes[slot] += made * factor;
                    self.attempts[slot] += att * factor;
                    self.pct_weighted[slot] += line.get(cat) * factor;
                }
                _ => self.totals[cat] += line.get(cat) * factor,
            }
        }
    }

    pub fn finish(mut self) -> CategoryValues {
        for cat in [Category::FgPct, Category::FtPct] {
            let Some(slot) = pct_slot(cat) else { continue };
            self.totals[cat] = if self.attempts[slot] > 0.0 {
                self.makes[slot] / self.attempts[slot]
            } else if self.weight > 0.0 {
                self.pct_weighted[slot] / self.weight
            } else {
                0.0
            };
        }
        self.totals
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analysis::injury::InjuryLabel;

    /// Test helper: a roster player with a simple stat line.
    pub(crate) fn player(name: &str, position: &str, pts: f64, reb: f64, ast: f64) -> RosterPlayer {
        let mut line = StatLine {
            fgm: 5.0,
            fga: 10.0,
            ftm: 3.0,
            fta: 4.0,
            games_played: 40,
            ..StatLine::default()
        };
        line.per_game[Category::Pts] = pts;
        line.per_game[Category::Reb] = reb;
        line.per_game[Category::Ast] = ast;
        line.per_game[Category::FgPct] = 0.5;
        line.per_game[Category::FtPct] = 0.75;
        RosterPlayer {
            player: LeaguePlayer {
                espn_id: None,
                name: name.to_string(),
                position: position.to_string(),
                eligible_positions: vec![],
                pro_team: "BOS".to_string(),
                injury_status: String::new(),
                injury_detail: String::new(),
                lineup_slot: None,
            },
            stats: Some(line),
            injury: InjuryReport::healthy(),
        }
    }

    pub(crate) fn without_stats(mut p: RosterPlayer) -> RosterPlayer {
        p.stats = None;
        p
    }

    pub(crate) fn injured(mut p: RosterPlayer, severity: f64) -> RosterPlayer {
        p.injury = InjuryReport {
            severity,
            label: InjuryLabel::Severe,
        };
        p
    }

    #[test]
    fn pool_stats_population_stdev() {
        let stats = compute_pool_stats(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.stdev - 2.0).abs() < 1e-12);
        assert_eq!(compute_pool_stats(&[]).mean, 0.0);
    }

    #[test]
    fn zscore_guards_zero_spread() {
        let stats = PoolStats {
            mean: 3.0,
            stdev: 0.0,
        };
        assert_eq!(compute_zscore(10.0, &stats), 0.0);
    }

    #[test]
    fn zscores_within_flips_turnovers() {
        let mut low = CategoryValues::zero();
        low[Category::Tov] = 1.0;
        let mut high = CategoryValues::zero();
        high[Category::Tov] = 3.0;
        let zs = zscores_within(&[low, high]);
        assert!(zs[0][Category::Tov] > 0.0);
        assert!(zs[1][Category::Tov] < 0.0);
        assert_eq!(zs[0][Category::Pts], 0.0);
    }

    #[test]
    fn local_zscores_skip_players_without_stats() {
        let a = player("A", "PG", 10.0, 0.0, 0.0);
        let b = player("B", "PG", 20.0, 0.0, 0.0);
        let gap = without_stats(player("C", "PG", 99.0, 0.0, 0.0));
        let zs = local_player_zscores(&[&a, &gap, &b]);
        assert!((zs[0][Category::Pts] + 1.0).abs() < 1e-12);
        assert_eq!(zs[1], CategoryValues::zero());
        assert!((zs[2][Category::Pts] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn accumulator_weights_percentages_by_attempts() {
        let mut acc = StatAccumulator::default();
        let a = player("A", "PG", 10.0, 1.0, 1.0).stats.unwrap();
        let mut b = a;
        b.fgm = 1.0;
        b.fga = 10.0;
        acc.add(&a, 1.0);
        acc.add(&b, 1.0);
        let totals = acc.finish();
        assert_eq!(totals[Category::Pts], 20.0);
        assert!((totals[Category::FgPct] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn accumulator_falls_back_to_mean_percentage() {
        let mut line = StatLine::default();
        line.per_game[Category::FtPct] = 0.8;
        let mut acc = StatAccumulator::default();
        acc.add(&line, 2.0);
        assert!((acc.finish()[Category::FtPct] - 0.8).abs() < 1e-12);
        assert_eq!(StatAccumulator::default().finish(), CategoryValues::zero());
    }

    #[test]
    fn top_categories_orders_and_truncates() {
        let mut v = CategoryValues::zero();
        v[Category::Reb] = 0.5;
        v[Category::Ast] = 0.9;
        v[Category::Stl] = -0.2;
        v[Category::Blk] = 0.1;
        let top = top_categories(&v, Category::trade_categories(), 2);
        assert_eq!(top, vec![Category::Ast, Category::Reb]);
    }

    #[test]
    fn normalized_requires_positive_sum() {
        assert!(normalized(&CategoryValues::zero()).is_none());
        let n = normalized(&CategoryValues::splat(2.0)).unwrap();
        assert!((n.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn durability_scales_with_severity() {
        let p = injured(player("A", "C", 1.0, 1.0, 1.0), 1.0);
        assert!((p.durability(0.7) - 0.3).abs() < 1e-12);
        assert_eq!(p.position(), Position::Center);
    }
}
