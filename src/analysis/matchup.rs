// Head-to-head matchup analysis: projections, live category breakdown and
// the "what do we need this week" vector.

use serde::Serialize;

use crate::analysis::profile::TeamProfile;
use crate::analysis::{normalized, StatAccumulator};
use crate::category::{Category, CategoryValues};
use crate::config::StreamingConfig;
use crate::league::{CategoryOutcome, MatchupRecord, MatchupSide};

/// Differences smaller than this are ties.
const TIE_EPSILON: f64 = 1e-6;

/// Smallest denominator used for relative margins.
const MIN_RELATIVE_BASE: f64 = 1e-3;

/// Outcome from the perspective of the side holding `mine`.
fn outcome(cat: Category, mine: f64, theirs: f64) -> CategoryOutcome {
    let margin = signed_margin(cat, mine, theirs);
    if margin.abs() < TIE_EPSILON {
        CategoryOutcome::Tie
    } else if margin > 0.0 {
        CategoryOutcome::Win
    } else {
        CategoryOutcome::Loss
    }
}

/// Positive when `mine` is ahead.
fn signed_margin(cat: Category, mine: f64, theirs: f64) -> f64 {
    if cat.is_negative() {
        theirs - mine
    } else {
        mine - theirs
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Expected games per rostered player in the scoring period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPeriod {
    pub games: f64,
}

impl ScoringPeriod {
    pub fn uniform(games: f64) -> Self {
        ScoringPeriod { games }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedCategory {
    pub category: Category,
    pub home: f64,
    pub away: f64,
    /// From the home team's point of view.
    pub outcome: CategoryOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupProjection {
    pub home_id: u32,
    pub away_id: u32,
    pub categories: Vec<ProjectedCategory>,
    pub home_wins: usize,
    pub away_wins: usize,
    pub ties: usize,
}

impl MatchupProjection {
    /// Home record as "W-L-T".
    pub fn record(&self) -> String {
        format!("{}-{}-{}", self.home_wins, self.away_wins, self.ties)
    }
}

/// Projected category totals of a team over `period`: per-game lines times
/// games times availability (`1 - injury severity`).
pub fn project_team(team: &TeamProfile, period: &ScoringPeriod) -> CategoryValues {
    let mut acc = StatAccumulator::default();
    for p in &team.roster {
        let Some(line) = &p.stats else { continue };
        let availability = (1.0 - p.severity()).clamp(0.0, 1.0);
        acc.add(line, period.games * availability);
    }
    acc.finish()
}

pub fn project_matchup(
    home: &TeamProfile,
    away: &TeamProfile,
    period: &ScoringPeriod,
) -> MatchupProjection {
    let home_totals = project_team(home, period);
    let away_totals = project_team(away, period);

    let categories: Vec<ProjectedCategory> = Category::ALL
        .into_iter()
        .map(|cat| ProjectedCategory {
            category: cat,
            home: home_totals.get(cat),
            away: away_totals.get(cat),
            outcome: outcome(cat, home_totals.get(cat), away_totals.get(cat)),
        })
        .collect();
    let count = |o: CategoryOutcome| categories.iter().filter(|c| c.outcome == o).count();

    MatchupProjection {
        home_id: home.team_id,
        away_id: away.team_id,
        home_wins: count(CategoryOutcome::Win),
        away_wins: count(CategoryOutcome::Loss),
        ties: count(CategoryOutcome::Tie),
        categories,
    }
}

// ---------------------------------------------------------------------------
// Live matchup
// ---------------------------------------------------------------------------

/// One row of the live category table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryNeed {
    pub category: Category,
    pub mine: f64,
    pub theirs: f64,
    /// Positive when ahead (TOV already inverted).
    pub margin: f64,
    pub relative_gap: f64,
    pub outcome: CategoryOutcome,
    pub need: f64,
}

/// Live per-category values of both sides, for categories both report.
fn live_pairs<'a>(
    mine: &'a MatchupSide,
    theirs: &'a MatchupSide,
) -> impl Iterator<Item = (Category, f64, f64)> + 'a {
    Category::ALL.into_iter().filter_map(|cat| {
        let m = mine.category(cat)?.value;
        let t = theirs.category(cat)?.value;
        Some((cat, m, t))
    })
}

fn relative_gap(margin: f64, theirs: f64) -> f64 {
    margin.abs() / theirs.abs().max(MIN_RELATIVE_BASE)
}

/// Per-category table of the live matchup with the need weight of each
/// category.
pub fn live_category_breakdown(
    mine: &MatchupSide,
    theirs: &MatchupSide,
    need: &CategoryValues,
) -> Vec<CategoryNeed> {
    live_pairs(mine, theirs)
        .map(|(cat, m, t)| {
            let margin = signed_margin(cat, m, t);
            CategoryNeed {
                category: cat,
                mine: m,
                theirs: t,
                margin,
                relative_gap: relative_gap(margin, t),
                outcome: outcome(cat, m, t),
                need: need.get(cat),
            }
        })
        .collect()
}

/// Where to push this week, from the live box score.
///
/// Close losses matter most, medium deficits less, blowouts a little;
/// fragile leads get a small "protect" weight and comfortable leads none.
/// Punted categories are scaled by `punt_multiplier`. The result sums to 1,
/// or is all zeros when nothing is needed or no live data exists.
pub fn matchup_need_vector(
    mine: &MatchupSide,
    theirs: &MatchupSide,
    punts: &[Category],
    config: &StreamingConfig,
) -> CategoryValues {
    let mut need = CategoryValues::zero();
    for (cat, m, t) in live_pairs(mine, theirs) {
        let margin = signed_margin(cat, m, t);
        let rel = relative_gap(margin, t);
        need[cat] = if margin >= 0.0 {
            if rel < config.close_margin {
                0.4 * (1.0 - rel / config.close_margin)
            } else {
                0.0
            }
        } else if rel < config.close_margin {
            1.0
        } else if rel < config.medium_margin {
            0.6
        } else {
            0.2
        };
    }
    for cat in punts {
        need[*cat] *= config.punt_multiplier;
    }
    normalized(&need).unwrap_or(need)
}

/// The team `team_id` faces in `matchups`, if any.
pub fn find_opponent(team_id: u32, matchups: &[MatchupRecord]) -> Option<u32> {
    matchups
        .iter()
        .find_map(|m| m.sides_for(team_id))
        .and_then(|(_, theirs)| theirs.map(|s| s.team_id))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::{injured, player};
    use crate::analysis::RosterPlayer;
    use crate::league::CategoryResult;

    fn streaming_config() -> StreamingConfig {
        StreamingConfig {
            max_results: 15,
            max_drops: 3,
            free_agent_limit: 100,
            close_margin: 0.05,
            medium_margin: 0.15,
            punt_multiplier: 0.1,
            filter_by_schedule: true,
        }
    }

    fn profile(id: u32, roster: Vec<RosterPlayer>) -> TeamProfile {
        TeamProfile {
            team_id: id,
            name: format!("Team {id}"),
            abbrev: format!("T{id}"),
            roster,
            totals: CategoryValues::zero(),
            raw_z: CategoryValues::zero(),
            weighted_z: CategoryValues::zero(),
            total_score: 0.0,
            punts: vec![],
            strengths: vec![],
        }
    }

    fn side(team_id: u32, values: &[(Category, f64)]) -> MatchupSide {
        MatchupSide {
            team_id,
            score: None,
            categories: values
                .iter()
                .map(|(c, v)| CategoryResult {
                    category: *c,
                    value: *v,
                    outcome: None,
                })
                .collect(),
        }
    }

    #[test]
    fn projection_scales_by_games_and_availability() {
        let healthy = player("A", "PG", 20.0, 5.0, 5.0);
        let hurt = injured(player("B", "C", 20.0, 10.0, 1.0), 0.5);
        let home = profile(1, vec![healthy.clone()]);
        let away = profile(2, vec![hurt]);
        let proj = project_matchup(&home, &away, &ScoringPeriod::uniform(3.0));

        let pts = &proj.categories[Category::Pts.index()];
        assert_eq!(pts.home, 60.0);
        assert_eq!(pts.away, 30.0);
        assert_eq!(pts.outcome, CategoryOutcome::Win);
        let reb = &proj.categories[Category::Reb.index()];
        assert_eq!(reb.outcome, CategoryOutcome::Tie);
        assert_eq!(proj.home_wins + proj.away_wins + proj.ties, Category::COUNT);
    }

    #[test]
    fn projection_inverts_turnovers() {
        let mut careful = player("A", "PG", 10.0, 0.0, 0.0);
        careful.stats.as_mut().unwrap().per_game[Category::Tov] = 1.0;
        let mut sloppy = player("B", "PG", 10.0, 0.0, 0.0);
        sloppy.stats.as_mut().unwrap().per_game[Category::Tov] = 4.0;
        let proj = project_matchup(
            &profile(1, vec![careful]),
            &profile(2, vec![sloppy]),
            &ScoringPeriod::uniform(1.0),
        );
        assert_eq!(
            proj.categories[Category::Tov.index()].outcome,
            CategoryOutcome::Win
        );
    }

    #[test]
    fn every_player_gets_the_same_games() {
        let mut celtic = player("A", "PG", 10.0, 0.0, 0.0);
        celtic.player.pro_team = "BOS".into();
        let mut laker = player("B", "PG", 10.0, 0.0, 0.0);
        laker.player.pro_team = "LAL".into();
        let totals = project_team(&profile(1, vec![celtic, laker]), &ScoringPeriod::uniform(3.0));
        assert_eq!(totals[Category::Pts], 60.0);
    }

    #[test]
    fn players_without_stats_contribute_nothing() {
        let mut gap = player("A", "PG", 50.0, 0.0, 0.0);
        gap.stats = None;
        let totals = project_team(&profile(1, vec![gap]), &ScoringPeriod::uniform(3.0));
        assert_eq!(totals, CategoryValues::zero());
    }

    #[test]
    fn breakdown_reports_margins() {
        let mine = side(1, &[(Category::Pts, 95.0), (Category::Tov, 10.0)]);
        let theirs = side(2, &[(Category::Pts, 100.0), (Category::Tov, 12.0), (Category::Reb, 40.0)]);
        let rows = live_category_breakdown(&mine, &theirs, &CategoryValues::splat(0.5));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].category, Category::Pts);
        assert_eq!(rows[0].margin, -5.0);
        assert!((rows[0].relative_gap - 0.05).abs() < 1e-12);
        assert_eq!(rows[0].outcome, CategoryOutcome::Loss);
        assert_eq!(rows[1].margin, 2.0);
        assert_eq!(rows[1].outcome, CategoryOutcome::Win);
        assert_eq!(rows[1].need, 0.5);
    }

    #[test]
    fn need_vector_prioritises_close_losses() {
        let mine = side(
            1,
            &[
                (Category::Pts, 98.0),  // close loss
                (Category::Reb, 45.0),  // medium deficit
                (Category::Ast, 10.0),  // blowout loss
                (Category::Stl, 30.0),  // comfortable lead
            ],
        );
        let theirs = side(
            2,
            &[
                (Category::Pts, 100.0),
                (Category::Reb, 50.0),
                (Category::Ast, 30.0),
                (Category::Stl, 10.0),
            ],
        );
        let need = matchup_need_vector(&mine, &theirs, &[], &streaming_config());
        assert!((need.sum() - 1.0).abs() < 1e-9);
        assert!((need[Category::Pts] - 1.0 / 1.8).abs() < 1e-9);
        assert!((need[Category::Reb] - 0.6 / 1.8).abs() < 1e-9);
        assert!((need[Category::Ast] - 0.2 / 1.8).abs() < 1e-9);
        assert_eq!(need[Category::Stl], 0.0);
    }

    #[test]
    fn need_vector_protects_fragile_leads_and_respects_punts() {
        let mine = side(1, &[(Category::Pts, 101.0), (Category::Blk, 4.0)]);
        let theirs = side(2, &[(Category::Pts, 100.0), (Category::Blk, 5.0)]);
        let need = matchup_need_vector(&mine, &theirs, &[Category::Blk], &streaming_config());
        // PTS: 0.4 * (1 - 0.01/0.05) = 0.32; BLK: 0.2 * 0.1 = 0.02
        assert!((need[Category::Pts] - 0.32 / 0.34).abs() < 1e-9);
        assert!((need[Category::Blk] - 0.02 / 0.34).abs() < 1e-9);
    }

    #[test]
    fn need_vector_without_live_data_is_zero() {
        let need = matchup_need_vector(&side(1, &[]), &side(2, &[]), &[], &streaming_config());
        assert_eq!(need, CategoryValues::zero());
    }

    #[test]
    fn opponent_lookup() {
        let matchups = vec![MatchupRecord {
            period: 1,
            home: side(4, &[]),
            away: Some(side(7, &[])),
        }];
        assert_eq!(find_opponent(7, &matchups), Some(4));
        assert_eq!(find_opponent(4, &matchups), Some(7));
        assert_eq!(find_opponent(1, &matchups), None);
    }
}
