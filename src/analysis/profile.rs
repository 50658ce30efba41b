// Team profiles: rosters joined with stats, category totals, league
// z-scores, weighted scores, punts and strengths.

use serde::Serialize;
use tracing::debug;

use crate::analysis::injury::classify_injury;
use crate::analysis::{zscores_within, RosterPlayer, StatAccumulator};
use crate::category::{Category, CategoryValues};
use crate::config::{CategoryWeights, InjuryConfig, ScoringConfig};
use crate::league::{FantasyTeam, LeaguePlayer};
use crate::stats::StatsIndex;

/// Join one league player with stats and an injury report.
pub fn enrich_player(
    player: &LeaguePlayer,
    stats: &StatsIndex,
    injury: &InjuryConfig,
) -> RosterPlayer {
    let line = match stats.require(&player.name) {
        Ok(found) => Some(found.line),
        Err(gap) => {
            debug!("{gap}");
            None
        }
    };
    RosterPlayer {
        player: player.clone(),
        stats: line,
        injury: classify_injury(&player.injury_status, &player.injury_detail, injury),
    }
}

/// Enrich a team's roster in roster order.
pub fn build_roster(
    team: &FantasyTeam,
    stats: &StatsIndex,
    injury: &InjuryConfig,
) -> Vec<RosterPlayer> {
    team.roster
        .iter()
        .map(|p| enrich_player(p, stats, injury))
        .collect()
}

/// Category totals of a roster; players without stats add nothing.
pub fn roster_totals(roster: &[RosterPlayer]) -> CategoryValues {
    let mut acc = StatAccumulator::default();
    for line in roster.iter().filter_map(|p| p.stats.as_ref()) {
        acc.add(line, 1.0);
    }
    acc.finish()
}

// ---------------------------------------------------------------------------
// TeamProfile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamProfile {
    pub team_id: u32,
    pub name: String,
    pub abbrev: String,
    pub roster: Vec<RosterPlayer>,
    pub totals: CategoryValues,
    /// League z-score per category (TOV sign-flipped, higher is better).
    pub raw_z: CategoryValues,
    /// `raw_z` times category weight; zero for manually punted categories.
    pub weighted_z: CategoryValues,
    pub total_score: f64,
    pub punts: Vec<Category>,
    pub strengths: Vec<Category>,
}

impl TeamProfile {
    pub fn is_punted(&self, cat: Category) -> bool {
        self.punts.contains(&cat)
    }

    pub fn is_strength(&self, cat: Category) -> bool {
        self.strengths.contains(&cat)
    }

    /// Rostered players with no matching stat record.
    pub fn data_gaps(&self) -> impl Iterator<Item = &RosterPlayer> {
        self.roster.iter().filter(|p| !p.has_stats())
    }
}

/// Build a profile per team with totals and league-relative z-scores.
/// Weighted scores, punts and strengths are left empty until
/// [`apply_weights_and_scores`].
pub fn aggregate_team_profiles(
    teams: &[FantasyTeam],
    stats: &StatsIndex,
    injury: &InjuryConfig,
) -> Vec<TeamProfile> {
    let mut profiles: Vec<TeamProfile> = teams
        .iter()
        .map(|team| {
            let roster = build_roster(team, stats, injury);
            let totals = roster_totals(&roster);
            TeamProfile {
                team_id: team.team_id,
                name: team.name.clone(),
                abbrev: team.abbrev.clone(),
                roster,
                totals,
                raw_z: CategoryValues::zero(),
                weighted_z: CategoryValues::zero(),
                total_score: 0.0,
                punts: Vec::new(),
                strengths: Vec::new(),
            }
        })
        .collect();

    let totals: Vec<CategoryValues> = profiles.iter().map(|p| p.totals).collect();
    for (profile, z) in profiles.iter_mut().zip(zscores_within(&totals)) {
        profile.raw_z = z;
    }
    profiles
}

/// Fill in weighted z-scores, total score, punts and strengths.
///
/// A weight of 0 is a manual punt and is excluded from the total. Auto
/// punts are the worst categories at or below `punt_threshold` (up to
/// `max_auto_punts`), or else the single worst below-average category.
pub fn apply_weights_and_scores(
    profiles: &mut [TeamProfile],
    weights: &CategoryWeights,
    scoring: &ScoringConfig,
) {
    for profile in profiles.iter_mut() {
        let active: Vec<Category> = Category::ALL
            .into_iter()
            .filter(|c| weights.get(*c) > 0.0)
            .collect();

        profile.weighted_z = CategoryValues::from_fn(|cat| {
            let w = weights.get(cat);
            if w <= 0.0 {
                return 0.0;
            }
            let w = if cat.is_negative() { w * scoring.turnover_weight } else { w };
            profile.raw_z.get(cat) * w
        });
        profile.total_score = profile.weighted_z.sum();

        let by_z = |cats: &mut Vec<Category>| {
            cats.sort_by(|a, b| profile.raw_z.get(*a).total_cmp(&profile.raw_z.get(*b)))
        };
        let mut serious: Vec<Category> = active
            .iter()
            .copied()
            .filter(|c| profile.raw_z.get(*c) <= scoring.punt_threshold)
            .collect();
        let mut weak: Vec<Category> = active
            .iter()
            .copied()
            .filter(|c| profile.raw_z.get(*c) < 0.0)
            .collect();
        by_z(&mut serious);
        by_z(&mut weak);

        let auto_punts: Vec<Category> = if !serious.is_empty() {
            serious.into_iter().take(scoring.max_auto_punts).collect()
        } else {
            weak.into_iter().take(1).collect()
        };

        profile.punts = Category::ALL
            .into_iter()
            .filter(|c| weights.get(*c) <= 0.0 || auto_punts.contains(c))
            .collect();

        let mut strengths: Vec<Category> = active
            .iter()
            .copied()
            .filter(|c| !profile.punts.contains(c))
            .filter(|c| profile.raw_z.get(*c) >= scoring.strength_threshold)
            .collect();
        strengths.sort_by(|a, b| profile.raw_z.get(*b).total_cmp(&profile.raw_z.get(*a)));
        strengths.truncate(scoring.max_strengths);
        profile.strengths = strengths;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
