// Streaming / waiver recommendations: which free agents to add for the
// current matchup and which rostered players are the weakest fits.

use std::collections::HashSet;

use serde::Serialize;

use crate::analysis::matchup::matchup_need_vector;
use crate::analysis::profile::TeamProfile;
use crate::analysis::{local_player_zscores, normalized, top_categories, RosterPlayer};
use crate::category::{Category, CategoryValues};
use crate::config::{CategoryWeights, StreamingConfig};
use crate::league::MatchupSide;
use crate::stats::normalize_name;
use crate::stats::schedule::GameDay;

const MAX_CATS_HELPED: usize = 4;

/// Everything about my situation the streaming ranker looks at.
pub struct StreamingContext<'a> {
    pub my_team: &'a TeamProfile,
    pub opponent: Option<&'a TeamProfile>,
    /// `(mine, theirs)` live box score of the current matchup.
    pub live: Option<(&'a MatchupSide, &'a MatchupSide)>,
    pub game_day: &'a GameDay,
    pub weights: &'a CategoryWeights,
    /// Fraction of value lost at injury severity 1.0.
    pub durability_penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamingAdd {
    pub player: RosterPlayer,
    pub score: f64,
    pub cats_helped: Vec<Category>,
    pub injury_severity: f64,
    pub playing: bool,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamingDrop {
    pub player: RosterPlayer,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamingPlan {
    /// Normalized need per category (TOV always 0).
    pub needs: CategoryValues,
    pub adds: Vec<StreamingAdd>,
    pub drops: Vec<StreamingDrop>,
}

/// Season-long needs when there is no live matchup: categories where the
/// opponent is ahead, or without an opponent my own weak categories.
fn season_needs(ctx: &StreamingContext) -> CategoryValues {
    let mut needs = CategoryValues::zero();
    for cat in Category::trade_categories() {
        let mine = ctx.my_team.raw_z.get(cat);
        let gap = match ctx.opponent {
            Some(opp) => opp.raw_z.get(cat) - mine,
            None => -mine,
        };
        needs[cat] = gap.max(0.0) * ctx.weights.get(cat);
    }
    normalized(&needs).unwrap_or(needs)
}

/// Category needs over the trade categories: the live matchup blended with
/// the weights, or season needs when the live view is empty.
pub fn streaming_needs(ctx: &StreamingContext, config: &StreamingConfig) -> CategoryValues {
    if let Some((mine, theirs)) = ctx.live {
        let live = matchup_need_vector(mine, theirs, &ctx.my_team.punts, config);
        let mut needs = CategoryValues::zero();
        for cat in Category::trade_categories() {
            needs[cat] = live.get(cat) * ctx.weights.get(cat);
        }
        if let Some(n) = normalized(&needs) {
            return n;
        }
    }
    season_needs(ctx)
}

fn explanation(cats: &[Category], playing_team: Option<&str>, severity: f64) -> String {
    let mut parts = Vec::new();
    if !cats.is_empty() {
        let labels: Vec<&str> = cats.iter().map(|c| c.label()).collect();
        parts.push(format!("Boosts {} for this matchup.", labels.join(", ")));
    }
    if let Some(team) = playing_team {
        parts.push(format!("Plays today for {team}."));
    }
    if severity >= 0.6 {
        parts.push("Carries notable injury risk.".to_string());
    } else if severity >= 0.3 {
        parts.push("Minor injury notes to monitor.".to_string());
    }
    parts.join(" ")
}

/// Need-weighted effect of each player over `players`' own z-score pool.
fn scored<'a>(
    players: &[&'a RosterPlayer],
    needs: &CategoryValues,
    durability_penalty: f64,
) -> Vec<(&'a RosterPlayer, f64, CategoryValues)> {
    let zs = local_player_zscores(players);
    players
        .iter()
        .zip(zs)
        .map(|(p, z)| {
            let effect = z.scale(p.durability(durability_penalty));
            let contrib = CategoryValues::from_fn(|c| effect.get(c) * needs.get(c));
            let score = contrib.dot_over(&CategoryValues::splat(1.0), Category::trade_categories());
            (*p, score, contrib)
        })
        .collect()
}

/// Rank free agents for the current matchup and suggest drops.
///
/// Rostered players (matched by ESPN id or normalized name) and players
/// without stats are never suggested. Drops are only proposed alongside at
/// least one add, so an empty pool yields an empty plan.
pub fn recommend_streaming(
    ctx: &StreamingContext,
    pool: &[RosterPlayer],
    config: &StreamingConfig,
) -> StreamingPlan {
    let needs = streaming_needs(ctx, config);

    let rostered_ids: HashSet<i64> = ctx
        .my_team
        .roster
        .iter()
        .filter_map(|p| p.player.espn_id)
        .collect();
    let rostered_names: HashSet<String> = ctx
        .my_team
        .roster
        .iter()
        .map(|p| normalize_name(p.name()))
        .collect();

    let candidates: Vec<&RosterPlayer> = pool
        .iter()
        .filter(|p| p.has_stats())
        .filter(|p| !p.player.espn_id.is_some_and(|id| rostered_ids.contains(&id)))
        .filter(|p| !rostered_names.contains(&normalize_name(p.name())))
        .collect();

    let filter_schedule = config.filter_by_schedule && ctx.game_day.is_known();
    let mut adds: Vec<StreamingAdd> = scored(&candidates, &needs, ctx.durability_penalty)
        .into_iter()
        .filter_map(|(p, score, contrib)| {
            let team = p.player.pro_team.to_uppercase();
            let playing = ctx.game_day.plays(&team);
            if (filter_schedule && !playing) || score <= 0.0 {
                return None;
            }
            let cats_helped = top_categories(&contrib, Category::trade_categories(), MAX_CATS_HELPED);
            let playing_team = (playing && ctx.game_day.is_known()).then_some(team.as_str());
            Some(StreamingAdd {
                explanation: explanation(&cats_helped, playing_team, p.severity()),
                player: p.clone(),
                score,
                cats_helped,
                injury_severity: p.severity(),
                playing,
            })
        })
        .collect();
    adds.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.player.name().cmp(b.player.name()))
    });
    adds.truncate(config.max_results);
    if adds.is_empty() {
        return StreamingPlan {
            needs,
            adds,
            drops: Vec::new(),
        };
    }

    let mine: Vec<&RosterPlayer> = ctx.my_team.roster.iter().filter(|p| p.has_stats()).collect();
    let mut drops: Vec<StreamingDrop> = scored(&mine, &needs, ctx.durability_penalty)
        .into_iter()
        .map(|(p, score, _)| StreamingDrop {
            player: p.clone(),
            score,
        })
        .collect();
    drops.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| a.player.name().cmp(b.player.name()))
    });
    drops.truncate(config.max_drops);

    StreamingPlan { needs, adds, drops }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
