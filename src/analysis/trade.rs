// Trade suggestion engine: fit-based, fairness-checked package swaps between
// two fantasy teams.
//
// Both models share the same pipeline:
//   1. per-player z-scores over the two rosters (players with stats only)
//   2. a preference vector per team from its league z-scores
//   3. every package pair up to `max_package_size` per side
//   4. keep pairs where both teams gain and market values are close
// They differ in how preferences are shaped and how a package is scored.

use serde::Serialize;

use crate::analysis::injury::avg_injury_severity;
use crate::analysis::position::position_balance_delta;
use crate::analysis::profile::TeamProfile;
use crate::analysis::{local_player_zscores, normalized, top_categories, RosterPlayer};
use crate::category::{Category, CategoryValues};
use crate::config::{CategoryWeights, TradeConfig, TradeModel};

const MAX_IMPROVED_CATEGORIES: usize = 3;

/// Fairness is 1.0 when both sides send near-zero value.
const FAIRNESS_EPSILON: f64 = 1e-6;

/// Average injury severity shift worth calling out in the reason text.
const INJURY_NOTE_DELTA: f64 = 0.2;

/// Position balance delta worth calling out in the reason text.
const POSITION_NOTE_DELTA: f64 = 0.2;

// Enhanced model constants.
const ENHANCED_MIN_TOTAL_FIT: f64 = 0.08;
const ENHANCED_POSITION_WEIGHT: f64 = 0.15;
const ENHANCED_PUNT_MULTIPLIER: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeSuggestion {
    pub team_a_id: u32,
    pub team_b_id: u32,
    /// Players team A sends.
    pub from_a: Vec<String>,
    /// Players team B sends.
    pub from_b: Vec<String>,
    pub gain_a: f64,
    pub gain_b: f64,
    /// `(gain_a + gain_b) * fairness`.
    pub score: f64,
    pub fairness: f64,
    pub improve_a: Vec<Category>,
    pub improve_b: Vec<Category>,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

/// A tradeable player with their z-scores over the trade universe.
#[derive(Clone, Copy)]
struct Tradeable<'a> {
    player: &'a RosterPlayer,
    z: CategoryValues,
}

impl Tradeable<'_> {
    fn effect(&self, durability_penalty: f64) -> CategoryValues {
        self.z.scale(self.player.durability(durability_penalty))
    }

    /// Team-agnostic value used for the fairness check.
    fn market_value(&self, weights: &CategoryWeights, durability_penalty: f64) -> f64 {
        self.z.dot_over(&weights.as_values(), Category::trade_categories())
            * self.player.durability(durability_penalty)
    }
}

fn package_effect(pack: &[Tradeable], durability_penalty: f64) -> CategoryValues {
    pack.iter().fold(CategoryValues::zero(), |acc, t| {
        acc.add(&t.effect(durability_penalty))
    })
}

/// Symmetric value-balance score in [0, 1]; 1.0 means even value.
pub fn fairness_score(value_a: f64, value_b: f64) -> f64 {
    let avg = (value_a.abs() + value_b.abs()) / 2.0;
    if avg <= FAIRNESS_EPSILON {
        return 1.0;
    }
    (1.0 - (value_a - value_b).abs() / avg).max(0.0)
}

fn uniform_preferences() -> CategoryValues {
    let n = Category::trade_categories().count() as f64;
    CategoryValues::from_fn(|c| if c.is_negative() { 0.0 } else { 1.0 / n })
}

/// Index combinations of size `k` out of `n`, in lexicographic order.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    fn extend(start: usize, n: usize, k: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            current.push(i);
            extend(i + 1, n, k, current, out);
            current.pop();
        }
    }
    let mut out = Vec::new();
    if k > 0 && k <= n {
        extend(0, n, k, &mut Vec::with_capacity(k), &mut out);
    }
    out
}

fn packages<'a>(players: &[Tradeable<'a>], max_size: usize) -> Vec<Vec<Tradeable<'a>>> {
    (1..=max_size)
        .flat_map(|k| combinations(players.len(), k))
        .map(|idx| idx.into_iter().map(|i| players[i]).collect())
        .collect()
}

fn names(pack: &[Tradeable]) -> Vec<String> {
    pack.iter().map(|t| t.player.name().to_string()).collect()
}

fn roster_refs<'a>(pack: &[Tradeable<'a>]) -> Vec<&'a RosterPlayer> {
    pack.iter().map(|t| t.player).collect()
}

// ---------------------------------------------------------------------------
// Standard model
// ---------------------------------------------------------------------------

/// Lean into existing strengths; weak categories keep a smaller weight so
/// trades that patch holes can still qualify.
fn standard_preferences(
    team: &TeamProfile,
    weights: &CategoryWeights,
    punt_multiplier: f64,
) -> CategoryValues {
    let mut prefs = CategoryValues::zero();
    for cat in Category::trade_categories() {
        let z = team.raw_z.get(cat);
        let mut base = if team.is_strength(cat) && z > 0.0 {
            1.0 + 0.5 * z
        } else if z > 0.0 {
            0.7 + 0.3 * z
        } else {
            0.4 + 0.2 * -z
        };
        if team.is_punted(cat) {
            base *= punt_multiplier;
        }
        prefs[cat] = (base * weights.get(cat)).max(0.0);
    }
    normalized(&prefs).unwrap_or_else(uniform_preferences)
}

// ---------------------------------------------------------------------------
// Enhanced model
// ---------------------------------------------------------------------------

/// Week-to-week volatility of each category (higher is less predictable).
fn volatility(cat: Category) -> f64 {
    match cat {
        Category::Pts => 0.15,
        Category::Reb => 0.12,
        Category::Ast => 0.18,
        Category::Stl => 0.35,
        Category::Blk => 0.32,
        Category::FgPct => 0.08,
        Category::FtPct => 0.10,
        Category::ThreePm => 0.25,
        Category::Tov => 0.15,
    }
}

/// Category pairs that tend to move together.
const CORRELATIONS: &[(Category, Category, f64)] = &[
    (Category::Reb, Category::FgPct, 0.6),
    (Category::Ast, Category::Pts, 0.5),
    (Category::Stl, Category::Ast, 0.4),
    (Category::Blk, Category::Reb, 0.5),
    (Category::ThreePm, Category::Pts, 0.6),
];

fn diminishing_returns(value: f64, threshold: f64) -> f64 {
    if value <= 0.0 {
        return value;
    }
    value * (1.0 - (-value / threshold).exp())
}

/// How much an improvement moves the needle given the team's current
/// standing and the category's volatility.
fn swing_value(current_z: f64, improvement: f64, volatility: f64) -> f64 {
    let effective = if current_z > 1.0 {
        improvement / (1.0 + current_z)
    } else if current_z < -0.5 {
        improvement * 1.5
    } else {
        improvement * 1.2
    };
    effective * (1.0 - volatility * 0.3)
}

fn enhanced_preferences(
    team: &TeamProfile,
    opponent: &TeamProfile,
    weights: &CategoryWeights,
) -> CategoryValues {
    let mut prefs = CategoryValues::zero();
    for cat in Category::trade_categories() {
        let z = team.raw_z.get(cat);
        let mut base = if team.is_strength(cat) && z > 0.0 {
            1.0 + 0.5 * diminishing_returns(z, 1.0)
        } else if z > 0.2 {
            0.7 + 0.3 * z
        } else if z > -0.3 {
            // near average: small moves flip categories
            0.8 + 0.4 * (1.0 - z.abs())
        } else {
            0.4 + 0.2 * -z
        };

        let margin = z - opponent.raw_z.get(cat);
        if -0.5 < margin && margin < 0.0 {
            base *= 1.3;
        } else if margin > 1.0 {
            base *= 0.7;
        }

        base += (1.0 - volatility(cat)) * 0.2;
        if team.is_punted(cat) {
            base *= ENHANCED_PUNT_MULTIPLIER;
        }
        prefs[cat] = (base * weights.get(cat)).max(0.0);
    }
    normalized(&prefs).unwrap_or_else(uniform_preferences)
}

// ---------------------------------------------------------------------------
// Package scoring
// ---------------------------------------------------------------------------

/// Per-category gain of a swap for `team`, plus the position term.
struct PackageScore {
    per_cat: CategoryValues,
    position: f64,
}

impl PackageScore {
    fn total(&self) -> f64 {
        self.per_cat.sum() + self.position
    }
}

struct Scorer<'a> {
    model: TradeModel,
    config: &'a TradeConfig,
}

impl Scorer<'_> {
    fn position_weight(&self) -> f64 {
        match self.model {
            TradeModel::Standard => self.config.position_weight,
            TradeModel::Enhanced => ENHANCED_POSITION_WEIGHT,
        }
    }

    fn min_total_fit(&self) -> f64 {
        match self.model {
            TradeModel::Standard => self.config.min_total_fit,
            TradeModel::Enhanced => self.config.min_total_fit.max(ENHANCED_MIN_TOTAL_FIT),
        }
    }

    fn score(
        &self,
        team: &TeamProfile,
        prefs: &CategoryValues,
        outgoing: &[Tradeable],
        incoming: &[Tradeable],
    ) -> PackageScore {
        let penalty = self.config.durability_penalty;
        let delta = package_effect(incoming, penalty).sub(&package_effect(outgoing, penalty));

        let mut per_cat = CategoryValues::zero();
        for cat in Category::trade_categories() {
            per_cat[cat] = match self.model {
                TradeModel::Standard => delta.get(cat) * prefs.get(cat),
                TradeModel::Enhanced => {
                    let swing = swing_value(team.raw_z.get(cat), delta.get(cat), volatility(cat));
                    let mut gain = swing * prefs.get(cat);
                    for (c1, c2, corr) in CORRELATIONS {
                        let other = if cat == *c1 {
                            Some(*c2)
                        } else if cat == *c2 {
                            Some(*c1)
                        } else {
                            None
                        };
                        // only categories already scored count
                        if let Some(other) = other {
                            if other < cat && per_cat.get(other) > 0.0 {
                                gain *= 1.0 - corr * 0.3;
                            }
                        }
                    }
                    gain
                }
            };
        }

        let position = self.position_weight()
            * position_balance_delta(&team.roster, &roster_refs(outgoing), &roster_refs(incoming));
        PackageScore { per_cat, position }
    }
}

// ---------------------------------------------------------------------------
// Reasoning text
// ---------------------------------------------------------------------------

struct ReasonInput<'a> {
    team_a: &'a TeamProfile,
    team_b: &'a TeamProfile,
    pack_a: &'a [Tradeable<'a>],
    pack_b: &'a [Tradeable<'a>],
    improve_a: &'a [Category],
    improve_b: &'a [Category],
    fairness: f64,
}

fn join_labels(cats: &[Category]) -> String {
    cats.iter().map(|c| c.label()).collect::<Vec<_>>().join(", ")
}

fn build_reason(input: &ReasonInput) -> String {
    let mut lines = Vec::new();
    if !input.improve_a.is_empty() {
        lines.push(format!(
            "{} gets clear help in {}, reinforcing its existing build.",
            input.team_a.name,
            join_labels(input.improve_a)
        ));
    }
    if !input.improve_b.is_empty() {
        lines.push(format!(
            "{} improves in {} without giving up its core strengths.",
            input.team_b.name,
            join_labels(input.improve_b)
        ));
    }

    let refs_a = roster_refs(input.pack_a);
    let refs_b = roster_refs(input.pack_b);
    let pos_a = position_balance_delta(&input.team_a.roster, &refs_a, &refs_b);
    let pos_b = position_balance_delta(&input.team_b.roster, &refs_b, &refs_a);
    if pos_a > POSITION_NOTE_DELTA || pos_b > POSITION_NOTE_DELTA {
        lines.push("The swap smooths out roster positions instead of creating logjams.".to_string());
    }

    let sev_a = avg_injury_severity(refs_a.iter().copied());
    let sev_b = avg_injury_severity(refs_b.iter().copied());
    if sev_a > sev_b + INJURY_NOTE_DELTA {
        lines.push(format!("{} also sheds some injury risk.", input.team_a.name));
    }
    if sev_b > sev_a + INJURY_NOTE_DELTA {
        lines.push(format!("{} lightens its injury risk as well.", input.team_b.name));
    }

    lines.push(format!(
        "Both sides send similar total value (fairness {:.2}), so neither team is clearly overpaying.",
        input.fairness
    ));
    lines.join(" ")
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Suggest fair trades between `team_a` and `team_b`.
///
/// Only players with stats are offered. Results are ordered by score, then
/// by the names involved, and truncated to `max_suggestions`.
pub fn suggest_trades(
    team_a: &TeamProfile,
    team_b: &TeamProfile,
    weights: &CategoryWeights,
    config: &TradeConfig,
) -> Vec<TradeSuggestion> {
    if team_a.team_id == team_b.team_id {
        return Vec::new();
    }

    let pool: Vec<&RosterPlayer> = team_a
        .roster
        .iter()
        .chain(&team_b.roster)
        .filter(|p| p.has_stats())
        .collect();
    let zs = local_player_zscores(&pool);
    let split = team_a.roster.iter().filter(|p| p.has_stats()).count();
    let tradeables: Vec<Tradeable> = pool
        .iter()
        .zip(zs)
        .map(|(&player, z)| Tradeable { player, z })
        .collect();
    let (side_a, side_b) = tradeables.split_at(split);

    let (prefs_a, prefs_b) = match config.model {
        TradeModel::Standard => (
            standard_preferences(team_a, weights, config.punt_multiplier),
            standard_preferences(team_b, weights, config.punt_multiplier),
        ),
        TradeModel::Enhanced => (
            enhanced_preferences(team_a, team_b, weights),
            enhanced_preferences(team_b, team_a, weights),
        ),
    };
    let scorer = Scorer {
        model: config.model,
        config,
    };
    let penalty = config.durability_penalty;

    let packs_a = packages(side_a, config.max_package_size);
    let packs_b = packages(side_b, config.max_package_size);

    let mut suggestions = Vec::new();
    for pack_a in &packs_a {
        let names_a = names(pack_a);
        let value_a: f64 = pack_a.iter().map(|t| t.market_value(weights, penalty)).sum();
        for pack_b in &packs_b {
            let names_b = names(pack_b);
            if names_a == names_b {
                continue;
            }

            let fit_a = scorer.score(team_a, &prefs_a, pack_a, pack_b);
            let fit_b = scorer.score(team_b, &prefs_b, pack_b, pack_a);
            let (gain_a, gain_b) = (fit_a.total(), fit_b.total());
            if gain_a <= 0.0 || gain_b <= 0.0 || gain_a + gain_b <= scorer.min_total_fit() {
                continue;
            }

            let value_b: f64 = pack_b.iter().map(|t| t.market_value(weights, penalty)).sum();
            let fairness = fairness_score(value_a, value_b);
            if fairness < config.min_fairness {
                continue;
            }

            let improve_a =
                top_categories(&fit_a.per_cat, Category::trade_categories(), MAX_IMPROVED_CATEGORIES);
            let improve_b =
                top_categories(&fit_b.per_cat, Category::trade_categories(), MAX_IMPROVED_CATEGORIES);
            let reason = build_reason(&ReasonInput {
                team_a,
                team_b,
                pack_a,
                pack_b,
                improve_a: &improve_a,
                improve_b: &improve_b,
                fairness,
            });

            suggestions.push(TradeSuggestion {
                team_a_id: team_a.team_id,
                team_b_id: team_b.team_id,
                from_a: names_a.clone(),
                from_b: names_b,
                gain_a,
                gain_b,
                score: (gain_a + gain_b) * fairness,
                fairness,
                improve_a,
                improve_b,
                reason,
            });
        }
    }

    suggestions.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.from_a.cmp(&b.from_a))
            .then_with(|| a.from_b.cmp(&b.from_b))
    });
    suggestions.truncate(config.max_suggestions);
    suggestions
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
