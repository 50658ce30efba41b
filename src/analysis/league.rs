// League roll-up: standings, matchup list, and the per-render Dashboard
// that bundles every analysis for one team selection.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::analysis::matchup::{
    live_category_breakdown, matchup_need_vector, project_matchup, CategoryNeed,
    MatchupProjection, ScoringPeriod,
};
use crate::analysis::position::{position_balance, PositionBalance};
use crate::analysis::profile::{
    aggregate_team_profiles, apply_weights_and_scores, enrich_player, TeamProfile,
};
use crate::analysis::streaming::{recommend_streaming, StreamingContext, StreamingPlan};
use crate::analysis::trade::{suggest_trades, TradeSuggestion};
use crate::analysis::RosterPlayer;
use crate::config::{CategoryWeights, StrategyConfig};
use crate::league::{FantasyTeam, LeagueData, MatchupSide};
use crate::stats::schedule::GameDay;
use crate::stats::StatsIndex;

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingRow {
    pub rank: usize,
    pub team_id: u32,
    pub name: String,
    pub record: String,
    pub win_pct: Option<f64>,
}

/// "W-L", or "W-L-T" when the team has ties.
pub fn format_record(team: &FantasyTeam) -> String {
    if team.ties > 0 {
        format!("{}-{}-{}", team.wins, team.losses, team.ties)
    } else {
        format!("{}-{}", team.wins, team.losses)
    }
}

/// Teams ranked by win percentage (ties count half), then wins, then name.
/// Teams without games sort last.
pub fn standings(teams: &[FantasyTeam]) -> Vec<StandingRow> {
    let mut sorted: Vec<&FantasyTeam> = teams.iter().collect();
    sorted.sort_by(|a, b| {
        let pct = |t: &FantasyTeam| t.win_pct().unwrap_or(-1.0);
        pct(b)
            .total_cmp(&pct(a))
            .then_with(|| b.wins.cmp(&a.wins))
            .then_with(|| a.name.cmp(&b.name))
    });
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, team)| StandingRow {
            rank: i + 1,
            team_id: team.team_id,
            name: team.name.clone(),
            record: format_record(team),
            win_pct: team.win_pct(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Matchups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupSummary {
    pub home_id: u32,
    pub away_id: u32,
    /// "Home vs Away".
    pub label: String,
    /// "x.x – y.y", empty when no score is reported yet.
    pub score: String,
}

fn team_name(data: &LeagueData, team_id: u32) -> String {
    data.team(team_id)
        .map(|t| t.name.clone())
        .unwrap_or_else(|| format!("Team {team_id}"))
}

/// Current-period matchups in league order. Byes are skipped.
pub fn matchup_summaries(data: &LeagueData) -> Vec<MatchupSummary> {
    data.matchups
        .iter()
        .filter_map(|m| {
            let away = m.away.as_ref()?;
            let score = match (m.home.score, away.score) {
                (Some(h), Some(a)) => format!("{h:.1} – {a:.1}"),
                _ => String::new(),
            };
            Some(MatchupSummary {
                home_id: m.home.team_id,
                away_id: away.team_id,
                label: format!(
                    "{} vs {}",
                    team_name(data, m.home.team_id),
                    team_name(data, away.team_id)
                ),
                score,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Which teams the user is looking at. `None` falls back to defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeamSelection {
    pub my_team: Option<u32>,
    pub partner: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub league_name: String,
    pub season: u16,
    pub period: u32,
    pub standings: Vec<StandingRow>,
    pub matchups: Vec<MatchupSummary>,
    /// Sorted by total score, best first.
    pub profiles: Vec<TeamProfile>,
    pub my_team_id: Option<u32>,
    pub partner_id: Option<u32>,
    pub opponent_id: Option<u32>,
    pub position_balance: PositionBalance,
    pub trades: Vec<TradeSuggestion>,
    pub streaming: StreamingPlan,
    pub projection: Option<MatchupProjection>,
    /// Live box score of my current matchup, one row per category.
    pub live: Vec<CategoryNeed>,
    pub free_agent_count: usize,
    pub data_gap_count: usize,
}

impl Dashboard {
    pub fn profile(&self, team_id: u32) -> Option<&TeamProfile> {
        self.profiles.iter().find(|p| p.team_id == team_id)
    }

    pub fn my_profile(&self) -> Option<&TeamProfile> {
        self.my_team_id.and_then(|id| self.profile(id))
    }
}

fn resolve_my_team(data: &LeagueData, selection: &TeamSelection, configured: Option<u32>) -> Option<u32> {
    [selection.my_team, configured]
        .into_iter()
        .flatten()
        .find(|id| data.team(*id).is_some())
        .or_else(|| data.teams.first().map(|t| t.team_id))
}

fn resolve_partner(data: &LeagueData, selection: &TeamSelection, mine: Option<u32>) -> Option<u32> {
    selection
        .partner
        .filter(|id| Some(*id) != mine && data.team(*id).is_some())
        .or_else(|| {
            data.teams
                .iter()
                .map(|t| t.team_id)
                .find(|id| Some(*id) != mine)
        })
}

/// Both sides of my matchup, when both report category values.
fn live_sides(data: &LeagueData, team_id: u32) -> Option<(&MatchupSide, &MatchupSide)> {
    let (mine, theirs) = data.matchup_for(team_id)?.sides_for(team_id)?;
    let theirs = theirs?;
    (!mine.categories.is_empty() && !theirs.categories.is_empty()).then_some((mine, theirs))
}

/// Inputs that stay fixed across one dashboard build.
pub struct DashboardInput<'a> {
    pub data: &'a LeagueData,
    pub stats: &'a StatsIndex,
    pub strategy: &'a StrategyConfig,
    pub weights: &'a CategoryWeights,
    pub roster_targets: &'a BTreeMap<String, usize>,
    pub configured_team: Option<u32>,
    pub game_day: &'a GameDay,
}

/// Enrich, analyze and aggregate one league view.
pub fn build_dashboard(input: &DashboardInput, selection: &TeamSelection) -> Dashboard {
    let data = input.data;
    let strategy = input.strategy;

    let mut profiles = aggregate_team_profiles(&data.teams, input.stats, &strategy.injury);
    apply_weights_and_scores(&mut profiles, input.weights, &strategy.scoring);
    profiles.sort_by(|a, b| {
        b.total_score
            .total_cmp(&a.total_score)
            .then_with(|| a.name.cmp(&b.name))
    });

    let my_team_id = resolve_my_team(data, selection, input.configured_team);
    let partner_id = resolve_partner(data, selection, my_team_id);
    let opponent_id = my_team_id.and_then(|id| data.opponent_of(id));

    let find = |id: Option<u32>| id.and_then(|id| profiles.iter().find(|p| p.team_id == id));
    let mine = find(my_team_id);
    let partner = find(partner_id);
    let opponent = find(opponent_id);

    let position_balance = mine
        .map(|p| position_balance(&p.roster, input.roster_targets))
        .unwrap_or_default();

    let trades = match (mine, partner) {
        (Some(a), Some(b)) => suggest_trades(a, b, input.weights, &strategy.trade),
        _ => Vec::new(),
    };

    let pool: Vec<RosterPlayer> = data
        .free_agents
        .iter()
        .map(|p| enrich_player(p, input.stats, &strategy.injury))
        .collect();
    let live = my_team_id.and_then(|id| live_sides(data, id));

    let streaming = match mine {
        Some(my_team) => {
            let ctx = StreamingContext {
                my_team,
                opponent,
                live,
                game_day: input.game_day,
                weights: input.weights,
                durability_penalty: strategy.trade.durability_penalty,
            };
            recommend_streaming(&ctx, &pool, &strategy.streaming)
        }
        None => StreamingPlan::default(),
    };

    let projection = match (mine, opponent) {
        (Some(m), Some(o)) => Some(project_matchup(
            m,
            o,
            &ScoringPeriod::uniform(strategy.matchup.games_per_period),
        )),
        _ => None,
    };

    let live_rows = match (mine, live) {
        (Some(m), Some((my_side, their_side))) => {
            let need = matchup_need_vector(my_side, their_side, &m.punts, &strategy.streaming);
            live_category_breakdown(my_side, their_side, &need)
        }
        _ => Vec::new(),
    };

    let data_gap_count = profiles.iter().map(|p| p.data_gaps().count()).sum();
    info!(
        "dashboard built: {} teams, {} trades, {} streaming adds, {} data gaps",
        profiles.len(),
        trades.len(),
        streaming.adds.len(),
        data_gap_count
    );

    Dashboard {
        league_name: data.name.clone(),
        season: data.season,
        period: data.current_period,
        standings: standings(&data.teams),
        matchups: matchup_summaries(data),
        my_team_id,
        partner_id,
        opponent_id,
        position_balance,
        trades,
        streaming,
        projection,
        live: live_rows,
        free_agent_count: pool.len(),
        data_gap_count,
        profiles,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::league::{CategoryOutcome, CategoryResult, MatchupRecord};

    fn team(id: u32, name: &str, wins: u32, losses: u32, ties: u32) -> FantasyTeam {
        FantasyTeam {
            team_id: id,
            name: name.to_string(),
            abbrev: name[..3].to_uppercase(),
            wins,
            losses,
            ties,
            roster: vec![],
        }
    }

    fn side(team_id: u32, score: Option<f64>) -> MatchupSide {
        MatchupSide {
            team_id,
            score,
            categories: vec![],
        }
    }

    fn league(teams: Vec<FantasyTeam>, matchups: Vec<MatchupRecord>) -> LeagueData {
        LeagueData {
            league_id: 1,
            season: 2026,
            name: "Test League".to_string(),
            current_period: 5,
            teams,
            matchups,
            free_agents: vec![],
        }
    }

    #[test]
    fn standings_rank_by_win_pct_with_half_ties() {
        let teams = vec![
            team(1, "Alpha", 3, 3, 0),
            team(2, "Bravo", 4, 2, 0),
            team(3, "Charlie", 3, 2, 2),
            team(4, "Delta", 0, 0, 0),
        ];
        let rows = standings(&teams);
        let order: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        // Bravo .667, Charlie 4/7 = .571, Alpha .500, Delta none
        assert_eq!(order, vec!["Bravo", "Charlie", "Alpha", "Delta"]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[1].record, "3-2-2");
        assert_eq!(rows[2].record, "3-3");
        assert_eq!(rows[3].win_pct, None);
    }

    #[test]
    fn standings_tie_break_is_deterministic() {
        let teams = vec![team(1, "Zulu", 2, 2, 0), team(2, "Echo", 2, 2, 0)];
        let rows = standings(&teams);
        assert_eq!(rows[0].name, "Echo");
        assert_eq!(rows[1].name, "Zulu");
    }

    #[test]
    fn matchup_summaries_skip_byes() {
        let data = league(
            vec![team(1, "Alpha", 0, 0, 0), team(2, "Bravo", 0, 0, 0), team(3, "Charlie", 0, 0, 0)],
            vec![
                MatchupRecord {
                    period: 5,
                    home: side(1, Some(5.5)),
                    away: Some(side(2, Some(3.5))),
                },
                MatchupRecord {
                    period: 5,
                    home: side(3, None),
                    away: None,
                },
            ],
        );
        let summaries = matchup_summaries(&data);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].label, "Alpha vs Bravo");
        assert_eq!(summaries[0].score, "5.5 – 3.5");
    }

    #[test]
    fn selection_falls_back_to_defaults() {
        let data = league(
            vec![team(1, "Alpha", 0, 0, 0), team(2, "Bravo", 0, 0, 0)],
            vec![],
        );
        let none = TeamSelection::default();
        assert_eq!(resolve_my_team(&data, &none, None), Some(1));
        assert_eq!(resolve_my_team(&data, &none, Some(2)), Some(2));
        assert_eq!(resolve_my_team(&data, &none, Some(99)), Some(1));

        let bad_partner = TeamSelection {
            my_team: Some(2),
            partner: Some(2),
        };
        assert_eq!(resolve_partner(&data, &bad_partner, Some(2)), Some(1));
    }

    #[test]
    fn live_sides_need_category_values() {
        let mut home = side(1, Some(4.0));
        let away = side(2, Some(5.0));
        let data_without = league(
            vec![team(1, "Alpha", 0, 0, 0), team(2, "Bravo", 0, 0, 0)],
            vec![MatchupRecord {
                period: 5,
                home: home.clone(),
                away: Some(away.clone()),
            }],
        );
        assert!(live_sides(&data_without, 1).is_none());

        home.categories.push(CategoryResult {
            category: Category::Pts,
            value: 100.0,
            outcome: Some(CategoryOutcome::Win),
        });
        let mut away = away;
        away.categories.push(CategoryResult {
            category: Category::Pts,
            value: 90.0,
            outcome: Some(CategoryOutcome::Loss),
        });
        let data_with = league(
            vec![team(1, "Alpha", 0, 0, 0), team(2, "Bravo", 0, 0, 0)],
            vec![MatchupRecord {
                period: 5,
                home,
                away: Some(away),
            }],
        );
        let (mine, theirs) = live_sides(&data_with, 2).unwrap();
        assert_eq!((mine.team_id, theirs.team_id), (2, 1));
    }

    #[test]
    fn record_formats_ties_only_when_present() {
        assert_eq!(format_record(&team(1, "Alpha", 7, 2, 0)), "7-2");
        assert_eq!(format_record(&team(1, "Alpha", 7, 2, 1)), "7-2-1");
    }
}
