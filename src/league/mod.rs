// League client adapter: plain records of an ESPN fantasy basketball league.
//
// `LeagueSource` is the seam between the dashboard and the upstream league
// provider. `espn::EspnClient` talks to the ESPN fantasy API; `snapshot::
// SnapshotSource` replays a saved JSON snapshot for offline use and tests.

pub mod espn;
pub mod snapshot;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::Category;
use crate::config::Config;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LeagueError {
    /// The league is private and the cookies are missing or rejected.
    #[error("league {league_id} requires valid espn_s2/SWID cookies")]
    Auth { league_id: u64 },

    /// No league with this ID exists for the season.
    #[error("league {league_id} not found for season {season}")]
    NotFound { league_id: u64, season: u16 },

    #[error("league request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected league payload: {0}")]
    Decode(String),

    #[error("failed to read league snapshot {path}: {message}")]
    Snapshot { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// ESPN cookies for private leagues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EspnAuth {
    pub espn_s2: String,
    pub swid: String,
}

/// Everything needed to identify and access one league-season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueRequest {
    pub league_id: u64,
    pub season: u16,
    pub auth: Option<EspnAuth>,
    /// How many free agents to include.
    pub free_agent_limit: usize,
}

impl LeagueRequest {
    /// Build a request for `league_id` using the season, cookies, and
    /// free-agent limit from `config`. Cookies are only used when both are
    /// present and non-empty.
    pub fn from_config(config: &Config, league_id: u64, season: u16) -> Self {
        let creds = &config.credentials;
        let auth = match (creds.espn_s2.as_deref(), creds.swid.as_deref()) {
            (Some(s2), Some(swid)) if !s2.trim().is_empty() && !swid.trim().is_empty() => {
                Some(EspnAuth {
                    espn_s2: s2.trim().to_string(),
                    swid: swid.trim().to_string(),
                })
            }
            _ => None,
        };
        LeagueRequest {
            league_id,
            season,
            auth,
            free_agent_limit: config.strategy.streaming.free_agent_limit,
        }
    }
}

// ---------------------------------------------------------------------------
// League records
// ---------------------------------------------------------------------------

/// A player as reported by the league provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaguePlayer {
    #[serde(default)]
    pub espn_id: Option<i64>,
    pub name: String,
    /// Primary position as a slash-joined string ("PG", "SF/PF").
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub eligible_positions: Vec<String>,
    /// NBA team abbreviation; "FA" for unsigned players.
    #[serde(default)]
    pub pro_team: String,
    #[serde(default)]
    pub injury_status: String,
    #[serde(default)]
    pub injury_detail: String,
    /// Lineup slot label ("PG", "BE", "IR", ...), when rostered.
    #[serde(default)]
    pub lineup_slot: Option<String>,
}

/// One fantasy team and its roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FantasyTeam {
    pub team_id: u32,
    pub name: String,
    pub abbrev: String,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub ties: u32,
    #[serde(default)]
    pub roster: Vec<LeaguePlayer>,
}

impl FantasyTeam {
    pub fn games_played(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// Win percentage with ties counted as half a win; `None` before any
    /// games are played.
    pub fn win_pct(&self) -> Option<f64> {
        let games = self.games_played();
        (games > 0).then(|| (self.wins as f64 + 0.5 * self.ties as f64) / games as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CategoryOutcome {
    Win,
    Loss,
    Tie,
}

/// Live value of one category in the current matchup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub category: Category,
    pub value: f64,
    #[serde(default)]
    pub outcome: Option<CategoryOutcome>,
}

/// One side of a head-to-head matchup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupSide {
    pub team_id: u32,
    /// Categories won so far (ESPN's running matchup score).
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub categories: Vec<CategoryResult>,
}

impl MatchupSide {
    pub fn category(&self, cat: Category) -> Option<&CategoryResult> {
        self.categories.iter().find(|r| r.category == cat)
    }
}

/// A scheduled matchup. `away` is `None` for a bye.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupRecord {
    pub period: u32,
    pub home: MatchupSide,
    #[serde(default)]
    pub away: Option<MatchupSide>,
}

impl MatchupRecord {
    /// `(mine, theirs)` when `team_id` plays in this matchup.
    pub fn sides_for(&self, team_id: u32) -> Option<(&MatchupSide, Option<&MatchupSide>)> {
        if self.home.team_id == team_id {
            return Some((&self.home, self.away.as_ref()));
        }
        match &self.away {
            Some(away) if away.team_id == team_id => Some((away, Some(&self.home))),
            _ => None,
        }
    }
}

/// Snapshot of a league at fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueData {
    pub league_id: u64,
    pub season: u16,
    pub name: String,
    #[serde(default)]
    pub current_period: u32,
    pub teams: Vec<FantasyTeam>,
    /// Matchups of the current period only.
    #[serde(default)]
    pub matchups: Vec<MatchupRecord>,
    #[serde(default)]
    pub free_agents: Vec<LeaguePlayer>,
}

impl LeagueData {
    pub fn team(&self, team_id: u32) -> Option<&FantasyTeam> {
        self.teams.iter().find(|t| t.team_id == team_id)
    }

    /// The current matchup involving `team_id`.
    pub fn matchup_for(&self, team_id: u32) -> Option<&MatchupRecord> {
        self.matchups
            .iter()
            .find(|m| m.sides_for(team_id).is_some())
    }

    /// Team ID of `team_id`'s current opponent (None on a bye).
    pub fn opponent_of(&self, team_id: u32) -> Option<u32> {
        let (_, theirs) = self.matchup_for(team_id)?.sides_for(team_id)?;
        theirs.map(|s| s.team_id)
    }
}

// ---------------------------------------------------------------------------
// LeagueSource
// ---------------------------------------------------------------------------

/// Anything that can produce a league snapshot.
#[async_trait]
pub trait LeagueSource: Send + Sync {
    async fn fetch_league(&self, req: &LeagueRequest) -> Result<LeagueData, LeagueError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: u32, w: u32, l: u32, t: u32) -> FantasyTeam {
        FantasyTeam {
            team_id: id,
            name: format!("Team {id}"),
            abbrev: format!("T{id}"),
            wins: w,
            losses: l,
            ties: t,
            roster: vec![],
        }
    }

    fn side(team_id: u32) -> MatchupSide {
        MatchupSide {
            team_id,
            score: None,
            categories: vec![],
        }
    }

    #[test]
    fn win_pct_counts_ties_as_half() {
        assert_eq!(team(1, 6, 2, 2).win_pct(), Some(0.7));
        assert_eq!(team(1, 0, 0, 0).win_pct(), None);
    }

    #[test]
    fn opponent_lookup_handles_home_away_and_bye() {
        let data = LeagueData {
            league_id: 1,
            season: 2026,
            name: "L".into(),
            current_period: 5,
            teams: vec![team(1, 0, 0, 0), team(2, 0, 0, 0), team(3, 0, 0, 0)],
            matchups: vec![
                MatchupRecord {
                    period: 5,
                    home: side(1),
                    away: Some(side(2)),
                },
                MatchupRecord {
                    period: 5,
                    home: side(3),
                    away: None,
                },
            ],
            free_agents: vec![],
        };
        assert_eq!(data.opponent_of(1), Some(2));
        assert_eq!(data.opponent_of(2), Some(1));
        assert_eq!(data.opponent_of(3), None);
        assert_eq!(data.opponent_of(9), None);
        assert_eq!(data.team(2).map(|t| t.abbrev.as_str()), Some("T2"));
    }
}
