// Which NBA teams play on a given date (stats.nba.com scoreboard).

use std::collections::HashSet;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::warn;

use crate::stats::loader::{NbaStatsClient, ResultSet};
use crate::stats::StatsError;

/// NBA teams in action on one date. An empty team set means the schedule is
/// unknown and nobody is filtered out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDay {
    pub date: NaiveDate,
    pub teams: HashSet<String>,
}

impl GameDay {
    pub fn unknown(date: NaiveDate) -> Self {
        GameDay {
            date,
            teams: HashSet::new(),
        }
    }

    pub fn is_known(&self) -> bool {
        !self.teams.is_empty()
    }

    /// Whether `team` (NBA abbreviation) plays. Always true when the
    /// schedule is unknown.
    pub fn plays(&self, team: &str) -> bool {
        !self.is_known() || self.teams.contains(&team.to_uppercase())
    }
}

/// Parse the `LineScore` result set of a `scoreboardv2` response.
pub fn parse_scoreboard(body: &Value) -> Result<HashSet<String>, StatsError> {
    let set = ResultSet::find(body, Some("LineScore"))?;
    Ok(set
        .rows()
        .filter_map(|row| set.str(row, "TEAM_ABBREVIATION"))
        .map(str::to_uppercase)
        .collect())
}

impl NbaStatsClient {
    pub async fn fetch_teams_playing(&self, date: NaiveDate) -> Result<HashSet<String>, StatsError> {
        let date_str = date.format("%Y-%m-%d").to_string();
        let body = self
            .get_json(
                "scoreboardv2",
                &[("GameDate", date_str.as_str()), ("LeagueID", "00"), ("DayOffset", "0")],
            )
            .await?;
        parse_scoreboard(&body)
    }
}

/// Fetch the game day, degrading to "unknown" on any failure.
pub async fn load_game_day(client: &NbaStatsClient, date: NaiveDate) -> GameDay {
    match client.fetch_teams_playing(date).await {
        Ok(teams) => GameDay { date, teams },
        Err(e) => {
            warn!("schedule lookup for {date} failed, not filtering by games: {e}");
            GameDay::unknown(date)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
