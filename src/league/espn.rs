// ESPN fantasy basketball API client (lm-api-reads v3, game "fba").

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::COOKIE;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{
    CategoryOutcome, CategoryResult, FantasyTeam, LeagueData, LeagueError, LeaguePlayer,
    LeagueRequest, LeagueSource, MatchupRecord, MatchupSide,
};
use crate::category::Category;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const ESPN_BASE_URL: &str = "https://lm-api-reads.fantasy.espn.com/apis/v3/games/fba";

const LEAGUE_VIEWS: &[&str] = &[
    "mTeam",
    "mRoster",
    "mMatchupScore",
    "mSettings",
    "mStandings",
    "mStatus",
];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Lineup slot IDs used by ESPN basketball.
fn slot_label(slot_id: i64) -> Option<&'static str> {
    Some(match slot_id {
        0 => "PG",
        1 => "SG",
        2 => "SF",
        3 => "PF",
        4 => "C",
        5 => "G",
        6 => "F",
        7 => "SG/SF",
        8 => "G/F",
        9 => "PF/C",
        10 => "F/C",
        11 => "UTIL",
        12 => "BE",
        13 => "IR",
        _ => return None,
    })
}

/// `defaultPositionId` values (1-based, unlike lineup slots).
fn default_position_label(position_id: i64) -> &'static str {
    match position_id {
        1 => "PG",
        2 => "SG",
        3 => "SF",
        4 => "PF",
        5 => "C",
        6 => "G",
        7 => "F",
        _ => "",
    }
}

/// ESPN `proTeamId` to NBA stats abbreviation.
fn pro_team_abbrev(pro_team_id: i64) -> &'static str {
    match pro_team_id {
        1 => "ATL",
        2 => "BOS",
        3 => "NOP",
        4 => "CHI",
        5 => "CLE",
        6 => "DAL",
        7 => "DEN",
        8 => "DET",
        9 => "GSW",
        10 => "HOU",
        11 => "IND",
        12 => "LAC",
        13 => "LAL",
        14 => "MIA",
        15 => "MIL",
        16 => "MIN",
        17 => "BKN",
        18 => "NYK",
        19 => "ORL",
        20 => "PHI",
        21 => "PHX",
        22 => "POR",
        23 => "SAC",
        24 => "SAS",
        25 => "OKC",
        26 => "UTA",
        27 => "WAS",
        28 => "TOR",
        29 => "MEM",
        30 => "CHA",
        _ => "FA",
    }
}

// ---------------------------------------------------------------------------
// EspnClient
// ---------------------------------------------------------------------------

pub struct EspnClient {
    http: reqwest::Client,
    base_url: String,
}

impl EspnClient {
    pub fn new() -> Result<Self, LeagueError> {
        Self::with_base_url(ESPN_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, LeagueError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn league_url(&self, req: &LeagueRequest) -> String {
        format!(
            "{}/seasons/{}/segments/0/leagues/{}",
            self.base_url, req.season, req.league_id
        )
    }

    async fn get(
        &self,
        req: &LeagueRequest,
        query: &[(&str, &str)],
        fantasy_filter: Option<String>,
    ) -> Result<Value, LeagueError> {
        let url = self.league_url(req);
        debug!("GET {url}");
        let mut request = self.http.get(&url).query(query);
        if let Some(auth) = &req.auth {
            request = request.header(COOKIE, format!("espn_s2={}; SWID={}", auth.espn_s2, auth.swid));
        }
        if let Some(filter) = fantasy_filter {
            request = request.header("x-fantasy-filter", filter);
        }

        let resp = request.send().await?;
        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(LeagueError::Auth {
                    league_id: req.league_id,
                })
            }
            StatusCode::NOT_FOUND => {
                return Err(LeagueError::NotFound {
                    league_id: req.league_id,
                    season: req.season,
                })
            }
            _ => {}
        }
        let resp = resp.error_for_status()?;
        resp.json::<Value>()
            .await
            .map_err(|e| LeagueError::Decode(e.to_string()))
    }

    async fn fetch_free_agents(
        &self,
        req: &LeagueRequest,
        scoring_period: u32,
        today: NaiveDate,
    ) -> Result<Vec<LeaguePlayer>, LeagueError> {
        let filter = serde_json::json!({
            "players": {
                "filterStatus": {"value": ["FREEAGENT", "WAIVERS"]},
                "limit": req.free_agent_limit,
                "sortPercOwned": {"sortPriority": 1, "sortAsc": false}
            }
        });
        let period = scoring_period.to_string();
        let body = self
            .get(
                req,
                &[("view", "kona_player_info"), ("scoringPeriodId", period.as_str())],
                Some(filter.to_string()),
            )
            .await?;
        Ok(parse_free_agents(&body, today))
    }
}

#[async_trait]
impl LeagueSource for EspnClient {
    async fn fetch_league(&self, req: &LeagueRequest) -> Result<LeagueData, LeagueError> {
        let query: Vec<(&str, &str)> = LEAGUE_VIEWS.iter().map(|v| ("view", *v)).collect();
        let body = self.get(req, &query, None).await?;
        let today = chrono::Local::now().date_naive();
        let mut data = parse_league(&body, req, today)?;

        let scoring_period = body
            .get("scoringPeriodId")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32;
        match self.fetch_free_agents(req, scoring_period, today).await {
            Ok(players) => data.free_agents = players,
            Err(e) => warn!("free agent lookup failed, streaming pool will be empty: {e}"),
        }

        info!(
            "Fetched league {} ({}): {} teams, {} matchups, {} free agents",
            data.league_id,
            data.name,
            data.teams.len(),
            data.matchups.len(),
            data.free_agents.len()
        );
        Ok(data)
    }
}

// ---------------------------------------------------------------------------
// Payload parsing
// ---------------------------------------------------------------------------

fn str_field<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key).and_then(Value::as_str)
}

fn u32_field(v: &Value, key: &str) -> u32 {
    v.get(key).and_then(Value::as_u64).unwrap_or(0) as u32
}

/// Parse the league payload (teams, rosters, current matchups).
///
/// An empty or team-less payload is treated as "league not found": ESPN
/// answers some unknown league IDs with `200 []`.
pub fn parse_league(
    body: &Value,
    req: &LeagueRequest,
    today: NaiveDate,
) -> Result<LeagueData, LeagueError> {
    let not_found = || LeagueError::NotFound {
        league_id: req.league_id,
        season: req.season,
    };
    if !body.is_object() {
        return Err(not_found());
    }
    let teams_json = body
        .get("teams")
        .and_then(Value::as_array)
        .filter(|t| !t.is_empty())
        .ok_or_else(not_found)?;

    let teams = teams_json
        .iter()
        .map(|t| parse_team(t, today))
        .collect::<Result<Vec<_>, _>>()?;

    let current_period = body
        .pointer("/status/currentMatchupPeriod")
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32;

    let matchups = body
        .get("schedule")
        .and_then(Value::as_array)
        .map(|schedule| {
            schedule
                .iter()
                .filter(|m| u32_field(m, "matchupPeriodId") == current_period)
                .filter_map(parse_matchup)
                .collect()
        })
        .unwrap_or_default();

    let name = body
        .pointer("/settings/name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("League {}", req.league_id));

    Ok(LeagueData {
        league_id: req.league_id,
        season: req.season,
        name,
        current_period,
        teams,
        matchups,
        free_agents: Vec::new(),
    })
}

fn parse_team(team: &Value, today: NaiveDate) -> Result<FantasyTeam, LeagueError> {
    let team_id = team
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| LeagueError::Decode("team without id".into()))? as u32;

    let name = match str_field(team, "name") {
        Some(n) if !n.trim().is_empty() => n.trim().to_string(),
        _ => {
            let location = str_field(team, "location").unwrap_or("");
            let nickname = str_field(team, "nickname").unwrap_or("");
            let joined = format!("{location} {nickname}").trim().to_string();
            if joined.is_empty() {
                format!("Team {team_id}")
            } else {
                joined
            }
        }
    };

    let record = team.pointer("/record/overall").cloned().unwrap_or(Value::Null);
    let roster = team
        .pointer("/roster/entries")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let player_json = entry.pointer("/playerPoolEntry/player")?;
                    let mut player = parse_player(player_json, today)?;
                    player.lineup_slot = entry
                        .get("lineupSlotId")
                        .and_then(Value::as_i64)
                        .and_then(slot_label)
                        .map(str::to_string);
                    if player.injury_status.is_empty() {
                        if let Some(status) = str_field(entry, "injuryStatus") {
                            player.injury_status = status.to_string();
                        }
                    }
                    Some(player)
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(FantasyTeam {
        team_id,
        abbrev: str_field(team, "abbrev").unwrap_or("").to_string(),
        name,
        wins: u32_field(&record, "wins"),
        losses: u32_field(&record, "losses"),
        ties: u32_field(&record, "ties"),
        roster,
    })
}

/// Parse an ESPN `player` object. Returns `None` when it has no name.
pub fn parse_player(player: &Value, today: NaiveDate) -> Option<LeaguePlayer> {
    let name = str_field(player, "fullName")?.trim().to_string();
    if name.is_empty() {
        return None;
    }

    let eligible_positions: Vec<String> = player
        .get("eligibleSlots")
        .and_then(Value::as_array)
        .map(|slots| {
            slots
                .iter()
                .filter_map(Value::as_i64)
                .filter(|id| (0..=4).contains(id))
                .filter_map(slot_label)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let position = player
        .get("defaultPositionId")
        .and_then(Value::as_i64)
        .map(default_position_label)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| eligible_positions.join("/"));

    let injury_status = str_field(player, "injuryStatus").unwrap_or("").to_string();

    Some(LeaguePlayer {
        espn_id: player.get("id").and_then(Value::as_i64),
        name,
        position,
        eligible_positions,
        pro_team: pro_team_abbrev(player.get("proTeamId").and_then(Value::as_i64).unwrap_or(0))
            .to_string(),
        injury_detail: injury_detail(player, today),
        injury_status,
        lineup_slot: None,
    })
}

/// Turn ESPN's structured injury details into free text the injury
/// heuristic understands ("out for season", "12 days").
fn injury_detail(player: &Value, today: NaiveDate) -> String {
    let Some(details) = player.get("injuryDetails") else {
        return String::new();
    };
    if details.get("outForSeason").and_then(Value::as_bool) == Some(true) {
        return "out for season".to_string();
    }
    let ret = details.get("expectedReturnDate").and_then(Value::as_array);
    let date = ret.and_then(|parts| {
        let y = parts.first()?.as_i64()? as i32;
        let m = parts.get(1)?.as_u64()? as u32;
        let d = parts.get(2)?.as_u64()? as u32;
        NaiveDate::from_ymd_opt(y, m, d)
    });
    match date {
        Some(date) if date > today => format!("{} days", (date - today).num_days()),
        _ => String::new(),
    }
}

fn parse_matchup(m: &Value) -> Option<MatchupRecord> {
    let home = parse_side(m.get("home")?)?;
    let away = m.get("away").and_then(parse_side);
    Some(MatchupRecord {
        period: u32_field(m, "matchupPeriodId"),
        home,
        away,
    })
}

fn parse_side(side: &Value) -> Option<MatchupSide> {
    let team_id = side.get("teamId").and_then(Value::as_u64)? as u32;
    let cumulative = side.get("cumulativeScore");
    let score = cumulative
        .and_then(|c| c.get("wins"))
        .and_then(Value::as_f64)
        .map(|wins| {
            let ties = cumulative
                .and_then(|c| c.get("ties"))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            wins + 0.5 * ties
        })
        .or_else(|| side.get("totalPoints").and_then(Value::as_f64));

    let by_stat = cumulative.and_then(|c| c.get("scoreByStat"));
    let categories = Category::ALL
        .into_iter()
        .filter_map(|cat| {
            let entry = by_stat?.get(cat.espn_stat_id())?;
            let value = entry.get("score").and_then(Value::as_f64)?;
            let outcome = match str_field(entry, "result") {
                Some("WIN") => Some(CategoryOutcome::Win),
                Some("LOSS") => Some(CategoryOutcome::Loss),
                Some("TIE") => Some(CategoryOutcome::Tie),
                _ => None,
            };
            Some(CategoryResult {
                category: cat,
                value,
                outcome,
            })
        })
        .collect();

    Some(MatchupSide {
        team_id,
        score,
        categories,
    })
}

/// Parse the `kona_player_info` free agent payload.
pub fn parse_free_agents(body: &Value, today: NaiveDate) -> Vec<LeaguePlayer> {
    body.get("players")
        .and_then(Value::as_array)
        .map(|players| {
            players
                .iter()
                .filter_map(|entry| parse_player(entry.get("player")?, today))
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn req() -> LeagueRequest {
        LeagueRequest {
            league_id: 424242,
            season: 2026,
            auth: None,
            free_agent_limit: 50,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()
    }

    fn league_body() -> Value {
        json!({
            "id": 424242,
            "scoringPeriodId": 80,
            "settings": {"name": "Hardwood Heroes"},
            "status": {"currentMatchupPeriod": 12},
            "teams": [
                {
                    "id": 1, "abbrev": "DUNK", "name": "Dunk City",
                    "record": {"overall": {"wins": 70, "losses": 40, "ties": 6}},
                    "roster": {"entries": [
                        {"lineupSlotId": 0, "playerPoolEntry": {"player": {
                            "id": 3945274, "fullName": "Luka Dončić",
                            "defaultPositionId": 1, "eligibleSlots": [0, 1, 5, 7, 8, 11, 12, 13],
                            "proTeamId": 13, "injuryStatus": "ACTIVE"
                        }}},
                        {"lineupSlotId": 13, "playerPoolEntry": {"player": {
                            "id": 1, "fullName": "Hurt Guy", "defaultPositionId": 5,
                            "eligibleSlots": [4, 9, 10, 11, 12, 13], "proTeamId": 2,
                            "injuryStatus": "OUT",
                            "injuryDetails": {"expectedReturnDate": [2026, 1, 24]}
                        }}}
                    ]}
                },
                {
                    "id": 2, "abbrev": "BRCK", "location": "Brick", "nickname": "Layers",
                    "record": {"overall": {"wins": 40, "losses": 70, "ties": 6}},
                    "roster": {"entries": []}
                }
            ],
            "schedule": [
                {"matchupPeriodId": 11, "home": {"teamId": 2}, "away": {"teamId": 1}},
                {"matchupPeriodId": 12,
                 "home": {"teamId": 1, "cumulativeScore": {"wins": 5, "losses": 3, "ties": 1,
                    "scoreByStat": {
                        "0": {"score": 512.0, "result": "WIN"},
                        "19": {"score": 0.471, "result": "LOSS"},
                        "11": {"score": 60.0, "result": "TIE"}
                    }}},
                 "away": {"teamId": 2, "cumulativeScore": {"wins": 3, "losses": 5, "ties": 1,
                    "scoreByStat": {"0": {"score": 488.0, "result": "LOSS"}}}}}
            ]
        })
    }

    #[test]
    fn parse_league_reads_teams_and_records() {
        let data = parse_league(&league_body(), &req(), today()).unwrap();
        assert_eq!(data.name, "Hardwood Heroes");
        assert_eq!(data.current_period, 12);
        assert_eq!(data.teams.len(), 2);

        let dunk = &data.teams[0];
        assert_eq!(dunk.abbrev, "DUNK");
        assert_eq!((dunk.wins, dunk.losses, dunk.ties), (70, 40, 6));
        assert_eq!(data.teams[1].name, "Brick Layers");
    }

    #[test]
    fn parse_league_maps_player_metadata() {
        let data = parse_league(&league_body(), &req(), today()).unwrap();
        let luka = &data.teams[0].roster[0];
        assert_eq!(luka.name, "Luka Dončić");
        assert_eq!(luka.position, "PG");
        assert_eq!(luka.eligible_positions, vec!["PG", "SG"]);
        assert_eq!(luka.pro_team, "LAL");
        assert_eq!(luka.lineup_slot.as_deref(), Some("PG"));
        assert_eq!(luka.injury_status, "ACTIVE");

        let hurt = &data.teams[0].roster[1];
        assert_eq!(hurt.position, "C");
        assert_eq!(hurt.pro_team, "BOS");
        assert_eq!(hurt.lineup_slot.as_deref(), Some("IR"));
        assert_eq!(hurt.injury_detail, "14 days");
    }

    #[test]
    fn parse_league_keeps_only_current_period_matchups() {
        let data = parse_league(&league_body(), &req(), today()).unwrap();
        assert_eq!(data.matchups.len(), 1);
        let m = &data.matchups[0];
        assert_eq!(m.period, 12);
        assert_eq!(m.home.score, Some(5.5));

        let pts = m.home.category(Category::Pts).unwrap();
        assert_eq!(pts.value, 512.0);
        assert_eq!(pts.outcome, Some(CategoryOutcome::Win));
        assert_eq!(m.home.category(Category::FgPct).unwrap().value, 0.471);
        assert_eq!(
            m.home.category(Category::Tov).unwrap().outcome,
            Some(CategoryOutcome::Tie)
        );
        assert!(m.home.category(Category::Blk).is_none());
        assert_eq!(data.opponent_of(1), Some(2));
    }

    #[test]
    fn empty_payload_is_not_found() {
        for body in [json!([]), json!({"teams": []}), json!({"messages": []})] {
            let err = parse_league(&body, &req(), today()).unwrap_err();
            assert!(matches!(
                err,
                LeagueError::NotFound {
                    league_id: 424242,
                    season: 2026
                }
            ));
        }
    }

    #[test]
    fn out_for_season_detail() {
        let player = json!({"fullName": "X", "injuryStatus": "OUT",
                            "injuryDetails": {"outForSeason": true}});
        let parsed = parse_player(&player, today()).unwrap();
        assert_eq!(parsed.injury_detail, "out for season");
        assert_eq!(parsed.pro_team, "FA");
        assert_eq!(parsed.position, "");
    }

    #[test]
    fn player_without_name_is_skipped() {
        assert!(parse_player(&json!({"id": 5}), today()).is_none());
    }

    #[test]
    fn parse_free_agents_reads_player_entries() {
        let body = json!({"players": [
            {"player": {"id": 10, "fullName": "Waiver Wire", "defaultPositionId": 3,
                        "eligibleSlots": [2, 3, 6], "proTeamId": 18}},
            {"player": {"id": 11}}
        ]});
        let fas = parse_free_agents(&body, today());
        assert_eq!(fas.len(), 1);
        assert_eq!(fas[0].position, "SF");
        assert_eq!(fas[0].eligible_positions, vec!["SF", "PF"]);
        assert_eq!(fas[0].pro_team, "NYK");
    }

    #[tokio::test]
    async fn unreachable_host_is_http_error() {
        let client = EspnClient::with_base_url("http://127.0.0.1:9").unwrap();
        let err = client.fetch_league(&req()).await.unwrap_err();
        assert!(matches!(err, LeagueError::Http(_)));
    }
}
