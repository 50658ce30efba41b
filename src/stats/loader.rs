// Player stats loading: NBA stats API, CSV exports, and the SQLite cache.
//
// `load_stats_index` never fails. It prefers fresh cached data, then a live
// fetch, then stale cache, then the configured CSV, and finally an empty
// index (every player becomes a data gap).

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::category::Category;
use crate::config::{StatsConfig, StatsSource};
use crate::db::Database;
use crate::stats::{PlayerStats, StatLine, StatsError, StatsIndex};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const NBA_STATS_BASE_URL: &str = "https://stats.nba.com/stats";

/// stats.nba.com rejects requests that don't look like they come from a
/// browser on nba.com.
const NBA_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// CSV loading
// ---------------------------------------------------------------------------

/// One row of a `leaguedashplayerstats` CSV export. Column names follow the
/// NBA stats API; unknown columns are ignored.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawStatsRow {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    PLAYER_ID: Option<i64>,
    PLAYER_NAME: String,
    #[serde(default)]
    TEAM_ABBREVIATION: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    GP: Option<f64>,
    PTS: f64,
    REB: f64,
    AST: f64,
    STL: f64,
    BLK: f64,
    FG_PCT: f64,
    FT_PCT: f64,
    FG3M: f64,
    TOV: f64,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    FGM: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    FGA: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    FTM: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    FTA: Option<f64>,
}

impl RawStatsRow {
    fn into_player_stats(self) -> Option<PlayerStats> {
        let values = [
            self.PTS, self.REB, self.AST, self.STL, self.BLK, self.FG_PCT, self.FT_PCT,
            self.FG3M, self.TOV,
        ];
        if !values.iter().all(|v| v.is_finite()) {
            warn!("skipping stats for '{}': non-finite value", self.PLAYER_NAME.trim());
            return None;
        }
        let mut line = StatLine {
            fgm: self.FGM.unwrap_or(0.0),
            fga: self.FGA.unwrap_or(0.0),
            ftm: self.FTM.unwrap_or(0.0),
            fta: self.FTA.unwrap_or(0.0),
            games_played: self.GP.map(|g| g.max(0.0).round() as u32).unwrap_or(0),
            ..StatLine::default()
        };
        let per_game = &mut line.per_game;
        per_game[Category::Pts] = self.PTS;
        per_game[Category::Reb] = self.REB;
        per_game[Category::Ast] = self.AST;
        per_game[Category::Stl] = self.STL;
        per_game[Category::Blk] = self.BLK;
        per_game[Category::FgPct] = self.FG_PCT;
        per_game[Category::FtPct] = self.FT_PCT;
        per_game[Category::ThreePm] = self.FG3M;
        per_game[Category::Tov] = self.TOV;

        Some(PlayerStats {
            player_id: self.PLAYER_ID,
            name: self.PLAYER_NAME.trim().to_string(),
            team: self.TEAM_ABBREVIATION.trim().to_uppercase(),
            line,
        })
    }
}

fn load_stats_from_reader<R: Read>(rdr: R) -> Result<Vec<PlayerStats>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut players = Vec::new();
    for result in reader.deserialize::<RawStatsRow>() {
        match result {
            Ok(raw) => {
                if let Some(player) = raw.into_player_stats() {
                    players.push(player);
                }
            }
            Err(e) => {
                warn!("skipping malformed stats row: {}", e);
            }
        }
    }
    Ok(players)
}

/// Load per-game stats from a CSV file.
pub fn load_stats_csv(path: &Path) -> Result<Vec<PlayerStats>, StatsError> {
    let file = std::fs::File::open(path).map_err(|e| StatsError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_stats_from_reader(file).map_err(|e| StatsError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// NBA stats API
// ---------------------------------------------------------------------------

/// Thin client for the public stats.nba.com endpoints.
pub struct NbaStatsClient {
    http: reqwest::Client,
    base_url: String,
}

impl NbaStatsClient {
    pub fn new() -> Result<Self, StatsError> {
        Self::with_base_url(NBA_STATS_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, StatsError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(NBA_USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET `{base}/{endpoint}` with the headers stats.nba.com insists on.
    pub(crate) async fn get_json(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, StatsError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("GET {url}");
        let resp = self
            .http
            .get(&url)
            .query(query)
            .header("Accept", "application/json")
            .header("Referer", "https://www.nba.com/")
            .header("Origin", "https://www.nba.com")
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json::<Value>().await?)
    }

    /// Fetch league-wide per-game regular season stats for `season`
    /// ("2025-26").
    pub async fn fetch_player_stats(&self, season: &str) -> Result<Vec<PlayerStats>, StatsError> {
        let query = [
            ("College", ""),
            ("Conference", ""),
            ("Country", ""),
            ("DateFrom", ""),
            ("DateTo", ""),
            ("Division", ""),
            ("GameScope", ""),
            ("GameSegment", ""),
            ("LastNGames", "0"),
            ("LeagueID", "00"),
            ("Location", ""),
            ("MeasureType", "Base"),
            ("Month", "0"),
            ("OpponentTeamID", "0"),
            ("Outcome", ""),
            ("PORound", "0"),
            ("PaceAdjust", "N"),
            ("PerMode", "PerGame"),
            ("Period", "0"),
            ("PlayerExperience", ""),
            ("PlayerPosition", ""),
            ("PlusMinus", "N"),
            ("Rank", "N"),
            ("Season", season),
            ("SeasonSegment", ""),
            ("SeasonType", "Regular Season"),
            ("StarterBench", ""),
            ("TeamID", "0"),
            ("VsConference", ""),
            ("VsDivision", ""),
        ];
        let body = self.get_json("leaguedashplayerstats", &query).await?;
        parse_league_dash(&body)
    }
}

/// Column-indexed view of one `resultSets[]` entry.
pub(crate) struct ResultSet<'a> {
    columns: HashMap<String, usize>,
    rows: &'a [Value],
}

impl<'a> ResultSet<'a> {
    /// Find the result set named `name`, or the first one when `name` is
    /// `None`.
    pub(crate) fn find(body: &'a Value, name: Option<&str>) -> Result<Self, StatsError> {
        let sets = body
            .get("resultSets")
            .and_then(Value::as_array)
            .ok_or_else(|| StatsError::Decode("missing resultSets".into()))?;
        let set = match name {
            Some(name) => sets
                .iter()
                .find(|s| s.get("name").and_then(Value::as_str) == Some(name)),
            None => sets.first(),
        }
        .ok_or_else(|| StatsError::Decode(format!("result set {name:?} not found")))?;

        let columns = set
            .get("headers")
            .and_then(Value::as_array)
            .ok_or_else(|| StatsError::Decode("result set has no headers".into()))?
            .iter()
            .enumerate()
            .filter_map(|(i, h)| h.as_str().map(|s| (s.to_string(), i)))
            .collect();
        let rows = set
            .get("rowSet")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        Ok(ResultSet { columns, rows })
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = &'a Value> {
        self.rows.iter()
    }

    pub(crate) fn cell<'r>(&self, row: &'r Value, column: &str) -> Option<&'r Value> {
        let idx = *self.columns.get(column)?;
        row.get(idx)
    }

    pub(crate) fn f64(&self, row: &Value, column: &str) -> Option<f64> {
        self.cell(row, column).and_then(Value::as_f64)
    }

    pub(crate) fn str<'r>(&self, row: &'r Value, column: &str) -> Option<&'r str> {
        self.cell(row, column).and_then(Value::as_str)
    }
}

/// Parse a `leaguedashplayerstats` response body.
pub fn parse_league_dash(body: &Value) -> Result<Vec<PlayerStats>, StatsError> {
    let set = ResultSet::find(body, None)?;
    let mut players = Vec::new();

    for row in set.rows() {
        let Some(name) = set.str(row, "PLAYER_NAME") else {
            warn!("skipping stats row without PLAYER_NAME");
            continue;
        };
        let mut line = StatLine::default();
        let mut complete = true;
        for (cat, column) in [
            (Category::Pts, "PTS"),
            (Category::Reb, "REB"),
            (Category::Ast, "AST"),
            (Category::Stl, "STL"),
            (Category::Blk, "BLK"),
            (Category::FgPct, "FG_PCT"),
            (Category::FtPct, "FT_PCT"),
            (Category::ThreePm, "FG3M"),
            (Category::Tov, "TOV"),
        ] {
            match set.f64(row, column) {
                Some(v) => line.per_game[cat] = v,
                None => complete = false,
            }
        }
        if !complete {
            warn!("skipping stats for '{name}': missing category values");
            continue;
        }
        line.fgm = set.f64(row, "FGM").unwrap_or(0.0);
        line.fga = set.f64(row, "FGA").unwrap_or(0.0);
        line.ftm = set.f64(row, "FTM").unwrap_or(0.0);
        line.fta = set.f64(row, "FTA").unwrap_or(0.0);
        line.games_played = set.f64(row, "GP").map(|g| g.max(0.0) as u32).unwrap_or(0);

        players.push(PlayerStats {
            player_id: set.cell(row, "PLAYER_ID").and_then(Value::as_i64),
            name: name.trim().to_string(),
            team: set
                .str(row, "TEAM_ABBREVIATION")
                .unwrap_or_default()
                .to_uppercase(),
            line,
        });
    }

    Ok(players)
}

/// Keep the `n` highest scorers (points per game), ties broken by name.
pub fn top_by_points(mut players: Vec<PlayerStats>, n: usize) -> Vec<PlayerStats> {
    players.sort_by(|a, b| {
        b.line
            .get(Category::Pts)
            .total_cmp(&a.line.get(Category::Pts))
            .then_with(|| a.name.cmp(&b.name))
    });
    players.truncate(n);
    players
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Build the stats index for a session. Never fails: each unavailable
/// source degrades to the next one.
pub async fn load_stats_index(
    config: &StatsConfig,
    db: &Database,
    client: &NbaStatsClient,
    now: DateTime<Utc>,
) -> StatsIndex {
    let season = config.season.as_str();
    let players = match config.source {
        StatsSource::Csv => match load_csv_source(config) {
            Some(players) => {
                cache(db, season, &players, "csv", now);
                players
            }
            None => load_cached(db, season),
        },
        StatsSource::NbaApi => load_api_source(config, db, client, now).await,
    };

    let players = top_by_points(players, config.top_n);
    info!("Stats index ready: {} players for {}", players.len(), season);
    StatsIndex::from_players(season, players)
}

async fn load_api_source(
    config: &StatsConfig,
    db: &Database,
    client: &NbaStatsClient,
    now: DateTime<Utc>,
) -> Vec<PlayerStats> {
    let season = config.season.as_str();
    // Out-of-range TTLs treat the cache as stale.
    let ttl = chrono::Duration::try_hours(config.cache_ttl_hours).unwrap_or_else(|| {
        warn!("stats.cache_ttl_hours out of range: {}", config.cache_ttl_hours);
        chrono::Duration::zero()
    });
    match db.stats_are_fresh(season, ttl, now) {
        Ok(true) => {
            let cached = load_cached(db, season);
            if !cached.is_empty() {
                debug!("using cached stats for {season}");
                return cached;
            }
        }
        Ok(false) => {}
        Err(e) => warn!("stats cache unreadable: {e:#}"),
    }

    match client.fetch_player_stats(season).await {
        Ok(players) if !players.is_empty() => {
            info!("Fetched {} player stat lines from stats.nba.com", players.len());
            cache(db, season, &players, "nba_api", now);
            return players;
        }
        Ok(_) => warn!("stats.nba.com returned no players for {season}"),
        Err(e) => warn!("stats.nba.com fetch failed: {e}"),
    }

    let stale = load_cached(db, season);
    if !stale.is_empty() {
        warn!("using stale cached stats for {season}");
        return stale;
    }
    load_csv_source(config).unwrap_or_else(|| {
        warn!("no player stats available; every player will show as missing data");
        Vec::new()
    })
}

fn load_csv_source(config: &StatsConfig) -> Option<Vec<PlayerStats>> {
    let path = config.csv_path.as_deref()?;
    match load_stats_csv(Path::new(path)) {
        Ok(players) => Some(players),
        Err(e) => {
            warn!("stats CSV unavailable: {e}");
            None
        }
    }
}

fn load_cached(db: &Database, season: &str) -> Vec<PlayerStats> {
    db.load_player_stats(season).unwrap_or_else(|e| {
        warn!("failed to read cached stats: {e:#}");
        Vec::new()
    })
}

fn cache(db: &Database, season: &str, players: &[PlayerStats], source: &str, now: DateTime<Utc>) {
    if let Err(e) = db.store_player_stats(season, players, source, now) {
        warn!("failed to cache stats: {e:#}");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
