// Configuration loading and parsing (league.toml, strategy.toml, credentials.toml).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::category::{Category, CategoryValues};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub strategy: StrategyConfig,
    pub credentials: CredentialsConfig,
    pub stats: StatsConfig,
    pub db_path: String,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    /// ESPN league ID. When omitted the dashboard starts on the connect
    /// prompt.
    #[serde(default)]
    pub league_id: Option<u64>,
    /// ESPN season year (the year the season ends in, e.g. 2026 for 2025-26).
    pub season: u16,
    /// The user's fantasy team. Defaults to the first team in the league.
    #[serde(default)]
    pub my_team_id: Option<u32>,
    /// Load the league from a JSON snapshot instead of the ESPN API.
    #[serde(default)]
    pub snapshot_path: Option<String>,
    /// Target number of rostered players per primary position.
    pub roster_targets: BTreeMap<String, usize>,
}

// ---------------------------------------------------------------------------
// strategy.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire strategy.toml file.
#[derive(Debug, Clone, Deserialize)]
struct StrategyFile {
    category_weights: CategoryWeights,
    scoring: ScoringConfig,
    injury: InjuryConfig,
    trade: TradeConfig,
    streaming: StreamingConfig,
    matchup: MatchupConfig,
    stats: StatsConfig,
    #[serde(default)]
    database: DatabaseSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DatabaseSection {
    #[serde(default)]
    path: Option<String>,
}

/// The public strategy config assembled from the strategy.toml sections.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub weights: CategoryWeights,
    pub scoring: ScoringConfig,
    pub injury: InjuryConfig,
    pub trade: TradeConfig,
    pub streaming: StreamingConfig,
    pub matchup: MatchupConfig,
}

/// Category weight multipliers in the range 0.0..=2.0. A weight of 0.0
/// marks the category as manually punted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    #[serde(rename = "PTS")]
    pub pts: f64,
    #[serde(rename = "REB")]
    pub reb: f64,
    #[serde(rename = "AST")]
    pub ast: f64,
    #[serde(rename = "STL")]
    pub stl: f64,
    #[serde(rename = "BLK")]
    pub blk: f64,
    #[serde(rename = "FG%")]
    pub fg_pct: f64,
    #[serde(rename = "FT%")]
    pub ft_pct: f64,
    #[serde(rename = "3PM")]
    pub three_pm: f64,
    #[serde(rename = "TOV")]
    pub tov: f64,
}

pub const MAX_CATEGORY_WEIGHT: f64 = 2.0;

/// Longest stats cache lifetime accepted from `strategy.toml` (one year).
pub const MAX_CACHE_TTL_HOURS: i64 = 24 * 365;

impl Default for CategoryWeights {
    fn default() -> Self {
        CategoryWeights {
            pts: 1.0,
            reb: 1.0,
            ast: 1.0,
            stl: 1.0,
            blk: 1.0,
            fg_pct: 1.0,
            ft_pct: 1.0,
            three_pm: 1.0,
            tov: 1.0,
        }
    }
}

impl CategoryWeights {
    pub fn get(&self, cat: Category) -> f64 {
        match cat {
            Category::Pts => self.pts,
            Category::Reb => self.reb,
            Category::Ast => self.ast,
            Category::Stl => self.stl,
            Category::Blk => self.blk,
            Category::FgPct => self.fg_pct,
            Category::FtPct => self.ft_pct,
            Category::ThreePm => self.three_pm,
            Category::Tov => self.tov,
        }
    }

    /// Set a weight, clamped to `0.0..=MAX_CATEGORY_WEIGHT`.
    pub fn set(&mut self, cat: Category, value: f64) {
        let value = value.clamp(0.0, MAX_CATEGORY_WEIGHT);
        let slot = match cat {
            Category::Pts => &mut self.pts,
            Category::Reb => &mut self.reb,
            Category::Ast => &mut self.ast,
            Category::Stl => &mut self.stl,
            Category::Blk => &mut self.blk,
            Category::FgPct => &mut self.fg_pct,
            Category::FtPct => &mut self.ft_pct,
            Category::ThreePm => &mut self.three_pm,
            Category::Tov => &mut self.tov,
        };
        *slot = value;
    }

    pub fn as_values(&self) -> CategoryValues {
        CategoryValues::from_fn(|c| self.get(c))
    }
}

/// Team-level scoring: weighted z totals, punts and strengths.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Extra multiplier on the turnover z-score in team totals.
    pub turnover_weight: f64,
    /// A category at or below this z-score is a candidate auto-punt.
    pub punt_threshold: f64,
    pub max_auto_punts: usize,
    /// Non-punted categories at or above this z-score are strengths.
    pub strength_threshold: f64,
    pub max_strengths: usize,
}

/// One ordered keyword tier of the injury heuristic.
#[derive(Debug, Clone, Deserialize)]
pub struct InjuryTier {
    pub severity: f64,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InjuryConfig {
    /// Statuses that mean the player is available.
    pub healthy_keywords: Vec<String>,
    /// Checked in order; the first matching tier sets the base severity.
    pub tiers: Vec<InjuryTier>,
    /// Severity used for a status that matches no tier.
    pub unknown_severity: f64,
    pub games_per_day: f64,
    pub games_per_week: f64,
    /// Games missed at which the duration signal saturates at 1.0.
    pub games_for_full_severity: f64,
    /// Upper bound of the "minor" label.
    pub minor_max: f64,
    /// Upper bound of the "moderate" label.
    pub moderate_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeModel {
    Standard,
    Enhanced,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradeConfig {
    pub model: TradeModel,
    pub max_package_size: usize,
    pub max_suggestions: usize,
    pub min_fairness: f64,
    pub min_total_fit: f64,
    pub position_weight: f64,
    /// Fraction of a player's value lost at injury severity 1.0.
    pub durability_penalty: f64,
    /// Preference multiplier for punted categories.
    pub punt_multiplier: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamingConfig {
    pub max_results: usize,
    pub max_drops: usize,
    /// How many free agents to request from ESPN.
    pub free_agent_limit: usize,
    /// Relative margin under which a category is a coin flip.
    pub close_margin: f64,
    /// Relative margin under which a deficit is still recoverable.
    pub medium_margin: f64,
    pub punt_multiplier: f64,
    pub filter_by_schedule: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchupConfig {
    /// Expected games per player in one matchup period.
    pub games_per_period: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsSource {
    NbaApi,
    Csv,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsConfig {
    pub source: StatsSource,
    /// NBA season string, e.g. "2025-26".
    pub season: String,
    #[serde(default)]
    pub csv_path: Option<String>,
    /// Keep the top N players by points per game.
    pub top_n: usize,
    pub cache_ttl_hours: i64,
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

/// ESPN cookies for private leagues.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub espn_s2: Option<String>,
    pub swid: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml`,
/// `config/strategy.toml`, and (optionally) `config/credentials.toml`,
/// all relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;
    let league = league_file.league;

    let strategy_path = config_dir.join("strategy.toml");
    let strategy_text = read_file(&strategy_path)?;
    let strategy_file: StrategyFile =
        toml::from_str(&strategy_text).map_err(|e| ConfigError::ParseError {
            path: strategy_path.clone(),
            source: e,
        })?;

    let strategy = StrategyConfig {
        weights: strategy_file.category_weights,
        scoring: strategy_file.scoring,
        injury: strategy_file.injury,
        trade: strategy_file.trade,
        streaming: strategy_file.streaming,
        matchup: strategy_file.matchup,
    };
    let stats = strategy_file.stats;
    let db_path = resolve_db_path(strategy_file.database.path);

    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        league,
        strategy,
        credentials,
        stats,
        db_path,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            // Never clobber a user's edited config.
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

/// An explicit `[database] path` wins; otherwise the cache lives in the
/// platform data directory, falling back to the working directory.
fn resolve_db_path(configured: Option<String>) -> String {
    if let Some(path) = configured {
        return path;
    }
    directories::ProjectDirs::from("", "", "hoopcast")
        .and_then(|dirs| {
            let dir = dirs.data_local_dir();
            std::fs::create_dir_all(dir).ok()?;
            Some(dir.join("hoopcast.db").to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "hoopcast.db".to_string())
}

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let league = &config.league;
    if league.league_id == Some(0) {
        return Err(invalid("league.league_id", "must be greater than 0".into()));
    }
    if !(2000..=2100).contains(&league.season) {
        return Err(invalid(
            "league.season",
            format!("must be a season year between 2000 and 2100, got {}", league.season),
        ));
    }
    if league.roster_targets.values().sum::<usize>() == 0 {
        return Err(invalid(
            "league.roster_targets",
            "must contain at least one position with a positive target".into(),
        ));
    }
    for pos in league.roster_targets.keys() {
        if crate::analysis::position::Position::from_str_pos(pos).is_none() {
            return Err(invalid(
                "league.roster_targets",
                format!("unknown position `{pos}`"),
            ));
        }
    }

    // Category weights: 0 punts a category, 2 doubles it.
    let w = &config.strategy.weights;
    for cat in Category::ALL {
        let val = w.get(cat);
        if !(0.0..=MAX_CATEGORY_WEIGHT).contains(&val) {
            return Err(invalid(
                &format!("weights.{}", cat.label()),
                format!("must be between 0.0 and {MAX_CATEGORY_WEIGHT}, got {val}"),
            ));
        }
    }

    let scoring = &config.strategy.scoring;
    if scoring.turnover_weight < 0.0 {
        return Err(invalid(
            "scoring.turnover_weight",
            format!("must be >= 0, got {}", scoring.turnover_weight),
        ));
    }

    let injury = &config.strategy.injury;
    for (i, tier) in injury.tiers.iter().enumerate() {
        if !(0.0..=1.0).contains(&tier.severity) {
            return Err(invalid(
                &format!("injury.tiers[{i}].severity"),
                format!("must be between 0.0 and 1.0, got {}", tier.severity),
            ));
        }
        if tier.keywords.is_empty() {
            return Err(invalid(
                &format!("injury.tiers[{i}].keywords"),
                "must not be empty".into(),
            ));
        }
    }
    let injury_fields: &[(&str, f64)] = &[
        ("injury.unknown_severity", injury.unknown_severity),
        ("injury.minor_max", injury.minor_max),
        ("injury.moderate_max", injury.moderate_max),
    ];
    for (name, val) in injury_fields {
        if !(0.0..=1.0).contains(val) {
            return Err(invalid(name, format!("must be between 0.0 and 1.0, got {val}")));
        }
    }
    if injury.minor_max > injury.moderate_max {
        return Err(invalid(
            "injury.minor_max",
            "must not exceed injury.moderate_max".into(),
        ));
    }
    if injury.games_for_full_severity <= 0.0 {
        return Err(invalid(
            "injury.games_for_full_severity",
            format!("must be > 0, got {}", injury.games_for_full_severity),
        ));
    }

    let trade = &config.strategy.trade;
    if !(1..=3).contains(&trade.max_package_size) {
        return Err(invalid(
            "trade.max_package_size",
            format!("must be between 1 and 3, got {}", trade.max_package_size),
        ));
    }
    let unit_fields: &[(&str, f64)] = &[
        ("trade.min_fairness", trade.min_fairness),
        ("trade.durability_penalty", trade.durability_penalty),
        ("trade.punt_multiplier", trade.punt_multiplier),
        ("streaming.punt_multiplier", config.strategy.streaming.punt_multiplier),
    ];
    for (name, val) in unit_fields {
        if !(0.0..=1.0).contains(val) {
            return Err(invalid(name, format!("must be between 0.0 and 1.0, got {val}")));
        }
    }

    // Fit thresholds have no upper bound but must be real, non-negative numbers.
    let fit_fields: &[(&str, f64)] = &[
        ("trade.min_total_fit", trade.min_total_fit),
        ("trade.position_weight", trade.position_weight),
    ];
    for (name, val) in fit_fields {
        if !val.is_finite() || *val < 0.0 {
            return Err(invalid(name, format!("must be a finite number >= 0, got {val}")));
        }
    }

    let streaming = &config.strategy.streaming;
    if streaming.close_margin <= 0.0 || streaming.medium_margin < streaming.close_margin {
        return Err(invalid(
            "streaming.medium_margin",
            "margins must satisfy 0 < close_margin <= medium_margin".into(),
        ));
    }

    let count_fields: &[(&str, usize)] = &[
        ("trade.max_suggestions", trade.max_suggestions),
        ("streaming.max_results", streaming.max_results),
        ("streaming.free_agent_limit", streaming.free_agent_limit),
        ("stats.top_n", config.stats.top_n),
    ];
    for (name, val) in count_fields {
        if *val == 0 {
            return Err(invalid(name, "must be > 0".into()));
        }
    }

    if config.strategy.matchup.games_per_period <= 0.0 {
        return Err(invalid(
            "matchup.games_per_period",
            format!("must be > 0, got {}", config.strategy.matchup.games_per_period),
        ));
    }

    if !(1..=MAX_CACHE_TTL_HOURS).contains(&config.stats.cache_ttl_hours) {
        return Err(invalid(
            "stats.cache_ttl_hours",
            format!(
                "must be between 1 and {MAX_CACHE_TTL_HOURS}, got {}",
                config.stats.cache_ttl_hours
            ),
        ));
    }

    if config.stats.source == StatsSource::Csv && config.stats.csv_path.is_none() {
        return Err(invalid(
            "stats.csv_path",
            "required when stats.source = \"csv\"".into(),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
