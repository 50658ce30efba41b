// NBA per-game player statistics: types, name matching, and lookup.
//
// The loader (`loader.rs`) fills a `StatsIndex` from the NBA stats API, a
// CSV export, or the SQLite cache. Everything downstream only sees the index
// and treats a missing entry as "no data" for that player.

pub mod loader;
pub mod schedule;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::{Category, CategoryValues};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("stats request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected stats payload: {0}")]
    Decode(String),
}

/// A rostered player has no matching stat record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no stats found for player `{player}`")]
pub struct DataGapError {
    pub player: String,
}

// ---------------------------------------------------------------------------
// Stat records
// ---------------------------------------------------------------------------

/// Per-game production of one player.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatLine {
    /// Per-game value of each category (percentages as fractions).
    pub per_game: CategoryValues,
    pub fgm: f64,
    pub fga: f64,
    pub ftm: f64,
    pub fta: f64,
    pub games_played: u32,
}

impl StatLine {
    pub fn get(&self, cat: Category) -> f64 {
        self.per_game.get(cat)
    }

    /// Attempts backing a percentage category, or `None` for counting stats.
    pub fn attempts(&self, cat: Category) -> Option<(f64, f64)> {
        match cat {
            Category::FgPct => Some((self.fgm, self.fga)),
            Category::FtPct => Some((self.ftm, self.fta)),
            _ => None,
        }
    }
}

/// A stat line tied to an NBA player identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player_id: Option<i64>,
    pub name: String,
    /// NBA team abbreviation ("BOS", "LAL", ...).
    pub team: String,
    pub line: StatLine,
}

// ---------------------------------------------------------------------------
// Name matching
// ---------------------------------------------------------------------------

const NAME_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv", "v"];

/// Canonical form of a player name for cross-source matching.
///
/// Lower-cases, folds common Latin diacritics, drops punctuation and
/// generational suffixes: "Luka Dončić" and "luka doncic" match, as do
/// "Jaren Jackson Jr." and "Jaren Jackson".
pub fn normalize_name(name: &str) -> String {
    let folded: String = name
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_diacritic)
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .map(|c| if c == '-' { ' ' } else { c })
        .collect();

    let mut words: Vec<&str> = folded.split_whitespace().collect();
    while words.len() > 1 && words.last().is_some_and(|w| NAME_SUFFIXES.contains(w)) {
        words.pop();
    }
    words.join(" ")
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'ā' => 'a',
        'ć' | 'č' | 'ç' => 'c',
        'đ' | 'ď' => 'd',
        'é' | 'è' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => 'e',
        'ğ' => 'g',
        'í' | 'ì' | 'î' | 'ï' | 'ī' | 'į' => 'i',
        'ł' | 'ľ' => 'l',
        'ñ' | 'ń' | 'ň' => 'n',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ø' | 'ō' | 'ő' => 'o',
        'ř' => 'r',
        'ś' | 'š' | 'ş' => 's',
        'ť' | 'ț' => 't',
        'ú' | 'ù' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ž' | 'ż' => 'z',
        other => other,
    }
}

// ---------------------------------------------------------------------------
// StatsIndex
// ---------------------------------------------------------------------------

/// Player stats keyed by normalized name.
#[derive(Debug, Clone, Default)]
pub struct StatsIndex {
    season: String,
    by_name: HashMap<String, PlayerStats>,
}

impl StatsIndex {
    /// Build an index. When two records normalize to the same name the one
    /// with more games played wins.
    pub fn from_players(season: impl Into<String>, players: Vec<PlayerStats>) -> Self {
        let mut by_name: HashMap<String, PlayerStats> = HashMap::with_capacity(players.len());
        for player in players {
            let key = normalize_name(&player.name);
            if key.is_empty() {
                continue;
            }
            match by_name.get(&key) {
                Some(existing) if existing.line.games_played >= player.line.games_played => {}
                _ => {
                    by_name.insert(key, player);
                }
            }
        }
        StatsIndex {
            season: season.into(),
            by_name,
        }
    }

    pub fn season(&self) -> &str {
        &self.season
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Look up a player's stats by display name; `None` is a data gap.
    pub fn get_player_stats(&self, name: &str) -> Option<&PlayerStats> {
        self.by_name.get(&normalize_name(name))
    }

    /// Like `get_player_stats` but reports the gap as an error value.
    pub fn require(&self, name: &str) -> Result<&PlayerStats, DataGapError> {
        self.get_player_stats(name).ok_or_else(|| DataGapError {
            player: name.to_string(),
        })
    }

    /// All records, sorted by name for stable iteration.
    pub fn players(&self) -> Vec<&PlayerStats> {
        let mut players: Vec<&PlayerStats> = self.by_name.values().collect();
        players.sort_by(|a, b| a.name.cmp(&b.name));
        players
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
