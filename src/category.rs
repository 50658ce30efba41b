// Scoring categories for nine-category head-to-head basketball leagues.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// One of the nine head-to-head scoring categories.
///
/// Declaration order is the display order used everywhere in the dashboard
/// and the index into [`CategoryValues`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum Category {
    #[default]
    Pts,
    Reb,
    Ast,
    Stl,
    Blk,
    FgPct,
    FtPct,
    ThreePm,
    Tov,
}

impl Category {
    pub const COUNT: usize = 9;

    pub const ALL: [Category; Category::COUNT] = [
        Category::Pts,
        Category::Reb,
        Category::Ast,
        Category::Stl,
        Category::Blk,
        Category::FgPct,
        Category::FtPct,
        Category::ThreePm,
        Category::Tov,
    ];

    /// Position of this category in [`Category::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Short label as shown by ESPN ("PTS", "FG%", "3PM", ...).
    pub fn label(self) -> &'static str {
        match self {
            Category::Pts => "PTS",
            Category::Reb => "REB",
            Category::Ast => "AST",
            Category::Stl => "STL",
            Category::Blk => "BLK",
            Category::FgPct => "FG%",
            Category::FtPct => "FT%",
            Category::ThreePm => "3PM",
            Category::Tov => "TOV",
        }
    }

    /// Parse a category label. Accepts the common aliases used by ESPN and
    /// the NBA stats API.
    pub fn from_label(s: &str) -> Option<Category> {
        match s.trim().to_uppercase().as_str() {
            "PTS" => Some(Category::Pts),
            "REB" => Some(Category::Reb),
            "AST" => Some(Category::Ast),
            "STL" => Some(Category::Stl),
            "BLK" => Some(Category::Blk),
            "FG%" | "FG_PCT" | "FGPCT" => Some(Category::FgPct),
            "FT%" | "FT_PCT" | "FTPCT" => Some(Category::FtPct),
            "3PM" | "3PTM" | "FG3M" => Some(Category::ThreePm),
            "TOV" | "TO" => Some(Category::Tov),
            _ => None,
        }
    }

    /// Lower is better for this category.
    pub fn is_negative(self) -> bool {
        matches!(self, Category::Tov)
    }

    pub fn is_percentage(self) -> bool {
        matches!(self, Category::FgPct | Category::FtPct)
    }

    /// Categories that trade and streaming logic optimise for. Turnovers are
    /// left out: nobody trades for them.
    pub fn trade_categories() -> impl Iterator<Item = Category> {
        Category::ALL.into_iter().filter(|c| !c.is_negative())
    }

    /// Key of this category in ESPN's `scoreByStat` / `stats` maps.
    pub fn espn_stat_id(self) -> &'static str {
        match self {
            Category::Pts => "0",
            Category::Blk => "1",
            Category::Stl => "2",
            Category::Ast => "3",
            Category::Reb => "6",
            Category::Tov => "11",
            Category::ThreePm => "17",
            Category::FgPct => "19",
            Category::FtPct => "20",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// CategoryValues
// ---------------------------------------------------------------------------

/// One `f64` per category, indexed by [`Category`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryValues([f64; Category::COUNT]);

impl CategoryValues {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build from a function of each category.
    pub fn from_fn(mut f: impl FnMut(Category) -> f64) -> Self {
        let mut values = [0.0; Category::COUNT];
        for cat in Category::ALL {
            values[cat.index()] = f(cat);
        }
        Self(values)
    }

    /// Same value for every category.
    pub fn splat(value: f64) -> Self {
        Self([value; Category::COUNT])
    }

    pub fn get(&self, cat: Category) -> f64 {
        self.0[cat.index()]
    }

    pub fn set(&mut self, cat: Category, value: f64) {
        self.0[cat.index()] = value;
    }

    /// Iterate `(category, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    pub fn add(&self, other: &CategoryValues) -> CategoryValues {
        CategoryValues::from_fn(|c| self.get(c) + other.get(c))
    }

    pub fn sub(&self, other: &CategoryValues) -> CategoryValues {
        CategoryValues::from_fn(|c| self.get(c) - other.get(c))
    }

    pub fn scale(&self, factor: f64) -> CategoryValues {
        CategoryValues::from_fn(|c| self.get(c) * factor)
    }

    /// Sum of the element-wise product over the given categories.
    pub fn dot_over(
        &self,
        other: &CategoryValues,
        cats: impl IntoIterator<Item = Category>,
    ) -> f64 {
        cats.into_iter().map(|c| self.get(c) * other.get(c)).sum()
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }
}

impl Index<Category> for CategoryValues {
    type Output = f64;

    fn index(&self, cat: Category) -> &f64 {
        &self.0[cat.index()]
    }
}

impl IndexMut<Category> for CategoryValues {
    fn index_mut(&mut self, cat: Category) -> &mut f64 {
        &mut self.0[cat.index()]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
