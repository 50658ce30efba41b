// Message types exchanged between the app orchestrator and the TUI.
//
// `UiUpdate` flows down from the orchestrator to the render loop;
// `UserCommand` flows up from keyboard handling to the orchestrator.

use crate::analysis::league::Dashboard;
use crate::category::Category;
use crate::config::CategoryWeights;

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

/// Main panel tabs, in key order (1-5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TabId {
    #[default]
    League,
    Matchups,
    Team,
    Trades,
    Streaming,
}

impl TabId {
    pub const ALL: [TabId; 5] = [
        TabId::League,
        TabId::Matchups,
        TabId::Team,
        TabId::Trades,
        TabId::Streaming,
    ];

    pub fn title(self) -> &'static str {
        match self {
            TabId::League => "League",
            TabId::Matchups => "Matchups",
            TabId::Team => "Team",
            TabId::Trades => "Trades",
            TabId::Streaming => "Streaming",
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator -> TUI
// ---------------------------------------------------------------------------

/// Everything the TUI needs to draw one league view.
#[derive(Debug, Clone, PartialEq)]
pub struct AppSnapshot {
    pub league_id: u64,
    pub season: u16,
    pub dashboard: Dashboard,
    pub weights: CategoryWeights,
    /// Players in the stats index and the NBA season they cover.
    pub stats_players: usize,
    pub stats_season: String,
    /// Whether today's NBA schedule was available for streaming.
    pub schedule_known: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    /// A league fetch has started.
    Loading { league_id: u64, season: u16 },
    Snapshot(Box<AppSnapshot>),
    /// A user-visible failure; the previous view stays on screen.
    Error(String),
}

// ---------------------------------------------------------------------------
// TUI -> Orchestrator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Load a league-season and run every analysis on it.
    Connect { league_id: u64, season: u16 },
    /// Re-fetch the current league.
    Refresh,
    /// View the dashboard as this team.
    SelectTeam(u32),
    /// Suggest trades with this team.
    SelectPartner(u32),
    /// Nudge one category weight; the result is clamped to the valid range.
    AdjustWeight { category: Category, delta: f64 },
    Quit,
}
