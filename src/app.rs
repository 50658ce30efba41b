// Application state and orchestration logic.
//
// The orchestrator owns the configuration, the stats index and the current
// league view. It handles user commands one at a time: a command performs at
// most one league fetch, then enrichment, analysis and aggregation, and
// finally pushes a snapshot to the TUI.

use anyhow::Context;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::analysis::league::{build_dashboard, DashboardInput, TeamSelection};
use crate::category::Category;
use crate::config::{CategoryWeights, Config};
use crate::db::Database;
use crate::league::{LeagueData, LeagueError, LeagueRequest, LeagueSource};
use crate::protocol::{AppSnapshot, UiUpdate, UserCommand};
use crate::stats::loader::NbaStatsClient;
use crate::stats::schedule::{load_game_day, GameDay};
use crate::stats::StatsIndex;

// ---------------------------------------------------------------------------
// Persisted session keys
// ---------------------------------------------------------------------------

pub const LAST_LEAGUE_KEY: &str = "last_league";
pub const WEIGHTS_KEY: &str = "category_weights";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedLeague {
    pub league_id: u64,
    pub season: u16,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub stats: StatsIndex,
    pub source: Box<dyn LeagueSource>,
    /// Used for today's NBA schedule. `None` skips the lookup.
    pub schedule_client: Option<NbaStatsClient>,
    pub weights: CategoryWeights,
    pub selection: TeamSelection,
    pub league: Option<LeagueData>,
    pub game_day: GameDay,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Database,
        stats: StatsIndex,
        source: Box<dyn LeagueSource>,
        schedule_client: Option<NbaStatsClient>,
    ) -> Self {
        let weights = config.strategy.weights;
        AppState {
            config,
            db,
            stats,
            source,
            schedule_client,
            weights,
            selection: TeamSelection::default(),
            league: None,
            game_day: GameDay::unknown(today()),
        }
    }

    /// Restore saved weights and return the last league viewed, if any.
    pub fn restore_from_db(&mut self) -> anyhow::Result<Option<SavedLeague>> {
        if let Some(value) = self.db.load_state(WEIGHTS_KEY)? {
            match serde_json::from_value::<CategoryWeights>(value) {
                Ok(weights) => {
                    info!("Restored saved category weights");
                    self.weights = weights;
                }
                Err(e) => warn!("ignoring unreadable saved weights: {e}"),
            }
        }
        let saved = match self.db.load_state(LAST_LEAGUE_KEY)? {
            Some(value) => serde_json::from_value::<SavedLeague>(value).ok(),
            None => None,
        };
        Ok(saved)
    }

    /// The league to open at startup: the configured one, else the last
    /// one viewed.
    pub fn initial_league(&self, saved: Option<SavedLeague>) -> Option<SavedLeague> {
        match self.config.league.league_id {
            Some(league_id) => Some(SavedLeague {
                league_id,
                season: self.config.league.season,
            }),
            None => saved,
        }
    }

    /// Fetch a league and make it the current view. On error the previous
    /// view is kept.
    pub async fn load_league(&mut self, league_id: u64, season: u16) -> Result<(), LeagueError> {
        let req = LeagueRequest::from_config(&self.config, league_id, season);
        let data = self.source.fetch_league(&req).await?;
        info!(
            "Loaded league '{}' ({} teams, {} free agents)",
            data.name,
            data.teams.len(),
            data.free_agents.len()
        );

        let switched = !self
            .league
            .as_ref()
            .is_some_and(|l| l.league_id == league_id && l.season == season);
        if switched {
            self.selection = TeamSelection::default();
        }
        self.league = Some(data);
        self.refresh_game_day().await;

        if let Err(e) = self.persist(LAST_LEAGUE_KEY, &SavedLeague { league_id, season }) {
            warn!("failed to persist last league: {e:#}");
        }
        Ok(())
    }

    async fn refresh_game_day(&mut self) {
        let date = today();
        self.game_day = match &self.schedule_client {
            Some(client) if self.config.strategy.streaming.filter_by_schedule => {
                load_game_day(client, date).await
            }
            _ => GameDay::unknown(date),
        };
    }

    /// Run every analysis on the current league. `None` before a league is
    /// loaded.
    pub fn build_snapshot(&self) -> Option<AppSnapshot> {
        let data = self.league.as_ref()?;
        let input = DashboardInput {
            data,
            stats: &self.stats,
            strategy: &self.config.strategy,
            weights: &self.weights,
            roster_targets: &self.config.league.roster_targets,
            configured_team: self.config.league.my_team_id,
            game_day: &self.game_day,
        };
        let dashboard = build_dashboard(&input, &self.selection);
        Some(AppSnapshot {
            league_id: data.league_id,
            season: data.season,
            dashboard,
            weights: self.weights,
            stats_players: self.stats.len(),
            stats_season: self.stats.season().to_string(),
            schedule_known: self.game_day.is_known(),
        })
    }

    pub fn adjust_weight(&mut self, category: Category, delta: f64) {
        let current = self.weights.get(category);
        self.weights.set(category, current + delta);
        debug!("weight {} -> {:.2}", category, self.weights.get(category));
        if let Err(e) = self.persist(WEIGHTS_KEY, &self.weights) {
            warn!("failed to persist weights: {e:#}");
        }
    }

    /// Save `value` as JSON session state under `key`.
    fn persist<T: Serialize>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        let json = serde_json::to_value(value)
            .with_context(|| format!("failed to serialize session state `{key}`"))?;
        self.db.save_state(key, &json)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// Run the orchestrator until `Quit` or until the command channel closes.
///
/// `startup` is connected to before the first command is read.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
    startup: Option<SavedLeague>,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    if let Some(saved) = startup {
        connect(&mut state, saved.league_id, saved.season, &ui_tx).await;
    }

    while let Some(cmd) = cmd_rx.recv().await {
        if cmd == UserCommand::Quit {
            info!("Quit command received, shutting down");
            break;
        }
        handle_user_command(&mut state, cmd, &ui_tx).await;
    }

    info!("Application event loop exiting");
    Ok(())
}

async fn send_snapshot(state: &AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    if let Some(snapshot) = state.build_snapshot() {
        let _ = ui_tx.send(UiUpdate::Snapshot(Box::new(snapshot))).await;
    }
}

async fn connect(state: &mut AppState, league_id: u64, season: u16, ui_tx: &mpsc::Sender<UiUpdate>) {
    info!("Connecting to league {league_id} season {season}");
    let _ = ui_tx.send(UiUpdate::Loading { league_id, season }).await;
    match state.load_league(league_id, season).await {
        Ok(()) => send_snapshot(state, ui_tx).await,
        Err(e) => {
            warn!("league fetch failed: {e}");
            let _ = ui_tx.send(UiUpdate::Error(e.to_string())).await;
        }
    }
}

/// Handle a user command from the TUI.
async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::Connect { league_id, season } => {
            connect(state, league_id, season, ui_tx).await;
        }
        UserCommand::Refresh => match state.league.as_ref().map(|l| (l.league_id, l.season)) {
            Some((league_id, season)) => connect(state, league_id, season, ui_tx).await,
            None => {
                let _ = ui_tx
                    .send(UiUpdate::Error("no league loaded; press L to connect".to_string()))
                    .await;
            }
        },
        UserCommand::SelectTeam(team_id) => {
            state.selection.my_team = Some(team_id);
            if state.selection.partner == Some(team_id) {
                state.selection.partner = None;
            }
            send_snapshot(state, ui_tx).await;
        }
        UserCommand::SelectPartner(team_id) => {
            state.selection.partner = Some(team_id);
            send_snapshot(state, ui_tx).await;
        }
        UserCommand::AdjustWeight { category, delta } => {
            state.adjust_weight(category, delta);
            send_snapshot(state, ui_tx).await;
        }
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
