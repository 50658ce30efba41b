// TUI dashboard: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors the latest league snapshot. The app
// orchestrator pushes `UiUpdate` messages over an mpsc channel; the TUI
// applies them to `ViewState` and re-renders at ~30 fps. No analysis happens
// here.

pub mod input;
pub mod layout;
pub mod widgets;

use std::collections::HashMap;
use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::warn;

use crate::analysis::league::Dashboard;
use crate::category::Category;
use crate::protocol::{AppSnapshot, TabId, UiUpdate, UserCommand};

use layout::build_layout;

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// What the status bar should say about the last request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading { league_id: u64, season: u16 },
    Error(String),
}

/// TUI-local state that mirrors the application state for rendering.
#[derive(Debug, Default)]
pub struct ViewState {
    pub snapshot: Option<AppSnapshot>,
    pub load_state: LoadState,
    pub active_tab: TabId,
    /// Per-widget scroll offsets (keyed by widget name).
    pub scroll_offset: HashMap<String, usize>,
    /// Category the +/- keys adjust.
    pub selected_category: Category,
    /// Connect prompt is open and capturing keys.
    pub input_mode: bool,
    pub input_text: String,
    pub confirm_quit: bool,
    pub show_help: bool,
}

impl ViewState {
    pub fn dashboard(&self) -> Option<&Dashboard> {
        self.snapshot.as_ref().map(|s| &s.dashboard)
    }

    /// Name of `team_id` in the current league.
    pub fn team_name(&self, team_id: u32) -> Option<&str> {
        self.dashboard()?
            .standings
            .iter()
            .find(|row| row.team_id == team_id)
            .map(|row| row.name.as_str())
    }

    pub fn scroll(&self, key: &str) -> usize {
        self.scroll_offset.get(key).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Loading { league_id, season } => {
            state.load_state = LoadState::Loading { league_id, season };
        }
        UiUpdate::Snapshot(snapshot) => {
            let new_league = !state
                .snapshot
                .as_ref()
                .is_some_and(|s| s.league_id == snapshot.league_id && s.season == snapshot.season);
            if new_league {
                state.scroll_offset.clear();
            }
            state.snapshot = Some(*snapshot);
            state.load_state = LoadState::Idle;
        }
        UiUpdate::Error(message) => {
            state.load_state = LoadState::Error(message);
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete dashboard frame.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    match state.active_tab {
        TabId::League => widgets::standings::render(frame, layout.main_panel, state),
        TabId::Matchups => widgets::matchups::render(frame, layout.main_panel, state),
        TabId::Team => widgets::team::render(frame, layout.main_panel, state),
        TabId::Trades => widgets::trades::render(frame, layout.main_panel, state),
        TabId::Streaming => widgets::streaming::render(frame, layout.main_panel, state),
    }
    widgets::weights::render(frame, layout.weights, state);
    widgets::positions::render(frame, layout.positions, state);
    widgets::help::render_bar(frame, layout.help_bar, state);

    let area = frame.area();
    if state.show_help {
        widgets::help::render_overlay(frame, area);
    }
    if state.input_mode {
        widgets::overlay::render_connect_prompt(frame, area, &state.input_text);
    }
    if state.confirm_quit {
        widgets::overlay::render_quit_confirm(frame, area);
    }
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// Initializes the terminal, installs a panic hook that restores it, then
/// selects over UI updates, keyboard input and render ticks until the user
/// quits or the orchestrator goes away.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    // orchestrator is gone
                    None => break,
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("terminal input error: {e}");
                        break;
                    }
                    None => break,
                }
            }

            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analysis::league::{
        build_dashboard, Dashboard, DashboardInput, StandingRow, TeamSelection,
    };
    use crate::analysis::position::PositionBalance;
    use crate::analysis::streaming::StreamingPlan;
    use crate::app::tests::{fixture, fixture_stats, test_config};
    use crate::config::CategoryWeights;
    use crate::league::snapshot::SnapshotSource;
    use crate::stats::schedule::GameDay;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static FIXTURE_DIRS: AtomicUsize = AtomicUsize::new(0);

    /// The fixture league analyzed as team 1 with default weights.
    pub(crate) fn fixture_snapshot() -> AppSnapshot {
        let n = FIXTURE_DIRS.fetch_add(1, Ordering::SeqCst);
        let config = test_config(&format!("hoopcast_tui_fixture_{n}"));
        let stats = fixture_stats();
        let data = SnapshotSource::new(fixture("league_snapshot.json"))
            .load()
            .unwrap();
        let weights = CategoryWeights::default();
        let game_day = GameDay::unknown(chrono::NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        let input = DashboardInput {
            data: &data,
            stats: &stats,
            strategy: &config.strategy,
            weights: &weights,
            roster_targets: &config.league.roster_targets,
            configured_team: Some(1),
            game_day: &game_day,
        };
        AppSnapshot {
            league_id: data.league_id,
            season: data.season,
            dashboard: build_dashboard(&input, &TeamSelection::default()),
            weights,
            stats_players: stats.len(),
            stats_season: stats.season().to_string(),
            schedule_known: false,
        }
    }

    /// A small snapshot with two teams and nothing else.
    pub(crate) fn sample_snapshot() -> AppSnapshot {
        let row = |rank, team_id, name: &str| StandingRow {
            rank,
            team_id,
            name: name.to_string(),
            record: "3-1".to_string(),
            win_pct: Some(0.75),
        };
        AppSnapshot {
            league_id: 42,
            season: 2026,
            dashboard: Dashboard {
                league_name: "Test League".to_string(),
                season: 2026,
                period: 7,
                standings: vec![row(1, 1, "Alpha"), row(2, 2, "Bravo")],
                matchups: vec![],
                profiles: vec![],
                my_team_id: Some(1),
                partner_id: Some(2),
                opponent_id: Some(2),
                position_balance: PositionBalance::default(),
                trades: vec![],
                streaming: StreamingPlan::default(),
                projection: None,
                live: vec![],
                free_agent_count: 0,
                data_gap_count: 0,
            },
            weights: CategoryWeights::default(),
            stats_players: 400,
            stats_season: "2025-26".to_string(),
            schedule_known: false,
        }
    }

    #[test]
    fn view_state_default_is_sensible() {
        let state = ViewState::default();
        assert!(state.snapshot.is_none());
        assert_eq!(state.load_state, LoadState::Idle);
        assert_eq!(state.active_tab, TabId::League);
        assert_eq!(state.selected_category, Category::Pts);
        assert!(!state.input_mode && !state.confirm_quit && !state.show_help);
        assert!(state.scroll_offset.is_empty());
    }

    #[test]
    fn loading_then_snapshot_clears_status() {
        let mut state = ViewState::default();
        apply_ui_update(
            &mut state,
            UiUpdate::Loading {
                league_id: 42,
                season: 2026,
            },
        );
        assert!(matches!(state.load_state, LoadState::Loading { league_id: 42, .. }));
        apply_ui_update(&mut state, UiUpdate::Snapshot(Box::new(sample_snapshot())));
        assert_eq!(state.load_state, LoadState::Idle);
        assert_eq!(state.team_name(2), Some("Bravo"));
    }

    #[test]
    fn error_keeps_previous_snapshot() {
        let mut state = ViewState::default();
        apply_ui_update(&mut state, UiUpdate::Snapshot(Box::new(sample_snapshot())));
        apply_ui_update(&mut state, UiUpdate::Error("league 9 not found".to_string()));
        assert!(state.snapshot.is_some());
        assert_eq!(state.load_state, LoadState::Error("league 9 not found".to_string()));
    }

    #[test]
    fn new_league_resets_scroll() {
        let mut state = ViewState::default();
        apply_ui_update(&mut state, UiUpdate::Snapshot(Box::new(sample_snapshot())));
        state.scroll_offset.insert("trades".to_string(), 4);

        apply_ui_update(&mut state, UiUpdate::Snapshot(Box::new(sample_snapshot())));
        assert_eq!(state.scroll("trades"), 4);

        let mut other = sample_snapshot();
        other.league_id = 43;
        apply_ui_update(&mut state, UiUpdate::Snapshot(Box::new(other)));
        assert_eq!(state.scroll("trades"), 0);
    }

    #[test]
    fn render_frame_every_tab() {
        let mut state = ViewState::default();
        for snapshot in [None, Some(sample_snapshot()), Some(fixture_snapshot())] {
            state.snapshot = snapshot;
            for tab in TabId::ALL {
                state.active_tab = tab;
                let backend = ratatui::backend::TestBackend::new(120, 40);
                let mut terminal = ratatui::Terminal::new(backend).unwrap();
                terminal.draw(|frame| render_frame(frame, &state)).unwrap();
            }
        }
    }

    #[test]
    fn render_frame_with_overlays() {
        let mut state = ViewState {
            show_help: true,
            input_mode: true,
            confirm_quit: true,
            ..ViewState::default()
        };
        state.input_text = "424242 2026".to_string();
        let backend = ratatui::backend::TestBackend::new(100, 30);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal.draw(|frame| render_frame(frame, &state)).unwrap();
    }
}
