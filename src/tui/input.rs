// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// app orchestrator, or into local ViewState mutations (tab switching,
// scrolling, category selection, the connect prompt).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::category::Category;
use crate::protocol::{TabId, UserCommand};
use super::ViewState;

/// Step applied to a category weight by `+` and `-`.
pub const WEIGHT_STEP: f64 = 0.25;

/// Season used by the connect prompt when none is typed and no league is loaded.
const FALLBACK_SEASON: u16 = 2026;

const PAGE_SIZE: usize = 20;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator. Returns `None` when it was handled locally.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // crossterm on Windows reports both Press and Release
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c') {
        return Some(UserCommand::Quit);
    }

    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }

    if view_state.input_mode {
        return handle_connect_prompt(key_event, view_state);
    }

    if view_state.show_help {
        // any key closes help
        view_state.show_help = false;
        return None;
    }

    match key_event.code {
        KeyCode::Char(c @ '1'..='5') => {
            let idx = c as usize - '1' as usize;
            view_state.active_tab = TabId::ALL[idx];
            None
        }
        KeyCode::Tab => {
            view_state.active_tab = cycle(&TabId::ALL, view_state.active_tab, true);
            None
        }
        KeyCode::BackTab => {
            view_state.active_tab = cycle(&TabId::ALL, view_state.active_tab, false);
            None
        }

        KeyCode::Up | KeyCode::Char('k') => {
            scroll_up(view_state, 1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            scroll_down(view_state, 1);
            None
        }
        KeyCode::PageUp => {
            scroll_up(view_state, PAGE_SIZE);
            None
        }
        KeyCode::PageDown => {
            scroll_down(view_state, PAGE_SIZE);
            None
        }

        KeyCode::Char('t') => next_team(view_state, true).map(UserCommand::SelectTeam),
        KeyCode::Char('T') => next_team(view_state, false).map(UserCommand::SelectTeam),
        KeyCode::Char('p') => next_partner(view_state, true).map(UserCommand::SelectPartner),
        KeyCode::Char('P') => next_partner(view_state, false).map(UserCommand::SelectPartner),

        KeyCode::Char('c') => {
            view_state.selected_category = cycle(&Category::ALL, view_state.selected_category, true);
            None
        }
        KeyCode::Char('C') => {
            view_state.selected_category =
                cycle(&Category::ALL, view_state.selected_category, false);
            None
        }
        KeyCode::Char('+') | KeyCode::Char('=') => Some(UserCommand::AdjustWeight {
            category: view_state.selected_category,
            delta: WEIGHT_STEP,
        }),
        KeyCode::Char('-') => Some(UserCommand::AdjustWeight {
            category: view_state.selected_category,
            delta: -WEIGHT_STEP,
        }),

        KeyCode::Char('r') => Some(UserCommand::Refresh),
        KeyCode::Char('L') => {
            view_state.input_mode = true;
            view_state.input_text = view_state
                .snapshot
                .as_ref()
                .map(|s| format!("{} {}", s.league_id, s.season))
                .unwrap_or_default();
            None
        }
        KeyCode::Char('?') => {
            view_state.show_help = true;
            None
        }
        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }

        _ => None,
    }
}

/// `y`/`q` confirm, `n`/Esc cancel, everything else is blocked.
fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') | KeyCode::Char('Q') => {
            Some(UserCommand::Quit)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

fn handle_connect_prompt(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Esc => {
            view_state.input_mode = false;
            view_state.input_text.clear();
            None
        }
        KeyCode::Enter => {
            let default_season = view_state
                .snapshot
                .as_ref()
                .map_or(FALLBACK_SEASON, |s| s.season);
            // Invalid input keeps the prompt open
            let (league_id, season) = parse_connect_input(&view_state.input_text, default_season)?;
            view_state.input_mode = false;
            view_state.input_text.clear();
            Some(UserCommand::Connect { league_id, season })
        }
        KeyCode::Backspace => {
            view_state.input_text.pop();
            None
        }
        KeyCode::Char(c) if c.is_ascii_digit() || c == ' ' => {
            view_state.input_text.push(c);
            None
        }
        _ => None,
    }
}

/// Parse "<league_id> [season]".
pub fn parse_connect_input(text: &str, default_season: u16) -> Option<(u64, u16)> {
    let mut parts = text.split_whitespace();
    let league_id = parts.next()?.parse::<u64>().ok()?;
    let season = match parts.next() {
        Some(s) => s.parse::<u16>().ok()?,
        None => default_season,
    };
    if parts.next().is_some() || league_id == 0 {
        return None;
    }
    Some((league_id, season))
}

/// Next (or previous) item after `current`, wrapping around.
fn cycle<T: Copy + PartialEq>(items: &[T], current: T, forward: bool) -> T {
    let len = items.len();
    let idx = items.iter().position(|i| *i == current).unwrap_or(0);
    let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
    items[next]
}

/// Team ids in standings order.
fn team_order(view_state: &ViewState) -> Vec<u32> {
    view_state
        .dashboard()
        .map(|d| d.standings.iter().map(|row| row.team_id).collect())
        .unwrap_or_default()
}

fn next_team(view_state: &ViewState, forward: bool) -> Option<u32> {
    let ids = team_order(view_state);
    let current = view_state.dashboard()?.my_team_id?;
    if ids.len() < 2 {
        return None;
    }
    Some(cycle(&ids, current, forward))
}

/// Cycle the trade partner, never landing on my own team.
fn next_partner(view_state: &ViewState, forward: bool) -> Option<u32> {
    let dashboard = view_state.dashboard()?;
    let ids: Vec<u32> = team_order(view_state)
        .into_iter()
        .filter(|id| Some(*id) != dashboard.my_team_id)
        .collect();
    if ids.is_empty() {
        return None;
    }
    match dashboard.partner_id {
        Some(current) if ids.contains(&current) => {
            let next = cycle(&ids, current, forward);
            (next != current).then_some(next)
        }
        _ => ids.first().copied(),
    }
}

/// Scroll key for the active tab.
pub fn active_widget_key(view_state: &ViewState) -> &'static str {
    match view_state.active_tab {
        TabId::League => "league",
        TabId::Matchups => "matchups",
        TabId::Team => "team",
        TabId::Trades => "trades",
        TabId::Streaming => "streaming",
    }
}

fn scroll_up(view_state: &mut ViewState, lines: usize) {
    let key = active_widget_key(view_state);
    let offset = view_state.scroll_offset.entry(key.to_string()).or_insert(0);
    *offset = offset.saturating_sub(lines);
}

fn scroll_down(view_state: &mut ViewState, lines: usize) {
    let key = active_widget_key(view_state);
    let offset = view_state.scroll_offset.entry(key.to_string()).or_insert(0);
    *offset = offset.saturating_add(lines);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
