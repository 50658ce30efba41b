// Status bar widget: league, period, selected team, load status, tab indicator.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::protocol::TabId;
use crate::tui::{LoadState, ViewState};

/// Render the status bar into the given area.
///
/// Layout: [load indicator] [league / period / team] | [tab bar] [error]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = Vec::new();

    let (dot, dot_color) = load_indicator(&state.load_state, state.snapshot.is_some());
    spans.push(Span::styled(format!(" {dot} "), Style::default().fg(dot_color)));

    spans.push(Span::styled(
        league_summary(state),
        Style::default().fg(Color::White),
    ));
    spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
    spans.extend(tab_spans(state.active_tab));

    match &state.load_state {
        LoadState::Loading { league_id, season } => spans.push(Span::styled(
            format!(" loading {league_id}/{season}..."),
            Style::default().fg(Color::Yellow),
        )),
        LoadState::Error(message) => spans.push(Span::styled(
            format!(" {message}"),
            Style::default().fg(Color::Red),
        )),
        LoadState::Idle => {}
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Dot character and color: yellow while loading, red after an error,
/// green with a league on screen, gray before the first load.
pub fn load_indicator(load_state: &LoadState, has_league: bool) -> (&'static str, Color) {
    match load_state {
        LoadState::Loading { .. } => ("●", Color::Yellow),
        LoadState::Error(_) => ("●", Color::Red),
        LoadState::Idle if has_league => ("●", Color::Green),
        LoadState::Idle => ("○", Color::Gray),
    }
}

/// "Hardwood Nine 2026 · Wk 9 · Downtown Splash", or a connect hint.
pub fn league_summary(state: &ViewState) -> String {
    let Some(dashboard) = state.dashboard() else {
        return "No league (press L)".to_string();
    };
    let mut summary = format!(
        "{} {} · Wk {}",
        dashboard.league_name, dashboard.season, dashboard.period
    );
    if let Some(name) = dashboard.my_team_id.and_then(|id| state.team_name(id)) {
        summary.push_str(" · ");
        summary.push_str(name);
    }
    summary
}

/// "[1:League] [2:Matchups] ..." with the active tab highlighted.
pub fn tab_spans(active: TabId) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (i, tab_id) in TabId::ALL.into_iter().enumerate() {
        let style = if tab_id == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!("[{}:{}]", i + 1, tab_id.title()), style));
        spans.push(Span::raw(" "));
    }
    spans
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
