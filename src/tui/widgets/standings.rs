// League tab: standings table and the category power ranking.
//
// Standings follow the league record. The power table ranks teams by weighted
// z-score total and lists each team's strengths and punted categories.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;

use crate::analysis::league::Dashboard;
use crate::tui::ViewState;

use super::{category_list, format_z, render_placeholder};

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(dashboard) = state.dashboard() else {
        render_placeholder(frame, area, "League", "No league loaded. Press L to connect.");
        return;
    };

    let standings_height = dashboard.standings.len() as u16 + 3;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(standings_height), Constraint::Min(4)])
        .split(area);

    render_standings(frame, chunks[0], dashboard);
    render_power(frame, chunks[1], dashboard, state.scroll("league"));
}

fn header(cells: &[&'static str]) -> Row<'static> {
    Row::new(cells.iter().map(|c| Cell::from(*c)).collect::<Vec<_>>())
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
}

fn mine_style(dashboard: &Dashboard, team_id: u32) -> Style {
    if dashboard.my_team_id == Some(team_id) {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

/// ".667", or "-" before any games.
pub fn format_pct(pct: Option<f64>) -> String {
    match pct {
        Some(p) if p >= 1.0 => "1.000".to_string(),
        Some(p) => format!("{p:.3}").trim_start_matches('0').to_string(),
        None => "-".to_string(),
    }
}

fn render_standings(frame: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let rows: Vec<Row> = dashboard
        .standings
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.rank.to_string()),
                Cell::from(row.name.clone()),
                Cell::from(row.record.clone()),
                Cell::from(format_pct(row.win_pct)),
            ])
            .style(mine_style(dashboard, row.team_id))
        })
        .collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Min(16),
        Constraint::Length(8),
        Constraint::Length(6),
    ];
    let table = Table::new(rows, widths)
        .header(header(&["#", "Team", "Record", "Pct"]))
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Standings · {} · Week {}",
            dashboard.league_name, dashboard.period
        )));
    frame.render_widget(table, area);
}

fn render_power(frame: &mut Frame, area: Rect, dashboard: &Dashboard, scroll: usize) {
    let rows: Vec<Row> = dashboard
        .profiles
        .iter()
        .enumerate()
        .skip(scroll)
        .map(|(i, profile)| {
            let gaps = profile.data_gaps().count();
            Row::new(vec![
                Cell::from((i + 1).to_string()),
                Cell::from(profile.name.clone()),
                Cell::from(format_z(profile.total_score)),
                Cell::from(category_list(&profile.strengths)),
                Cell::from(category_list(&profile.punts)),
                Cell::from(if gaps > 0 { gaps.to_string() } else { String::new() }),
            ])
            .style(mine_style(dashboard, profile.team_id))
        })
        .collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Min(16),
        Constraint::Length(7),
        Constraint::Min(14),
        Constraint::Min(10),
        Constraint::Length(4),
    ];
    let table = Table::new(rows, widths)
        .header(header(&["#", "Team", "Score", "Strengths", "Punts", "Gap"]))
        .block(Block::default().borders(Borders::ALL).title("Power (weighted z)"));
    frame.render_widget(table, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::tests::{fixture_snapshot, sample_snapshot};

    #[test]
    fn format_pct_drops_leading_zero() {
        assert_eq!(format_pct(Some(0.6667)), ".667");
        assert_eq!(format_pct(Some(1.0)), "1.000");
        assert_eq!(format_pct(Some(0.0)), ".000");
        assert_eq!(format_pct(None), "-");
    }

    #[test]
    fn render_does_not_panic_empty() {
        let backend = ratatui::backend::TestBackend::new(80, 20);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let state = ViewState::default();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
    }

    #[test]
    fn render_lists_fixture_teams() {
        let backend = ratatui::backend::TestBackend::new(100, 24);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let state = ViewState {
            snapshot: Some(fixture_snapshot()),
            ..ViewState::default()
        };
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
        let rendered: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(rendered.contains("Downtown Splash"));
        assert!(rendered.contains("Hardwood Nine"));
    }

    #[test]
    fn render_survives_large_scroll() {
        let backend = ratatui::backend::TestBackend::new(80, 12);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let mut state = ViewState {
            snapshot: Some(sample_snapshot()),
            ..ViewState::default()
        };
        state.scroll_offset.insert("league".to_string(), 50);
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
    }
}
