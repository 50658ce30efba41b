// Matchups tab: this week's pairings, the season-average projection of my
// matchup, and the live category breakdown when the league reports one.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, List, ListItem, Row, Table};
use ratatui::Frame;

use crate::analysis::league::Dashboard;
use crate::analysis::matchup::{CategoryNeed, MatchupProjection};
use crate::tui::ViewState;

use super::{format_stat, outcome_label, outcome_style, render_placeholder};

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(dashboard) = state.dashboard() else {
        render_placeholder(frame, area, "Matchups", "No league loaded.");
        return;
    };

    let list_height = (dashboard.matchups.len() as u16 + 2).max(3);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(list_height), Constraint::Min(6)])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    render_list(frame, rows[0], dashboard);

    let opponent = dashboard
        .opponent_id
        .and_then(|id| state.team_name(id))
        .unwrap_or("bye");
    match &dashboard.projection {
        Some(projection) => render_projection(frame, columns[0], projection, opponent),
        None => render_placeholder(frame, columns[0], "Projection", "No opponent this period."),
    }
    if dashboard.live.is_empty() {
        render_placeholder(frame, columns[1], "Live", "No live category totals yet.");
    } else {
        render_live(frame, columns[1], &dashboard.live, opponent);
    }
}

fn render_list(frame: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let items: Vec<ListItem> = dashboard
        .matchups
        .iter()
        .map(|m| {
            let mine = dashboard
                .my_team_id
                .is_some_and(|id| id == m.home_id || id == m.away_id);
            let style = if mine {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let mut spans = vec![Span::styled(format!(" {}", m.label), style)];
            if !m.score.is_empty() {
                spans.push(Span::styled(
                    format!("  {}", m.score),
                    Style::default().fg(Color::Gray),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Week {}", dashboard.period)),
    );
    frame.render_widget(list, area);
}

fn header(cells: [&'static str; 5]) -> Row<'static> {
    Row::new(cells.map(Cell::from))
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
}

/// The dashboard projects with my team on the home side.
fn render_projection(frame: &mut Frame, area: Rect, projection: &MatchupProjection, opponent: &str) {
    let rows: Vec<Row> = projection
        .categories
        .iter()
        .map(|pc| {
            Row::new(vec![
                Cell::from(pc.category.label()),
                Cell::from(format_stat(pc.category, pc.home)),
                Cell::from(format_stat(pc.category, pc.away)),
                Cell::from(outcome_label(pc.outcome)).style(outcome_style(pc.outcome)),
                Cell::from(""),
            ])
        })
        .collect();
    let widths = [
        Constraint::Length(5),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(3),
        Constraint::Min(0),
    ];
    let table = Table::new(rows, widths)
        .header(header(["Cat", "Me", "Them", "", ""]))
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Projected vs {opponent} ({})",
            projection.record()
        )));
    frame.render_widget(table, area);
}

fn render_live(frame: &mut Frame, area: Rect, live: &[CategoryNeed], opponent: &str) {
    let rows: Vec<Row> = live
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.category.label()),
                Cell::from(format_stat(row.category, row.mine)),
                Cell::from(format_stat(row.category, row.theirs)),
                Cell::from(outcome_label(row.outcome)).style(outcome_style(row.outcome)),
                Cell::from(format!("{:.2}", row.need)),
            ])
        })
        .collect();
    let widths = [
        Constraint::Length(5),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(3),
        Constraint::Length(6),
    ];
    let table = Table::new(rows, widths)
        .header(header(["Cat", "Me", "Them", "", "Need"]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Live vs {opponent}")),
        );
    frame.render_widget(table, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
