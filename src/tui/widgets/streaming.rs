// Streaming tab: category needs for the current matchup, ranked free-agent
// adds, and the roster spots they would replace.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use crate::analysis::streaming::StreamingPlan;
use crate::category::Category;
use crate::tui::ViewState;

use super::{category_list, render_placeholder};

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(snapshot) = state.snapshot.as_ref() else {
        render_placeholder(frame, area, "Streaming", "No league loaded.");
        return;
    };
    let plan = &snapshot.dashboard.streaming;

    let drops_height = (plan.drops.len() as u16 + 3).clamp(4, 8);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(drops_height),
        ])
        .split(area);

    let schedule = if snapshot.schedule_known {
        "today's schedule applied"
    } else {
        "schedule unknown"
    };
    render_needs(frame, chunks[0], plan, schedule);
    render_adds(frame, chunks[1], plan, state.scroll("streaming"));
    render_drops(frame, chunks[2], plan);
}

/// Needs as "PTS 0.42  REB 0.18 ...", skipping zero entries.
pub fn needs_line(plan: &StreamingPlan) -> String {
    let parts: Vec<String> = Category::trade_categories()
        .filter(|&c| plan.needs.get(c) > 0.0)
        .map(|c| format!("{} {:.2}", c.label(), plan.needs.get(c)))
        .collect();
    if parts.is_empty() {
        "no open needs".to_string()
    } else {
        parts.join("  ")
    }
}

fn render_needs(frame: &mut Frame, area: Rect, plan: &StreamingPlan, schedule: &str) {
    let paragraph = Paragraph::new(Line::from(Span::raw(format!(" {}", needs_line(plan)))))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Needs · {schedule}")),
        );
    frame.render_widget(paragraph, area);
}

fn render_adds(frame: &mut Frame, area: Rect, plan: &StreamingPlan, scroll: usize) {
    if plan.adds.is_empty() {
        render_placeholder(frame, area, "Adds", "No free agent helps right now.");
        return;
    }
    let header = Row::new(vec!["#", "Player", "NBA", "Score", "Helps", "Why"])
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = plan
        .adds
        .iter()
        .enumerate()
        .skip(scroll)
        .map(|(i, add)| {
            let name_style = if add.playing {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from((i + 1).to_string()),
                Cell::from(add.player.name().to_string()).style(name_style),
                Cell::from(add.player.player.pro_team.clone()),
                Cell::from(format!("{:.2}", add.score)),
                Cell::from(category_list(&add.cats_helped)),
                Cell::from(add.explanation.clone()),
            ])
        })
        .collect();
    let widths = [
        Constraint::Length(3),
        Constraint::Length(20),
        Constraint::Length(4),
        Constraint::Length(6),
        Constraint::Length(16),
        Constraint::Min(20),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Adds"));
    frame.render_widget(table, area);
}

fn render_drops(frame: &mut Frame, area: Rect, plan: &StreamingPlan) {
    if plan.drops.is_empty() {
        render_placeholder(frame, area, "Drops", "-");
        return;
    }
    let rows: Vec<Row> = plan
        .drops
        .iter()
        .map(|drop| {
            Row::new(vec![
                Cell::from(drop.player.name().to_string()),
                Cell::from(drop.player.position().to_string()),
                Cell::from(format!("{:.2}", drop.score)),
            ])
        })
        .collect();
    let widths = [Constraint::Min(20), Constraint::Length(5), Constraint::Length(7)];
    let table = Table::new(rows, widths)
        .block(Block::default().borders(Borders::ALL).title("Drop candidates"));
    frame.render_widget(table, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
