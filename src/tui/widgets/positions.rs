// Position balance sidebar for my roster.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;

use crate::analysis::position::BalanceStatus;
use crate::tui::ViewState;

use super::render_placeholder;

pub fn status_marker(status: BalanceStatus) -> (&'static str, Color) {
    match status {
        BalanceStatus::Surplus => ("+", Color::Yellow),
        BalanceStatus::Deficit => ("-", Color::Red),
        BalanceStatus::Balanced => ("=", Color::Green),
    }
}

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(dashboard) = state.dashboard() else {
        render_placeholder(frame, area, "Positions", "-");
        return;
    };
    let balance = &dashboard.position_balance;
    if balance.rows.is_empty() {
        render_placeholder(frame, area, "Positions", "No position data.");
        return;
    }

    let rows: Vec<Row> = balance
        .rows
        .iter()
        .map(|row| {
            let (marker, color) = status_marker(row.status);
            Row::new(vec![
                Cell::from(row.position.display_str()),
                Cell::from(format!("{}/{}", row.count, row.target)),
                Cell::from(marker),
            ])
            .style(Style::default().fg(color))
        })
        .collect();
    let widths = [Constraint::Length(5), Constraint::Length(6), Constraint::Length(2)];
    let table = Table::new(rows, widths).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Positions (have/target)"),
    );
    frame.render_widget(table, area);
}
