// Weights sidebar: current category weights, with the category that `+`/`-`
// adjust highlighted.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;

use crate::category::Category;
use crate::config::CategoryWeights;
use crate::tui::ViewState;

/// Width of the weight bar at the maximum weight.
const BAR_WIDTH: usize = 8;
const MAX_WEIGHT: f64 = 2.0;

/// "████░░░░" scaled so 2.0 fills the bar.
pub fn weight_bar(weight: f64) -> String {
    let filled = ((weight / MAX_WEIGHT).clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let weights = state
        .snapshot
        .as_ref()
        .map(|s| s.weights)
        .unwrap_or_default();
    let table = weights_table(&weights, state.selected_category);
    frame.render_widget(table, area);
}

fn weights_table(weights: &CategoryWeights, selected: Category) -> Table<'static> {
    let rows: Vec<Row> = Category::ALL
        .iter()
        .map(|&cat| {
            let weight = weights.get(cat);
            let style = if cat == selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if weight == 0.0 {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(cat.label()),
                Cell::from(format!("{weight:.2}")),
                Cell::from(weight_bar(weight)),
            ])
            .style(style)
        })
        .collect();
    let widths = [
        Constraint::Length(4),
        Constraint::Length(5),
        Constraint::Length(BAR_WIDTH as u16),
    ];
    Table::new(rows, widths).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Weights (c, +/-)"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::tests::sample_snapshot;

    #[test]
    fn weight_bar_scales_and_clamps() {
        assert_eq!(weight_bar(0.0), "░░░░░░░░");
        assert_eq!(weight_bar(1.0), "████░░░░");
        assert_eq!(weight_bar(2.0), "████████");
        assert_eq!(weight_bar(5.0), "████████");
    }

    #[test]
    fn render_does_not_panic() {
        let mut snapshot = sample_snapshot();
        snapshot.weights.set(Category::Tov, 0.0);
        for snapshot in [None, Some(snapshot)] {
            let backend = ratatui::backend::TestBackend::new(30, 11);
            let mut terminal = ratatui::Terminal::new(backend).unwrap();
            let state = ViewState {
                snapshot,
                selected_category: Category::Blk,
                ..ViewState::default()
            };
            terminal
                .draw(|frame| render(frame, frame.area(), &state))
                .unwrap();
        }
    }
}
