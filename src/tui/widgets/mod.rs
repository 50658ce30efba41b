// TUI widget modules for each dashboard panel.

pub mod help;
pub mod matchups;
pub mod overlay;
pub mod positions;
pub mod standings;
pub mod status_bar;
pub mod streaming;
pub mod team;
pub mod trades;
pub mod weights;

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::category::Category;
use crate::league::CategoryOutcome;

/// Bordered panel with a single dimmed message, for empty states.
pub fn render_placeholder(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    let paragraph = Paragraph::new(format!("  {message}"))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    frame.render_widget(paragraph, area);
}

/// Percentages with three decimals, counting stats with one.
pub fn format_stat(cat: Category, value: f64) -> String {
    if cat.is_percentage() {
        format!("{value:.3}")
    } else {
        format!("{value:.1}")
    }
}

/// Signed z-score: "+1.25", "-0.40".
pub fn format_z(value: f64) -> String {
    format!("{value:+.2}")
}

pub fn outcome_style(outcome: CategoryOutcome) -> Style {
    match outcome {
        CategoryOutcome::Win => Style::default().fg(Color::Green),
        CategoryOutcome::Loss => Style::default().fg(Color::Red),
        CategoryOutcome::Tie => Style::default().fg(Color::Yellow),
    }
}

pub fn outcome_label(outcome: CategoryOutcome) -> &'static str {
    match outcome {
        CategoryOutcome::Win => "W",
        CategoryOutcome::Loss => "L",
        CategoryOutcome::Tie => "T",
    }
}

/// Comma-joined category labels, or "-" when empty.
pub fn category_list(cats: &[Category]) -> String {
    if cats.is_empty() {
        return "-".to_string();
    }
    cats.iter().map(|c| c.label()).collect::<Vec<_>>().join(", ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
