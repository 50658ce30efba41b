// Key hints: the one-line help bar and the full `?` overlay.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::tui::ViewState;

use super::overlay::centered_rect;

/// Every binding, in overlay order.
pub const KEY_BINDINGS: &[(&str, &str)] = &[
    ("1-5 / Tab", "switch tab"),
    ("j/k PgUp/PgDn", "scroll"),
    ("t / T", "next / previous team to view as"),
    ("p / P", "next / previous trade partner"),
    ("c / C", "select weight category"),
    ("+ / -", "raise / lower selected weight"),
    ("r", "refresh league"),
    ("L", "connect to another league"),
    ("?", "toggle this help"),
    ("q", "quit"),
];

/// Short hint line for the bottom of the screen.
pub fn render_bar(frame: &mut Frame, area: Rect, state: &ViewState) {
    let hint = if state.input_mode {
        " type league id [season] · Enter connect · Esc cancel"
    } else if state.snapshot.is_none() {
        " L connect · ? help · q quit"
    } else {
        " t team · p partner · c/+/- weights · r refresh · L league · ? help · q quit"
    };
    let paragraph = Paragraph::new(Line::from(Span::styled(
        hint,
        Style::default().fg(Color::DarkGray),
    )))
    .style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

pub fn render_overlay(frame: &mut Frame, area: Rect) {
    let height = KEY_BINDINGS.len() as u16 + 2;
    let dialog_area = centered_rect(52, height, area);
    frame.render_widget(Clear, dialog_area);

    let lines: Vec<Line> = KEY_BINDINGS
        .iter()
        .map(|(keys, action)| {
            Line::from(vec![
                Span::styled(
                    format!(" {keys:<15}"),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::raw(*action),
            ])
        })
        .collect();
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Keys "))
        .style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, dialog_area);
}
