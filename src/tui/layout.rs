// Screen layout: panel arrangement and sizing.
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +-------------------------+------------------------+
// | Main Panel (68%)         | Sidebar (32%)          |
// |                          | +- Weights (11 rows) -+|
// |                          | +- Positions (fill) --+|
// +-------------------------+------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each dashboard zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// League, period, selected team, load status and tabs.
    pub status_bar: Rect,
    /// Tab-switched content area.
    pub main_panel: Rect,
    /// Category weights with the adjustable one highlighted.
    pub weights: Rect,
    /// Position balance of my roster.
    pub positions: Rect,
    pub help_bar: Rect,
}

/// Weight table: 9 categories plus borders.
const WEIGHTS_HEIGHT: u16 = 11;

pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(8),    // main + sidebar
            Constraint::Length(1), // help bar
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(vertical[1]);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(WEIGHTS_HEIGHT), Constraint::Min(3)])
        .split(horizontal[1]);

    AppLayout {
        status_bar: vertical[0],
        main_panel: horizontal[0],
        weights: sidebar[0],
        positions: sidebar[1],
        help_bar: vertical[2],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
