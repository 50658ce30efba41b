// Trades tab: ranked suggestions between my team and the selected partner.
//
// Each suggestion renders as a header line (who sends what), a gains line and
// the wrapped reason text. Scrolling moves through the whole list.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::analysis::trade::TradeSuggestion;
use crate::tui::ViewState;

use super::{category_list, format_z, render_placeholder};

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(dashboard) = state.dashboard() else {
        render_placeholder(frame, area, "Trades", "No league loaded.");
        return;
    };
    let partner = dashboard
        .partner_id
        .and_then(|id| state.team_name(id))
        .unwrap_or("-");
    let title = format!("Trades with {partner} (p to change partner)");

    if dashboard.trades.is_empty() {
        render_placeholder(frame, area, &title, "No trade clears the fit and fairness thresholds.");
        return;
    }

    let lines: Vec<Line> = dashboard
        .trades
        .iter()
        .enumerate()
        .flat_map(|(i, trade)| suggestion_lines(i + 1, trade))
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll("trades") as u16, 0));
    frame.render_widget(paragraph, area);
}

/// Lines for one suggestion, ending with a blank separator.
pub fn suggestion_lines(rank: usize, trade: &TradeSuggestion) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{rank:>2}. "), bold),
            Span::styled("Give ", Style::default().fg(Color::Red)),
            Span::styled(trade.from_a.join(", "), bold),
            Span::styled("  for  ", Style::default().fg(Color::Gray)),
            Span::styled("Get ", Style::default().fg(Color::Green)),
            Span::styled(trade.from_b.join(", "), bold),
        ]),
        Line::from(Span::styled(
            format!(
                "    score {:.2} · fairness {:.2} · me {} ({}) · them {} ({})",
                trade.score,
                trade.fairness,
                format_z(trade.gain_a),
                category_list(&trade.improve_a),
                format_z(trade.gain_b),
                category_list(&trade.improve_b),
            ),
            Style::default().fg(Color::Gray),
        )),
    ];
    lines.extend(
        trade
            .reason
            .lines()
            .map(|line| Line::from(format!("    {line}"))),
    );
    lines.push(Line::from(""));
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
