// Team tab: my roster with per-game lines and injury status, followed by
// the team's category z-scores.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;

use crate::analysis::injury::InjuryLabel;
use crate::analysis::profile::TeamProfile;
use crate::analysis::RosterPlayer;
use crate::category::Category;
use crate::tui::ViewState;

use super::{format_stat, format_z, render_placeholder};

/// Per-game columns shown in the roster table.
const ROSTER_CATEGORIES: [Category; 6] = [
    Category::Pts,
    Category::Reb,
    Category::Ast,
    Category::ThreePm,
    Category::FgPct,
    Category::FtPct,
];

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(profile) = state.dashboard().and_then(|d| d.my_profile()) else {
        render_placeholder(frame, area, "Team", "No team selected.");
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(5)])
        .split(area);

    render_roster(frame, chunks[0], profile, state.scroll("team"));
    render_category_z(frame, chunks[1], profile);
}

fn injury_style(label: InjuryLabel) -> Style {
    match label {
        InjuryLabel::None => Style::default().fg(Color::Green),
        InjuryLabel::Minor => Style::default().fg(Color::Yellow),
        InjuryLabel::Moderate => Style::default().fg(Color::LightRed),
        InjuryLabel::Severe => Style::default().fg(Color::Red),
        InjuryLabel::Unknown => Style::default().fg(Color::Magenta),
    }
}

/// "OUT (severe)", "healthy", ...
pub fn injury_text(player: &RosterPlayer) -> String {
    let status = player.player.injury_status.trim();
    if status.is_empty() || player.injury.label == InjuryLabel::None {
        player.injury.label.as_str().to_string()
    } else {
        format!("{} ({})", status.replace('_', " "), player.injury.label.as_str())
    }
}

fn roster_row(player: &RosterPlayer) -> Row<'static> {
    let mut cells = vec![
        Cell::from(player.name().to_string()),
        Cell::from(player.position().to_string()),
        Cell::from(player.player.pro_team.clone()),
        Cell::from(player.player.lineup_slot.clone().unwrap_or_default()),
        Cell::from(injury_text(player)).style(injury_style(player.injury.label)),
    ];
    match &player.stats {
        Some(stats) => {
            cells.extend(
                ROSTER_CATEGORIES
                    .iter()
                    .map(|&cat| Cell::from(format_stat(cat, stats.get(cat)))),
            );
        }
        None => cells.push(
            Cell::from("no stats").style(Style::default().fg(Color::DarkGray)),
        ),
    }
    Row::new(cells)
}

fn render_roster(frame: &mut Frame, area: Rect, profile: &TeamProfile, scroll: usize) {
    let mut header_cells = vec!["Player", "Pos", "NBA", "Slot", "Status"];
    header_cells.extend(ROSTER_CATEGORIES.iter().map(|c| c.label()));
    let header = Row::new(header_cells.into_iter().map(Cell::from).collect::<Vec<_>>())
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = profile.roster.iter().skip(scroll).map(roster_row).collect();

    let mut widths = vec![
        Constraint::Min(18),
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(5),
        Constraint::Length(22),
    ];
    widths.extend(ROSTER_CATEGORIES.iter().map(|_| Constraint::Length(6)));

    let gaps = profile.data_gaps().count();
    let title = if gaps > 0 {
        format!("{} · {} players · {} without stats", profile.name, profile.roster.len(), gaps)
    } else {
        format!("{} · {} players", profile.name, profile.roster.len())
    };
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(table, area);
}

fn z_style(profile: &TeamProfile, cat: Category) -> Style {
    if profile.is_punted(cat) {
        Style::default().fg(Color::DarkGray)
    } else if profile.is_strength(cat) {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else if profile.raw_z.get(cat) < 0.0 {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    }
}

fn render_category_z(frame: &mut Frame, area: Rect, profile: &TeamProfile) {
    let header = Row::new(Category::ALL.map(|c| Cell::from(c.label())))
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));
    let raw = Row::new(
        Category::ALL.map(|c| Cell::from(format_z(profile.raw_z.get(c))).style(z_style(profile, c))),
    );
    let weighted = Row::new(Category::ALL.map(|c| Cell::from(format_z(profile.weighted_z.get(c)))));
    let widths = [Constraint::Length(7); Category::COUNT];
    let table = Table::new(vec![raw, weighted], widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Category z (raw / weighted) · total {}", format_z(profile.total_score))),
    );
    frame.render_widget(table, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
