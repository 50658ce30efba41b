// Roster position counts, balance against targets, and trade balance deltas.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::RosterPlayer;

/// Basketball positions as they appear in ESPN position strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    PointGuard,
    ShootingGuard,
    SmallForward,
    PowerForward,
    Center,
    Guard,
    Forward,
    Utility,
}

impl Position {
    /// Parse a position abbreviation ("PG", "C", "UTIL", ...).
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PG" => Some(Position::PointGuard),
            "SG" => Some(Position::ShootingGuard),
            "SF" => Some(Position::SmallForward),
            "PF" => Some(Position::PowerForward),
            "C" => Some(Position::Center),
            "G" => Some(Position::Guard),
            "F" => Some(Position::Forward),
            "UTIL" | "UT" => Some(Position::Utility),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::PointGuard => "PG",
            Position::ShootingGuard => "SG",
            Position::SmallForward => "SF",
            Position::PowerForward => "PF",
            Position::Center => "C",
            Position::Guard => "G",
            Position::Forward => "F",
            Position::Utility => "UTIL",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

/// First position of an ESPN position string: "PG/SG" -> PG, "SF,PF" -> SF.
/// Empty or unrecognised strings map to `Utility`.
pub fn primary_position(pos_str: &str) -> Position {
    pos_str
        .split(['/', ',', '-'])
        .map(str::trim)
        .find(|part| !part.is_empty())
        .and_then(Position::from_str_pos)
        .unwrap_or(Position::Utility)
}

/// Players per primary position. Counts sum to the roster length.
pub fn position_counts(roster: &[RosterPlayer]) -> BTreeMap<Position, usize> {
    let mut counts = BTreeMap::new();
    for p in roster {
        *counts.entry(p.position()).or_insert(0) += 1;
    }
    counts
}

// ---------------------------------------------------------------------------
// Balance against targets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BalanceStatus {
    Surplus,
    Deficit,
    Balanced,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionRow {
    pub position: Position,
    pub count: usize,
    pub target: usize,
    pub status: BalanceStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PositionBalance {
    pub rows: Vec<PositionRow>,
}

impl PositionBalance {
    pub fn deficits(&self) -> impl Iterator<Item = &PositionRow> {
        self.rows.iter().filter(|r| r.status == BalanceStatus::Deficit)
    }

    pub fn surpluses(&self) -> impl Iterator<Item = &PositionRow> {
        self.rows.iter().filter(|r| r.status == BalanceStatus::Surplus)
    }
}

/// Compare roster counts with per-position targets. Every targeted or
/// observed position gets a row; unknown target keys are ignored.
pub fn position_balance(
    roster: &[RosterPlayer],
    targets: &BTreeMap<String, usize>,
) -> PositionBalance {
    let counts = position_counts(roster);
    let targets: BTreeMap<Position, usize> = targets
        .iter()
        .filter_map(|(k, v)| Position::from_str_pos(k).map(|p| (p, *v)))
        .collect();

    let positions: BTreeSet<Position> = counts.keys().chain(targets.keys()).copied().collect();
    let rows = positions
        .into_iter()
        .map(|position| {
            let count = counts.get(&position).copied().unwrap_or(0);
            let target = targets.get(&position).copied().unwrap_or(0);
            let status = match count.cmp(&target) {
                std::cmp::Ordering::Greater => BalanceStatus::Surplus,
                std::cmp::Ordering::Less => BalanceStatus::Deficit,
                std::cmp::Ordering::Equal => BalanceStatus::Balanced,
            };
            PositionRow {
                position,
                count,
                target,
                status,
            }
        })
        .collect();
    PositionBalance { rows }
}

// ---------------------------------------------------------------------------
// Trade balance delta
// ---------------------------------------------------------------------------

/// How much swapping `outgoing` for `incoming` evens out the roster.
///
/// The ideal count per position is `roster len / distinct positions`;
/// the result is the total distance to that ideal before minus after, so
/// a positive value means a more balanced roster.
pub fn position_balance_delta(
    roster: &[RosterPlayer],
    outgoing: &[&RosterPlayer],
    incoming: &[&RosterPlayer],
) -> f64 {
    let before = position_counts(roster);
    if before.is_empty() {
        return 0.0;
    }
    let ideal = roster.len() as f64 / before.len() as f64;

    let mut after: BTreeMap<Position, i64> =
        before.iter().map(|(p, c)| (*p, *c as i64)).collect();
    for p in outgoing {
        *after.entry(p.position()).or_insert(0) -= 1;
    }
    for p in incoming {
        *after.entry(p.position()).or_insert(0) += 1;
    }

    let dist_before: f64 = before.values().map(|c| (*c as f64 - ideal).abs()).sum();
    let dist_after: f64 = after.values().map(|c| (*c as f64 - ideal).abs()).sum();
    dist_before - dist_after
}

/// Short note describing a balance delta, if it is worth mentioning.
pub fn position_note(delta: f64) -> Option<&'static str> {
    if delta > 0.4 {
        Some("Improves positional balance and helps avoid lineup logjams.")
    } else if delta > 0.15 {
        Some("Slightly improves positional balance across your roster.")
    } else if delta < -0.4 {
        Some("Creates a noticeable positional imbalance; double-check your lineup slots.")
    } else if delta < -0.15 {
        Some("Slightly worsens positional balance; mind your lineup constraints.")
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::player;

    fn roster(positions: &[&str]) -> Vec<RosterPlayer> {
        positions
            .iter()
            .enumerate()
            .map(|(i, pos)| player(&format!("P{i}"), pos, 10.0, 5.0, 3.0))
            .collect()
    }

    fn default_targets() -> BTreeMap<String, usize> {
        [("PG", 3), ("SG", 2), ("SF", 3), ("PF", 2), ("C", 3)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn primary_position_parsing() {
        assert_eq!(primary_position("PG"), Position::PointGuard);
        assert_eq!(primary_position("PG/SG"), Position::PointGuard);
        assert_eq!(primary_position("SF,PF"), Position::SmallForward);
        assert_eq!(primary_position("C-PF"), Position::Center);
        assert_eq!(primary_position(" sg "), Position::ShootingGuard);
        assert_eq!(primary_position(""), Position::Utility);
        assert_eq!(primary_position("XX"), Position::Utility);
    }

    #[test]
    fn counts_sum_to_roster_length() {
        let r = roster(&["PG", "PG/SG", "C", "", "SF", "F"]);
        let counts = position_counts(&r);
        assert_eq!(counts.values().sum::<usize>(), r.len());
        assert_eq!(counts[&Position::PointGuard], 2);
        assert_eq!(counts[&Position::Utility], 1);
    }

    #[test]
    fn roster_at_target_has_no_deficits() {
        let r = roster(&[
            "PG", "PG", "PG", "SG", "SG", "SF", "SF", "SF", "PF", "PF", "C", "C", "C",
        ]);
        assert_eq!(r.len(), 13);
        let balance = position_balance(&r, &default_targets());
        assert_eq!(balance.deficits().count(), 0);
        assert_eq!(balance.surpluses().count(), 0);
        assert_eq!(balance.rows.len(), 5);
    }

    #[test]
    fn empty_roster_is_all_deficits() {
        let balance = position_balance(&[], &default_targets());
        assert_eq!(balance.deficits().count(), 5);
    }

    #[test]
    fn untargeted_position_is_surplus() {
        let r = roster(&["PG", "PG", "PG", "PG", "G"]);
        let balance = position_balance(&r, &default_targets());
        let pg = balance
            .rows
            .iter()
            .find(|row| row.position == Position::PointGuard)
            .unwrap();
        assert_eq!(pg.status, BalanceStatus::Surplus);
        let g = balance.rows.iter().find(|row| row.position == Position::Guard).unwrap();
        assert_eq!((g.count, g.target, g.status), (1, 0, BalanceStatus::Surplus));
    }

    #[test]
    fn balance_delta_rewards_evening_out() {
        let r = roster(&["PG", "PG", "PG", "C"]);
        let out = &r[0];
        let incoming = player("Big", "C", 10.0, 10.0, 1.0);
        // ideal = 2; before |3-2| + |1-2| = 2, after 0.
        let delta = position_balance_delta(&r, &[out], &[&incoming]);
        assert!((delta - 2.0).abs() < 1e-12);

        let guard = player("Guard", "PG", 1.0, 1.0, 1.0);
        let worse = position_balance_delta(&r, &[&r[3]], &[&guard]);
        assert!(worse < 0.0);
    }

    #[test]
    fn balance_delta_of_empty_roster_is_zero() {
        let p = player("X", "PG", 1.0, 1.0, 1.0);
        assert_eq!(position_balance_delta(&[], &[], &[&p]), 0.0);
    }

    #[test]
    fn notes_by_threshold() {
        assert!(position_note(0.5).unwrap().starts_with("Improves"));
        assert!(position_note(0.2).unwrap().starts_with("Slightly improves"));
        assert_eq!(position_note(0.0), None);
        assert!(position_note(-0.2).unwrap().starts_with("Slightly worsens"));
        assert!(position_note(-0.5).unwrap().starts_with("Creates"));
    }
}
