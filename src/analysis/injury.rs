// Injury heuristic: ESPN status strings and free-text notes to a [0, 1]
// severity.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::analysis::RosterPlayer;
use crate::config::InjuryConfig;

/// "3 weeks", "10 days", "2wks", ...
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*(day|days|wk|wks|week|weeks)").expect("valid duration regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InjuryLabel {
    None,
    Minor,
    Moderate,
    Severe,
    /// A status the heuristic does not recognise.
    Unknown,
}

impl InjuryLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            InjuryLabel::None => "healthy",
            InjuryLabel::Minor => "minor",
            InjuryLabel::Moderate => "moderate",
            InjuryLabel::Severe => "severe",
            InjuryLabel::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InjuryReport {
    pub severity: f64,
    pub label: InjuryLabel,
}

impl InjuryReport {
    pub fn healthy() -> Self {
        InjuryReport {
            severity: 0.0,
            label: InjuryLabel::None,
        }
    }
}

/// Upper-case, trim, and join words with '-' so "day to day", "DAY_TO_DAY"
/// and "Day-To-Day" compare equal.
fn normalize_status(raw: &str) -> String {
    raw.trim()
        .to_uppercase()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Long keywords match anywhere in the status; one- and two-letter ones
/// ("Q", "IR") only match the whole status.
fn keyword_matches(status: &str, keyword: &str) -> bool {
    let keyword = normalize_status(keyword);
    if keyword.is_empty() {
        return false;
    }
    if keyword.len() >= 3 {
        status.contains(&keyword)
    } else {
        status == keyword
    }
}

fn tier_severity(status: &str, config: &InjuryConfig) -> Option<f64> {
    if status.is_empty() {
        return None;
    }
    config
        .tiers
        .iter()
        .find(|tier| tier.keywords.iter().any(|k| keyword_matches(status, k)))
        .map(|tier| tier.severity)
}

/// Severity implied by an explicit absence length in the detail text.
pub fn duration_severity(detail: &str, config: &InjuryConfig) -> Option<f64> {
    let detail = detail.to_lowercase();
    let caps = DURATION_RE.captures(&detail)?;
    let count: f64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str();
    let games = if unit.starts_with("day") {
        count * config.games_per_day
    } else {
        count * config.games_per_week
    };
    Some((games / config.games_for_full_severity).min(1.0))
}

/// Severity in [0, 1] for an ESPN status and detail text.
pub fn estimate_injury_severity(status: &str, detail: &str, config: &InjuryConfig) -> f64 {
    classify_injury(status, detail, config).severity
}

/// Classify an injury. Never fails: unrecognised statuses are reported as
/// `Unknown` with the configured neutral severity.
pub fn classify_injury(status: &str, detail: &str, config: &InjuryConfig) -> InjuryReport {
    let status = normalize_status(status);
    let healthy = status.is_empty()
        || config
            .healthy_keywords
            .iter()
            .any(|k| normalize_status(k) == status);

    let tier = if healthy {
        None
    } else {
        tier_severity(&status, config)
    };
    let duration = duration_severity(detail, config);

    if tier.is_none() && duration.is_none() {
        return if healthy {
            InjuryReport::healthy()
        } else {
            InjuryReport {
                severity: config.unknown_severity,
                label: InjuryLabel::Unknown,
            }
        };
    }

    let severity = tier
        .unwrap_or(0.0)
        .max(duration.unwrap_or(0.0))
        .clamp(0.0, 1.0);
    InjuryReport {
        severity,
        label: label_for(severity, config),
    }
}

fn label_for(severity: f64, config: &InjuryConfig) -> InjuryLabel {
    if severity <= 0.0 {
        InjuryLabel::None
    } else if severity <= config.minor_max {
        InjuryLabel::Minor
    } else if severity <= config.moderate_max {
        InjuryLabel::Moderate
    } else {
        InjuryLabel::Severe
    }
}

/// Mean injury severity; 0.0 for no players.
pub fn avg_injury_severity<'a>(players: impl IntoIterator<Item = &'a RosterPlayer>) -> f64 {
    let (sum, n) = players
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), p| (sum + p.severity(), n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::{injured, player};
    use crate::config::InjuryTier;

    fn config() -> InjuryConfig {
        let tier = |severity: f64, keywords: &[&str]| InjuryTier {
            severity,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        };
        InjuryConfig {
            healthy_keywords: vec!["ACTIVE".into(), "HEALTHY".into(), "NORMAL".into()],
            tiers: vec![
                tier(1.0, &["OUT", "INJURY-RESERVE", "INJ", "IR", "IL"]),
                tier(0.8, &["DOUBTFUL"]),
                tier(0.6, &["QUESTIONABLE", "QST", "Q"]),
                tier(0.3, &["DAY-TO-DAY", "DTD", "GTD", "PROBABLE"]),
            ],
            unknown_severity: 0.0,
            games_per_day: 1.0,
            games_per_week: 3.0,
            games_for_full_severity: 10.0,
            minor_max: 0.3,
            moderate_max: 0.6,
        }
    }

    #[test]
    fn empty_input_is_healthy() {
        let report = classify_injury("", "", &config());
        assert_eq!(report, InjuryReport::healthy());
        assert_eq!(estimate_injury_severity("", "", &config()), 0.0);
    }

    #[test]
    fn healthy_keywords_are_healthy() {
        for status in ["ACTIVE", "active", " Healthy "] {
            assert_eq!(classify_injury(status, "", &config()).label, InjuryLabel::None);
        }
    }

    #[test]
    fn status_tiers() {
        let cfg = config();
        assert_eq!(estimate_injury_severity("OUT", "", &cfg), 1.0);
        assert_eq!(estimate_injury_severity("INJURY_RESERVE", "", &cfg), 1.0);
        assert_eq!(estimate_injury_severity("Doubtful", "", &cfg), 0.8);
        assert_eq!(estimate_injury_severity("QUESTIONABLE", "", &cfg), 0.6);
        assert_eq!(estimate_injury_severity("Q", "", &cfg), 0.6);
        assert_eq!(estimate_injury_severity("day to day", "", &cfg), 0.3);
        assert_eq!(estimate_injury_severity("GTD", "", &cfg), 0.3);
    }

    #[test]
    fn short_keywords_need_the_whole_status() {
        let cfg = config();
        assert_eq!(classify_injury("SQUAD", "", &cfg).label, InjuryLabel::Unknown);
        // a word of a longer status is not enough
        assert_eq!(classify_injury("Q-LISTED", "", &cfg).label, InjuryLabel::Unknown);
        assert_eq!(estimate_injury_severity("ir", "", &cfg), 1.0);
        assert_eq!(estimate_injury_severity(" q ", "", &cfg), 0.6);
    }

    #[test]
    fn unknown_status_is_unknown_not_panic() {
        let report = classify_injury("SUSPENSION", "", &config());
        assert_eq!(report.label, InjuryLabel::Unknown);
        assert_eq!(report.severity, 0.0);
    }

    #[test]
    fn duration_in_detail_raises_severity() {
        let cfg = config();
        assert_eq!(duration_severity("Expected to miss 2 weeks", &cfg), Some(0.6));
        assert_eq!(duration_severity("out 4 days", &cfg), Some(0.4));
        assert_eq!(duration_severity("6 wks", &cfg), Some(1.0));
        assert_eq!(duration_severity("no timetable", &cfg), None);

        let report = classify_injury("DTD", "re-evaluated in 2 weeks", &cfg);
        assert_eq!(report.severity, 0.6);
        assert_eq!(report.label, InjuryLabel::Moderate);
    }

    #[test]
    fn duration_with_unknown_status_uses_duration() {
        let report = classify_injury("SUSPENSION", "10 days", &config());
        assert_eq!(report.severity, 1.0);
        assert_eq!(report.label, InjuryLabel::Severe);
    }

    #[test]
    fn labels_follow_thresholds() {
        let cfg = config();
        assert_eq!(classify_injury("PROBABLE", "", &cfg).label, InjuryLabel::Minor);
        assert_eq!(classify_injury("QUESTIONABLE", "", &cfg).label, InjuryLabel::Moderate);
        assert_eq!(classify_injury("DOUBTFUL", "", &cfg).label, InjuryLabel::Severe);
    }

    #[test]
    fn average_severity() {
        let a = injured(player("A", "PG", 1.0, 1.0, 1.0), 1.0);
        let b = player("B", "PG", 1.0, 1.0, 1.0);
        assert_eq!(avg_injury_severity([&a, &b]), 0.5);
        assert_eq!(avg_injury_severity(std::iter::empty::<&RosterPlayer>()), 0.0);
    }
}
