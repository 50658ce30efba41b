// Integration tests for hoopcast.
//
// These tests drive the library's public API end to end against the fixture
// league snapshot and stats CSV: league loading, stats matching, injury
// classification, every analysis, and the orchestrator event loop.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use hoopcast::analysis::league::{build_dashboard, Dashboard, DashboardInput, TeamSelection};
use hoopcast::analysis::injury::InjuryLabel;
use hoopcast::app::{self, AppState, SavedLeague};
use hoopcast::category::Category;
use hoopcast::config::{load_config_from, CategoryWeights, Config, TradeModel};
use hoopcast::db::Database;
use hoopcast::league::snapshot::SnapshotSource;
use hoopcast::league::{LeagueData, LeagueError, LeagueRequest, LeagueSource};
use hoopcast::protocol::{UiUpdate, UserCommand};
use hoopcast::stats::loader::load_stats_csv;
use hoopcast::stats::schedule::GameDay;
use hoopcast::stats::StatsIndex;

use chrono::NaiveDate;
use tokio::sync::mpsc;

// ===========================================================================
// Test helpers
// ===========================================================================

const FIXTURES: &str = "tests/fixtures";
const LEAGUE_ID: u64 = 424242;
const SEASON: u16 = 2026;

static CONFIG_DIRS: AtomicUsize = AtomicUsize::new(0);

fn fixture(name: &str) -> PathBuf {
    Path::new(FIXTURES).join(name)
}

/// Load the shipped default config from a scratch directory.
fn default_config() -> Config {
    let n = CONFIG_DIRS.fetch_add(1, Ordering::SeqCst);
    let tmp = std::env::temp_dir().join(format!("hoopcast_it_{}_{n}", std::process::id()));
    let config_dir = tmp.join("config");
    let _ = std::fs::remove_dir_all(&tmp);
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::copy("defaults/league.toml", config_dir.join("league.toml")).unwrap();
    std::fs::copy("defaults/strategy.toml", config_dir.join("strategy.toml")).unwrap();
    let config = load_config_from(&tmp).expect("default config loads");
    let _ = std::fs::remove_dir_all(&tmp);
    config
}

fn stats() -> StatsIndex {
    StatsIndex::from_players("2025-26", load_stats_csv(&fixture("player_stats.csv")).unwrap())
}

fn league() -> LeagueData {
    SnapshotSource::new(fixture("league_snapshot.json"))
        .load()
        .expect("fixture snapshot decodes")
}

fn game_day() -> GameDay {
    GameDay::unknown(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap())
}

fn dashboard_with(config: &Config, weights: &CategoryWeights, selection: &TeamSelection) -> Dashboard {
    let data = league();
    let stats = stats();
    let game_day = game_day();
    let input = DashboardInput {
        data: &data,
        stats: &stats,
        strategy: &config.strategy,
        weights,
        roster_targets: &config.league.roster_targets,
        configured_team: Some(1),
        game_day: &game_day,
    };
    build_dashboard(&input, selection)
}

fn dashboard() -> Dashboard {
    let config = default_config();
    dashboard_with(&config, &config.strategy.weights, &TeamSelection::default())
}

fn roster_names(dashboard: &Dashboard, team_id: u32) -> Vec<String> {
    dashboard
        .profile(team_id)
        .unwrap()
        .roster
        .iter()
        .map(|p| p.name().to_string())
        .collect()
}

// ===========================================================================
// League source
// ===========================================================================

#[tokio::test]
async fn snapshot_source_serves_only_its_league() {
    let config = default_config();
    let source = SnapshotSource::new(fixture("league_snapshot.json"));

    let ok = source
        .fetch_league(&LeagueRequest::from_config(&config, LEAGUE_ID, SEASON))
        .await
        .unwrap();
    assert_eq!(ok.name, "Hardwood Nine");
    assert_eq!(ok.teams.len(), 4);
    assert_eq!(ok.free_agents.len(), 5);

    let wrong_id = source
        .fetch_league(&LeagueRequest::from_config(&config, 1, SEASON))
        .await;
    assert!(matches!(wrong_id, Err(LeagueError::NotFound { league_id: 1, .. })));

    let wrong_season = source
        .fetch_league(&LeagueRequest::from_config(&config, LEAGUE_ID, 2024))
        .await;
    assert!(matches!(wrong_season, Err(LeagueError::NotFound { .. })));
}

#[test]
fn missing_snapshot_is_a_snapshot_error() {
    let err = SnapshotSource::new(fixture("does_not_exist.json"))
        .load()
        .unwrap_err();
    assert!(matches!(err, LeagueError::Snapshot { .. }));
}

// ===========================================================================
// Stats matching and injuries
// ===========================================================================

#[test]
fn stats_match_names_without_diacritics() {
    let index = stats();
    assert_eq!(index.len(), 23);
    assert!(index.get_player_stats("Luka Dončić").is_some());
    assert!(index.get_player_stats("luka doncic").is_some());
    assert!(index.get_player_stats("Mystery Rookie").is_none());
    assert!(index.require("Mystery Rookie").is_err());
}

#[test]
fn data_gaps_are_reported_not_fatal() {
    let dashboard = dashboard();
    assert_eq!(dashboard.data_gap_count, 1);

    let cleaners = dashboard.profile(2).unwrap();
    let gaps: Vec<&str> = cleaners.data_gaps().map(|p| p.name()).collect();
    assert_eq!(gaps, vec!["Mystery Rookie"]);

    let splash = dashboard.profile(1).unwrap();
    assert!(splash.roster.iter().all(|p| p.has_stats()));
}

#[test]
fn injuries_are_classified_from_status() {
    let dashboard = dashboard();
    let find = |team_id: u32, name: &str| {
        dashboard
            .profile(team_id)
            .unwrap()
            .roster
            .iter()
            .find(|p| p.name() == name)
            .unwrap()
            .injury
    };

    let fox = find(4, "De'Aaron Fox");
    assert_eq!(fox.severity, 1.0);
    assert_eq!(fox.label, InjuryLabel::Severe);

    let brunson = find(3, "Jalen Brunson");
    assert!((brunson.severity - 0.3).abs() < 1e-9);
    assert_eq!(brunson.label, InjuryLabel::Minor);

    let jjj = find(1, "Jaren Jackson Jr.");
    assert!((jjj.severity - 0.6).abs() < 1e-9);
    assert_eq!(jjj.label, InjuryLabel::Moderate);

    assert_eq!(find(1, "Mikal Bridges").label, InjuryLabel::None);
}

// ===========================================================================
// Aggregation
// ===========================================================================

#[test]
fn standings_follow_records() {
    let dashboard = dashboard();
    let order: Vec<u32> = dashboard.standings.iter().map(|r| r.team_id).collect();
    assert_eq!(order, vec![1, 2, 3, 4]);
    assert_eq!(dashboard.standings[0].record, "6-2-1");
    assert_eq!(dashboard.standings[1].record, "5-4");
}

#[test]
fn profiles_are_sorted_and_zscores_balance() {
    let dashboard = dashboard();
    assert_eq!(dashboard.profiles.len(), 4);
    for pair in dashboard.profiles.windows(2) {
        assert!(pair[0].total_score >= pair[1].total_score);
    }
    // League z-scores are centred per category
    for cat in Category::ALL {
        let sum: f64 = dashboard.profiles.iter().map(|p| p.raw_z.get(cat)).sum();
        assert!(sum.abs() < 1e-6, "{cat} z-scores sum to {sum}");
    }
}

#[test]
fn my_matchup_is_projected_and_live() {
    let dashboard = dashboard();
    assert_eq!(dashboard.my_team_id, Some(1));
    assert_eq!(dashboard.opponent_id, Some(2));
    assert_eq!(dashboard.matchups.len(), 2);

    let projection = dashboard.projection.as_ref().expect("opponent exists");
    assert_eq!(projection.categories.len(), Category::COUNT);
    assert_eq!(
        projection.home_wins + projection.away_wins + projection.ties,
        Category::COUNT
    );

    assert_eq!(dashboard.live.len(), Category::COUNT);
    assert!(dashboard.live.iter().all(|row| row.need >= 0.0));
}

#[test]
fn position_balance_covers_targets() {
    let dashboard = dashboard();
    let positions: Vec<&str> = dashboard
        .position_balance
        .rows
        .iter()
        .map(|r| r.position.display_str())
        .collect();
    for target in ["PG", "SG", "SF", "PF", "C"] {
        assert!(positions.contains(&target), "missing {target}");
    }
}

// ===========================================================================
// Trades
// ===========================================================================

#[test]
fn trades_respect_rosters_and_thresholds() {
    let config = default_config();
    for model in [TradeModel::Standard, TradeModel::Enhanced] {
        let mut config = config.clone();
        config.strategy.trade.model = model;
        let selection = TeamSelection {
            my_team: Some(1),
            partner: Some(3),
        };
        let dashboard = dashboard_with(&config, &config.strategy.weights, &selection);
        assert_eq!(dashboard.partner_id, Some(3));
        assert!(dashboard.trades.len() <= config.strategy.trade.max_suggestions);

        let mine = roster_names(&dashboard, 1);
        let theirs = roster_names(&dashboard, 3);
        for trade in &dashboard.trades {
            assert_eq!((trade.team_a_id, trade.team_b_id), (1, 3));
            assert!(trade.from_a.iter().all(|n| mine.contains(n)));
            assert!(trade.from_b.iter().all(|n| theirs.contains(n)));
            assert!(trade.from_a.len() <= config.strategy.trade.max_package_size);
            assert!(trade.fairness >= config.strategy.trade.min_fairness);
            assert!(!trade.reason.is_empty());
        }
        for pair in dashboard.trades.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}

#[test]
fn trades_skip_players_without_stats() {
    let config = default_config();
    let selection = TeamSelection {
        my_team: Some(1),
        partner: Some(2),
    };
    let dashboard = dashboard_with(&config, &config.strategy.weights, &selection);
    for trade in &dashboard.trades {
        assert!(!trade.from_b.iter().any(|n| n == "Mystery Rookie"));
    }
}

#[test]
fn analyses_are_deterministic() {
    let config = default_config();
    let selection = TeamSelection {
        my_team: Some(1),
        partner: Some(4),
    };
    let first = dashboard_with(&config, &config.strategy.weights, &selection);
    let second = dashboard_with(&config, &config.strategy.weights, &selection);
    assert_eq!(first, second);
}

// ===========================================================================
// Streaming
// ===========================================================================

#[test]
fn streaming_adds_come_from_the_pool() {
    let dashboard = dashboard();
    let plan = &dashboard.streaming;
    let mine = roster_names(&dashboard, 1);

    assert_eq!(plan.needs.get(Category::Tov), 0.0);
    for add in &plan.adds {
        assert!(add.score > 0.0);
        assert!(add.player.has_stats());
        assert_ne!(add.player.name(), "Unknown Prospect");
        assert!(!mine.contains(&add.player.name().to_string()));
    }
    for pair in plan.adds.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    if plan.adds.is_empty() {
        assert!(plan.drops.is_empty());
    }
    for drop in &plan.drops {
        assert!(mine.contains(&drop.player.name().to_string()));
    }
}

#[test]
fn zero_weights_change_the_power_ranking_scores() {
    let config = default_config();
    let mut punt_all_but_points = CategoryWeights::default();
    for cat in Category::ALL {
        if cat != Category::Pts {
            punt_all_but_points.set(cat, 0.0);
        }
    }
    let baseline = dashboard();
    let punted = dashboard_with(&config, &punt_all_but_points, &TeamSelection::default());
    for profile in &punted.profiles {
        for cat in Category::ALL.into_iter().filter(|c| *c != Category::Pts) {
            assert_eq!(profile.weighted_z.get(cat), 0.0);
        }
    }
    assert_ne!(
        baseline.profiles.iter().map(|p| p.total_score).collect::<Vec<_>>(),
        punted.profiles.iter().map(|p| p.total_score).collect::<Vec<_>>()
    );
}

// ===========================================================================
// Orchestrator
// ===========================================================================

fn app_state(config: Config) -> AppState {
    AppState::new(
        config,
        Database::open(":memory:").unwrap(),
        stats(),
        Box::new(SnapshotSource::new(fixture("league_snapshot.json"))),
        None,
    )
}

async fn next_snapshot(ui_rx: &mut mpsc::Receiver<UiUpdate>) -> hoopcast::protocol::AppSnapshot {
    loop {
        match ui_rx.recv().await.expect("orchestrator alive") {
            UiUpdate::Snapshot(snapshot) => return *snapshot,
            UiUpdate::Loading { .. } => continue,
            UiUpdate::Error(e) => panic!("unexpected error: {e}"),
        }
    }
}

#[tokio::test]
async fn event_loop_end_to_end() {
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (ui_tx, mut ui_rx) = mpsc::channel(16);
    let state = app_state(default_config());
    let startup = Some(SavedLeague {
        league_id: LEAGUE_ID,
        season: SEASON,
    });
    let handle = tokio::spawn(app::run(cmd_rx, ui_tx, state, startup));

    let first = next_snapshot(&mut ui_rx).await;
    assert_eq!(first.league_id, LEAGUE_ID);
    assert_eq!(first.dashboard.my_team_id, Some(1));
    assert_eq!(first.stats_players, 23);

    cmd_tx.send(UserCommand::SelectTeam(3)).await.unwrap();
    let as_three = next_snapshot(&mut ui_rx).await;
    assert_eq!(as_three.dashboard.my_team_id, Some(3));
    assert_eq!(as_three.dashboard.opponent_id, Some(4));

    cmd_tx
        .send(UserCommand::AdjustWeight {
            category: Category::Blk,
            delta: 5.0,
        })
        .await
        .unwrap();
    let weighted = next_snapshot(&mut ui_rx).await;
    assert_eq!(weighted.weights.get(Category::Blk), 2.0);

    cmd_tx
        .send(UserCommand::Connect {
            league_id: 99,
            season: SEASON,
        })
        .await
        .unwrap();
    assert_eq!(
        ui_rx.recv().await,
        Some(UiUpdate::Loading {
            league_id: 99,
            season: SEASON
        })
    );
    match ui_rx.recv().await {
        Some(UiUpdate::Error(message)) => assert!(message.contains("99")),
        other => panic!("expected error, got {other:?}"),
    }

    cmd_tx.send(UserCommand::Quit).await.unwrap();
    handle.await.unwrap().unwrap();
}
