// Hoopcast entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config, writing default files on first run
// 3. Open database, restore saved weights and last league
// 4. Load the NBA stats index (cache, CSV or stats API)
// 5. Pick the league source (JSON snapshot or ESPN)
// 6. Spawn the app logic task
// 7. Run the TUI until the user quits
// 8. Cleanup on exit

use hoopcast::app;
use hoopcast::config;
use hoopcast::db;
use hoopcast::league::espn::EspnClient;
use hoopcast::league::snapshot::SnapshotSource;
use hoopcast::league::LeagueSource;
use hoopcast::stats::loader::{load_stats_index, NbaStatsClient};
use hoopcast::tui;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Tracing
    init_tracing()?;
    info!("Hoopcast starting up");

    // 2. Config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={:?}, season {}, stats {}",
        config.league.league_id, config.league.season, config.stats.season
    );

    // 3. Database
    let db = db::Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);

    // 4. Stats
    let stats_client = NbaStatsClient::new().context("failed to build NBA stats client")?;
    let stats = load_stats_index(&config.stats, &db, &stats_client, chrono::Utc::now()).await;
    info!("Stats index ready: {} players ({})", stats.len(), stats.season());

    // 5. League source
    let source: Box<dyn LeagueSource> = match &config.league.snapshot_path {
        Some(path) => {
            info!("Using league snapshot at {path}");
            Box::new(SnapshotSource::new(path))
        }
        None => Box::new(EspnClient::new().context("failed to build ESPN client")?),
    };

    let mut app_state = app::AppState::new(config, db, stats, source, Some(stats_client));
    let saved = match app_state.restore_from_db() {
        Ok(saved) => saved,
        Err(e) => {
            error!("Session restore failed: {e:#}");
            return Err(e.context("session restore failed"));
        }
    };
    let startup = app_state.initial_league(saved);

    // 6. App task
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(64);
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, ui_tx, app_state, startup).await {
            error!("Application loop error: {e:#}");
        }
    });

    // 7. TUI, blocks until 'q' or Ctrl+C
    info!("Application ready");
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {e:#}");
    }

    // 8. Give the app task a moment to drain
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), app_handle).await;

    info!("Hoopcast shut down cleanly");
    Ok(())
}

/// Log to a file; the terminal belongs to the TUI.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("hoopcast.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hoopcast=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
