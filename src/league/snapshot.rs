// Offline league source: replays a `LeagueData` JSON snapshot from disk.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use super::{LeagueData, LeagueError, LeagueRequest, LeagueSource};

pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotSource { path: path.into() }
    }

    fn snapshot_error(&self, message: impl ToString) -> LeagueError {
        LeagueError::Snapshot {
            path: self.path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Read and decode the snapshot file.
    pub fn load(&self) -> Result<LeagueData, LeagueError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| self.snapshot_error(e))?;
        serde_json::from_str(&text).map_err(|e| self.snapshot_error(e))
    }
}

#[async_trait]
impl LeagueSource for SnapshotSource {
    /// The snapshot holds exactly one league-season; asking for any other
    /// one is reported the same way ESPN reports an unknown league.
    async fn fetch_league(&self, req: &LeagueRequest) -> Result<LeagueData, LeagueError> {
        let data = self.load()?;
        if data.league_id != req.league_id || data.season != req.season || data.teams.is_empty() {
            return Err(LeagueError::NotFound {
                league_id: req.league_id,
                season: req.season,
            });
        }
        info!(
            "Loaded league {} from snapshot {}",
            data.league_id,
            self.path.display()
        );
        Ok(data)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
