//! Snapshot storage.
//!
//! `FileSnapshotStore` keeps one pretty-printed JSON file per snapshot under
//! `<data_dir>/snapshots/<agent_id>/<date>.json`, and the latest PilotScore of
//! each agent at `<data_dir>/scores/<agent_id>.json`. `MemorySnapshotStore`
//! holds the same data in process for tests and the `memory` backend.

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use tracing::debug;

use crate::pilot::error::StoreError;
use crate::pilot::metrics::PilotScore;
use crate::pilot::snapshot::Snapshot;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Append-only snapshot store keyed by (agent_id, date), plus the last
/// computed PilotScore per agent
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn get(&self, agent_id: &str, date: NaiveDate) -> StoreResult<Option<Snapshot>>;

    /// Write a new snapshot. `AlreadyExists` if the (agent, date) key is taken.
    async fn put(&self, snapshot: &Snapshot) -> StoreResult<()>;

    /// All snapshots of an agent, ascending by date. Empty if none.
    async fn list(&self, agent_id: &str) -> StoreResult<Vec<Snapshot>>;

    /// Replace the agent's cached score
    async fn put_score(&self, score: &PilotScore) -> StoreResult<()>;

    async fn latest_score(&self, agent_id: &str) -> StoreResult<Option<PilotScore>>;

    /// Backend name for health output
    fn backend(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// MemorySnapshotStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    agents: RwLock<HashMap<String, BTreeMap<NaiveDate, Snapshot>>>,
    scores: RwLock<HashMap<String, PilotScore>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn get(&self, agent_id: &str, date: NaiveDate) -> StoreResult<Option<Snapshot>> {
        let agents = self.agents.read();
        Ok(agents.get(agent_id).and_then(|days| days.get(&date)).cloned())
    }

    async fn put(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let mut agents = self.agents.write();
        let days = agents.entry(snapshot.agent_id.clone()).or_default();
        if days.contains_key(&snapshot.date) {
            return Err(StoreError::AlreadyExists {
                agent_id: snapshot.agent_id.clone(),
                date: snapshot.date,
            });
        }
        days.insert(snapshot.date, snapshot.clone());
        Ok(())
    }

    async fn list(&self, agent_id: &str) -> StoreResult<Vec<Snapshot>> {
        let agents = self.agents.read();
        Ok(agents
            .get(agent_id)
            .map(|days| days.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn put_score(&self, score: &PilotScore) -> StoreResult<()> {
        self.scores.write().insert(score.agent_id.clone(), score.clone());
        Ok(())
    }

    async fn latest_score(&self, agent_id: &str) -> StoreResult<Option<PilotScore>> {
        Ok(self.scores.read().get(agent_id).cloned())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

// ---------------------------------------------------------------------------
// FileSnapshotStore
// ---------------------------------------------------------------------------

pub struct FileSnapshotStore {
    snapshots_dir: PathBuf,
    scores_dir: PathBuf,
}

impl FileSnapshotStore {
    /// Creates `<data_dir>/snapshots` and `<data_dir>/scores` if needed
    pub async fn open(data_dir: impl AsRef<Path>) -> StoreResult<Self> {
        let snapshots_dir = data_dir.as_ref().join("snapshots");
        let scores_dir = data_dir.as_ref().join("scores");
        tokio::fs::create_dir_all(&snapshots_dir).await?;
        tokio::fs::create_dir_all(&scores_dir).await?;
        Ok(Self {
            snapshots_dir,
            scores_dir,
        })
    }

    fn score_path(&self, agent_id: &str) -> PathBuf {
        self.scores_dir.join(format!("{}.json", agent_id))
    }

    fn agent_dir(&self, agent_id: &str) -> PathBuf {
        self.snapshots_dir.join(agent_id)
    }

    fn snapshot_path(&self, agent_id: &str, date: NaiveDate) -> PathBuf {
        self.agent_dir(agent_id).join(format!("{}.json", date))
    }

    async fn read_snapshot(path: &Path) -> StoreResult<Snapshot> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn get(&self, agent_id: &str, date: NaiveDate) -> StoreResult<Option<Snapshot>> {
        match Self::read_snapshot(&self.snapshot_path(agent_id, date)).await {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(StoreError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn put(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let agent_dir = self.agent_dir(&snapshot.agent_id);
        tokio::fs::create_dir_all(&agent_dir).await?;

        let path = self.snapshot_path(&snapshot.agent_id, snapshot.date);
        let body = serde_json::to_string_pretty(snapshot)?;

        // create_new makes the existence check and the write one step
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists {
                    agent_id: snapshot.agent_id.clone(),
                    date: snapshot.date,
                });
            }
            Err(e) => return Err(e.into()),
        };

        use tokio::io::AsyncWriteExt;
        file.write_all(body.as_bytes()).await?;
        file.flush().await?;
        debug!("Wrote snapshot {}", path.display());
        Ok(())
    }

    async fn list(&self, agent_id: &str) -> StoreResult<Vec<Snapshot>> {
        let mut entries = match tokio::fs::read_dir(self.agent_dir(agent_id)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        // Keyed by the date in the file name so ordering never depends on directory order
        let mut by_date = BTreeMap::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(date) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<NaiveDate>().ok())
            else {
                debug!("Skipping unrecognized file {}", path.display());
                continue;
            };
            by_date.insert(date, Self::read_snapshot(&path).await?);
        }

        Ok(by_date.into_values().collect())
    }

    async fn put_score(&self, score: &PilotScore) -> StoreResult<()> {
        let path = self.score_path(&score.agent_id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_string_pretty(score)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!("Wrote score {}", path.display());
        Ok(())
    }

    async fn latest_score(&self, agent_id: &str) -> StoreResult<Option<PilotScore>> {
        match tokio::fs::read_to_string(self.score_path(agent_id)).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}
