use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::metrics::MetricsCounters;
use crate::pilot::cohort::Cohort;
use crate::pilot::error::PilotError;
use crate::pilot::metrics::{PilotMetrics, PilotScore};
use crate::pilot::snapshot::Snapshot;
use crate::pilot::store::SnapshotStore;

#[derive(Debug, Clone, Serialize)]
pub struct IngestReceipt {
    pub status: &'static str,
    pub agent_id: String,
    pub date: NaiveDate,
    pub key: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    pub agent_id: String,
    pub category: String,
    pub voluntary: bool,
    pub snapshot_count: usize,
    pub latest_snapshot: Option<NaiveDate>,
    /// Overall score from the last computation, if any
    pub current_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CohortStatus {
    pub total_agents: usize,
    pub active_agents: usize,
    /// Latest snapshot date of each active agent, deduplicated
    pub snapshot_dates: Vec<NaiveDate>,
    pub agents: Vec<AgentStatus>,
    pub last_updated: DateTime<Utc>,
}

/// Pilot cohort tracker: validates membership, ingests snapshots and
/// derives PilotScores from stored history.
///
/// Scores are recomputed from snapshots on every request. The last result per
/// agent is written back to the store for the cohort overview.
pub struct PilotTracker {
    cohort: Cohort,
    store: Arc<dyn SnapshotStore>,
    evaluator: PilotMetrics,
    counters: Arc<MetricsCounters>,
}

impl PilotTracker {
    pub fn new(
        cohort: Cohort,
        store: Arc<dyn SnapshotStore>,
        evaluator: PilotMetrics,
        counters: Arc<MetricsCounters>,
    ) -> Self {
        Self {
            cohort,
            store,
            evaluator,
            counters,
        }
    }

    pub fn cohort(&self) -> &Cohort {
        &self.cohort
    }

    pub fn storage_backend(&self) -> &'static str {
        self.store.backend()
    }

    fn require_member(&self, agent_id: &str) -> Result<(), PilotError> {
        if self.cohort.contains(agent_id) {
            Ok(())
        } else {
            Err(PilotError::NotInCohort(agent_id.to_string()))
        }
    }

    /// Store one daily snapshot for a cohort member
    pub async fn ingest(&self, snapshot: &Snapshot) -> Result<IngestReceipt, PilotError> {
        let stored = match self.require_member(&snapshot.agent_id) {
            Ok(()) => self.store.put(snapshot).await.map_err(PilotError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = stored {
            warn!(agent_id = %snapshot.agent_id, date = %snapshot.date, "Snapshot rejected: {}", e);
            self.counters.record_ingest(false);
            return Err(e);
        }

        self.counters.record_ingest(true);
        info!(agent_id = %snapshot.agent_id, date = %snapshot.date, "Snapshot ingested");

        Ok(IngestReceipt {
            status: "ingested",
            agent_id: snapshot.agent_id.clone(),
            date: snapshot.date,
            key: snapshot.key(),
            timestamp: Utc::now(),
        })
    }

    /// Compute a fresh PilotScore from the agent's full snapshot history
    pub async fn score(&self, agent_id: &str) -> Result<PilotScore, PilotError> {
        self.require_member(agent_id)?;

        let snapshots = self.store.list(agent_id).await?;
        if snapshots.is_empty() {
            return Err(PilotError::NoData(agent_id.to_string()));
        }

        let score = self.evaluator.evaluate(agent_id, &snapshots, Utc::now())?;
        self.counters.record_pilot_score();
        info!(
            agent_id,
            snapshots = snapshots.len(),
            "PDR {:.3}, quality {:.1}, overall {:.1}",
            score.pdr,
            score.quality_score,
            score.overall_score
        );

        self.store.put_score(&score).await?;
        Ok(score)
    }

    /// Raw snapshot, for transparency
    pub async fn snapshot(&self, agent_id: &str, date: NaiveDate) -> Result<Snapshot, PilotError> {
        self.require_member(agent_id)?;
        self.store
            .get(agent_id, date)
            .await?
            .ok_or_else(|| PilotError::SnapshotNotFound {
                agent_id: agent_id.to_string(),
                date,
            })
    }

    pub async fn cohort_status(&self) -> Result<CohortStatus, PilotError> {
        let mut agents = Vec::with_capacity(self.cohort.len());
        let mut snapshot_dates = BTreeSet::new();

        for member in self.cohort.members() {
            let snapshots = self.store.list(&member.agent_id).await?;
            let latest_snapshot = snapshots.last().map(|s| s.date);
            let current_score = self
                .store
                .latest_score(&member.agent_id)
                .await?
                .map(|s| s.overall_score);
            if let Some(date) = latest_snapshot {
                snapshot_dates.insert(date);
            }

            agents.push(AgentStatus {
                agent_id: member.agent_id.clone(),
                category: member.category.clone(),
                voluntary: member.voluntary,
                snapshot_count: snapshots.len(),
                latest_snapshot,
                current_score,
            });
        }

        Ok(CohortStatus {
            total_agents: self.cohort.len(),
            active_agents: agents.iter().filter(|a| a.snapshot_count > 0).count(),
            snapshot_dates: snapshot_dates.into_iter().collect(),
            agents,
            last_updated: Utc::now(),
        })
    }
}
