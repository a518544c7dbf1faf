use chrono::NaiveDate;
use thiserror::Error;

/// Snapshot storage failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot (de)serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    /// Snapshots are append-only; a (agent, date) pair is written once
    #[error("Snapshot for {agent_id} on {date} already exists")]
    AlreadyExists { agent_id: String, date: NaiveDate },
}

/// Pilot operation failures
#[derive(Error, Debug)]
pub enum PilotError {
    #[error("Agent {0} not in pilot cohort")]
    NotInCohort(String),

    #[error("No snapshot data for agent {0}")]
    NoData(String),

    #[error("No snapshot found for {agent_id} on {date}")]
    SnapshotNotFound { agent_id: String, date: NaiveDate },

    #[error(transparent)]
    Store(#[from] StoreError),
}
