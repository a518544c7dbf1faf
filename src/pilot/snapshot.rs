use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

type Metadata = serde_json::Map<String, serde_json::Value>;

/// `null` and a missing field both read as an empty map
fn null_as_empty<'de, D>(deserializer: D) -> Result<Metadata, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Metadata>::deserialize(deserializer)?.unwrap_or_default())
}

/// One agent's daily activity record. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Agent identifier (GitHub username)
    pub agent_id: String,
    /// Snapshot date, `YYYY-MM-DD`
    pub date: NaiveDate,
    #[serde(default)]
    pub commits: u64,
    #[serde(default)]
    pub releases: u64,
    #[serde(default)]
    pub issues_closed: u64,
    #[serde(default)]
    pub prs_merged: u64,
    #[serde(default)]
    pub stars_gained: u64,
    /// Active contributors
    #[serde(default)]
    pub contributors: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub metadata: Metadata,
}

impl Snapshot {
    #[cfg(test)]
    pub fn new(agent_id: &str, date: NaiveDate) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            date,
            commits: 0,
            releases: 0,
            issues_closed: 0,
            prs_merged: 0,
            stars_gained: 0,
            contributors: 0,
            metadata: Metadata::new(),
        }
    }

    /// Storage key, `agent_id/date`
    pub fn key(&self) -> String {
        format!("{}/{}", self.agent_id, self.date)
    }
}
