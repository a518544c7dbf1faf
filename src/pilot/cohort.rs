use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One agent enrolled in the pilot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortMember {
    pub agent_id: String,
    /// Score assigned at enrollment
    pub score_baseline: u32,
    pub category: String,
    /// Joined without being invited
    #[serde(default)]
    pub voluntary: bool,
}

/// The set of agents eligible for snapshot ingestion and pilot scoring.
/// Ids are case-sensitive and keep their configured order.
#[derive(Debug, Clone, Default)]
pub struct Cohort {
    members: Vec<CohortMember>,
    ids: HashSet<String>,
}

impl Cohort {
    /// Later duplicates of an agent id are ignored
    pub fn new(members: Vec<CohortMember>) -> Self {
        let mut cohort = Cohort::default();
        for member in members {
            if cohort.ids.insert(member.agent_id.clone()) {
                cohort.members.push(member);
            }
        }
        cohort
    }

    pub fn contains(&self, agent_id: &str) -> bool {
        self.ids.contains(agent_id)
    }

    pub fn members(&self) -> &[CohortMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(agent_id: &str, category: &str) -> CohortMember {
        CohortMember {
            agent_id: agent_id.to_string(),
            score_baseline: 7,
            category: category.to_string(),
            voluntary: false,
        }
    }

    #[test]
    fn test_membership_is_case_sensitive() {
        let cohort = Cohort::new(vec![member("DiffDelta", "identity")]);
        assert!(cohort.contains("DiffDelta"));
        assert!(!cohort.contains("diffdelta"));
        assert_eq!(cohort.members()[0].category, "identity");
    }

    #[test]
    fn test_keeps_order_and_drops_duplicates() {
        let cohort = Cohort::new(vec![
            member("b", "first"),
            member("a", "second"),
            member("b", "duplicate"),
        ]);
        let ids: Vec<&str> = cohort.members().iter().map(|m| m.agent_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(cohort.members()[0].category, "first");
        assert_eq!(cohort.len(), 2);
    }
}
