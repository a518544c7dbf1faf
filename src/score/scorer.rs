use std::sync::Arc;
use chrono::Utc;
use tracing::{debug, info};

use crate::metrics::MetricsCounters;
use crate::score::cache::ProfileCache;
use crate::score::engine::{Evidence, ScoreEngine, ScoreResult};
use crate::score::profile::{ProfileFetcher, ProfileLookup};

/// Resolves profiles (through the cache) and runs the score engine
pub struct TrustScorer {
    engine: ScoreEngine,
    fetcher: Arc<dyn ProfileFetcher>,
    pub cache: ProfileCache,
    metrics: Arc<MetricsCounters>,
}

impl TrustScorer {
    pub fn new(
        engine: ScoreEngine,
        fetcher: Arc<dyn ProfileFetcher>,
        cache: ProfileCache,
        metrics: Arc<MetricsCounters>,
    ) -> Self {
        Self {
            engine,
            fetcher,
            cache,
            metrics,
        }
    }

    /// Cached profile lookup
    pub async fn lookup(&self, login: &str) -> ProfileLookup {
        if let Some(cached) = self.cache.get(login) {
            debug!("Profile cache hit: {}", login);
            return cached;
        }

        let lookup = self.fetcher.fetch(login).await;
        self.metrics.record_profile_lookup(lookup.is_found());
        self.cache.insert(login, &lookup);
        lookup
    }

    /// Score an identifier. Never fails: unresolvable identifiers get a demo score.
    pub async fn score(&self, identifier: &str, evidence: &Evidence) -> ScoreResult {
        let profile = self.lookup(identifier).await;
        let secondary = match evidence.github() {
            Some(handle) => Some(self.lookup(handle).await),
            None => None,
        };

        let result = self
            .engine
            .score(identifier, evidence, &profile, secondary.as_ref(), Utc::now());

        self.metrics.record_score(&result);
        info!(
            agent_id = %result.agent_id,
            mode = result.verification.as_str(),
            grade = result.grade.as_str(),
            "Trust score {:.1}",
            result.score
        );
        result
    }
}
