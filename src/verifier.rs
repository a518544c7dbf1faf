use std::sync::Arc;
use tracing::info;

use crate::config::{Config, StorageBackend};
use crate::metrics::MetricsCounters;
use crate::pilot::cohort::Cohort;
use crate::pilot::metrics::PilotMetrics;
use crate::pilot::store::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
use crate::pilot::tracker::PilotTracker;
use crate::score::cache::ProfileCache;
use crate::score::engine::ScoreEngine;
use crate::score::profile::{DemoOnlyFetcher, GitHubFetcher, ProfileFetcher};
use crate::score::scorer::TrustScorer;

/// Everything the HTTP handlers need
pub struct TrustVerifier {
    pub config: Arc<Config>,
    pub scorer: TrustScorer,
    pub pilot: PilotTracker,
    pub metrics: Arc<MetricsCounters>,
}

impl TrustVerifier {
    pub async fn new(config: Arc<Config>) -> anyhow::Result<Self> {
        let fetcher: Arc<dyn ProfileFetcher> = if config.github.enabled {
            info!(
                "GitHub lookups enabled via {} ({})",
                config.github.api_base,
                if config.github.token.is_some() { "authenticated" } else { "anonymous" }
            );
            Arc::new(GitHubFetcher::new(&config.github)?)
        } else {
            info!("GitHub lookups disabled, scoring in demo mode only");
            Arc::new(DemoOnlyFetcher)
        };

        let store: Arc<dyn SnapshotStore> = match config.pilot.storage {
            StorageBackend::File => {
                let store = FileSnapshotStore::open(&config.pilot.data_dir)
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to open snapshot store '{}': {}", config.pilot.data_dir, e))?;
                info!("Pilot snapshots stored under {}", config.pilot.data_dir);
                Arc::new(store)
            }
            StorageBackend::Memory => {
                info!("Pilot snapshots kept in memory");
                Arc::new(MemorySnapshotStore::new())
            }
        };

        let cohort = Cohort::new(config.pilot.cohort.clone());
        info!("Pilot cohort: {} agents", cohort.len());

        Ok(Self::from_parts(config, fetcher, store, cohort))
    }

    pub fn from_parts(
        config: Arc<Config>,
        fetcher: Arc<dyn ProfileFetcher>,
        store: Arc<dyn SnapshotStore>,
        cohort: Cohort,
    ) -> Self {
        let metrics = Arc::new(MetricsCounters::new());
        let scorer = TrustScorer::new(
            ScoreEngine::new(&config.github.profile_base),
            fetcher,
            ProfileCache::new(&config.profile_cache),
            metrics.clone(),
        );
        let pilot = PilotTracker::new(
            cohort,
            store,
            PilotMetrics::new(&config.pilot),
            metrics.clone(),
        );

        Self {
            config,
            scorer,
            pilot,
            metrics,
        }
    }

    pub fn get_health(&self) -> serde_json::Value {
        serde_json::json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now(),
            "github_lookups": self.config.github.enabled,
            "profile_cache": self.scorer.cache.get_stats(),
            "pilot": {
                "cohort_size": self.pilot.cohort().len(),
                "storage": self.pilot.storage_backend(),
            },
        })
    }
}
