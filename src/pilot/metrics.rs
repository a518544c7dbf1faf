//! Promise Delivery Ratio and quality scoring over daily snapshots.
//!
//! ```text
//! velocity = (Σ commits + 5 × Σ releases) / days
//! PDR      = min(current_velocity / baseline_velocity, 2.0)
//! quality  = min(2 × (stars + 5 × contributors + 2 × issues_closed), 100)
//! overall  = 70 × PDR + 0.3 × quality
//! ```
//!
//! The baseline window is the first 7 snapshots and the recent window the last
//! 7. With fewer than 14 snapshots the two windows overlap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PilotConfig;
use crate::pilot::error::PilotError;
use crate::pilot::snapshot::Snapshot;

pub const WINDOW_DAYS: usize = 7;
pub const PDR_CAP: f64 = 2.0;
pub const RELEASE_WEIGHT: f64 = 5.0;
/// Quality score reported when there is no snapshot to read
pub const NEUTRAL_QUALITY: f64 = 50.0;

const FORMULA: &str = "PDR = current_velocity / baseline_velocity (capped at 2.0)";

/// Raw inputs and intermediate values of one PDR derivation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdrComputation {
    pub baseline_commits: u64,
    pub baseline_releases: u64,
    pub baseline_days: usize,
    pub baseline_velocity: f64,
    pub current_commits: u64,
    pub current_releases: u64,
    pub current_days: usize,
    pub current_velocity: f64,
    pub pdr: f64,
}

/// Audit record describing exactly how a PDR was derived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdrProvenance {
    pub method: String,
    pub source: String,
    pub computation: PdrComputation,
    pub formula: String,
    pub timestamp: DateTime<Utc>,
    pub verifier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PilotScore {
    pub agent_id: String,
    pub pdr: f64,
    pub quality_score: f64,
    /// Not normalized: ranges roughly over [0, 170]
    pub overall_score: f64,
    pub provenance_chain: PdrProvenance,
    pub last_updated: DateTime<Utc>,
}

/// Activity totals of one window. Sums saturate at `u64::MAX`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Window {
    commits: u64,
    releases: u64,
    days: usize,
}

impl Window {
    fn over(snapshots: &[Snapshot]) -> Self {
        Self {
            commits: snapshots.iter().fold(0, |acc: u64, s| acc.saturating_add(s.commits)),
            releases: snapshots.iter().fold(0, |acc: u64, s| acc.saturating_add(s.releases)),
            days: snapshots.len(),
        }
    }

    fn velocity(&self) -> f64 {
        if self.days == 0 {
            return 0.0;
        }
        (self.commits as f64 + RELEASE_WEIGHT * self.releases as f64) / self.days as f64
    }
}

fn baseline_window(snapshots: &[Snapshot]) -> &[Snapshot] {
    &snapshots[..snapshots.len().min(WINDOW_DAYS)]
}

fn recent_window(snapshots: &[Snapshot]) -> &[Snapshot] {
    &snapshots[snapshots.len().saturating_sub(WINDOW_DAYS)..]
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// PDR from the two velocities. A zero baseline yields 1.0 when there is
/// current activity, 0.5 when there is none.
pub fn pdr_from_velocities(baseline_velocity: f64, current_velocity: f64) -> f64 {
    if baseline_velocity == 0.0 {
        if current_velocity > 0.0 { 1.0 } else { 0.5 }
    } else {
        (current_velocity / baseline_velocity).min(PDR_CAP)
    }
}

/// Quality from the latest snapshot only
pub fn quality_score(snapshots: &[Snapshot]) -> f64 {
    let Some(latest) = snapshots.last() else {
        return NEUTRAL_QUALITY;
    };
    let raw = latest.stars_gained as f64
        + 5.0 * latest.contributors as f64
        + 2.0 * latest.issues_closed as f64;
    (2.0 * raw).min(100.0)
}

pub fn overall_score(pdr: f64, quality_score: f64) -> f64 {
    70.0 * pdr + 0.3 * quality_score
}

/// Pure PDR / quality evaluation, labelled with the configured provenance tags
#[derive(Debug, Clone)]
pub struct PilotMetrics {
    method: String,
    source: String,
    verifier: String,
}

impl PilotMetrics {
    pub fn new(config: &PilotConfig) -> Self {
        Self {
            method: config.method.clone(),
            source: config.source.clone(),
            verifier: config.verifier.clone(),
        }
    }

    /// `snapshots` must be in ascending date order
    pub fn compute_pdr(
        &self,
        agent_id: &str,
        snapshots: &[Snapshot],
        now: DateTime<Utc>,
    ) -> Result<(f64, PdrProvenance), PilotError> {
        if snapshots.is_empty() {
            return Err(PilotError::NoData(agent_id.to_string()));
        }

        let baseline = Window::over(baseline_window(snapshots));
        let current = Window::over(recent_window(snapshots));
        let baseline_velocity = baseline.velocity();
        let current_velocity = current.velocity();
        let pdr = pdr_from_velocities(baseline_velocity, current_velocity);

        let provenance = PdrProvenance {
            method: self.method.clone(),
            source: self.source.clone(),
            computation: PdrComputation {
                baseline_commits: baseline.commits,
                baseline_releases: baseline.releases,
                baseline_days: baseline.days,
                baseline_velocity: round_to(baseline_velocity, 2),
                current_commits: current.commits,
                current_releases: current.releases,
                current_days: current.days,
                current_velocity: round_to(current_velocity, 2),
                pdr: round_to(pdr, 3),
            },
            formula: FORMULA.to_string(),
            timestamp: now,
            verifier: self.verifier.clone(),
        };

        Ok((pdr, provenance))
    }

    pub fn evaluate(
        &self,
        agent_id: &str,
        snapshots: &[Snapshot],
        now: DateTime<Utc>,
    ) -> Result<PilotScore, PilotError> {
        let (pdr, provenance) = self.compute_pdr(agent_id, snapshots, now)?;
        let quality = quality_score(snapshots);

        Ok(PilotScore {
            agent_id: agent_id.to_string(),
            pdr,
            quality_score: quality,
            overall_score: overall_score(pdr, quality),
            provenance_chain: provenance,
            last_updated: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn metrics() -> PilotMetrics {
        PilotMetrics::new(&PilotConfig::default())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 28, 9, 30, 0).unwrap()
    }

    /// One snapshot per day starting 2026-02-01
    fn series(commits: &[u64], releases: &[u64]) -> Vec<Snapshot> {
        let start = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        commits
            .iter()
            .zip(releases)
            .enumerate()
            .map(|(i, (&c, &r))| {
                let mut s = Snapshot::new("getclawe", start + Duration::days(i as i64));
                s.commits = c;
                s.releases = r;
                s
            })
            .collect()
    }

    #[test]
    fn test_three_snapshots_share_both_windows() {
        let snapshots = series(&[2, 3, 5], &[0, 0, 1]);
        let (pdr, provenance) = metrics().compute_pdr("getclawe", &snapshots, now()).unwrap();

        let c = &provenance.computation;
        assert_eq!(c.baseline_commits, 10);
        assert_eq!(c.baseline_releases, 1);
        assert_eq!(c.baseline_days, 3);
        assert_eq!(c.baseline_velocity, 5.0);
        assert_eq!(c.current_days, 3);
        assert_eq!(c.current_velocity, 5.0);
        assert_eq!(pdr, 1.0);
    }

    #[test]
    fn test_zero_baseline_with_activity_is_one() {
        let mut commits = vec![0; 7];
        commits.extend(vec![3; 7]);
        let snapshots = series(&commits, &[0; 14]);

        let (pdr, provenance) = metrics().compute_pdr("getclawe", &snapshots, now()).unwrap();
        assert_eq!(provenance.computation.baseline_velocity, 0.0);
        assert_eq!(provenance.computation.current_velocity, 3.0);
        assert_eq!(pdr, 1.0);
    }

    #[test]
    fn test_no_activity_at_all_is_half() {
        let snapshots = series(&[0; 5], &[0; 5]);
        let (pdr, _) = metrics().compute_pdr("getclawe", &snapshots, now()).unwrap();
        assert_eq!(pdr, 0.5);
    }

    #[test]
    fn test_pdr_is_capped_at_two() {
        let mut commits = vec![1; 7];
        commits.extend(vec![10; 7]);
        let snapshots = series(&commits, &[0; 14]);
        let (pdr, _) = metrics().compute_pdr("getclawe", &snapshots, now()).unwrap();
        assert_eq!(pdr, PDR_CAP);
    }

    #[test]
    fn test_pdr_can_reach_zero() {
        let mut commits = vec![10; 7];
        commits.extend(vec![0; 7]);
        let snapshots = series(&commits, &[0; 14]);
        let (pdr, _) = metrics().compute_pdr("getclawe", &snapshots, now()).unwrap();
        assert_eq!(pdr, 0.0);
    }

    #[test]
    fn test_overlapping_windows() {
        let commits: Vec<u64> = (1..=10).collect();
        let snapshots = series(&commits, &[0; 10]);
        let (pdr, provenance) = metrics().compute_pdr("getclawe", &snapshots, now()).unwrap();

        // baseline 1..=7, recent 4..=10
        assert_eq!(provenance.computation.baseline_commits, 28);
        assert_eq!(provenance.computation.current_commits, 49);
        assert_eq!(provenance.computation.baseline_velocity, 4.0);
        assert_eq!(provenance.computation.current_velocity, 7.0);
        assert_eq!(pdr, 1.75);
    }

    #[test]
    fn test_releases_weigh_five_commits() {
        let window = Window::over(&series(&[1, 1], &[1, 0]));
        assert_eq!(window.velocity(), 3.5);
    }

    #[test]
    fn test_provenance_rounding_and_fields() {
        let snapshots = series(&[1, 1, 0], &[0, 0, 0]);
        let (pdr, provenance) = metrics().compute_pdr("getclawe", &snapshots, now()).unwrap();
        assert_eq!(pdr, 1.0);
        assert_eq!(provenance.computation.baseline_velocity, 0.67);

        let json = serde_json::to_value(&provenance).unwrap();
        for key in ["method", "source", "computation", "formula", "timestamp", "verifier"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        for key in [
            "baseline_commits", "baseline_releases", "baseline_days", "baseline_velocity",
            "current_commits", "current_releases", "current_days", "current_velocity", "pdr",
        ] {
            assert!(json["computation"].get(key).is_some(), "missing computation.{}", key);
        }
        assert_eq!(json["method"], "velocity_based_pdr_v1");
        assert_eq!(json["formula"], FORMULA);
        assert_eq!(json["timestamp"], "2026-02-28T09:30:00Z");
    }

    #[test]
    fn test_huge_counts_do_not_overflow() {
        let snapshots = series(&[1], &[u64::MAX / 4]);
        let (pdr, provenance) = metrics().compute_pdr("getclawe", &snapshots, now()).unwrap();
        assert_eq!(pdr, 1.0);
        assert!(provenance.computation.baseline_velocity > 0.0);

        let snapshots = series(&[u64::MAX, 1, u64::MAX], &[u64::MAX, u64::MAX, 0]);
        let (pdr, provenance) = metrics().compute_pdr("getclawe", &snapshots, now()).unwrap();
        assert!((0.0..=PDR_CAP).contains(&pdr));
        assert_eq!(provenance.computation.baseline_commits, u64::MAX);
        assert_eq!(provenance.computation.baseline_releases, u64::MAX);
        assert!(provenance.computation.current_velocity.is_finite());

        let mut commits = vec![u64::MAX; 7];
        commits.extend(vec![0; 7]);
        let (pdr, _) = metrics().compute_pdr("getclawe", &series(&commits, &[0; 14]), now()).unwrap();
        assert_eq!(pdr, 0.0);
    }

    #[test]
    fn test_empty_series_is_no_data() {
        let err = metrics().compute_pdr("getclawe", &[], now()).unwrap_err();
        assert!(matches!(err, PilotError::NoData(ref a) if a == "getclawe"));
    }

    #[test]
    fn test_quality_uses_latest_snapshot() {
        let mut snapshots = series(&[1, 1], &[0, 0]);
        snapshots[0].stars_gained = 500;
        snapshots[1].stars_gained = 10;
        snapshots[1].contributors = 3;
        snapshots[1].issues_closed = 3;
        // 10 + 15 + 6 = 31, doubled
        assert_eq!(quality_score(&snapshots), 62.0);
    }

    #[test]
    fn test_quality_caps_and_neutral_default() {
        let mut snapshots = series(&[0], &[0]);
        snapshots[0].stars_gained = 1_000;
        assert_eq!(quality_score(&snapshots), 100.0);
        assert_eq!(quality_score(&[]), NEUTRAL_QUALITY);
    }

    #[test]
    fn test_evaluate_keeps_unnormalized_overall() {
        let mut commits = vec![1; 7];
        commits.extend(vec![10; 7]);
        let mut snapshots = series(&commits, &[0; 14]);
        snapshots[13].stars_gained = 100;

        let score = metrics().evaluate("getclawe", &snapshots, now()).unwrap();
        assert_eq!(score.pdr, 2.0);
        assert_eq!(score.quality_score, 100.0);
        assert!((score.overall_score - 170.0).abs() < 1e-9);
        assert_eq!(score.last_updated, now());
    }

    #[test]
    fn test_overall_formula() {
        assert!((overall_score(1.0, 62.0) - 88.6).abs() < 1e-9);
        assert_eq!(overall_score(0.0, 0.0), 0.0);
    }
}
