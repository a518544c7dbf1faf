//! Prometheus-compatible metrics exporter for trust-verifier
//!
//! Endpoint: GET /metrics (on the web port, default 8000)

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::score::engine::{ScoreResult, VerificationMode};
use crate::score::factors::Grade;
use crate::verifier::TrustVerifier;

/// Counters updated from request processing
pub struct MetricsCounters {
    /// Trust scores computed
    pub score_requests: AtomicU64,
    /// Results by verification mode
    pub github_verified: AtomicU64,
    pub demo_unverified: AtomicU64,
    /// Results by grade
    pub grade_a_plus: AtomicU64,
    pub grade_a: AtomicU64,
    pub grade_b: AtomicU64,
    pub grade_c: AtomicU64,
    pub grade_d: AtomicU64,
    pub grade_f: AtomicU64,
    /// Profile lookups that reached the fetcher (cache misses)
    pub profile_found: AtomicU64,
    pub profile_not_found: AtomicU64,
    /// Badges rendered
    pub badges_rendered: AtomicU64,
    /// Pilot ingestion
    pub snapshots_ingested: AtomicU64,
    pub ingests_rejected: AtomicU64,
    /// Pilot scores computed
    pub pilot_scores: AtomicU64,
    /// Server start time
    pub start_time: Instant,
}

impl Default for MetricsCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCounters {
    pub fn new() -> Self {
        Self {
            score_requests: AtomicU64::new(0),
            github_verified: AtomicU64::new(0),
            demo_unverified: AtomicU64::new(0),
            grade_a_plus: AtomicU64::new(0),
            grade_a: AtomicU64::new(0),
            grade_b: AtomicU64::new(0),
            grade_c: AtomicU64::new(0),
            grade_d: AtomicU64::new(0),
            grade_f: AtomicU64::new(0),
            profile_found: AtomicU64::new(0),
            profile_not_found: AtomicU64::new(0),
            badges_rendered: AtomicU64::new(0),
            snapshots_ingested: AtomicU64::new(0),
            ingests_rejected: AtomicU64::new(0),
            pilot_scores: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    #[inline]
    fn grade_counter(&self, grade: Grade) -> &AtomicU64 {
        match grade {
            Grade::APlus => &self.grade_a_plus,
            Grade::A => &self.grade_a,
            Grade::B => &self.grade_b,
            Grade::C => &self.grade_c,
            Grade::D => &self.grade_d,
            Grade::F => &self.grade_f,
        }
    }

    pub fn record_score(&self, result: &ScoreResult) {
        self.score_requests.fetch_add(1, Ordering::Relaxed);
        match result.verification {
            VerificationMode::GithubVerified => self.github_verified.fetch_add(1, Ordering::Relaxed),
            VerificationMode::DemoUnverified => self.demo_unverified.fetch_add(1, Ordering::Relaxed),
        };
        self.grade_counter(result.grade).fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_profile_lookup(&self, found: bool) {
        if found {
            self.profile_found.fetch_add(1, Ordering::Relaxed);
        } else {
            self.profile_not_found.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_badge(&self) {
        self.badges_rendered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ingest(&self, accepted: bool) {
        if accepted {
            self.snapshots_ingested.fetch_add(1, Ordering::Relaxed);
        } else {
            self.ingests_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_pilot_score(&self) {
        self.pilot_scores.fetch_add(1, Ordering::Relaxed);
    }

    pub fn score_requests(&self) -> u64 {
        self.score_requests.load(Ordering::Relaxed)
    }

    pub fn snapshots_ingested(&self) -> u64 {
        self.snapshots_ingested.load(Ordering::Relaxed)
    }

    pub fn ingests_rejected(&self) -> u64 {
        self.ingests_rejected.load(Ordering::Relaxed)
    }
}

/// Generate Prometheus-format metrics text
pub fn render_metrics(verifier: &TrustVerifier) -> String {
    let mut out = String::with_capacity(4096);
    let c = &verifier.metrics;

    // ──────────────────────────────────────────────
    // Process
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "trust_verifier_up", "Whether the service is up.", "gauge");
    writeln!(out, "trust_verifier_up 1").ok();

    let uptime = c.start_time.elapsed().as_secs_f64();
    write_help_type(&mut out, "trust_verifier_uptime_seconds_total", "Uptime since start in seconds.", "counter");
    writeln!(out, "trust_verifier_uptime_seconds_total {:.3}", uptime).ok();

    // ──────────────────────────────────────────────
    // Trust scores
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "trust_verifier_scores_total", "Total number of trust scores computed.", "counter");
    writeln!(out, "trust_verifier_scores_total {}", c.score_requests()).ok();

    write_help_type(&mut out, "trust_verifier_scores_by_mode_total", "Trust scores by verification mode.", "counter");
    writeln!(out, "trust_verifier_scores_by_mode_total{{mode=\"github_verified\"}} {}", c.github_verified.load(Ordering::Relaxed)).ok();
    writeln!(out, "trust_verifier_scores_by_mode_total{{mode=\"demo_unverified\"}} {}", c.demo_unverified.load(Ordering::Relaxed)).ok();

    write_help_type(&mut out, "trust_verifier_scores_by_grade_total", "Trust scores by letter grade.", "counter");
    for grade in [Grade::APlus, Grade::A, Grade::B, Grade::C, Grade::D, Grade::F] {
        let count = c.grade_counter(grade).load(Ordering::Relaxed);
        write_counter_if_nonzero(&mut out, "trust_verifier_scores_by_grade_total", "grade", grade.as_str(), count);
    }

    write_help_type(&mut out, "trust_verifier_badges_total", "Total number of badges rendered.", "counter");
    writeln!(out, "trust_verifier_badges_total {}", c.badges_rendered.load(Ordering::Relaxed)).ok();

    // ──────────────────────────────────────────────
    // Profile lookups and cache
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "trust_verifier_profile_lookups_total", "Profile lookups sent to the fetcher, by outcome.", "counter");
    writeln!(out, "trust_verifier_profile_lookups_total{{outcome=\"found\"}} {}", c.profile_found.load(Ordering::Relaxed)).ok();
    writeln!(out, "trust_verifier_profile_lookups_total{{outcome=\"not_found\"}} {}", c.profile_not_found.load(Ordering::Relaxed)).ok();

    let cache = &verifier.scorer.cache;
    let cache_hits = cache.hits();
    let cache_misses = cache.misses();
    write_help_type(&mut out, "trust_verifier_profile_cache_hits_total", "Profile cache hits.", "counter");
    writeln!(out, "trust_verifier_profile_cache_hits_total {}", cache_hits).ok();
    write_help_type(&mut out, "trust_verifier_profile_cache_misses_total", "Profile cache misses.", "counter");
    writeln!(out, "trust_verifier_profile_cache_misses_total {}", cache_misses).ok();
    write_help_type(&mut out, "trust_verifier_profile_cache_evictions_total", "Profile cache evictions.", "counter");
    writeln!(out, "trust_verifier_profile_cache_evictions_total {}", cache.evictions()).ok();
    write_help_type(&mut out, "trust_verifier_profile_cache_entries", "Profiles currently cached.", "gauge");
    writeln!(out, "trust_verifier_profile_cache_entries {}", cache.len()).ok();

    let total = cache_hits + cache_misses;
    let hit_rate = if total > 0 { cache_hits as f64 / total as f64 } else { 0.0 };
    write_help_type(&mut out, "trust_verifier_profile_cache_hit_ratio", "Profile cache hit ratio (0.0-1.0).", "gauge");
    writeln!(out, "trust_verifier_profile_cache_hit_ratio {:.4}", hit_rate).ok();

    // ──────────────────────────────────────────────
    // Pilot
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "trust_verifier_pilot_cohort_agents", "Agents enrolled in the pilot cohort.", "gauge");
    writeln!(out, "trust_verifier_pilot_cohort_agents {}", verifier.pilot.cohort().len()).ok();

    write_help_type(&mut out, "trust_verifier_pilot_ingests_total", "Snapshot ingestion attempts by result.", "counter");
    writeln!(out, "trust_verifier_pilot_ingests_total{{result=\"accepted\"}} {}", c.snapshots_ingested()).ok();
    writeln!(out, "trust_verifier_pilot_ingests_total{{result=\"rejected\"}} {}", c.ingests_rejected()).ok();

    write_help_type(&mut out, "trust_verifier_pilot_scores_total", "Pilot scores computed.", "counter");
    writeln!(out, "trust_verifier_pilot_scores_total {}", c.pilot_scores.load(Ordering::Relaxed)).ok();

    // ──────────────────────────────────────────────
    // Build info
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "trust_verifier_build_info", "trust-verifier build information.", "gauge");
    writeln!(out, "trust_verifier_build_info{{version=\"{}\"}} 1", env!("CARGO_PKG_VERSION")).ok();

    out
}

// ── helpers ─────────────────────────────────────────

fn write_help_type(out: &mut String, name: &str, help: &str, metric_type: &str) {
    writeln!(out, "# HELP {} {}", name, help).ok();
    writeln!(out, "# TYPE {} {}", name, metric_type).ok();
}

fn write_counter_if_nonzero(out: &mut String, name: &str, label: &str, value: &str, count: u64) {
    if count > 0 {
        writeln!(out, "{}{{{}=\"{}\"}} {}", name, label, value, count).ok();
    }
}
