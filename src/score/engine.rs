use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::score::factors::{clamp_factor, Factor, FactorSet, Grade, WEIGHTS};
use crate::score::profile::{GitHubProfile, ProfileLookup};

/// Optional claims supplied with a score request. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Secondary GitHub handle
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    /// Decentralized identifier claim
    #[serde(default)]
    pub did: Option<String>,
    #[serde(default)]
    pub wallet: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Evidence {
    pub fn github(&self) -> Option<&str> {
        present(&self.github)
    }

    pub fn website(&self) -> Option<&str> {
        present(&self.website)
    }

    pub fn did(&self) -> Option<&str> {
        present(&self.did)
    }

    pub fn wallet(&self) -> Option<&str> {
        present(&self.wallet)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    GithubVerified,
    DemoUnverified,
}

impl VerificationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationMode::GithubVerified => "github_verified",
            VerificationMode::DemoUnverified => "demo_unverified",
        }
    }
}

/// Evidence that was accepted, in application order. `Wallet` carries no bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Github,
    Website,
    Did,
    Wallet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub agent_id: String,
    pub score: f64,
    pub grade: Grade,
    pub factors: FactorSet,
    pub weights: FactorSet,
    pub verification: VerificationMode,
    pub evidence_applied: Vec<EvidenceKind>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,
}

// Evidence bonuses
const SECONDARY_IDENTITY_BONUS: f64 = 15.0;
const SECONDARY_TRANSPARENCY_BONUS: f64 = 10.0;
const WEBSITE_TRANSPARENCY_BONUS: f64 = 10.0;
const DID_IDENTITY_BONUS: f64 = 20.0;

// Demo mode: every factor lands in [DEMO_BASE, DEMO_BASE + DEMO_SPAN)
const DEMO_BASE: u64 = 30;
const DEMO_SPAN: u64 = 50;

/// Pure trust-score computation.
///
/// A found profile drives the factors from observed attributes. Otherwise the
/// factors are derived from SHA-256 digests of the identifier, so the same
/// identifier always produces the same demo score. Evidence bonuses apply to
/// both branches, in a fixed order, each clamped at 100.
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    profile_base: String,
}

impl ScoreEngine {
    pub fn new(profile_base: &str) -> Self {
        Self {
            profile_base: profile_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn profile_url(&self, login: &str) -> String {
        format!("{}/{}", self.profile_base, login)
    }

    /// `secondary` is the lookup result for `evidence.github`, when one was made.
    pub fn score(
        &self,
        identifier: &str,
        evidence: &Evidence,
        profile: &ProfileLookup,
        secondary: Option<&ProfileLookup>,
        now: DateTime<Utc>,
    ) -> ScoreResult {
        let (mut factors, mut verification, mut source) = match profile {
            ProfileLookup::Found(p) => (
                profile_factors(p, now.year()),
                VerificationMode::GithubVerified,
                Some(self.profile_url(&p.login)),
            ),
            ProfileLookup::NotFound => (demo_factors(identifier), VerificationMode::DemoUnverified, None),
        };

        let mut applied = Vec::new();

        if evidence.github().is_some() {
            if let Some(ProfileLookup::Found(secondary)) = secondary {
                factors.add(Factor::Identity, SECONDARY_IDENTITY_BONUS);
                factors.add(Factor::Transparency, SECONDARY_TRANSPARENCY_BONUS);
                verification = VerificationMode::GithubVerified;
                if source.is_none() {
                    source = Some(self.profile_url(&secondary.login));
                }
                applied.push(EvidenceKind::Github);
            }
        }
        if evidence.website().is_some() {
            factors.add(Factor::Transparency, WEBSITE_TRANSPARENCY_BONUS);
            applied.push(EvidenceKind::Website);
        }
        if evidence.did().is_some() {
            factors.add(Factor::Identity, DID_IDENTITY_BONUS);
            applied.push(EvidenceKind::Did);
        }
        // Recorded, never scored
        if evidence.wallet().is_some() {
            applied.push(EvidenceKind::Wallet);
        }

        let score = clamp_factor(factors.weighted_total());

        ScoreResult {
            agent_id: identifier.to_string(),
            score,
            grade: Grade::from_score(score),
            factors,
            weights: WEIGHTS,
            verification,
            evidence_applied: applied,
            timestamp: now,
            source,
        }
    }
}

/// Factors from observed profile attributes
pub fn profile_factors(profile: &GitHubProfile, current_year: i32) -> FactorSet {
    let repos = profile.public_repos as f64;
    let followers = profile.followers as f64;
    let account_age = (current_year - profile.created_year) as f64;

    let mut factors = FactorSet::default();

    let identity = (30.0 + 8.0 * account_age).clamp(0.0, 90.0);
    factors.set(Factor::Identity, identity + if profile.has_bio { 10.0 } else { 0.0 });

    factors.set(Factor::Provenance, 20.0 + 2.0 * repos);

    let ratio = if profile.following == 0 {
        1.0
    } else {
        followers / profile.following as f64
    };
    factors.set(Factor::Behavior, 30.0 + 10.0 * ratio + repos.min(30.0));

    factors.set(Factor::Reputation, 20.0 + (2.0 * followers).min(80.0));

    let link_bonus = if profile.has_blog { 15.0 } else { 0.0 };
    factors.set(Factor::Transparency, 20.0 + 3.0 * repos + link_bonus);

    factors
}

/// Deterministic demo factors. Identity hashes the bare identifier, the
/// others hash `identifier + factor_name`.
pub fn demo_factors(identifier: &str) -> FactorSet {
    let mut factors = FactorSet::default();
    for factor in Factor::ALL {
        let digest = match factor {
            Factor::Identity => digest_u64(identifier),
            other => digest_u64(&format!("{}{}", identifier, other.name())),
        };
        factors.set(factor, (DEMO_BASE + digest % DEMO_SPAN) as f64);
    }
    factors
}

/// First 8 bytes of the SHA-256 digest, big-endian
fn digest_u64(input: &str) -> u64 {
    let digest = Sha256::digest(input.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn engine() -> ScoreEngine {
        ScoreEngine::new("https://github.com/")
    }

    fn profile(login: &str) -> GitHubProfile {
        GitHubProfile {
            login: login.to_string(),
            public_repos: 5,
            followers: 4,
            following: 2,
            created_year: 2024,
            has_bio: false,
            has_blog: true,
        }
    }

    fn assert_in_range(factors: &FactorSet) {
        for f in Factor::ALL {
            let v = factors.get(f);
            assert!((0.0..=100.0).contains(&v), "{} out of range: {}", f.name(), v);
        }
    }

    #[test]
    fn test_torvalds_profile_clamps() {
        let torvalds = GitHubProfile {
            login: "torvalds".to_string(),
            public_repos: 50,
            followers: 100_000,
            following: 10,
            created_year: 2010,
            has_bio: true,
            has_blog: false,
        };

        let result = engine().score(
            "torvalds",
            &Evidence::default(),
            &ProfileLookup::Found(torvalds),
            None,
            now(),
        );

        assert_eq!(result.factors.identity, 100.0);
        assert_eq!(result.factors.provenance, 100.0);
        assert_eq!(result.factors.behavior, 100.0);
        assert_eq!(result.factors.reputation, 100.0);
        assert_eq!(result.factors.transparency, 100.0);
        assert_eq!(result.verification, VerificationMode::GithubVerified);
        assert_eq!(result.grade, Grade::APlus);
        assert_eq!(result.source.as_deref(), Some("https://github.com/torvalds"));
    }

    #[test]
    fn test_identity_without_bio_caps_at_ninety() {
        let mut veteran = profile("veteran");
        veteran.created_year = 2008;
        let factors = profile_factors(&veteran, 2026);
        assert_eq!(factors.identity, 90.0);
    }

    #[test]
    fn test_modest_profile_factors() {
        let factors = profile_factors(&profile("newcomer"), 2026);
        assert_eq!(factors.identity, 46.0);
        assert_eq!(factors.provenance, 30.0);
        assert_eq!(factors.behavior, 55.0);
        assert_eq!(factors.reputation, 28.0);
        assert_eq!(factors.transparency, 50.0);

        let result = engine().score(
            "newcomer",
            &Evidence::default(),
            &ProfileLookup::Found(profile("newcomer")),
            None,
            now(),
        );
        assert!((result.score - 41.7).abs() < 1e-9);
        assert_eq!(result.grade, Grade::D);
    }

    #[test]
    fn test_zero_following_uses_unit_ratio() {
        let mut lurker = profile("lurker");
        lurker.followers = 7;
        lurker.following = 0;
        lurker.public_repos = 0;
        let factors = profile_factors(&lurker, 2026);
        assert_eq!(factors.behavior, 40.0);
    }

    #[test]
    fn test_demo_mode_is_deterministic() {
        let a = engine().score("agent-007", &Evidence::default(), &ProfileLookup::NotFound, None, now());
        let b = engine().score("agent-007", &Evidence::default(), &ProfileLookup::NotFound, None, now());

        assert_eq!(a.factors, b.factors);
        assert_eq!(a.score.to_bits(), b.score.to_bits());
        assert_eq!(a.verification, VerificationMode::DemoUnverified);
        assert!(a.source.is_none());

        for f in Factor::ALL {
            let v = a.factors.get(f);
            assert!((30.0..=79.0).contains(&v));
            assert_eq!(v.fract(), 0.0);
        }
    }

    #[test]
    fn test_demo_mode_is_case_sensitive() {
        assert_ne!(demo_factors("Agent-A"), demo_factors("agent-a"));
    }

    #[test]
    fn test_secondary_handle_bonus_switches_mode() {
        let evidence = Evidence {
            github: Some("octocat".to_string()),
            ..Default::default()
        };
        let secondary = ProfileLookup::Found(profile("octocat"));
        let base = demo_factors("did:web:agent");

        let result = engine().score("did:web:agent", &evidence, &ProfileLookup::NotFound, Some(&secondary), now());

        assert_eq!(result.factors.identity, base.identity + 15.0);
        assert_eq!(result.factors.transparency, base.transparency + 10.0);
        assert_eq!(result.verification, VerificationMode::GithubVerified);
        assert_eq!(result.evidence_applied, vec![EvidenceKind::Github]);
        assert_eq!(result.source.as_deref(), Some("https://github.com/octocat"));
    }

    #[test]
    fn test_unresolved_secondary_handle_adds_nothing() {
        let evidence = Evidence {
            github: Some("nobody-here".to_string()),
            ..Default::default()
        };
        let result = engine().score(
            "agent-x",
            &evidence,
            &ProfileLookup::NotFound,
            Some(&ProfileLookup::NotFound),
            now(),
        );
        assert_eq!(result.factors, demo_factors("agent-x"));
        assert_eq!(result.verification, VerificationMode::DemoUnverified);
        assert!(result.evidence_applied.is_empty());
    }

    #[test]
    fn test_all_bonuses_clamp_at_ceiling() {
        let mut strong = profile("strong");
        strong.created_year = 2000;
        strong.has_bio = true;
        strong.public_repos = 40;
        let evidence = Evidence {
            github: Some("strong-alt".to_string()),
            website: Some("https://strong.dev".to_string()),
            did: Some("did:web:strong.dev".to_string()),
            wallet: Some("0xabc".to_string()),
        };
        let secondary = ProfileLookup::Found(profile("strong-alt"));

        let result = engine().score("strong", &evidence, &ProfileLookup::Found(strong), Some(&secondary), now());

        assert_in_range(&result.factors);
        assert_eq!(result.factors.identity, 100.0);
        assert_eq!(result.factors.transparency, 100.0);
        assert_eq!(result.factors.provenance, 100.0);
        assert_eq!(
            result.evidence_applied,
            vec![EvidenceKind::Github, EvidenceKind::Website, EvidenceKind::Did, EvidenceKind::Wallet]
        );
        // the primary profile keeps the source URL
        assert_eq!(result.source.as_deref(), Some("https://github.com/strong"));
    }

    #[test]
    fn test_website_and_did_bonuses() {
        let evidence = Evidence {
            website: Some("https://agent.example".to_string()),
            did: Some("did:key:z6Mk".to_string()),
            ..Default::default()
        };
        let base = profile_factors(&profile("p"), 2026);
        let result = engine().score("p", &evidence, &ProfileLookup::Found(profile("p")), None, now());

        assert_eq!(result.factors.transparency, base.transparency + 10.0);
        assert_eq!(result.factors.identity, base.identity + 20.0);
        assert_eq!(result.factors.provenance, base.provenance);
    }

    #[test]
    fn test_wallet_is_recorded_without_bonus() {
        let evidence = Evidence {
            wallet: Some("0xabc".to_string()),
            ..Default::default()
        };
        let found = engine().score("p", &evidence, &ProfileLookup::Found(profile("p")), None, now());
        assert_eq!(found.factors, profile_factors(&profile("p"), 2026));
        assert_eq!(found.evidence_applied, vec![EvidenceKind::Wallet]);

        let demo = engine().score("agent-w", &evidence, &ProfileLookup::NotFound, None, now());
        assert_eq!(demo.factors, demo_factors("agent-w"));
        assert_eq!(demo.score, engine().score("agent-w", &Evidence::default(), &ProfileLookup::NotFound, None, now()).score);
    }

    #[test]
    fn test_blank_evidence_is_ignored() {
        let evidence = Evidence {
            website: Some("   ".to_string()),
            did: Some(String::new()),
            ..Default::default()
        };
        let result = engine().score("agent-y", &evidence, &ProfileLookup::NotFound, None, now());
        assert_eq!(result.factors, demo_factors("agent-y"));
        assert!(result.evidence_applied.is_empty());
    }

    #[test]
    fn test_unknown_evidence_keys_are_ignored() {
        let evidence: Evidence = serde_json::from_value(serde_json::json!({
            "website": "https://x.dev",
            "telegram": "@x"
        }))
        .unwrap();
        assert_eq!(evidence.website(), Some("https://x.dev"));
    }

    #[test]
    fn test_factors_stay_in_range_across_profiles() {
        for repos in [0u64, 1, 15, 40, 500] {
            for followers in [0u64, 3, 1000, u32::MAX as u64] {
                for following in [0u64, 1, 50] {
                    for created_year in [2008, 2026, 2030] {
                        let p = GitHubProfile {
                            login: "x".to_string(),
                            public_repos: repos,
                            followers,
                            following,
                            created_year,
                            has_bio: true,
                            has_blog: true,
                        };
                        let result = engine().score("x", &Evidence::default(), &ProfileLookup::Found(p), None, now());
                        assert_in_range(&result.factors);
                        assert!((0.0..=100.0).contains(&result.score));
                        assert!((result.score - result.factors.weighted_total()).abs() < 1e-9);
                    }
                }
            }
        }
    }
}
