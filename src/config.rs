use serde::Deserialize;

use crate::pilot::cohort::CohortMember;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub profile_cache: ProfileCacheConfig,
    #[serde(default)]
    pub pilot: PilotConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_web_address")]
    pub address: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// Allow any origin
    #[serde(default = "default_true")]
    pub cors_permissive: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GitHubConfig {
    /// When disabled every identifier is scored in demo mode
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Base used to build the `source` URL of verified results
    #[serde(default = "default_profile_base")]
    pub profile_base: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Personal access token; `GITHUB_TOKEN` takes precedence
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProfileCacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_profile_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PilotConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_storage")]
    pub storage: StorageBackend,
    /// Method tag written into every PDR provenance record
    #[serde(default = "default_method")]
    pub method: String,
    /// Where the snapshots come from
    #[serde(default = "default_source")]
    pub source: String,
    /// Attribution string for provenance records
    #[serde(default = "default_verifier")]
    pub verifier: String,
    #[serde(default)]
    pub cohort: Vec<CohortMember>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: default_web_address(),
            port: default_web_port(),
            cors_permissive: true,
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: default_api_base(),
            profile_base: default_profile_base(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
            token: None,
        }
    }
}

impl Default for ProfileCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_profile_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage: default_storage(),
            method: default_method(),
            source: default_source(),
            verifier: default_verifier(),
            cohort: Vec::new(),
        }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_web_address() -> String { "0.0.0.0".to_string() }
fn default_web_port() -> u16 { 8000 }
fn default_api_base() -> String { "https://api.github.com".to_string() }
fn default_profile_base() -> String { "https://github.com".to_string() }
fn default_timeout_ms() -> u64 { 5000 }
fn default_user_agent() -> String { format!("trust-verifier/{}", env!("CARGO_PKG_VERSION")) }
fn default_profile_ttl() -> u64 { 3600 }
fn default_max_entries() -> usize { 10_000 }
fn default_data_dir() -> String { "pilot_data".to_string() }
fn default_storage() -> StorageBackend { StorageBackend::File }
fn default_method() -> String { "velocity_based_pdr_v1".to_string() }
fn default_source() -> String { "nanook_snapshots".to_string() }
fn default_verifier() -> String { "trust-verifier".to_string() }

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path, e))?;
        let mut config = Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config '{}': {}", path, e))?;
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            if !token.is_empty() {
                config.github.token = Some(token);
            }
        }
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
