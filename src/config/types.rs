use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for PageScope
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub service: ServiceConfig,
}

/// Page fetch and link probe behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AnalyzerConfig {
    /// Maximum number of link probes in flight for one analysis
    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: u32,

    /// Deadline for fetching the target page, body included (milliseconds)
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Deadline for a single link probe (milliseconds)
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl AnalyzerConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_probes: default_max_concurrent_probes(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

fn default_max_concurrent_probes() -> u32 {
    32
}

fn default_fetch_timeout_ms() -> u64 {
    30_000
}

fn default_probe_timeout_ms() -> u64 {
    10_000
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the analyzer
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the analyzer
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the analyzer
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for analyzer-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: Name/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Path to the SQLite database file
    pub database_path: String,

    /// Path to the markdown report file
    pub summary_path: String,
}

/// Analysis queue configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Number of analyses that may run at the same time
    #[serde(default = "default_workers")]
    pub workers: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

fn default_workers() -> u32 {
    4
}
