// =============================================================================
// Service Configuration — JSON file with environment overrides
// =============================================================================
//
// Every tunable lives here.  All fields carry `#[serde(default)]` so that a
// partial (or empty) config file still loads, and a missing file simply means
// "run with defaults".
//
// Environment variables win over the file:
//   ALPHA_VANTAGE_API_KEY    provider API key
//   ALPHA_VANTAGE_BASE_URL   provider base URL (tests, proxies)
//   ANALYZER_BIND_ADDR       HTTP listen address
//
// The API key is never logged.
// =============================================================================

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_base_url() -> String {
    "https://www.alphavantage.co".to_string()
}

fn default_history_days() -> usize {
    60
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_requests_per_minute() -> usize {
    5
}

fn default_requests_per_day() -> usize {
    500
}

// =============================================================================
// ServiceConfig
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address the HTTP API listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    // --- Market data provider ------------------------------------------------

    #[serde(default = "default_base_url")]
    pub alpha_vantage_base_url: String,

    #[serde(default, skip_serializing)]
    pub alpha_vantage_api_key: Option<String>,

    /// Number of most recent daily bars kept from the provider response.
    #[serde(default = "default_history_days")]
    pub history_days: usize,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Free-tier limits, tracked per provider endpoint.
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: usize,

    #[serde(default = "default_requests_per_day")]
    pub requests_per_day: usize,

    // --- Analysis ------------------------------------------------------------

    /// Fixed seed for price-level jitter. `None` draws fresh entropy per
    /// request; set it to make responses reproducible.
    #[serde(default)]
    pub jitter_seed: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            alpha_vantage_base_url: default_base_url(),
            alpha_vantage_api_key: None,
            history_days: default_history_days(),
            request_timeout_secs: default_request_timeout_secs(),
            requests_per_minute: default_requests_per_minute(),
            requests_per_day: default_requests_per_day(),
            jitter_seed: None,
        }
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("bind_addr", &self.bind_addr)
            .field("alpha_vantage_base_url", &self.alpha_vantage_base_url)
            .field("alpha_vantage_api_key", &self.alpha_vantage_api_key.as_ref().map(|_| "<redacted>"))
            .field("history_days", &self.history_days)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("requests_per_minute", &self.requests_per_minute)
            .field("requests_per_day", &self.requests_per_day)
            .field("jitter_seed", &self.jitter_seed)
            .finish()
    }
}

impl ServiceConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// Returns an error when the file is missing or malformed so the caller
    /// can fall back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read service config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse service config from {}", path.display()))?;

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            history_days = config.history_days,
            "service config loaded"
        );

        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally `std::env::var`).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = non_empty("ALPHA_VANTAGE_API_KEY") {
            self.alpha_vantage_api_key = Some(key);
        }
        if let Some(url) = non_empty("ALPHA_VANTAGE_BASE_URL") {
            self.alpha_vantage_base_url = url;
        }
        if let Some(addr) = non_empty("ANALYZER_BIND_ADDR") {
            self.bind_addr = addr;
        }
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.history_days == 0 {
            bail!("history_days must be at least 1");
        }
        if self.requests_per_minute == 0 || self.requests_per_day == 0 {
            bail!("provider rate limits must be non-zero");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be non-zero");
        }
        Ok(())
    }
}

/// Provider keys are 10-20 upper-case letters or digits.
pub fn is_valid_api_key(key: &str) -> bool {
    (10..=20).contains(&key.len())
        && key.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}
