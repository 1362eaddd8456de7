// =============================================================================
// Central Application State — Stock Analyzer
// =============================================================================
//
// Shared by every request handler through `Arc<AppState>`.
//
// Thread safety:
//   - Atomic counter for lock-free request accounting.
//   - The rate limiter manages its own interior mutability.
//   - Everything else is immutable after startup.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::analysis::RandomJitter;
use crate::market_data::{AlphaVantageClient, ProviderRateLimiter};
use crate::runtime_config::ServiceConfig;

pub struct AppState {
    pub config: ServiceConfig,
    pub client: AlphaVantageClient,
    pub rate_limiter: Arc<ProviderRateLimiter>,

    /// Successful analyses since startup.
    pub analyses_served: AtomicU64,

    /// Instant when the service was started. Used for uptime reporting.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Build the state from a validated config.  Fails only if the HTTP
    /// client cannot be constructed.
    pub fn new(config: ServiceConfig) -> anyhow::Result<Self> {
        let rate_limiter = Arc::new(ProviderRateLimiter::new(
            config.requests_per_minute,
            config.requests_per_day,
        ));
        let client = AlphaVantageClient::new(&config, rate_limiter.clone())?;

        Ok(Self {
            config,
            client,
            rate_limiter,
            analyses_served: AtomicU64::new(0),
            start_time: std::time::Instant::now(),
        })
    }

    /// Jitter for one analysis: seeded from config when set, else fresh
    /// entropy.
    pub fn jitter(&self) -> RandomJitter {
        match self.config.jitter_seed {
            Some(seed) => RandomJitter::seeded(seed),
            None => RandomJitter::from_entropy(),
        }
    }

    pub fn record_analysis(&self) -> u64 {
        self.analyses_served.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn analyses_served(&self) -> u64 {
        self.analyses_served.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
