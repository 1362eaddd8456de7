// =============================================================================
// Rate-Limit Tracker — keeps Alpha Vantage calls inside the free tier
// =============================================================================
//
// The provider enforces two limits per API key:
//   - 5 requests per rolling minute
//   - 500 requests per rolling day
//
// We keep a timestamp log per endpoint (`alphavantage_<FUNCTION>`) and refuse
// to send a request that would exceed either window.  The log is pruned of
// entries older than a day on every access.
// =============================================================================

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

const MINUTE: Duration = Duration::from_secs(60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Thread-safe sliding-window request tracker.
pub struct ProviderRateLimiter {
    per_minute: usize,
    per_day: usize,
    log: Mutex<HashMap<String, VecDeque<Instant>>>,
}

/// Usage counters for one endpoint (suitable for the health payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointUsage {
    pub endpoint: String,
    pub last_minute: usize,
    pub last_day: usize,
}

/// Immutable snapshot of the limiter state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitSnapshot {
    pub per_minute_limit: usize,
    pub per_day_limit: usize,
    pub endpoints: Vec<EndpointUsage>,
}

fn key(endpoint: &str) -> String {
    format!("alphavantage_{endpoint}")
}

fn prune(entries: &mut VecDeque<Instant>, now: Instant) {
    while let Some(&oldest) = entries.front() {
        if now.saturating_duration_since(oldest) >= DAY {
            entries.pop_front();
        } else {
            break;
        }
    }
}

fn within(entries: &VecDeque<Instant>, now: Instant, window: Duration) -> usize {
    entries
        .iter()
        .filter(|&&t| now.saturating_duration_since(t) < window)
        .count()
}

/// Time until the oldest request in the minute window expires, or zero when
/// the window still has room.
fn minute_wait(entries: &VecDeque<Instant>, now: Instant, limit: usize) -> Duration {
    let recent: Vec<Instant> = entries
        .iter()
        .copied()
        .filter(|&t| now.saturating_duration_since(t) < MINUTE)
        .collect();
    if recent.len() < limit {
        return Duration::ZERO;
    }

    recent
        .iter()
        .min()
        .map(|&oldest| (oldest + MINUTE).saturating_duration_since(now))
        .unwrap_or(Duration::ZERO)
}

impl ProviderRateLimiter {
    pub fn new(per_minute: usize, per_day: usize) -> Self {
        Self {
            per_minute,
            per_day,
            log: Mutex::new(HashMap::new()),
        }
    }

    // -------------------------------------------------------------------------
    // Pre-flight checks
    // -------------------------------------------------------------------------

    /// Return `true` if one more request to `endpoint` fits both windows.
    pub fn can_make_request(&self, endpoint: &str) -> bool {
        self.can_make_request_at(endpoint, Instant::now())
    }

    pub fn can_make_request_at(&self, endpoint: &str, now: Instant) -> bool {
        let mut log = self.log.lock();
        let Some(entries) = log.get_mut(&key(endpoint)) else {
            return true;
        };
        prune(entries, now);

        let last_minute = within(entries, now, MINUTE);
        if last_minute >= self.per_minute {
            warn!(endpoint, last_minute, limit = self.per_minute, "request blocked — per-minute limit reached");
            return false;
        }
        if entries.len() >= self.per_day {
            warn!(endpoint, last_day = entries.len(), limit = self.per_day, "request blocked — daily limit reached");
            return false;
        }
        true
    }

    /// Record a request that is about to be sent.
    pub fn record_request(&self, endpoint: &str) {
        self.record_request_at(endpoint, Instant::now());
    }

    pub fn record_request_at(&self, endpoint: &str, now: Instant) {
        let mut log = self.log.lock();
        let entries = log.entry(key(endpoint)).or_default();
        prune(entries, now);
        entries.push_back(now);
        debug!(endpoint, last_day = entries.len(), "provider request recorded");
    }

    /// Check and record one request per endpoint under a single lock.
    ///
    /// Either every endpoint is recorded or none is.  On refusal returns the
    /// first saturated endpoint and how long until its minute window frees a
    /// slot.
    pub fn try_acquire(&self, endpoints: &[&str]) -> Result<(), (String, Duration)> {
        self.try_acquire_at(endpoints, Instant::now())
    }

    pub fn try_acquire_at(&self, endpoints: &[&str], now: Instant) -> Result<(), (String, Duration)> {
        let mut log = self.log.lock();

        for &endpoint in endpoints {
            let Some(entries) = log.get_mut(&key(endpoint)) else {
                continue;
            };
            prune(entries, now);

            let last_minute = within(entries, now, MINUTE);
            if last_minute >= self.per_minute {
                warn!(endpoint, last_minute, limit = self.per_minute, "request blocked — per-minute limit reached");
                return Err((endpoint.to_string(), minute_wait(entries, now, self.per_minute)));
            }
            if entries.len() >= self.per_day {
                warn!(endpoint, last_day = entries.len(), limit = self.per_day, "request blocked — daily limit reached");
                return Err((endpoint.to_string(), Duration::ZERO));
            }
        }

        for &endpoint in endpoints {
            let entries = log.entry(key(endpoint)).or_default();
            entries.push_back(now);
            debug!(endpoint, last_day = entries.len(), "provider request recorded");
        }
        Ok(())
    }

    /// How long until the per-minute window frees a slot (zero if it already
    /// has one).
    pub fn next_available(&self, endpoint: &str) -> Duration {
        self.next_available_at(endpoint, Instant::now())
    }

    pub fn next_available_at(&self, endpoint: &str, now: Instant) -> Duration {
        let log = self.log.lock();
        log.get(&key(endpoint))
            .map(|entries| minute_wait(entries, now, self.per_minute))
            .unwrap_or(Duration::ZERO)
    }

    // -------------------------------------------------------------------------
    // Snapshot
    // -------------------------------------------------------------------------

    pub fn snapshot(&self) -> RateLimitSnapshot {
        let now = Instant::now();
        let log = self.log.lock();
        let mut endpoints: Vec<EndpointUsage> = log
            .iter()
            .map(|(endpoint, entries)| EndpointUsage {
                endpoint: endpoint.clone(),
                last_minute: within(entries, now, MINUTE),
                last_day: within(entries, now, DAY),
            })
            .collect();
        endpoints.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));

        RateLimitSnapshot {
            per_minute_limit: self.per_minute,
            per_day_limit: self.per_day,
            endpoints,
        }
    }
}

impl std::fmt::Debug for ProviderRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRateLimiter")
            .field("per_minute", &self.per_minute)
            .field("per_day", &self.per_day)
            .field("endpoints", &self.log.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    const TIME_SERIES: &str = "TIME_SERIES_DAILY";
    const QUOTE: &str = "GLOBAL_QUOTE";

    #[test]
    fn fresh_limiter_allows_requests() {
        let limiter = ProviderRateLimiter::new(5, 500);
        assert!(limiter.can_make_request("GLOBAL_QUOTE"));
        assert_eq!(limiter.next_available("GLOBAL_QUOTE"), Duration::ZERO);
    }

    #[test]
    fn minute_window_blocks_sixth_request() {
        let limiter = ProviderRateLimiter::new(5, 500);
        let start = Instant::now();
        for i in 0..5 {
            let t = start + Duration::from_secs(i);
            assert!(limiter.can_make_request_at("TIME_SERIES_DAILY", t));
            limiter.record_request_at("TIME_SERIES_DAILY", t);
        }
        let t = start + Duration::from_secs(10);
        assert!(!limiter.can_make_request_at("TIME_SERIES_DAILY", t));
        // Oldest entry (start) expires at start + 60s.
        assert_eq!(limiter.next_available_at("TIME_SERIES_DAILY", t), Duration::from_secs(50));

        // Other endpoints are tracked separately.
        assert!(limiter.can_make_request_at("GLOBAL_QUOTE", t));

        // A minute after the first request a slot frees up.
        let later = start + Duration::from_secs(61);
        assert!(limiter.can_make_request_at("TIME_SERIES_DAILY", later));
        assert_eq!(limiter.next_available_at("TIME_SERIES_DAILY", later), Duration::ZERO);
    }

    #[test]
    fn day_window_blocks_after_limit() {
        let limiter = ProviderRateLimiter::new(5, 3);
        let start = Instant::now();
        for i in 0..3 {
            limiter.record_request_at("GLOBAL_QUOTE", start + Duration::from_secs(i * 120));
        }
        let t = start + Duration::from_secs(3600);
        assert!(!limiter.can_make_request_at("GLOBAL_QUOTE", t));
        // Nothing in the last minute, so no per-minute wait is reported.
        assert_eq!(limiter.next_available_at("GLOBAL_QUOTE", t), Duration::ZERO);

        let next_day = start + DAY + Duration::from_secs(600);
        assert!(limiter.can_make_request_at("GLOBAL_QUOTE", next_day));
    }

    #[test]
    fn try_acquire_records_all_or_nothing() {
        let limiter = ProviderRateLimiter::new(2, 500);
        let start = Instant::now();
        let both = [TIME_SERIES, QUOTE];

        assert!(limiter.try_acquire_at(&both, start).is_ok());
        limiter.record_request_at(QUOTE, start);

        // QUOTE is full, so TIME_SERIES must not be charged either.
        let t = start + Duration::from_secs(5);
        let (endpoint, wait) = limiter.try_acquire_at(&both, t).unwrap_err();
        assert_eq!(endpoint, QUOTE);
        assert_eq!(wait, Duration::from_secs(55));
        assert!(limiter.can_make_request_at(TIME_SERIES, t));
        assert!(limiter.try_acquire_at(&[TIME_SERIES], t).is_ok());
        assert!(limiter.try_acquire_at(&[TIME_SERIES], t).is_err());
    }

    #[test]
    fn concurrent_acquire_never_exceeds_minute_limit() {
        let limiter = Arc::new(ProviderRateLimiter::new(5, 500));
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    limiter.try_acquire(&[TIME_SERIES, QUOTE]).is_ok()
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(admitted, 5);

        let snap = limiter.snapshot();
        assert_eq!(snap.endpoints.len(), 2);
        assert!(snap.endpoints.iter().all(|e| e.last_minute == 5));
    }

    #[test]
    fn snapshot_reports_usage() {
        let limiter = ProviderRateLimiter::new(5, 500);
        limiter.record_request("GLOBAL_QUOTE");
        limiter.record_request("GLOBAL_QUOTE");
        limiter.record_request("TIME_SERIES_DAILY");

        let snap = limiter.snapshot();
        assert_eq!(snap.per_minute_limit, 5);
        assert_eq!(snap.endpoints.len(), 2);
        assert_eq!(snap.endpoints[0].endpoint, "alphavantage_GLOBAL_QUOTE");
        assert_eq!(snap.endpoints[0].last_minute, 2);
        assert_eq!(snap.endpoints[1].last_day, 1);
    }
}
