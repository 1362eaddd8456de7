// =============================================================================
// Market Data Module
// =============================================================================
//
// - Alpha Vantage REST client producing `StockSnapshot`s
// - Sliding-window tracker for the provider's free-tier limits

pub mod alpha_vantage;
pub mod rate_limit;

pub use alpha_vantage::{AlphaVantageClient, FetchError, StockSnapshot};
pub use rate_limit::{ProviderRateLimiter, RateLimitSnapshot};
