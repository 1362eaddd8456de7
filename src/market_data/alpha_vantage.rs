// =============================================================================
// Alpha Vantage REST Client — daily series + global quote
// =============================================================================
//
// One snapshot costs two provider calls:
//   GET /query?function=TIME_SERIES_DAILY&symbol=S&outputsize=compact&apikey=K
//   GET /query?function=GLOBAL_QUOTE&symbol=S&apikey=K
//
// The provider answers HTTP 200 even for failures and signals them in the
// body ("Error Message", "Note", "Information"), so every payload is checked
// before parsing.  Numeric values arrive as strings.
//
// SECURITY: the API key only ever appears in the query string sent to the
// provider.  It is never logged.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::rate_limit::ProviderRateLimiter;
use crate::runtime_config::ServiceConfig;
use crate::types::OhlcvBar;

pub const TIME_SERIES_DAILY: &str = "TIME_SERIES_DAILY";
pub const GLOBAL_QUOTE: &str = "GLOBAL_QUOTE";

const MAX_SYMBOL_LEN: usize = 5;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Symbol is required")]
    MissingSymbol,

    #[error("Invalid symbol format: {0}")]
    InvalidSymbol(String),

    #[error("market data API key is not configured")]
    MissingApiKey,

    #[error("rate limit reached for {endpoint}, retry in {}s", retry_after.as_secs())]
    RateLimited { endpoint: String, retry_after: Duration },

    #[error("network error while fetching data: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API Error: {0}")]
    Api(String),

    #[error("API Limit: {0}")]
    ApiLimit(String),

    #[error("{0}")]
    NoData(String),

    #[error("malformed provider response: {0}")]
    Parse(String),
}

// =============================================================================
// StockSnapshot
// =============================================================================

/// Everything the analysis endpoints need about one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSnapshot {
    pub symbol: String,
    pub current_price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub market_cap: String,
    pub historical_prices: Vec<f64>,
    pub candlestick_data: Vec<OhlcvBar>,
}

/// Parsed `Global Quote` block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
}

/// Upper-case `raw` and check it is 1-5 ASCII letters.
pub fn normalize_symbol(raw: &str) -> Result<String, FetchError> {
    let symbol = raw.to_ascii_uppercase();
    if symbol.is_empty() {
        return Err(FetchError::MissingSymbol);
    }
    if symbol.len() > MAX_SYMBOL_LEN || !symbol.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(FetchError::InvalidSymbol(symbol));
    }
    Ok(symbol)
}

/// Display-only market cap estimate, e.g. `"$187.3B"`.
pub fn estimate_market_cap(price: f64) -> String {
    format!("${:.1}B", price * 1_000_000_000.0 / 1_000_000_000.0)
}

// =============================================================================
// Payload parsing
// =============================================================================

/// Map provider-side failures carried in an HTTP 200 body to typed errors.
fn check_api_errors(body: &Value) -> Result<(), FetchError> {
    if let Some(msg) = body.get("Error Message") {
        return Err(FetchError::Api(text_of(msg)));
    }
    for key in ["Note", "Information"] {
        if let Some(msg) = body.get(key) {
            return Err(FetchError::ApiLimit(text_of(msg)));
        }
    }
    Ok(())
}

fn text_of(value: &Value) -> String {
    value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string())
}

fn no_data(symbol: &str) -> FetchError {
    FetchError::NoData(format!("No data found for symbol {symbol}"))
}

fn field_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a str, FetchError> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .ok_or_else(|| FetchError::Parse(format!("missing field '{key}'")))
}

fn field_f64(obj: &Map<String, Value>, key: &str) -> Result<f64, FetchError> {
    let raw = field_str(obj, key)?;
    raw.parse::<f64>()
        .map_err(|_| FetchError::Parse(format!("field '{key}' is not a number: {raw}")))
}

fn field_u64(obj: &Map<String, Value>, key: &str) -> Result<u64, FetchError> {
    let raw = field_str(obj, key)?;
    raw.parse::<u64>()
        .map_err(|_| FetchError::Parse(format!("field '{key}' is not an integer: {raw}")))
}

/// Parse `Time Series (Daily)` into ascending bars, keeping the most recent
/// `history_days`.
pub fn parse_daily_series(
    body: &Value,
    symbol: &str,
    history_days: usize,
) -> Result<Vec<OhlcvBar>, FetchError> {
    let series = body
        .get("Time Series (Daily)")
        .and_then(Value::as_object)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| no_data(symbol))?;

    let mut bars = Vec::with_capacity(series.len());
    for (date, day) in series {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| FetchError::Parse(format!("bad series date: {date}")))?;
        let day = day
            .as_object()
            .ok_or_else(|| FetchError::Parse(format!("series entry for {date} is not an object")))?;

        bars.push(OhlcvBar {
            date,
            open: field_f64(day, "1. open")?,
            high: field_f64(day, "2. high")?,
            low: field_f64(day, "3. low")?,
            close: field_f64(day, "4. close")?,
            volume: field_u64(day, "5. volume")?,
        });
    }

    bars.sort_by_key(|b| b.date);
    let skip = bars.len().saturating_sub(history_days);
    Ok(bars.split_off(skip))
}

/// Parse the `Global Quote` block.
pub fn parse_global_quote(body: &Value, symbol: &str) -> Result<Quote, FetchError> {
    let quote = body
        .get("Global Quote")
        .and_then(Value::as_object)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| no_data(symbol))?;

    let raw_pct = field_str(quote, "10. change percent")?;
    let change_percent = raw_pct
        .trim_end_matches('%')
        .parse::<f64>()
        .map_err(|_| FetchError::Parse(format!("bad change percent: {raw_pct}")))?;

    Ok(Quote {
        price: field_f64(quote, "05. price")?,
        change: field_f64(quote, "09. change")?,
        change_percent,
        volume: field_u64(quote, "06. volume")?,
    })
}

// =============================================================================
// Client
// =============================================================================

#[derive(Clone)]
pub struct AlphaVantageClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    history_days: usize,
    rate_limiter: Arc<ProviderRateLimiter>,
}

impl AlphaVantageClient {
    pub fn new(config: &ServiceConfig, rate_limiter: Arc<ProviderRateLimiter>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build HTTP client for market data")?;

        let base_url = config.alpha_vantage_base_url.trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "AlphaVantageClient initialised");

        Ok(Self {
            client,
            base_url,
            api_key: config.alpha_vantage_api_key.clone(),
            history_days: config.history_days,
            rate_limiter,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch the daily series and quote for `symbol` and merge them into a
    /// snapshot.  `symbol` is normalised first.
    #[instrument(skip(self), name = "alpha_vantage::fetch_stock_data")]
    pub async fn fetch_stock_data(&self, symbol: &str) -> Result<StockSnapshot, FetchError> {
        let symbol = normalize_symbol(symbol)?;
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey)?;

        // Both endpoints need headroom before either is called.
        self.rate_limiter
            .try_acquire(&[TIME_SERIES_DAILY, GLOBAL_QUOTE])
            .map_err(|(endpoint, retry_after)| FetchError::RateLimited { endpoint, retry_after })?;

        let series_body = self
            .query(TIME_SERIES_DAILY, &symbol, api_key, &[("outputsize", "compact")])
            .await?;

        let quote_body = self.query(GLOBAL_QUOTE, &symbol, api_key, &[]).await?;

        check_api_errors(&series_body)?;
        check_api_errors(&quote_body)?;

        let candlestick_data = parse_daily_series(&series_body, &symbol, self.history_days)?;
        let quote = parse_global_quote(&quote_body, &symbol)?;
        let historical_prices = candlestick_data.iter().map(|b| b.close).collect();

        info!(
            symbol = %symbol,
            bars = candlestick_data.len(),
            price = quote.price,
            "stock data fetched"
        );

        Ok(StockSnapshot {
            market_cap: estimate_market_cap(quote.price),
            symbol,
            current_price: quote.price,
            change: quote.change,
            change_percent: quote.change_percent,
            volume: quote.volume,
            historical_prices,
            candlestick_data,
        })
    }

    async fn query(
        &self,
        function: &str,
        symbol: &str,
        api_key: &str,
        extra: &[(&str, &str)],
    ) -> Result<Value, FetchError> {
        let url = format!("{}/query", self.base_url);
        let mut params = vec![("function", function), ("symbol", symbol)];
        params.extend_from_slice(extra);
        params.push(("apikey", api_key));

        let resp = self.client.get(&url).query(&params).send().await?;
        let status = resp.status();
        if !status.is_success() {
            warn!(function, %status, "provider returned non-success status");
            return Err(FetchError::Api(format!("{function} returned HTTP {status}")));
        }

        resp.json::<Value>()
            .await
            .map_err(|e| FetchError::Parse(format!("{function} body is not JSON: {e}")))
    }
}

impl std::fmt::Debug for AlphaVantageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlphaVantageClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("history_days", &self.history_days)
            .finish()
    }
}
