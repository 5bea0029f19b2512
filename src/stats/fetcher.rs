//! Fetches network statistics from the block explorer and the exchange
//!
//! Each metric is requested on its own and returns its own `Result`, so one
//! broken endpoint never hides the others.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{MarketSummary, NetworkStats};
use crate::config::SourcesConfig;
use crate::error::FetchError;

const DIFFICULTY_PATH: &str = "/api/getdifficulty";
const HASHRATE_PATH: &str = "/api/getnetworkhashps";
const BLOCK_COUNT_PATH: &str = "/api/getblockcount";
const MONEY_SUPPLY_PATH: &str = "/ext/getmoneysupply";

/// HTTP client wrapper for one fetch round
pub struct StatsFetcher {
    client: Client,
    explorer_url: String,
    exchange_url: String,
    timeout: Option<Duration>,
}

impl StatsFetcher {
    /// Create a fetcher with its own HTTP session.
    ///
    /// A new fetcher is built for every cycle so no connection state
    /// outlives the cycle that opened it.
    pub fn new(sources: &SourcesConfig) -> Self {
        Self {
            client: Client::new(),
            explorer_url: sources.explorer_url.trim_end_matches('/').to_string(),
            exchange_url: sources.exchange_url.clone(),
            timeout: sources.request_timeout(),
        }
    }

    /// Fetch every metric in turn. Never fails as a whole.
    pub async fn fetch_all(&self) -> NetworkStats {
        let stats = NetworkStats {
            difficulty: self.fetch_explorer_number(DIFFICULTY_PATH).await,
            hashrate: self.fetch_explorer_number(HASHRATE_PATH).await,
            block_count: self.fetch_explorer_number(BLOCK_COUNT_PATH).await,
            supply: self.fetch_explorer_number(MONEY_SUPPLY_PATH).await,
            market: self.fetch_market().await,
        };

        log_outcome("difficulty", &stats.difficulty);
        log_outcome("hashrate", &stats.hashrate);
        log_outcome("block_count", &stats.block_count);
        log_outcome("supply", &stats.supply);
        match &stats.market {
            Ok(market) => {
                log_outcome("last_price", &market.last_price);
                log_outcome("volume", &market.volume);
            }
            Err(e) => warn!(metric = "market", error = %e, "Fetch failed, value will show as missing"),
        }

        stats
    }

    /// Fetch a plain-text numeric body from the explorer.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Network request fails
    /// - Response status is not successful (2xx)
    /// - Body is not a finite number
    pub async fn fetch_explorer_number(&self, path: &str) -> Result<f64, FetchError> {
        let url = format!("{}{}", self.explorer_url, path);
        let body = self.get(&url).await?.text().await?;
        parse_number(&body)
    }

    /// Fetch the exchange's market summary.
    ///
    /// Only transport failures and a body that is not JSON fail the whole
    /// call; a bad or missing field fails just that field.
    pub async fn fetch_market(&self) -> Result<MarketSummary, FetchError> {
        let body = self.get(&self.exchange_url).await?.text().await?;
        parse_market(&body)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let mut request = self.client.get(url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

/// Parse an explorer body such as `"123456.789\n"`.
pub fn parse_number(body: &str) -> Result<f64, FetchError> {
    let trimmed = body.trim();
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| FetchError::Malformed(format!("not a number: {:?}", truncate(trimmed))))?;

    if !value.is_finite() {
        return Err(FetchError::Malformed(format!("not a finite number: {:?}", trimmed)));
    }
    Ok(value)
}

/// Parse an exchange body such as `{"lastPrice":"0.00012345","volume":"1000000"}`.
pub fn parse_market(body: &str) -> Result<MarketSummary, FetchError> {
    let document: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    Ok(MarketSummary {
        last_price: market_field(&document, "lastPrice"),
        volume: market_field(&document, "volume"),
    })
}

/// Exchange numbers usually arrive as JSON strings; plain numbers are accepted too.
fn market_field(document: &Value, field: &str) -> Result<f64, FetchError> {
    match document.get(field) {
        Some(Value::String(text)) => parse_number(text),
        Some(Value::Number(number)) => number
            .as_f64()
            .filter(|value| value.is_finite())
            .ok_or_else(|| FetchError::Malformed(format!("field `{}` is not a finite number", field))),
        Some(other) => Err(FetchError::Malformed(format!(
            "field `{}` has unexpected value {}",
            field, other
        ))),
        None => Err(FetchError::Malformed(format!("missing field `{}`", field))),
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(64) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn log_outcome(metric: &str, outcome: &Result<f64, FetchError>) {
    match outcome {
        Ok(value) => debug!(metric, value, "Fetched metric"),
        Err(e) => warn!(metric, error = %e, "Fetch failed, value will show as missing"),
    }
}
