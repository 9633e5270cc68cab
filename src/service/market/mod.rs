use std::sync::Arc;

use finance_query_core::{FetchClient, YahooAuthManager, YahooError, YahooFinanceClient};
use serde_json::Value;

use crate::models::{IntradayBar, QuoteSnapshot};

pub mod intraday;

#[derive(Debug, thiserror::Error)]
pub enum MarketServiceError {
    #[error(transparent)]
    Yahoo(#[from] YahooError),
    #[error("No quote data for symbol {0}")]
    NotFound(String),
    #[error("Chart API error: {0}")]
    Http(String),
}

pub struct MarketService {
    client: Arc<YahooFinanceClient>,
    #[allow(dead_code)]
    auth: Arc<YahooAuthManager>,
    #[allow(dead_code)]
    fetch: Arc<FetchClient>,
}

impl MarketService {
    /// Build a market-data service with optional proxy support.
    pub fn new(proxy: Option<String>) -> Result<Self, MarketServiceError> {
        let fetch = Arc::new(FetchClient::new(proxy.clone())?);
        let auth = Arc::new(YahooAuthManager::new(proxy, fetch.cookie_jar().clone()));
        let client = Arc::new(YahooFinanceClient::new(auth.clone(), fetch.clone()));

        Ok(Self {
            client,
            auth,
            fetch,
        })
    }

    /// Fetch the current quote snapshot for a symbol.
    ///
    /// Previous close is always taken from this snapshot; the bot never
    /// falls back to historical daily bars for it.
    pub async fn get_snapshot(&self, symbol: &str) -> Result<QuoteSnapshot, MarketServiceError> {
        let summary = self
            .client
            .get_quote_summary(symbol, &["price", "summaryDetail"])
            .await?;

        let result = summary
            .get("quoteSummary")
            .and_then(|q| q.get("result"))
            .and_then(|r| r.as_array())
            .and_then(|arr| arr.first())
            .ok_or_else(|| MarketServiceError::NotFound(symbol.to_string()))?;

        Ok(extract_snapshot(result, symbol))
    }

    /// Fetch one trading day of one-minute OHLCV bars for a symbol.
    pub async fn get_intraday_bars(
        &self,
        symbol: &str,
    ) -> Result<Vec<IntradayBar>, MarketServiceError> {
        intraday::fetch_intraday_bars(symbol).await
    }
}

/// Pull the display fields out of a quoteSummary result entry. Missing
/// fields stay `None`; the caller renders those as "N/A".
fn extract_snapshot(result: &Value, symbol: &str) -> QuoteSnapshot {
    QuoteSnapshot {
        symbol: result
            .get("price")
            .and_then(|p| p.get("symbol"))
            .and_then(|s| s.as_str())
            .unwrap_or(symbol)
            .to_string(),
        currency: result
            .get("price")
            .and_then(|p| p.get("currency"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string()),
        price: extract_f64_raw(result, &["price", "regularMarketPrice"]),
        open: extract_f64_raw(result, &["price", "regularMarketOpen"])
            .or_else(|| extract_f64_raw(result, &["summaryDetail", "open"])),
        previous_close: extract_f64_raw(result, &["summaryDetail", "previousClose"])
            .or_else(|| extract_f64_raw(result, &["price", "regularMarketPreviousClose"])),
        day_low: extract_f64_raw(result, &["price", "regularMarketDayLow"])
            .or_else(|| extract_f64_raw(result, &["summaryDetail", "dayLow"])),
        day_high: extract_f64_raw(result, &["price", "regularMarketDayHigh"])
            .or_else(|| extract_f64_raw(result, &["summaryDetail", "dayHigh"])),
        volume: extract_f64_raw(result, &["price", "regularMarketVolume"])
            .or_else(|| extract_f64_raw(result, &["summaryDetail", "volume"])),
        market_cap: extract_f64_raw(result, &["price", "marketCap"])
            .or_else(|| extract_f64_raw(result, &["summaryDetail", "marketCap"])),
    }
}

fn extract_f64_raw(root: &Value, path: &[&str]) -> Option<f64> {
    let mut current = root;
    for key in path {
        current = current.get(*key)?;
    }

    current
        .get("raw")
        .and_then(|v| v.as_f64())
        .or_else(|| current.as_f64())
}
