use std::time::Duration as StdDuration;

use chrono::{TimeZone, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::models::IntradayBar;
use crate::service::market::MarketServiceError;

const CHART_API_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

// The chart API returns parallel arrays with nulls in slots where a
// minute had no trades; those slots are skipped when zipping into bars.
#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Fetch one day of one-minute bars for a symbol from the chart endpoint.
pub async fn fetch_intraday_bars(symbol: &str) -> Result<Vec<IntradayBar>, MarketServiceError> {
    let client = reqwest::Client::builder()
        .timeout(StdDuration::from_secs(15))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| MarketServiceError::Http(format!("failed to build client: {e}")))?;

    let url = format!("{CHART_API_URL}/{symbol}");
    let resp = client
        .get(&url)
        .query(&[
            ("interval", "1m"),
            ("range", "1d"),
            ("includePrePost", "false"),
        ])
        .send()
        .await
        .map_err(|e| {
            warn!("Chart API request failed for {symbol}: {e}");
            MarketServiceError::Http(format!("chart request failed: {e}"))
        })?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| "unable to read body".to_string());
        warn!("Chart API returned error status {status} for {symbol}: {body}");
        return Err(MarketServiceError::Http(format!(
            "chart api status {status}: {body}"
        )));
    }

    let raw_bytes = resp
        .bytes()
        .await
        .map_err(|e| MarketServiceError::Http(format!("chart body read failed: {e}")))?;

    let parsed: ChartEnvelope = serde_json::from_slice(&raw_bytes).map_err(|e| {
        let preview = String::from_utf8_lossy(&raw_bytes[..raw_bytes.len().min(500)]);
        warn!("Failed to parse chart response: {e}; body preview: {preview}");
        MarketServiceError::Http(format!("chart parse failed: {e}"))
    })?;

    if let Some(err) = parsed.chart.error {
        if !err.is_null() {
            return Err(MarketServiceError::Http(format!("chart api error: {err}")));
        }
    }

    let result = parsed
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or_else(|| MarketServiceError::NotFound(symbol.to_string()))?;

    Ok(zip_bars(&result))
}

fn zip_bars(result: &ChartResult) -> Vec<IntradayBar> {
    let Some(quote) = result.indicators.quote.first() else {
        return Vec::new();
    };

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(timestamp) = Utc.timestamp_opt(*ts, 0).single() else {
            continue;
        };
        let (Some(open), Some(high), Some(low), Some(close)) = (
            value_at(&quote.open, i),
            value_at(&quote.high, i),
            value_at(&quote.low, i),
            value_at(&quote.close, i),
        ) else {
            continue;
        };
        let volume = value_at(&quote.volume, i).unwrap_or(0);

        bars.push(IntradayBar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
    }
    bars
}

fn value_at<T: Copy>(values: &[Option<T>], index: usize) -> Option<T> {
    values.get(index).copied().flatten()
}
