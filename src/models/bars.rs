use chrono::{DateTime, Utc};

/// One intraday OHLCV bar at one-minute resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntradayBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}
