use std::env;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::{Europe::Stockholm, Tz};

const DEFAULT_TICKER: &str = "HAMLET-B.ST";
const DEFAULT_CHANNEL_ID: u64 = 1474470635198484716;

/// Runtime configuration for the summary bot.
///
/// Everything except the Discord token lives here; the token is read
/// separately in `main` so the config stays cheap to clone around.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Exchange symbol of the tracked security.
    pub ticker: String,
    /// Channel the summaries are posted to.
    pub channel_id: u64,
    /// Time zone the schedule and all displayed timestamps use.
    pub timezone: Tz,
    /// Wall-clock time of the opening summary.
    pub opening: NaiveTime,
    /// Wall-clock time of the closing summary.
    pub closing: NaiveTime,
    /// Upcoming earnings report dates, ascending.
    pub report_dates: Vec<NaiveDate>,
}

impl BotConfig {
    /// Build a config from env overrides (`TICKER`, `SUMMARY_CHANNEL_ID`)
    /// falling back to the compiled defaults.
    pub fn from_env() -> Self {
        let ticker = env::var("TICKER")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_TICKER.to_string());

        let channel_id = env::var("SUMMARY_CHANNEL_ID")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_CHANNEL_ID);

        Self {
            ticker,
            channel_id,
            ..Self::default()
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            ticker: DEFAULT_TICKER.to_string(),
            channel_id: DEFAULT_CHANNEL_ID,
            timezone: Stockholm,
            opening: NaiveTime::from_hms_opt(9, 45, 0).expect("valid opening time"),
            closing: NaiveTime::from_hms_opt(17, 45, 0).expect("valid closing time"),
            report_dates: vec![
                NaiveDate::from_ymd_opt(2026, 5, 22).expect("valid report date"),
                NaiveDate::from_ymd_opt(2026, 8, 28).expect("valid report date"),
                NaiveDate::from_ymd_opt(2026, 11, 13).expect("valid report date"),
            ],
        }
    }
}
