use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use serenity::all::Http;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::BotConfig;
use crate::service::market::MarketService;
use crate::service::summary::{post_market_summary, MarketEvent};

/// How long after its scheduled time an event may still fire. Wide enough
/// that a slow tick never skips a day, narrow enough to stay "at open".
const FIRE_WINDOW_MINUTES: i64 = 5;

/// Owns the scheduled opening/closing poster task.
///
/// Serenity fires `ready` again after any reconnect that starts a new
/// session, so the spawn must be idempotent: only the first call starts
/// the loop, otherwise two tasks would each post at the next window.
pub struct SummaryPoster {
    started: AtomicBool,
}

impl SummaryPoster {
    pub fn new() -> Self {
        Self {
            started: AtomicBool::new(false),
        }
    }

    /// Spawn the scheduled summary loop.
    ///
    /// Ticks once a minute and fires each event within a few minutes of
    /// its configured local time, at most once per calendar day. Returns
    /// `None` when disabled via env or when the loop is already running.
    pub fn spawn(
        &self,
        http: Arc<Http>,
        market: Arc<MarketService>,
        config: BotConfig,
    ) -> Option<JoinHandle<()>> {
        if self.started.swap(true, Ordering::SeqCst) {
            info!("Summary poster already running; ignoring respawn");
            return None;
        }

        if env::var("ENABLE_SUMMARY_POSTER")
            .map(|v| v == "0")
            .unwrap_or(false)
        {
            info!("Summary poster disabled via ENABLE_SUMMARY_POSTER=0");
            return None;
        }

        info!(
            "Starting summary poster for {} to channel {} ({} open / {} close, {})",
            config.ticker, config.channel_id, config.opening, config.closing, config.timezone
        );

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(60));
            let mut last_posted: HashMap<MarketEvent, NaiveDate> = HashMap::new();

            loop {
                interval.tick().await;

                let now = Utc::now().with_timezone(&config.timezone);
                let today = now.date_naive();

                for (event, scheduled) in [
                    (MarketEvent::Opening, config.opening),
                    (MarketEvent::Closing, config.closing),
                ] {
                    if !event_due(now.time(), scheduled) {
                        continue;
                    }
                    if last_posted.get(&event) == Some(&today) {
                        continue;
                    }
                    last_posted.insert(event, today);

                    if let Err(e) = post_market_summary(&http, &market, &config, event, false).await
                    {
                        warn!("{} summary iteration failed: {e}", event.label());
                    }
                }
            }
        }))
    }
}

impl Default for SummaryPoster {
    fn default() -> Self {
        Self::new()
    }
}

/// True when `now` falls inside the fire window of `scheduled`.
fn event_due(now: NaiveTime, scheduled: NaiveTime) -> bool {
    let delta = (now - scheduled).num_minutes();
    (0..FIRE_WINDOW_MINUTES).contains(&delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn fires_only_inside_window() {
        let scheduled = t(9, 45);
        assert!(!event_due(t(9, 44), scheduled));
        assert!(event_due(t(9, 45), scheduled));
        assert!(event_due(t(9, 49), scheduled));
        assert!(!event_due(t(9, 50), scheduled));
        assert!(!event_due(t(17, 45), scheduled));
    }

    #[tokio::test]
    async fn reconnect_respawn_starts_no_second_task() {
        env::remove_var("ENABLE_SUMMARY_POSTER");

        let poster = SummaryPoster::new();
        let http = Arc::new(Http::new(""));
        let market = Arc::new(MarketService::new(None).expect("market service"));
        let config = BotConfig::default();

        let first = poster.spawn(http.clone(), market.clone(), config.clone());
        // a gateway reconnect re-fires ready, which calls spawn again
        let second = poster.spawn(http, market, config);

        assert!(first.is_some());
        assert!(second.is_none());

        if let Some(handle) = first {
            handle.abort();
        }
    }
}
