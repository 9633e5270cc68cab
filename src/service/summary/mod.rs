use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serenity::all::{CreateEmbed, CreateMessage, Http};
use serenity::model::prelude::ChannelId;
use tracing::{info, warn};

use crate::config::BotConfig;
use crate::models::{IntradayBar, QuoteSnapshot};
use crate::service::market::MarketService;

pub mod poster;

const NOT_AVAILABLE: &str = "N/A";

const COLOR_POSITIVE: u32 = 0x00FF00;
const COLOR_NEGATIVE: u32 = 0xFF0000;
const COLOR_FLAT: u32 = 0xFFA500;

/// Which of the two daily summaries is being posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketEvent {
    Opening,
    Closing,
}

impl MarketEvent {
    pub fn label(&self) -> &'static str {
        match self {
            MarketEvent::Opening => "Opening",
            MarketEvent::Closing => "Closing",
        }
    }

    fn emoji(&self) -> &'static str {
        match self {
            MarketEvent::Opening => "🛎️",
            MarketEvent::Closing => "💤",
        }
    }

    /// The price this event leads with: open price at the bell, last
    /// price at the close.
    fn primary_price(&self, snapshot: &QuoteSnapshot) -> Option<f64> {
        match self {
            MarketEvent::Opening => snapshot.open,
            MarketEvent::Closing => snapshot.price,
        }
    }
}

/// Whole days until the first report date on or after `today`, together
/// with that date. `None` once every report date has passed.
pub fn days_until_report(
    today: NaiveDate,
    report_dates: &[NaiveDate],
) -> Option<(i64, NaiveDate)> {
    report_dates
        .iter()
        .filter(|d| **d >= today)
        .min()
        .map(|d| ((*d - today).num_days(), *d))
}

pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Percent change vs previous close. `None` when either side is missing
/// or previous close is zero; an unknown change is displayed as "N/A",
/// never as a computed zero.
pub fn percent_change(price: Option<f64>, previous_close: Option<f64>) -> Option<f64> {
    let price = price?;
    let previous_close = previous_close?;
    if previous_close == 0.0 {
        return None;
    }
    Some((price - previous_close) / previous_close * 100.0)
}

/// Volume-weighted average price over a bar series:
/// Σ(close×volume) / Σ(volume). `None` on an empty series or when no
/// volume traded.
pub fn vwap(bars: &[IntradayBar]) -> Option<f64> {
    let total_volume: f64 = bars.iter().map(|b| b.volume as f64).sum();
    if total_volume <= 0.0 {
        return None;
    }
    let weighted: f64 = bars.iter().map(|b| b.close * b.volume as f64).sum();
    Some(weighted / total_volume)
}

/// Three fixed buckets: up green, down red, flat or unknown amber.
pub fn embed_color(change: Option<f64>) -> u32 {
    match change {
        Some(c) if c > 0.0 => COLOR_POSITIVE,
        Some(c) if c < 0.0 => COLOR_NEGATIVE,
        _ => COLOR_FLAT,
    }
}

/// Millions with one decimal, e.g. 1_234_567_000 → "1234.6 MSEK".
pub fn format_msek(value: f64) -> String {
    format!("{:.1} MSEK", value / 1_000_000.0)
}

fn format_price(price: Option<f64>, change: Option<f64>) -> String {
    match (price, change) {
        (Some(p), Some(c)) => format!("{p:.2} SEK ({c:+.2}%)"),
        (Some(p), None) => format!("{p:.2} SEK"),
        (None, _) => NOT_AVAILABLE.to_string(),
    }
}

fn format_market_cap(market_cap: Option<f64>) -> String {
    market_cap
        .map(format_msek)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn format_day_range(low: Option<f64>, high: Option<f64>) -> String {
    match (low, high) {
        (Some(lo), Some(hi)) => format!("{lo:.2} – {hi:.2} SEK"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Turnover = volume × last price, shown in MSEK with the share count.
fn format_turnover(volume: Option<f64>, price: Option<f64>) -> String {
    match (volume, price) {
        (Some(vol), Some(p)) => format!("{} ({} shares)", format_msek(vol * p), vol as u64),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn format_vwap(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.2} SEK"))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Percent change shown on a summary. Only the close compares against
/// previous close; the opening leads with the plain open price and keeps
/// the fixed amber accent.
fn summary_change(event: MarketEvent, snapshot: &QuoteSnapshot) -> Option<f64> {
    match event {
        MarketEvent::Opening => None,
        MarketEvent::Closing => percent_change(snapshot.price, snapshot.previous_close),
    }
}

/// One builder for both events; the opening and closing summaries differ
/// only in their field set.
pub fn build_summary_embed(
    event: MarketEvent,
    config: &BotConfig,
    snapshot: &QuoteSnapshot,
    vwap_value: Option<f64>,
    now: DateTime<chrono_tz::Tz>,
) -> CreateEmbed {
    let change = summary_change(event, snapshot);

    let mut embed = CreateEmbed::new()
        .title(format!(
            "{} • {} {}",
            config.ticker,
            event.label(),
            event.emoji()
        ))
        .color(embed_color(change));

    let price_label = match event {
        MarketEvent::Opening => "Open",
        MarketEvent::Closing => "Price",
    };
    embed = embed.field(
        price_label,
        format_price(event.primary_price(snapshot), change),
        true,
    );

    match event {
        MarketEvent::Opening => {
            embed = embed.field(
                "Previous close",
                format_price(snapshot.previous_close, None),
                true,
            );

            let upcoming = days_until_report(now.date_naive(), &config.report_dates);
            let (days, next) = match upcoming {
                Some((days, date)) => (days.to_string(), date.format("%Y-%m-%d").to_string()),
                None => ("No upcoming report".to_string(), NOT_AVAILABLE.to_string()),
            };
            embed = embed
                .field("Days to report", days, true)
                .field("Next report", next, true);
        }
        MarketEvent::Closing => {
            embed = embed
                .field("Market cap", format_market_cap(snapshot.market_cap), true)
                .field(
                    "Day range",
                    format_day_range(snapshot.day_low, snapshot.day_high),
                    true,
                )
                .field(
                    "Turnover",
                    format_turnover(snapshot.volume, snapshot.price),
                    true,
                )
                .field("VWAP", format_vwap(vwap_value), true);
        }
    }

    embed.field("Posted", now.format("%Y-%m-%d %H:%M %Z").to_string(), false)
}

/// Fetch, format and send one market summary.
///
/// Weekends are a no-op unless `force` is set (the manual command forces
/// so it stays usable for testing). An intraday fetch failure only costs
/// the VWAP field; a send failure is reported to the caller as a string
/// and never stops the schedule.
pub async fn post_market_summary(
    http: &Http,
    market: &MarketService,
    config: &BotConfig,
    event: MarketEvent,
    force: bool,
) -> Result<(), String> {
    let now = Utc::now().with_timezone(&config.timezone);

    if !force && !is_trading_day(now.date_naive()) {
        info!("Weekend — no {} summary", event.label().to_lowercase());
        return Ok(());
    }

    let snapshot = market
        .get_snapshot(&config.ticker)
        .await
        .map_err(|e| format!("quote fetch error: {e}"))?;

    let vwap_value = match event {
        MarketEvent::Closing => match market.get_intraday_bars(&config.ticker).await {
            Ok(bars) => vwap(&bars),
            Err(e) => {
                warn!("intraday fetch failed for {}: {e}", config.ticker);
                None
            }
        },
        MarketEvent::Opening => None,
    };

    let embed = build_summary_embed(event, config, &snapshot, vwap_value, now);

    info!(
        "Posting {} summary for {} to channel {}",
        event.label().to_lowercase(),
        config.ticker,
        config.channel_id
    );

    ChannelId::new(config.channel_id)
        .send_message(http, CreateMessage::new().embed(embed))
        .await
        .map_err(|e| format!("failed to post {} summary: {e}", event.label().to_lowercase()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bar(close: f64, volume: u64) -> IntradayBar {
        IntradayBar {
            timestamp: Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    #[test]
    fn weekend_days_are_not_trading_days() {
        // 2026-05-02 is a Saturday, 2026-05-03 a Sunday
        assert!(!is_trading_day(date(2026, 5, 2)));
        assert!(!is_trading_day(date(2026, 5, 3)));
        assert!(is_trading_day(date(2026, 5, 1)));
        assert!(is_trading_day(date(2026, 5, 4)));
    }

    #[test]
    fn counts_days_to_first_upcoming_report() {
        let reports = [date(2026, 5, 22), date(2026, 8, 28), date(2026, 11, 13)];
        let (days, next) = days_until_report(date(2026, 5, 1), &reports).unwrap();
        assert_eq!(days, 21);
        assert_eq!(next, date(2026, 5, 22));
    }

    #[test]
    fn report_day_itself_counts_as_zero() {
        let reports = [date(2026, 5, 22)];
        let (days, _) = days_until_report(date(2026, 5, 22), &reports).unwrap();
        assert_eq!(days, 0);
    }

    #[test]
    fn no_upcoming_report_after_last_date() {
        let reports = [date(2026, 5, 22), date(2026, 8, 28), date(2026, 11, 13)];
        assert_eq!(days_until_report(date(2026, 11, 14), &reports), None);
    }

    #[test]
    fn percent_change_from_previous_close() {
        let change = percent_change(Some(110.0), Some(100.0)).unwrap();
        assert!((change - 10.0).abs() < 1e-9);
        assert_eq!(format!("{change:.2}%"), "10.00%");
    }

    #[test]
    fn missing_price_gives_no_change_not_zero() {
        assert_eq!(percent_change(None, Some(100.0)), None);
        assert_eq!(percent_change(Some(110.0), None), None);
        assert_eq!(percent_change(Some(110.0), Some(0.0)), None);
        assert_eq!(format_price(None, None), "N/A");
    }

    #[test]
    fn vwap_weights_close_by_volume() {
        let bars = [bar(10.0, 100), bar(12.0, 50)];
        let value = vwap(&bars).unwrap();
        assert!((value - (10.0 * 100.0 + 12.0 * 50.0) / 150.0).abs() < 1e-9);
        assert_eq!(format_vwap(Some(value)), "10.67 SEK");
    }

    #[test]
    fn vwap_unavailable_without_volume() {
        assert_eq!(vwap(&[]), None);
        assert_eq!(vwap(&[bar(10.0, 0), bar(12.0, 0)]), None);
        assert_eq!(format_vwap(None), "N/A");
    }

    #[test]
    fn market_cap_in_millions_one_decimal() {
        assert_eq!(format_msek(1_234_567_000.0), "1234.6 MSEK");
        assert_eq!(format_market_cap(Some(1_234_567_000.0)), "1234.6 MSEK");
        assert_eq!(format_market_cap(None), "N/A");
    }

    #[test]
    fn turnover_is_volume_times_price() {
        assert_eq!(
            format_turnover(Some(41_250.0), Some(110.0)),
            "4.5 MSEK (41250 shares)"
        );
        assert_eq!(format_turnover(None, Some(110.0)), "N/A");
        assert_eq!(format_turnover(Some(41_250.0), None), "N/A");
    }

    #[test]
    fn opening_summary_has_no_change_and_stays_amber() {
        let snapshot = QuoteSnapshot {
            open: Some(105.0),
            price: Some(110.0),
            previous_close: Some(100.0),
            ..Default::default()
        };

        assert_eq!(summary_change(MarketEvent::Opening, &snapshot), None);
        assert_eq!(
            embed_color(summary_change(MarketEvent::Opening, &snapshot)),
            COLOR_FLAT
        );

        let closing = summary_change(MarketEvent::Closing, &snapshot).unwrap();
        assert!((closing - 10.0).abs() < 1e-9);
        assert_eq!(embed_color(Some(closing)), COLOR_POSITIVE);
    }

    #[test]
    fn color_buckets() {
        assert_eq!(embed_color(Some(0.5)), COLOR_POSITIVE);
        assert_eq!(embed_color(Some(-0.5)), COLOR_NEGATIVE);
        assert_eq!(embed_color(Some(0.0)), COLOR_FLAT);
        assert_eq!(embed_color(None), COLOR_FLAT);
    }

    #[test]
    fn price_formatting_with_and_without_change() {
        assert_eq!(format_price(Some(110.0), Some(10.0)), "110.00 SEK (+10.00%)");
        assert_eq!(format_price(Some(110.0), Some(-2.5)), "110.00 SEK (-2.50%)");
        assert_eq!(format_price(Some(110.0), None), "110.00 SEK");
    }

    #[test]
    fn day_range_needs_both_ends() {
        assert_eq!(
            format_day_range(Some(108.5), Some(111.0)),
            "108.50 – 111.00 SEK"
        );
        assert_eq!(format_day_range(Some(108.5), None), "N/A");
    }
}
